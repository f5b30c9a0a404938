// tapir/src/report/state.rs

//! Buffering state shared by every task completion of a run.

use crate::core::task::Task;
use crate::error::TapirResult;
use crate::plugin::Context;
use crate::report::buffer::OrderedBuffer;
use crate::report::entry::{entries, ReportEntry};
use crate::report::reporter::Reporter;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{event, instrument, Level};

/// Reporters of a run and the ordered buffer of completed tasks.
///
/// Built during `start`, once task keys are fixed, and kept in `StartData`. Task
/// workers never touch the buffer directly: every completion goes through
/// [`ReportState::record`], which holds the lock for the whole record-then-flush
/// step so two flushes never interleave.
pub struct ReportState {
  reporters: Vec<Arc<dyn Reporter>>,
  buffer: Mutex<OrderedBuffer<Task>>,
}

impl ReportState {
  pub fn new(reporters: Vec<Arc<dyn Reporter>>, task_keys: &[String]) -> Self {
    Self {
      reporters,
      buffer: Mutex::new(OrderedBuffer::new(task_keys.to_vec())),
    }
  }

  pub fn reporters(&self) -> &[Arc<dyn Reporter>] {
    &self.reporters
  }

  /// Records a completed task, fires `tick`, then `complete` for every task now
  /// releasable. Returns how many tasks were released.
  ///
  /// A failing reporter never keeps the other released tasks from being emitted:
  /// every entry goes to every reporter and the first error is returned afterwards.
  #[instrument(name = "ReportState::record", skip_all, fields(task = %task.key), err(Display))]
  pub async fn record(&self, task: &Task, ctx: &Context) -> TapirResult<usize> {
    let mut buffer = self.buffer.lock().await;
    let ready = buffer.record(&task.key, task.clone())?;
    let mut first_error = None;

    let tick = ReportEntry::from_task(task, ctx, false);
    for reporter in &self.reporters {
      if let Err(err) = reporter.tick(&tick).await {
        event!(Level::ERROR, reporter = reporter.name(), task = %task.key, error = %err, "Reporter 'tick' failed.");
        first_error.get_or_insert(err);
      }
    }

    let released = ready.len();
    for ready_task in &ready {
      if let Err(err) = self.emit(ready_task, ctx).await {
        first_error.get_or_insert(err);
      }
    }
    event!(Level::TRACE, released, index = buffer.index(), "Report buffer flushed.");
    match first_error {
      Some(err) => Err(err),
      None => Ok(released),
    }
  }

  /// Releases the tasks still buffered behind a task that never completed.
  pub async fn flush_remaining(&self, ctx: &Context) -> TapirResult<usize> {
    let mut buffer = self.buffer.lock().await;
    let remaining = buffer.drain();
    if !remaining.is_empty() {
      event!(Level::WARN, remaining = remaining.len(), "Flushing tasks buffered behind a missing completion.");
    }
    let mut first_error = None;
    for task in &remaining {
      if let Err(err) = self.emit(task, ctx).await {
        first_error.get_or_insert(err);
      }
    }
    match first_error {
      Some(err) => Err(err),
      None => Ok(remaining.len()),
    }
  }

  /// Position of the next task to release.
  pub async fn index(&self) -> usize {
    self.buffer.lock().await.index()
  }

  /// Sends every entry of `task` to every reporter, then returns the first error.
  async fn emit(&self, task: &Task, ctx: &Context) -> TapirResult<()> {
    let mut first_error = None;
    for entry in entries(task, ctx) {
      for reporter in &self.reporters {
        if let Err(err) = reporter.complete(&entry).await {
          event!(Level::ERROR, reporter = reporter.name(), task = %entry.key, error = %err, "Reporter 'complete' failed.");
          first_error.get_or_insert(err);
        }
      }
    }
    match first_error {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}
