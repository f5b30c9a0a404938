// tapir/src/pipeline/task.rs

//! The task runner: per-task `run` and `complete` phases, concurrently across
//! top-level tasks, plus inline sub-task runs.

use crate::core::phase::Phase;
use crate::core::task::{Task, TaskReturn};
use crate::error::{TapirError, TapirResult};
use crate::plugin::{task_return, Context, RunContext};
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{event, instrument, Level};

/// Executes tasks through the per-task phases.
///
/// Holds the tasks as they were after `load`: top-level runs start from them, and
/// `run_nested` looks sub-tasks up among them.
pub struct TaskRunner {
  ctx: Context,
  tasks: Vec<Task>,
  positions: HashMap<String, usize>,
}

impl TaskRunner {
  pub(crate) fn new(ctx: Context, tasks: Vec<Task>) -> Self {
    let positions = tasks
      .iter()
      .enumerate()
      .map(|(position, task)| (task.key.clone(), position))
      .collect();
    Self { ctx, tasks, positions }
  }

  pub fn context(&self) -> &Context {
    &self.ctx
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn task(&self, key: &str) -> Option<&Task> {
    self.positions.get(key).map(|position| &self.tasks[*position])
  }

  /// Runs every task concurrently and returns them, final state and external
  /// result, in declaration order.
  ///
  /// A failing task never stops its siblings. A task that panics is recorded as a
  /// `bug` failure and still goes through `complete`.
  #[instrument(name = "TaskRunner::run_all", skip_all, fields(num_tasks = self.tasks.len()), err(Display))]
  pub(crate) async fn run_all(self: Arc<Self>) -> TapirResult<Vec<(Task, TaskReturn)>> {
    let mut join_set = JoinSet::new();
    for (position, task) in self.tasks.iter().enumerate() {
      let runner = Arc::clone(&self);
      let task = task.clone();
      join_set.spawn(async move {
        let key = task.key.clone();
        let outcome = AssertUnwindSafe(runner.run_top(task)).catch_unwind().await;
        (position, key, outcome)
      });
    }

    let mut finished: Vec<Option<Task>> = vec![None; self.tasks.len()];
    while let Some(joined) = join_set.join_next().await {
      let (position, key, outcome) =
        joined.map_err(|err| TapirError::bug(format!("Task execution was interrupted: {}", err)))?;
      let task = match outcome {
        Ok(task) => task,
        Err(panic) => {
          let message = panic_message(panic.as_ref());
          event!(Level::ERROR, task = %key, panic = %message, "Task panicked.");
          let mut task = self.tasks[position].clone();
          task.error = Some(TapirError::bug(format!("Task '{}' panicked: {}", key, message)).with_task(&key));
          self.complete_phase(task).await
        }
      };
      finished[position] = Some(task);
    }

    let plugins = self.ctx.plugins();
    let outcomes = finished
      .into_iter()
      .zip(self.tasks.iter())
      .filter_map(|(task, original)| {
        task.map(|task| {
          let returned = task_return(&task, original, plugins);
          (task, returned)
        })
      })
      .collect();
    Ok(outcomes)
  }

  #[instrument(name = "TaskRunner::run_top", skip_all, fields(task = %task.key))]
  async fn run_top(self: &Arc<Self>, task: Task) -> Task {
    let path = vec![task.key.clone()];
    let task = self.run_phase(task, path).await;
    self.complete_phase(task).await
  }

  /// Runs another task inline for the task at the end of `parent_path`.
  pub(crate) async fn run_nested(self: &Arc<Self>, key: &str, parent_path: &[String]) -> TapirResult<Task> {
    if parent_path.iter().any(|in_flight| in_flight == key) {
      let chain = parent_path
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(key))
        .collect::<Vec<_>>()
        .join(" -> ");
      return Err(
        TapirError::config(format!("Task '{}' recursively runs itself: {}", key, chain))
          .with_property("property", format!("tasks.{}", key)),
      );
    }

    let mut task = self.task(key).cloned().ok_or_else(|| {
      TapirError::config(format!("Task '{}' does not exist", key)).with_property("property", format!("tasks.{}", key))
    })?;
    task.nested = true;

    let mut path = parent_path.to_vec();
    path.push(key.to_string());
    event!(Level::DEBUG, task = %key, depth = path.len(), "Running nested task.");

    let task = self.run_phase(task, path).await;
    let task = self.complete_phase(task).await;

    match &task.error {
      None => Ok(task),
      Some(err) => {
        let wrapper = TapirError::new(err.kind, format!("Task '{}' failed: {}", key, err.message));
        Err(wrapper.with_nested(task))
      }
    }
  }

  /// Fires `run` handlers in order until one fails or the task is skipped.
  async fn run_phase(self: &Arc<Self>, task: Task, nested_path: Vec<String>) -> Task {
    let ctx = RunContext::new(Arc::clone(self), nested_path);
    let mut task = task;

    for plugin in self.ctx.plugins().handlers(Phase::Run) {
      if task.skip {
        event!(Level::DEBUG, task = %task.key, "Task skipped.");
        break;
      }
      match plugin.run(&task, &ctx).await {
        Ok(patch) => task = task.apply(patch),
        Err(err) => {
          event!(Level::WARN, task = %task.key, plugin = plugin.name(), error = %err, "'run' handler failed.");
          let err = err.with_plugin(plugin.name()).with_task(&task.key);
          task.error = Some(err);
          break;
        }
      }
    }
    task
  }

  /// Fires `complete` handlers. An error stops this task's completion and is kept
  /// unless the task already failed.
  async fn complete_phase(&self, task: Task) -> Task {
    let mut task = task;
    for plugin in self.ctx.plugins().handlers(Phase::Complete) {
      if let Err(err) = plugin.complete(&task, &self.ctx).await {
        event!(Level::ERROR, task = %task.key, plugin = plugin.name(), error = %err, "'complete' handler failed.");
        if task.error.is_none() {
          task.error = Some(err.with_plugin(plugin.name()).with_task(&task.key));
        }
        break;
      }
    }
    task
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(message) = panic.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
