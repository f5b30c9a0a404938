// tapir/src/report/memory.rs

use crate::error::TapirResult;
use crate::report::entry::{ReportEntry, ReportSummary};
use crate::report::reporter::Reporter;
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
  Start(Vec<String>),
  Tick(String),
  Complete(ReportEntry),
  End(ReportSummary),
}

/// Reporter keeping every event in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
  events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<ReportEvent> {
    self.events.lock().clone()
  }

  /// Entries passed to `complete`, in call order.
  pub fn completed(&self) -> Vec<ReportEntry> {
    self
      .events
      .lock()
      .iter()
      .filter_map(|event| match event {
        ReportEvent::Complete(entry) => Some(entry.clone()),
        _ => None,
      })
      .collect()
  }

  /// Keys passed to `tick`, in call order.
  pub fn ticks(&self) -> Vec<String> {
    self
      .events
      .lock()
      .iter()
      .filter_map(|event| match event {
        ReportEvent::Tick(key) => Some(key.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn summary(&self) -> Option<ReportSummary> {
    self.events.lock().iter().rev().find_map(|event| match event {
      ReportEvent::End(summary) => Some(*summary),
      _ => None,
    })
  }
}

#[async_trait]
impl Reporter for MemoryReporter {
  fn name(&self) -> &str {
    "memory"
  }

  async fn start(&self, task_keys: &[String]) -> TapirResult<()> {
    self.events.lock().push(ReportEvent::Start(task_keys.to_vec()));
    Ok(())
  }

  async fn tick(&self, entry: &ReportEntry) -> TapirResult<()> {
    self.events.lock().push(ReportEvent::Tick(entry.key.clone()));
    Ok(())
  }

  async fn complete(&self, entry: &ReportEntry) -> TapirResult<()> {
    self.events.lock().push(ReportEvent::Complete(entry.clone()));
    Ok(())
  }

  async fn end(&self, summary: &ReportSummary) -> TapirResult<()> {
    self.events.lock().push(ReportEvent::End(*summary));
    Ok(())
  }
}
