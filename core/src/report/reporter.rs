// tapir/src/report/reporter.rs

use crate::error::TapirResult;
use crate::report::entry::{ReportEntry, ReportSummary};
use async_trait::async_trait;

/// An output format. Only the contract lives here; formats are provided by users.
///
/// `complete` is called in declaration order of the tasks, never concurrently with
/// another `complete`. `tick` is called once per finished task, in completion order,
/// just before any `complete` that finish releases.
#[async_trait]
pub trait Reporter: Send + Sync {
  fn name(&self) -> &str;

  async fn start(&self, _task_keys: &[String]) -> TapirResult<()> {
    Ok(())
  }

  async fn tick(&self, _entry: &ReportEntry) -> TapirResult<()> {
    Ok(())
  }

  async fn complete(&self, entry: &ReportEntry) -> TapirResult<()>;

  async fn end(&self, _summary: &ReportSummary) -> TapirResult<()> {
    Ok(())
  }
}
