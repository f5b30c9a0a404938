// tapir/src/plugins/report.rs

use crate::core::phase::{Phase, PhaseSet};
use crate::core::start_data::{StartData, StartPatch};
use crate::core::task::{Task, TaskReturn};
use crate::error::{TapirError, TapirResult};
use crate::plugin::{Context, Plugin, ReturnPolicy};
use crate::report::{ReportState, ReportSummary, Reporter};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, Level};

/// Drives the injected reporters.
///
/// `start` builds the [`ReportState`] from the task keys fixed by `load`,
/// `complete` feeds it each top-level task, and `end` sends the summary. Nested
/// tasks are reported through the error chain of the task that ran them.
pub struct ReportPlugin {
  reporters: Vec<Arc<dyn Reporter>>,
}

impl ReportPlugin {
  pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
    Self { reporters }
  }

  fn state(ctx: &Context) -> TapirResult<Arc<ReportState>> {
    ctx
      .start_data()
      .shared::<ReportState>()
      .ok_or_else(|| TapirError::bug("Report state is missing: 'start' was not fired"))
  }
}

#[async_trait]
impl Plugin for ReportPlugin {
  fn name(&self) -> &str {
    "report"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::of(&[Phase::Start, Phase::Complete, Phase::End])
  }

  fn return_policy(&self) -> ReturnPolicy {
    ReturnPolicy::Never
  }

  async fn start(&self, _start_data: &StartData, ctx: &Context) -> TapirResult<StartPatch> {
    for reporter in &self.reporters {
      event!(Level::DEBUG, reporter = reporter.name(), "Starting reporter.");
      reporter.start(ctx.task_keys()).await?;
    }
    let state = ReportState::new(self.reporters.clone(), ctx.task_keys());
    Ok(StartPatch::new().shared(state))
  }

  async fn complete(&self, task: &Task, ctx: &Context) -> TapirResult<()> {
    if task.nested {
      return Ok(());
    }
    Self::state(ctx)?.record(task, ctx).await?;
    Ok(())
  }

  async fn end(&self, tasks: &[Task], _returns: &[TaskReturn], ctx: &Context) -> TapirResult<()> {
    Self::state(ctx)?.flush_remaining(ctx).await?;
    let summary = ReportSummary::from_tasks(tasks);
    event!(
      Level::INFO,
      total = summary.total,
      pass = summary.pass,
      fail = summary.fail,
      skip = summary.skip,
      "Run summary."
    );
    for reporter in &self.reporters {
      reporter.end(&summary).await?;
    }
    Ok(())
  }
}
