// tapir/src/plugins/skip.rs

use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::Task;
use crate::error::TapirResult;
use crate::plugin::{ConfigSchema, Context, Plugin};
use crate::plugins::select::{matches_any, patterns, patterns_schema};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Marks tasks skipped: those with `skip: true`, and those whose key matches a
/// `config.skip` pattern. A skipped task fires no `run` handler and reports as
/// `skip`.
#[derive(Debug, Default)]
pub struct SkipPlugin;

#[async_trait]
impl Plugin for SkipPlugin {
  fn name(&self) -> &str {
    "skip"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Load)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: Some(patterns_schema()),
      task: Some(json!({ "type": "boolean" })),
    }
  }

  async fn load(&self, tasks: &[Task], ctx: &Context) -> TapirResult<Option<Vec<Task>>> {
    let patterns = patterns(ctx.config().get("skip"), "skip")?;
    let skipped = |task: &Task| task.get("skip") == Some(&Value::Bool(true)) || matches_any(&patterns, &task.key);

    if !tasks.iter().any(|task| skipped(task)) {
      return Ok(None);
    }

    let marked = tasks
      .iter()
      .map(|task| Task {
        skip: task.skip || skipped(task),
        ..task.clone()
      })
      .collect();
    Ok(Some(marked))
  }
}
