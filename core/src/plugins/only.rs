// tapir/src/plugins/only.rs

use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::Task;
use crate::error::TapirResult;
use crate::plugin::{ConfigSchema, Context, Plugin};
use crate::plugins::select::{matches_any, patterns, patterns_schema};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{event, Level};

/// Keeps only the selected tasks: those with `only: true`, and those whose key
/// matches a `config.only` pattern. Without any selection every task is kept.
#[derive(Debug, Default)]
pub struct OnlyPlugin;

#[async_trait]
impl Plugin for OnlyPlugin {
  fn name(&self) -> &str {
    "only"
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
    let patterns = patterns(ctx.config().get("only"), "only")?;
    let selected = |task: &Task| task.get("only") == Some(&Value::Bool(true)) || matches_any(&patterns, &task.key);

    if !tasks.iter().any(|task| task.get("only") == Some(&Value::Bool(true))) && patterns.is_empty() {
      return Ok(None);
    }

    let kept: Vec<Task> = tasks.iter().filter(|task| selected(*task)).cloned().collect();
    event!(Level::DEBUG, kept = kept.len(), total = tasks.len(), "Tasks selected.");
    Ok(Some(kept))
  }
}
