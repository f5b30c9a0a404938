// tapir/src/plugins/each.rs

use crate::core::merge::deep_merge;
use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::Task;
use crate::error::TapirResult;
use crate::plugin::{ConfigSchema, Context, Plugin};
use async_trait::async_trait;
use serde_json::{json, Value};

/// `config.each` is deep-merged under every task. Task values win.
#[derive(Debug, Default)]
pub struct EachPlugin;

#[async_trait]
impl Plugin for EachPlugin {
  fn name(&self) -> &str {
    "each"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Load)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: Some(json!({ "type": "object" })),
      task: None,
    }
  }

  async fn load(&self, tasks: &[Task], ctx: &Context) -> TapirResult<Option<Vec<Task>>> {
    let Some(defaults) = ctx.config().get("each").filter(|each| each.is_object()) else {
      return Ok(None);
    };

    let merged = tasks
      .iter()
      .map(|task| {
        let data = match deep_merge(defaults, &Value::Object(task.data.clone())) {
          Value::Object(data) => data,
          _ => task.data.clone(),
        };
        Task { data, ..task.clone() }
      })
      .collect();
    Ok(Some(merged))
  }
}
