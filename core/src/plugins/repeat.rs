// tapir/src/plugins/repeat.rs

use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::Task;
use crate::error::TapirResult;
use crate::plugin::{ConfigSchema, Context, Plugin};
use async_trait::async_trait;
use serde_json::json;

/// Repeats every task `config.repeat` times. Copies keep their position and are
/// keyed `KEY #N`, starting at 1.
#[derive(Debug, Default)]
pub struct RepeatPlugin;

#[async_trait]
impl Plugin for RepeatPlugin {
  fn name(&self) -> &str {
    "repeat"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Load)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: Some(json!({ "type": "integer", "minimum": 1 })),
      task: None,
    }
  }

  async fn load(&self, tasks: &[Task], ctx: &Context) -> TapirResult<Option<Vec<Task>>> {
    let times = ctx.config().section::<u64>("repeat")?.unwrap_or(1);
    if times <= 1 {
      return Ok(None);
    }

    let repeated = tasks
      .iter()
      .flat_map(|task| {
        (1..=times).map(move |count| Task {
          key: format!("{} #{}", task.key, count),
          ..task.clone()
        })
      })
      .collect();
    Ok(Some(repeated))
  }
}
