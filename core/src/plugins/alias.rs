// tapir/src/plugins/alias.rs

use crate::core::phase::PhaseSet;
use crate::core::task::Task;
use crate::error::TapirResult;
use crate::plugin::{ConfigSchema, Plugin, RunContext};
use crate::template::{TemplateFunction, TemplateValue, TemplateVars};
use async_trait::async_trait;
use serde_json::{json, Value};

/// `alias: NAME` on a task exposes it to other tasks as the template `$$NAME`.
///
/// Referencing the alias runs the aliased task inline, through `run` and
/// `complete`, and resolves to its data, e.g. `$$login.call.response.body.token`.
#[derive(Debug, Default)]
pub struct AliasPlugin;

struct AliasFunction {
  key: String,
  ctx: RunContext,
}

#[async_trait]
impl TemplateFunction for AliasFunction {
  async fn call(&self, _args: Vec<Value>) -> TapirResult<Value> {
    let task = self.ctx.run_task(&self.key).await?;
    let mut data = task.data;
    data.remove("alias");
    Ok(Value::Object(data))
  }
}

#[async_trait]
impl Plugin for AliasPlugin {
  fn name(&self) -> &str {
    "alias"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: None,
      task: Some(json!({ "type": "string", "pattern": "^(\\$\\$)?[A-Za-z_][A-Za-z0-9_]*$" })),
    }
  }

  fn template(&self, _task: &Task, ctx: &RunContext) -> TemplateVars {
    let mut vars = TemplateVars::new();
    for aliased in ctx.tasks() {
      if let Some(Value::String(name)) = aliased.get("alias") {
        let function = AliasFunction {
          key: aliased.key.clone(),
          ctx: ctx.clone(),
        };
        vars.insert(name.clone(), TemplateValue::function(function));
      }
    }
    vars
  }
}
