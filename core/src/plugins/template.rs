// tapir/src/plugins/template.rs

use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::{Task, TaskPatch};
use crate::error::TapirResult;
use crate::plugin::{ConfigSchema, Plugin, RunContext};
use crate::template::{evaluate, has_markers, TemplateVars};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::env;
use tracing::{event, Level};

/// Sections holding template declarations rather than templated data.
const UNTEMPLATED: &[&str] = &["alias"];

/// Evaluates the templates of every namespaced section of the task.
///
/// Variables come, in increasing precedence, from the process environment
/// (`$$env`), `config.template`, then each plugin's `template()` contribution in
/// plugin order.
#[derive(Debug, Default)]
pub struct TemplatePlugin;

impl TemplatePlugin {
  pub fn vars(task: &Task, ctx: &RunContext) -> TemplateVars {
    let environment: Map<String, Value> = env::vars().map(|(name, value)| (name, Value::String(value))).collect();
    let mut vars = TemplateVars::new().with("env", Value::Object(environment));

    if let Some(Value::Object(custom)) = ctx.config().get("template") {
      vars.extend(TemplateVars::from(custom.clone()));
    }
    for plugin in ctx.plugins().iter() {
      vars.extend(plugin.template(task, ctx));
    }
    vars
  }
}

#[async_trait]
impl Plugin for TemplatePlugin {
  fn name(&self) -> &str {
    "template"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Run)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: Some(json!({ "type": "object" })),
      task: None,
    }
  }

  async fn run(&self, task: &Task, ctx: &RunContext) -> TapirResult<TaskPatch> {
    let templated: Vec<(&String, &Value)> = task
      .data
      .iter()
      .filter(|(namespace, value)| !UNTEMPLATED.contains(&namespace.as_str()) && has_markers(value))
      .collect();
    if templated.is_empty() {
      return Ok(TaskPatch::new());
    }

    let vars = Self::vars(task, ctx);
    let mut patch = TaskPatch::new();
    for (namespace, value) in templated {
      event!(Level::TRACE, task = %task.key, namespace = %namespace, "Evaluating templates.");
      let evaluated = evaluate(value, &vars).await.map_err(|err| {
        if err.properties.contains_key("property") {
          err
        } else {
          err.with_property("property", format!("task.{}", namespace))
        }
      })?;
      patch = patch.set(namespace.clone(), evaluated);
    }
    Ok(patch)
  }
}
