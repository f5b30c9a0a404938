// tapir/src/plugin/verify.rs

//! Checks of plugin-declared configuration schemas.

use crate::collab::{SchemaValidator, SchemaViolation};
use crate::core::config::Config;
use crate::core::task::Task;
use crate::error::{TapirError, TapirResult};
use crate::plugin::Plugin;
use serde_json::Value;

/// Checks that the plugin's own schemas compile, then validates `config.<plugin>`
/// against its general schema when both exist.
pub fn verify_plugin_config(plugin: &dyn Plugin, config: &Config, validator: &dyn SchemaValidator) -> TapirResult<()> {
  let name = plugin.name();
  let schema = plugin.config_schema();

  for declared in [&schema.general, &schema.task].into_iter().flatten() {
    validator.check_schema(declared).map_err(|violation| {
      TapirError::bug(format!("Plugin '{}' declares an invalid schema: {}", name, violation))
        .with_plugin(name)
        .with_property("schema", declared.clone())
    })?;
  }

  match (&schema.general, config.get(name)) {
    (Some(general), Some(value)) if !value.is_null() => check(validator, general, value, &format!("config.{}", name))
      .map_err(|err| err.with_plugin(name)),
    _ => Ok(()),
  }
}

/// Validates `task.<plugin>` against the plugin's task schema when both exist.
pub fn verify_task_config(plugin: &dyn Plugin, task: &Task, validator: &dyn SchemaValidator) -> TapirResult<()> {
  let name = plugin.name();
  match (plugin.config_schema().task, task.get(name)) {
    (Some(schema), Some(value)) => {
      check(validator, &schema, value, &format!("task.{}", name)).map_err(|err| err.with_plugin(name))
    }
    _ => Ok(()),
  }
}

fn check(validator: &dyn SchemaValidator, schema: &Value, value: &Value, property: &str) -> TapirResult<()> {
  match validator.validate(schema, value) {
    Ok(()) => Ok(()),
    Err(SchemaViolation::InvalidSchema(message)) => Err(
      TapirError::bug(format!("Schema of '{}' is invalid: {}", property, message))
        .with_property("schema", schema.clone()),
    ),
    Err(SchemaViolation::Invalid(messages)) => Err(
      TapirError::config(format!("Configuration '{}' is invalid: {}", property, messages.join("; ")))
        .with_property("property", property)
        .with_property("schema", schema.clone())
        .with_property("actual", value.clone()),
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collab::JsonSchemaValidator;
  use crate::core::phase::PhaseSet;
  use crate::error::ErrorKind;
  use crate::plugin::ConfigSchema;
  use serde_json::json;

  struct Schemas(ConfigSchema);

  impl Plugin for Schemas {
    fn name(&self) -> &str {
      "demo"
    }

    fn phases(&self) -> PhaseSet {
      PhaseSet::NONE
    }

    fn config_schema(&self) -> ConfigSchema {
      self.0.clone()
    }
  }

  fn plugin(general: Value, task: Value) -> Schemas {
    Schemas(ConfigSchema {
      general: Some(general),
      task: Some(task),
    })
  }

  #[test]
  fn general_config_violation_is_a_config_error() {
    let plugin = plugin(json!({ "type": "object" }), json!({ "type": "object" }));
    let config = Config::builder().set("demo", json!(3)).build();
    let err = verify_plugin_config(&plugin, &config, &JsonSchemaValidator).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Config);
    assert_eq!(err.plugin.as_deref(), Some("demo"));
    assert_eq!(err.properties["property"], json!("config.demo"));
  }

  #[test]
  fn absent_config_is_not_checked() {
    let plugin = plugin(json!({ "type": "object" }), json!({ "type": "object" }));
    assert!(verify_plugin_config(&plugin, &Config::new(), &JsonSchemaValidator).is_ok());
  }

  #[test]
  fn broken_plugin_schema_is_a_bug() {
    let plugin = plugin(json!({ "type": "object" }), json!({ "type": 42 }));
    let err = verify_plugin_config(&plugin, &Config::new(), &JsonSchemaValidator).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Bug);
  }

  #[test]
  fn task_section_is_checked() {
    let plugin = plugin(json!({}), json!({ "type": "object", "required": ["url"] }));
    let task = Task::from_value("a", json!({ "demo": {} })).unwrap();
    let err = verify_task_config(&plugin, &task, &JsonSchemaValidator).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Config);
    assert_eq!(err.properties["property"], json!("task.demo"));
  }
}
