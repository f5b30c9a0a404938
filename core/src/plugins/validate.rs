// tapir/src/plugins/validate.rs

use crate::collab::{SchemaValidator, SchemaViolation};
use crate::core::merge::deep_merge;
use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::{Task, TaskPatch};
use crate::error::{TapirError, TapirResult};
use crate::plugin::{ConfigSchema, Plugin, RunContext};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Validates `task.call.response` against the schemas of `task.validate`.
///
/// `validate.status`, `validate.headers.<name>` and `validate.body` are JSON schemas.
/// A non-object value is a shortcut for "exactly this value". Rules under
/// `validate.byStatus.<status>` (or `byStatus.default`) apply too, with lower
/// priority than the top-level ones.
pub struct ValidatePlugin {
  validator: Arc<dyn SchemaValidator>,
}

impl ValidatePlugin {
  pub fn new(validator: Arc<dyn SchemaValidator>) -> Self {
    Self { validator }
  }

  fn check(&self, schema: &Value, actual: &Value, property: &str, label: &str) -> TapirResult<()> {
    let schema = shortcut(schema);
    match self.validator.validate(&schema, actual) {
      Ok(()) => Ok(()),
      Err(SchemaViolation::InvalidSchema(message)) => Err(
        TapirError::config(format!("Schema of '{}' is invalid: {}", property, message))
          .with_property("property", property)
          .with_property("schema", schema),
      ),
      Err(SchemaViolation::Invalid(messages)) => Err(
        TapirError::test(format!("{} is invalid: {}.", label, messages.join("; ")))
          .with_property("property", property)
          .with_property("schema", schema)
          .with_property("actual", actual.clone()),
      ),
    }
  }
}

#[async_trait]
impl Plugin for ValidatePlugin {
  fn name(&self) -> &str {
    "validate"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Run)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: None,
      task: Some(json!({
        "type": "object",
        "properties": {
          "headers": { "type": "object" },
          "byStatus": { "type": "object" },
        },
      })),
    }
  }

  async fn run(&self, task: &Task, _ctx: &RunContext) -> TapirResult<TaskPatch> {
    let Some(Value::Object(rules)) = task.get("validate") else {
      return Ok(TaskPatch::new());
    };
    let response = task
      .get("call")
      .and_then(|call| call.get("response"))
      .filter(|response| response.is_object())
      .ok_or_else(|| {
        TapirError::response("No response to validate: 'call.response' is missing")
          .with_property("property", "call.response")
      })?;

    let status = response.get("status").cloned().unwrap_or(Value::Null);
    let rules = by_status(rules, &status);

    if let Some(schema) = rules.get("status") {
      self.check(schema, &status, "call.response.status", "Status code")?;
    }

    if let Some(Value::Object(headers)) = rules.get("headers") {
      let actual_headers = response.get("headers").and_then(Value::as_object);
      for (name, schema) in headers {
        let property = format!("call.response.headers.{}", name);
        let actual = actual_headers.and_then(|actual| find_header(actual, name)).ok_or_else(|| {
          TapirError::test(format!("Response header '{}' is missing.", name)).with_property("property", property.clone())
        })?;
        self.check(schema, actual, &property, &format!("Response header '{}'", name))?;
      }
    }

    if let Some(schema) = rules.get("body") {
      let body = response.get("body").unwrap_or(&Value::Null);
      self.check(schema, body, "call.response.body", "Response body")?;
    }

    Ok(TaskPatch::new())
  }
}

/// Merges the `byStatus` rules matching `status` under the top-level rules.
fn by_status(rules: &Map<String, Value>, status: &Value) -> Map<String, Value> {
  let mut rules = rules.clone();
  let Some(Value::Object(by_status)) = rules.remove("byStatus") else {
    return rules;
  };
  let status_key = match status {
    Value::String(text) => text.clone(),
    other => other.to_string(),
  };
  let Some(matching) = by_status.get(&status_key).or_else(|| by_status.get("default")) else {
    return rules;
  };
  match deep_merge(matching, &Value::Object(rules.clone())) {
    Value::Object(merged) => merged,
    _ => rules,
  }
}

/// `validate.*: non-object` is a shortcut for `{ type, enum: [value] }`.
fn shortcut(schema: &Value) -> Value {
  if schema.is_object() {
    return schema.clone();
  }
  let schema_type = match schema {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
    Value::Number(number) if number.as_f64().is_some_and(|float| float.fract() == 0.0) => "integer",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  };
  json!({ "type": schema_type, "enum": [schema] })
}

fn find_header<'a>(headers: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
  headers
    .iter()
    .find(|(header, _)| header.eq_ignore_ascii_case(name))
    .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shortcut_pins_type_and_value() {
    assert_eq!(shortcut(&json!(200)), json!({ "type": "integer", "enum": [200] }));
    assert_eq!(shortcut(&json!("ok")), json!({ "type": "string", "enum": ["ok"] }));
    assert_eq!(shortcut(&json!(1.5)), json!({ "type": "number", "enum": [1.5] }));
    assert_eq!(shortcut(&json!({ "minimum": 200 })), json!({ "minimum": 200 }));
  }

  #[test]
  fn by_status_has_lower_priority() {
    let rules = json!({
      "body": { "type": "object" },
      "byStatus": {
        "201": { "body": { "required": ["id"], "type": "array" }, "headers": { "location": { "type": "string" } } },
        "default": { "status": 500 },
      },
    });
    let Value::Object(rules) = rules else { unreachable!() };

    let merged = by_status(&rules, &json!(201));
    assert_eq!(merged["body"], json!({ "type": "object", "required": ["id"] }));
    assert!(merged.contains_key("headers"));
    assert!(!merged.contains_key("byStatus"));

    let fallback = by_status(&rules, &json!(404));
    assert_eq!(fallback["status"], json!(500));
  }
}
