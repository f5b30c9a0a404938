// tapir/src/collab.rs

//! Boundary traits for the collaborators the engine drives but does not implement:
//! JSON-schema validation, API specification loading and the HTTP transport.
//!
//! Implementations are injected on [`crate::Runner::builder`]. A default
//! [`SchemaValidator`] backed by the `jsonschema` crate is provided.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Why a value did not validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
  /// The schema itself does not compile.
  InvalidSchema(String),
  /// The value does not match. One message per failed keyword.
  Invalid(Vec<String>),
}

impl fmt::Display for SchemaViolation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SchemaViolation::InvalidSchema(message) => write!(f, "invalid schema: {}", message),
      SchemaViolation::Invalid(messages) => f.write_str(&messages.join("; ")),
    }
  }
}

/// `validate(schema, value)` capability used by the registry, `verify` and `validate`.
pub trait SchemaValidator: Send + Sync {
  fn validate(&self, schema: &Value, value: &Value) -> Result<(), SchemaViolation>;

  /// Checks that `schema` compiles, without validating anything against it.
  fn check_schema(&self, schema: &Value) -> Result<(), SchemaViolation>;
}

/// [`SchemaValidator`] backed by `jsonschema`, drafts auto-detected from `$schema`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
  fn validate(&self, schema: &Value, value: &Value) -> Result<(), SchemaViolation> {
    let compiled =
      jsonschema::validator_for(schema).map_err(|err| SchemaViolation::InvalidSchema(err.to_string()))?;
    if compiled.is_valid(value) {
      return Ok(());
    }
    let messages = compiled.iter_errors(value).map(|err| err.to_string()).collect::<Vec<_>>();
    Err(SchemaViolation::Invalid(messages))
  }

  fn check_schema(&self, schema: &Value) -> Result<(), SchemaViolation> {
    jsonschema::validator_for(schema)
      .map(|_| ())
      .map_err(|err| SchemaViolation::InvalidSchema(err.to_string()))
  }
}

/// Loads and normalizes an API specification from its `config.spec` definition.
#[async_trait]
pub trait SpecLoader: Send + Sync {
  async fn load(&self, definition: &Value) -> anyhow::Result<Value>;
}

/// One HTTP request, built from a task's `call` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
  #[serde(default = "default_method")]
  pub method: String,
  pub url: String,
  #[serde(default)]
  pub headers: Map<String, Value>,
  #[serde(default)]
  pub query: Map<String, Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body: Option<Value>,
}

fn default_method() -> String {
  "GET".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub status: u16,
  #[serde(default)]
  pub headers: Map<String, Value>,
  #[serde(default)]
  pub body: Value,
}

/// Sends requests. Timeouts and retries are the transport's concern.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: &Request) -> anyhow::Result<Response>;
}
