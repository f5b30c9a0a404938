// tapir/src/error.rs

//! Classified failures.
//!
//! Every failure that crosses a plugin boundary is a [`TapirError`]: a kind from a
//! fixed taxonomy, a message, free-form properties and an optional nested task (the
//! sub-task whose failure caused this one). A failed run surfaces a single
//! [`RunError`] listing every individual failure as a plain [`ErrorRecord`].

use crate::core::task::Task;
use anyhow::Error as AnyhowError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use thiserror::Error;

/// The failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
  /// Defect in the engine or in a plugin. The only kind that keeps a stack.
  Bug,
  /// Invalid run-wide or plugin configuration.
  Config,
  /// Invalid or unfetchable API specification.
  Specification,
  /// Assertion or validation failure against the declared rules.
  Test,
  /// Network or transport failure.
  Connect,
  /// Unexpected API response shape.
  Response,
}

impl ErrorKind {
  /// Order used to pick the kind of an aggregate error.
  pub const PRIORITY: [ErrorKind; 6] = [
    ErrorKind::Bug,
    ErrorKind::Config,
    ErrorKind::Specification,
    ErrorKind::Test,
    ErrorKind::Connect,
    ErrorKind::Response,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::Bug => "bug",
      ErrorKind::Config => "config",
      ErrorKind::Specification => "specification",
      ErrorKind::Test => "test",
      ErrorKind::Connect => "connect",
      ErrorKind::Response => "response",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A classified failure raised by the engine or by a plugin handler.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct TapirError {
  pub kind: ErrorKind,
  pub message: String,
  /// Plugin-specific details, e.g. `property`, `schema`, `actual`.
  #[serde(flatten)]
  pub properties: Map<String, Value>,
  /// Plugin whose handler raised the error.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub plugin: Option<String>,
  /// Key of the task being processed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub task: Option<String>,
  /// Sub-task whose failure caused this one. Forms a chain, never a cycle.
  #[serde(skip)]
  pub nested: Option<Box<Task>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stack: Option<String>,
}

impl TapirError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    let stack = match kind {
      ErrorKind::Bug => captured_stack(),
      _ => None,
    };
    Self {
      kind,
      message: message.into(),
      properties: Map::new(),
      plugin: None,
      task: None,
      nested: None,
      stack,
    }
  }

  pub fn bug(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Bug, message)
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Config, message)
  }

  pub fn specification(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Specification, message)
  }

  pub fn test(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Test, message)
  }

  pub fn connect(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Connect, message)
  }

  pub fn response(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Response, message)
  }

  pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.properties.insert(name.into(), value.into());
    self
  }

  /// Sets the plugin name unless an inner layer already did.
  pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
    if self.plugin.is_none() {
      self.plugin = Some(plugin.into());
    }
    self
  }

  /// Sets the task key unless an inner layer already did.
  pub fn with_task(mut self, key: impl Into<String>) -> Self {
    if self.task.is_none() {
      self.task = Some(key.into());
    }
    self
  }

  pub fn with_nested(mut self, task: Task) -> Self {
    self.nested = Some(Box::new(task));
    self
  }

  /// Plain, serializable projection. The nested task is dropped (aggregation walks
  /// it separately) and the stack is kept only for bugs.
  pub fn to_record(&self) -> ErrorRecord {
    ErrorRecord {
      kind: self.kind,
      message: self.message.clone(),
      plugin: self.plugin.clone(),
      task: self.task.clone(),
      properties: self.properties.clone(),
      nested: false,
      stack: match self.kind {
        ErrorKind::Bug => self.stack.clone(),
        _ => None,
      },
    }
  }
}

/// The current stack when backtraces are enabled (`RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`).
fn captured_stack() -> Option<String> {
  let backtrace = Backtrace::capture();
  match backtrace.status() {
    BacktraceStatus::Captured => Some(backtrace.to_string()),
    _ => None,
  }
}

// Plugins may return any `anyhow::Error`. One that already wraps a `TapirError`
// keeps its classification, anything else is a bug.
impl From<AnyhowError> for TapirError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<TapirError>() {
      Ok(tapir_err) => tapir_err,
      Err(other) => TapirError::bug(format!("{:#}", other)),
    }
  }
}

pub type TapirResult<T, E = TapirError> = std::result::Result<T, E>;

/// Normalized, serializable form of one failure inside a [`RunError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
  pub kind: ErrorKind,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub plugin: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub task: Option<String>,
  #[serde(flatten)]
  pub properties: Map<String, Value>,
  /// Set when the failure belongs to a sub-task reached through `error.nested`.
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub nested: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stack: Option<String>,
}

/// The single error a failed run returns.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct RunError {
  pub kind: ErrorKind,
  pub message: String,
  /// Every individual failure, in task declaration order.
  pub errors: Vec<ErrorRecord>,
  /// Names of the plugins active during the run.
  pub plugins: Vec<String>,
}

impl RunError {
  /// Wraps an error raised by a fatal phase (`load`, `start`, `end`) or by plugin
  /// loading. Its `errors` holds exactly that failure.
  pub fn fatal(err: TapirError, plugins: &[String]) -> Self {
    Self {
      kind: err.kind,
      message: err.message.clone(),
      errors: vec![err.to_record()],
      plugins: plugins.to_vec(),
    }
  }
}
