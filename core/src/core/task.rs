// tapir/src/core/task.rs

//! The unit of execution: one declared test case.

use crate::core::merge::shallow_merge;
use crate::error::{TapirError, TapirResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// One test case, identified by a unique `key`.
///
/// `data` holds the plugin-namespaced sections (`call`, `validate`, `alias`, ...).
/// A `Task` is treated as a value: handlers receive it by reference and describe
/// changes as a [`TaskPatch`], which the runner applies with [`Task::apply`].
#[derive(Debug, Clone, Serialize)]
pub struct Task {
  pub key: String,
  #[serde(flatten)]
  pub data: Map<String, Value>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub skip: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<TapirError>,
  /// Set when the task was executed through another task's `run_task`.
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub nested: bool,
}

impl Task {
  pub fn new(key: impl Into<String>, data: Map<String, Value>) -> Self {
    Self {
      key: key.into(),
      data,
      skip: false,
      error: None,
      nested: false,
    }
  }

  /// Builds a task from its declaration, which must be an object.
  pub fn from_value(key: impl Into<String>, value: Value) -> TapirResult<Self> {
    let key = key.into();
    match value {
      Value::Object(data) => Ok(Self::new(key, data)),
      Value::Null => Ok(Self::new(key, Map::new())),
      other => Err(
        TapirError::config(format!("Task '{}' must be an object, not {}", key, other))
          .with_property("property", format!("tasks.{}", key)),
      ),
    }
  }

  /// The section owned by `namespace`, usually a plugin name.
  pub fn get(&self, namespace: &str) -> Option<&Value> {
    self.data.get(namespace)
  }

  /// Returns the task with `patch` shallow-merged into it.
  pub fn apply(self, patch: TaskPatch) -> Task {
    let TaskPatch { data, skip } = patch;
    Task {
      data: if data.is_empty() { self.data } else { shallow_merge(&self.data, data) },
      skip: skip.unwrap_or(self.skip),
      ..self
    }
  }

  pub fn is_failed(&self) -> bool {
    self.error.is_some()
  }

  pub fn result_type(&self) -> ResultType {
    if self.error.is_some() {
      ResultType::Fail
    } else if self.skip {
      ResultType::Skip
    } else {
      ResultType::Pass
    }
  }
}

/// Changes a `run` handler wants applied to its task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
  pub data: Map<String, Value>,
  pub skip: Option<bool>,
}

impl TaskPatch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replaces the whole `namespace` section.
  pub fn set(mut self, namespace: impl Into<String>, value: Value) -> Self {
    self.data.insert(namespace.into(), value);
    self
  }

  /// Marks the task skipped. No further `run` handler is fired for it.
  pub fn skipped() -> Self {
    Self {
      data: Map::new(),
      skip: Some(true),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty() && self.skip.is_none()
  }
}

impl From<Map<String, Value>> for TaskPatch {
  fn from(data: Map<String, Value>) -> Self {
    Self { data, skip: None }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
  Pass,
  Fail,
  Skip,
}

/// The externally visible result of one task: `{key, ...plugin fields}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReturn {
  pub key: String,
  #[serde(flatten)]
  pub data: Map<String, Value>,
}

impl TaskReturn {
  pub fn get(&self, namespace: &str) -> Option<&Value> {
    self.data.get(namespace)
  }
}
