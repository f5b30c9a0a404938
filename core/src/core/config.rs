// tapir/src/core/config.rs

//! The run-wide configuration value.
//!
//! `Config` is built once at the entry boundary and shared as `Arc<Config>` across
//! every phase. Plugins read it; only the scheduler produces new versions of it, by
//! merging the config patches returned from `start` handlers.

use crate::core::merge::shallow_merge;
use crate::core::task::Task;
use crate::error::{TapirError, TapirResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Top-level key holding the task declarations.
pub const TASKS_KEY: &str = "tasks";
/// Top-level key holding the requested plugin names.
pub const PLUGINS_KEY: &str = "plugins";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
  values: Map<String, Value>,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn builder() -> ConfigBuilder {
    ConfigBuilder::default()
  }

  /// Builds the configuration from a deserialized document, which must be an object.
  pub fn from_value(value: Value) -> TapirResult<Self> {
    match value {
      Value::Object(values) => Ok(Self { values }),
      other => Err(TapirError::config(format!(
        "Configuration must be an object, not {}",
        other
      ))),
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn values(&self) -> &Map<String, Value> {
    &self.values
  }

  /// Deserializes the section at `key`, e.g. a plugin's general configuration.
  pub fn section<T: DeserializeOwned>(&self, key: &str) -> TapirResult<Option<T>> {
    match self.values.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|err| {
        TapirError::config(format!("Configuration 'config.{}' is invalid: {}", key, err))
          .with_property("property", format!("config.{}", key))
      }),
    }
  }

  /// Requested plugin names, in declaration order.
  pub fn plugin_names(&self) -> TapirResult<Vec<String>> {
    Ok(self.section::<Vec<String>>(PLUGINS_KEY)?.unwrap_or_default())
  }

  /// Declared tasks, in declaration order.
  pub fn tasks(&self) -> TapirResult<Vec<Task>> {
    match self.values.get(TASKS_KEY) {
      None | Some(Value::Null) => Ok(Vec::new()),
      Some(Value::Object(tasks)) => tasks
        .iter()
        .map(|(key, value)| Task::from_value(key.clone(), value.clone()))
        .collect(),
      Some(other) => Err(
        TapirError::config(format!("'config.tasks' must be an object, not {}", other))
          .with_property("property", TASKS_KEY),
      ),
    }
  }

  /// Returns a new configuration with `patch` shallow-merged into it.
  pub fn merged(&self, patch: Map<String, Value>) -> Config {
    Config {
      values: shallow_merge(&self.values, patch),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
  values: Map<String, Value>,
  tasks: Map<String, Value>,
  plugins: Vec<String>,
}

impl ConfigBuilder {
  pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
    self.values.insert(key.into(), value);
    self
  }

  pub fn task(mut self, key: impl Into<String>, definition: Value) -> Self {
    self.tasks.insert(key.into(), definition);
    self
  }

  pub fn plugin(mut self, name: impl Into<String>) -> Self {
    self.plugins.push(name.into());
    self
  }

  pub fn build(self) -> Config {
    let mut values = self.values;
    if !self.tasks.is_empty() {
      values.insert(TASKS_KEY.to_string(), Value::Object(self.tasks));
    }
    if !self.plugins.is_empty() {
      let names = self.plugins.into_iter().map(Value::String).collect();
      values.insert(PLUGINS_KEY.to_string(), Value::Array(names));
    }
    Config { values }
  }
}
