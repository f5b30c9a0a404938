// tapir/src/core/start_data.rs

//! Accumulator of the `start` phase.

use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type SharedValue = Arc<dyn Any + Send + Sync>;

/// Data produced by `start` handlers and handed to every later phase.
///
/// Holds plain values (e.g. the parsed API specification under `spec`) and typed
/// shared objects keyed by type (e.g. the reporter's buffering state). Both are
/// immutable once `start` completes; a shared object that needs to change later
/// carries its own lock.
#[derive(Clone, Default)]
pub struct StartData {
  values: Map<String, Value>,
  shared: HashMap<TypeId, SharedValue>,
}

impl StartData {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn values(&self) -> &Map<String, Value> {
    &self.values
  }

  /// Typed shared object registered by a `start` handler.
  pub fn shared<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self
      .shared
      .get(&TypeId::of::<T>())
      .cloned()
      .and_then(|value| value.downcast::<T>().ok())
  }

  /// Returns the accumulator with `patch` shallow-merged into it.
  pub(crate) fn merged(&self, patch: StartPatch) -> StartData {
    let mut next = self.clone();
    for (key, value) in patch.values {
      next.values.insert(key, value);
    }
    for (type_id, value) in patch.shared {
      next.shared.insert(type_id, value);
    }
    next
  }
}

impl fmt::Debug for StartData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StartData")
      .field("values", &self.values)
      .field("shared_count", &self.shared.len())
      .finish()
  }
}

/// What a `start` handler returns: a `StartData` patch and a config patch.
#[derive(Default)]
pub struct StartPatch {
  pub(crate) values: Map<String, Value>,
  pub(crate) shared: Vec<(TypeId, SharedValue)>,
  pub(crate) config: Map<String, Value>,
}

impl StartPatch {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn value(mut self, key: impl Into<String>, value: Value) -> Self {
    self.values.insert(key.into(), value);
    self
  }

  pub fn shared<T: Any + Send + Sync>(mut self, value: T) -> Self {
    self.shared.push((TypeId::of::<T>(), Arc::new(value)));
    self
  }

  /// Sets a top-level configuration key for every later phase.
  pub fn config(mut self, key: impl Into<String>, value: Value) -> Self {
    self.config.insert(key.into(), value);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty() && self.shared.is_empty() && self.config.is_empty()
  }
}

impl fmt::Debug for StartPatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StartPatch")
      .field("values", &self.values)
      .field("shared_count", &self.shared.len())
      .field("config", &self.config)
      .finish()
  }
}
