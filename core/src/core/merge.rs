// tapir/src/core/merge.rs

//! Pure merge functions applied by the scheduler to phase accumulators.

use serde_json::{Map, Value};

/// Key-by-key merge: every key of `patch` replaces the same key of `base`.
pub fn shallow_merge(base: &Map<String, Value>, patch: Map<String, Value>) -> Map<String, Value> {
  let mut merged = base.clone();
  for (key, value) in patch {
    merged.insert(key, value);
  }
  merged
}

/// Recursive merge of objects. Non-object values of `overlay` win, including arrays.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
  match (base, overlay) {
    (Value::Object(base_map), Value::Object(overlay_map)) => {
      let mut merged = base_map.clone();
      for (key, value) in overlay_map {
        let next = match merged.get(key) {
          Some(existing) => deep_merge(existing, value),
          None => value.clone(),
        };
        merged.insert(key.clone(), next);
      }
      Value::Object(merged)
    }
    (_, overlay) => overlay.clone(),
  }
}
