// tapir/src/report/buffer.rs

//! Bounded buffer releasing items in a fixed key order.

use crate::error::{TapirError, TapirResult};
use std::collections::HashMap;

/// Holds items recorded in any order and releases them in the order of `keys`.
///
/// `index` is the position of the next key to release. It only moves forward and
/// never exceeds the number of keys. Each key is recorded at most once.
#[derive(Debug)]
pub struct OrderedBuffer<T> {
  keys: Vec<String>,
  positions: HashMap<String, usize>,
  slots: Vec<Option<T>>,
  index: usize,
}

impl<T> OrderedBuffer<T> {
  pub fn new(keys: Vec<String>) -> Self {
    let positions = keys
      .iter()
      .enumerate()
      .map(|(position, key)| (key.clone(), position))
      .collect();
    let slots = keys.iter().map(|_| None).collect();
    Self {
      keys,
      positions,
      slots,
      index: 0,
    }
  }

  /// Records the item of `key` and returns every item now releasable, in key order.
  pub fn record(&mut self, key: &str, item: T) -> TapirResult<Vec<T>> {
    let position = *self
      .positions
      .get(key)
      .ok_or_else(|| TapirError::bug(format!("Task '{}' is not part of the report", key)))?;
    if position < self.index || self.slots[position].is_some() {
      return Err(TapirError::bug(format!("Task '{}' was reported twice", key)));
    }
    self.slots[position] = Some(item);

    let mut ready = Vec::new();
    while let Some(item) = self.slots.get_mut(self.index).and_then(Option::take) {
      ready.push(item);
      self.index += 1;
    }
    Ok(ready)
  }

  /// Releases every recorded item left, in key order, skipping keys never recorded.
  pub fn drain(&mut self) -> Vec<T> {
    let remaining = self.slots[self.index..].iter_mut().filter_map(Option::take).collect();
    self.index = self.keys.len();
    remaining
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn keys(&self) -> &[String] {
    &self.keys
  }

  /// Number of items recorded but not released yet.
  pub fn pending(&self) -> usize {
    self.slots[self.index..].iter().filter(|slot| slot.is_some()).count()
  }

  pub fn is_done(&self) -> bool {
    self.index == self.keys.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn buffer(keys: &[&str]) -> OrderedBuffer<&'static str> {
    OrderedBuffer::new(keys.iter().map(|key| key.to_string()).collect())
  }

  #[test]
  fn releases_in_key_order() {
    let mut buffer = buffer(&["a", "b", "c"]);
    assert!(buffer.record("c", "C").unwrap().is_empty());
    assert!(buffer.record("b", "B").unwrap().is_empty());
    assert_eq!(buffer.pending(), 2);
    assert_eq!(buffer.record("a", "A").unwrap(), vec!["A", "B", "C"]);
    assert!(buffer.is_done());
  }

  #[test]
  fn recording_twice_or_unknown_is_a_bug() {
    let mut buffer = buffer(&["a", "b"]);
    buffer.record("a", "A").unwrap();
    assert!(buffer.record("a", "A").is_err());
    assert!(buffer.record("z", "Z").is_err());
    buffer.record("b", "B").unwrap();
    assert!(buffer.record("b", "B").is_err());
  }

  #[test]
  fn drain_skips_missing_keys() {
    let mut buffer = buffer(&["a", "b", "c"]);
    buffer.record("c", "C").unwrap();
    assert_eq!(buffer.drain(), vec!["C"]);
    assert_eq!(buffer.index(), 3);
  }
}
