// tests/buffer_proptest.rs
use proptest::prelude::*;
use tapir::report::OrderedBuffer;

fn keys(count: usize) -> Vec<String> {
  (0..count).map(|position| format!("task{}", position)).collect()
}

proptest! {
  #[test]
  fn any_completion_order_releases_in_key_order(order in (1usize..24).prop_flat_map(|count| Just((0..count).collect::<Vec<_>>()).prop_shuffle())) {
    let keys = keys(order.len());
    let mut buffer = OrderedBuffer::new(keys.clone());
    let mut released = Vec::new();

    for position in &order {
      let before = buffer.index();
      let ready = buffer.record(&keys[*position], *position).unwrap();
      prop_assert!(buffer.index() >= before);
      prop_assert!(buffer.index() <= keys.len());
      released.extend(ready);
    }

    prop_assert!(buffer.is_done());
    prop_assert_eq!(buffer.pending(), 0);
    prop_assert_eq!(released, (0..order.len()).collect::<Vec<_>>());
  }

  #[test]
  fn drain_keeps_relative_order(order in (2usize..16).prop_flat_map(|count| Just((0..count).collect::<Vec<_>>()).prop_shuffle()), missing in 0usize..16) {
    let keys = keys(order.len());
    let missing = missing % order.len();
    let mut buffer = OrderedBuffer::new(keys.clone());
    let mut released = Vec::new();

    for position in order.iter().filter(|position| **position != missing) {
      released.extend(buffer.record(&keys[*position], *position).unwrap());
    }
    prop_assert_eq!(buffer.index(), missing);
    released.extend(buffer.drain());

    let expected: Vec<usize> = (0..order.len()).filter(|position| *position != missing).collect();
    prop_assert_eq!(released, expected);
  }
}
