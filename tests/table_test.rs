use proptest::prelude::*;
use std::collections::HashMap;

use ferrox::string::{StringHeap, StringRef};
use ferrox::table::Table;

/// Interns `count` distinct keys to drive the table with.
fn make_keys(heap: &mut StringHeap, count: usize) -> Vec<StringRef> {
    (0..count)
        .map(|index| heap.intern(&format!("key{index}")))
        .collect()
}

#[test]
fn empty_table_lookups() {
    let mut heap = StringHeap::new();
    let key = heap.intern("missing");
    let mut table: Table<StringRef, f64> = Table::new();

    assert_eq!(table.get(&key), None);
    assert!(!table.set_existing(key, 1.0));
    assert!(!table.delete(&key));
    assert_eq!(table.len(), 0);
    assert_eq!(table.capacity(), 0);
}

#[test]
fn set_then_get_round_trip() {
    let mut heap = StringHeap::new();
    let keys = make_keys(&mut heap, 100);
    let mut table = Table::new();

    for (index, key) in keys.iter().enumerate() {
        assert!(table.set(*key, index as f64));
    }
    for (index, key) in keys.iter().enumerate() {
        assert_eq!(table.get(key), Some(&(index as f64)));
    }
    assert_eq!(table.len(), 100);
}

#[test]
fn set_overwrites_and_reports_new_keys() {
    let mut heap = StringHeap::new();
    let key = heap.intern("x");
    let mut table = Table::new();

    assert!(table.set(key, 1.0));
    assert!(!table.set(key, 2.0));
    assert_eq!(table.get(&key), Some(&2.0));
    assert_eq!(table.len(), 1);
}

#[test]
fn set_existing_requires_presence() {
    let mut heap = StringHeap::new();
    let present = heap.intern("present");
    let absent = heap.intern("absent");
    let mut table = Table::new();

    table.set(present, 1.0);
    assert!(table.set_existing(present, 2.0));
    assert_eq!(table.get(&present), Some(&2.0));

    assert!(!table.set_existing(absent, 3.0));
    assert_eq!(table.get(&absent), None);
    assert_eq!(table.len(), 1);
}

#[test]
fn delete_leaves_unrelated_keys_intact() {
    let mut heap = StringHeap::new();
    let keys = make_keys(&mut heap, 32);
    let mut table = Table::new();

    for (index, key) in keys.iter().enumerate() {
        table.set(*key, index as f64);
    }
    for key in keys.iter().step_by(2) {
        assert!(table.delete(key));
    }
    for (index, key) in keys.iter().enumerate() {
        let expected = if index % 2 == 0 {
            None
        } else {
            Some(index as f64)
        };
        assert_eq!(table.get(key).copied(), expected);
    }
    assert_eq!(table.len(), 16);

    // Deleting twice reports the key as gone.
    assert!(!table.delete(&keys[0]));
}

#[test]
fn growth_preserves_content() {
    let mut heap = StringHeap::new();
    // Far past several doublings of the minimum capacity of 8.
    let keys = make_keys(&mut heap, 200);
    let mut table = Table::new();

    for (index, key) in keys.iter().enumerate() {
        table.set(*key, index as f64);
    }

    assert!(table.capacity() >= 256);
    assert_eq!(table.len(), 200);
    for (index, key) in keys.iter().enumerate() {
        assert_eq!(table.get(key), Some(&(index as f64)));
    }
}

#[test]
fn growth_happens_at_three_quarters_load() {
    let mut heap = StringHeap::new();
    let keys = make_keys(&mut heap, 7);
    let mut table = Table::new();

    for key in keys.iter().take(6) {
        table.set(*key, 0.0);
    }
    assert_eq!(table.capacity(), 8);

    // The seventh insertion would pass 3/4 load and forces a doubling.
    table.set(keys[6], 0.0);
    assert_eq!(table.capacity(), 16);
}

#[test]
fn churn_does_not_lose_entries_across_growth_cycles() {
    let mut heap = StringHeap::new();
    let keys = make_keys(&mut heap, 512);
    let mut table = Table::new();

    // Alternate inserting a batch and deleting half of it, driving the
    // table through several growths while tombstones accumulate.
    let mut live = HashMap::new();
    for round in 0..8 {
        let batch = &keys[round * 64..(round + 1) * 64];
        for (index, key) in batch.iter().enumerate() {
            table.set(*key, index as f64);
            live.insert(*key, index as f64);
        }
        for key in batch.iter().step_by(2) {
            table.delete(key);
            live.remove(key);
        }
    }

    assert_eq!(table.len(), live.len());
    for key in keys.iter() {
        assert_eq!(table.get(key).copied(), live.get(key).copied());
    }
}

#[test]
fn deleted_slots_are_reusable() {
    let mut heap = StringHeap::new();
    let keys = make_keys(&mut heap, 6);
    let mut table = Table::new();

    // Insert/delete churn on a fixed key set must not trigger unbounded
    // growth: tombstones are reclaimed on the resize that drops them.
    for _ in 0..1000 {
        for (index, key) in keys.iter().enumerate() {
            table.set(*key, index as f64);
        }
        for key in keys.iter() {
            table.delete(key);
        }
    }
    assert!(table.capacity() <= 32);
    assert_eq!(table.len(), 0);
}

#[test]
fn add_all_unions_with_later_entries_winning() {
    let mut heap = StringHeap::new();
    let shared = heap.intern("shared");
    let left_only = heap.intern("left");
    let right_only = heap.intern("right");

    let mut left = Table::new();
    left.set(shared, 1.0);
    left.set(left_only, 2.0);

    let mut right = Table::new();
    right.set(shared, 10.0);
    right.set(right_only, 20.0);

    left.add_all(&right);

    assert_eq!(left.len(), 3);
    assert_eq!(left.get(&shared), Some(&10.0));
    assert_eq!(left.get(&left_only), Some(&2.0));
    assert_eq!(left.get(&right_only), Some(&20.0));
}

#[test]
fn interning_probes_by_content() {
    let mut heap = StringHeap::new();
    let first = heap.intern("hello");
    let second = heap.intern("hello");
    let other = heap.intern("world");

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(heap.len(), 2);
    assert_eq!(heap.get(first), "hello");
    assert_eq!(heap.get(other), "world");
}

#[test]
fn concatenation_reuses_interned_strings() {
    let mut heap = StringHeap::new();
    let foo = heap.intern("foo");
    let bar = heap.intern("bar");
    let foobar = heap.intern("foobar");

    let concatenated = heap.concatenate(foo, bar);
    assert_eq!(concatenated, foobar);
    assert_eq!(heap.len(), 3);
}

// Property-based tests: the table agrees with a std::collections model
// under arbitrary set/delete churn over a small key space.

#[derive(Debug, Clone)]
enum Operation {
    Set(usize, i64),
    SetExisting(usize, i64),
    Delete(usize),
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (0usize..16, any::<i64>()).prop_map(|(k, v)| Operation::Set(k, v)),
        (0usize..16, any::<i64>()).prop_map(|(k, v)| Operation::SetExisting(k, v)),
        (0usize..16).prop_map(Operation::Delete),
    ]
}

proptest! {
    #[test]
    fn table_matches_model(operations in prop::collection::vec(operation_strategy(), 0..400)) {
        let mut heap = StringHeap::new();
        let keys = make_keys(&mut heap, 16);
        let mut table = Table::new();
        let mut model: HashMap<usize, i64> = HashMap::new();

        for operation in operations {
            match operation {
                Operation::Set(k, v) => {
                    let newly_inserted = table.set(keys[k], v);
                    prop_assert_eq!(newly_inserted, model.insert(k, v).is_none());
                }
                Operation::SetExisting(k, v) => {
                    let present = table.set_existing(keys[k], v);
                    prop_assert_eq!(present, model.contains_key(&k));
                    if present {
                        model.insert(k, v);
                    }
                }
                Operation::Delete(k) => {
                    prop_assert_eq!(table.delete(&keys[k]), model.remove(&k).is_some());
                }
            }
        }

        prop_assert_eq!(table.len(), model.len());
        for (index, key) in keys.iter().enumerate() {
            prop_assert_eq!(table.get(key).copied(), model.get(&index).copied());
        }
    }
}
