//! Property-based tests for the store's core guarantees.
//!
//! - Path writes read back what was written
//! - Appending the same value twice does not grow a sequence
//! - Writing null changes nothing
//! - Index and link insertion are idempotent and mirrored
//! - Save followed by init reconstructs items, index and links
//! - Rebuilding the link index from annotations loses no link

use ocean_core::{models, IdGenerator, Item, MemoryContentStore, Store, StoreOptions};
use proptest::prelude::*;
use serde_json::{Map, Value};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

/// Non-numeric keys, so no segment is read as a sequence position
fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z_]{0,6}").unwrap()
}

fn dotted_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(key_strategy(), 1..5).prop_map(|keys| keys.join("."))
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,20}")
            .unwrap()
            .prop_map(Value::from),
    ]
}

/// Optional link annotation value; null stands for no value
fn link_value_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        2 => Just(None),
        1 => Just(Some(Value::Null)),
        2 => scalar_strategy().prop_map(Some),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => scalar_strategy(),
        1 => prop::collection::vec(scalar_strategy(), 0..4).prop_map(Value::from),
        1 => (key_strategy(), scalar_strategy()).prop_map(|(k, v)| {
            let mut map = Map::new();
            map.insert(k, v);
            Value::Object(map)
        }),
    ]
}

/// An item with a handful of random properties
fn item_strategy(id: &'static str) -> impl Strategy<Value = Item> {
    prop::collection::vec((dotted_path_strategy(), value_strategy()), 0..6).prop_map(
        move |writes| {
            let mut item = Item::new(id, Some(models::ASSET));
            for (path, value) in writes {
                // Earlier scalar writes may block deeper paths
                let _ = item.set(path.as_str(), value);
            }
            item
        },
    )
}

// =============================================================================
// ITEM PROPERTIES
// =============================================================================

mod item_properties {
    use super::*;

    proptest! {
        /// Get(Set(item, path, v), path) == v
        #[test]
        fn set_then_get_returns_value(path in dotted_path_strategy(), value in value_strategy()) {
            let mut item = Item::new("A", None);
            item.set(path.as_str(), value.clone()).unwrap();
            prop_assert_eq!(item.get(path.as_str()).unwrap(), Some(&value));
        }

        /// Appending an equal value twice leaves one element
        #[test]
        fn append_deduplicates(prefix in dotted_path_strategy(), value in scalar_strategy()) {
            let mut item = Item::new("A", None);
            let path = format!("{}.*", prefix);

            let first = item.set(path.as_str(), value.clone()).unwrap();
            let second = item.set(path.as_str(), value.clone()).unwrap();

            prop_assert_eq!(first, Some(0));
            prop_assert_eq!(second, Some(0));
            let seq = item.get(prefix.as_str()).unwrap().and_then(Value::as_array).unwrap();
            prop_assert_eq!(seq.len(), 1);
        }

        /// Set(item, path, null) leaves the item deep-equal
        #[test]
        fn set_null_is_noop(item in item_strategy("A"), path in dotted_path_strategy()) {
            let mut changed = item.clone();
            changed.set(path.as_str(), Value::Null).unwrap();
            prop_assert_eq!(changed, item);
        }

        /// Set never touches the identity fields
        #[test]
        fn set_preserves_identity(path in dotted_path_strategy(), value in value_strategy()) {
            let mut item = Item::new("A", Some(models::IDENTITY));
            let _ = item.set(path.as_str(), value);
            prop_assert_eq!(item.id(), "A");
            prop_assert_eq!(item.model(), models::IDENTITY);
        }
    }
}

// =============================================================================
// INDEX AND LINK PROPERTIES
// =============================================================================

mod index_properties {
    use super::*;

    proptest! {
        /// Indexing the same id under a value any number of times stores it once
        #[test]
        fn index_is_idempotent(value in "[a-zA-Z:0-9]{1,12}", repeats in 1usize..5) {
            let mut store = Store::memory();
            let id = store.new_item(models::ASSET, None).unwrap();
            for _ in 0..repeats {
                store.index(&value, &id).unwrap();
            }

            let matches = store.from_index(&value, None, None).unwrap();
            prop_assert_eq!(matches.iter().filter(|m| **m == id).count(), 1);
        }

        /// AddLink(A, B) records B in A's outgoing and A in B's incoming
        #[test]
        fn add_link_is_mirrored(sub in prop::option::of(dotted_path_strategy()), repeats in 1usize..3) {
            let mut store = Store::memory();
            let a = store.new_item(models::GENERIC, Some("A")).unwrap();
            let b = store.new_item(models::GENERIC, Some("B")).unwrap();
            for _ in 0..repeats {
                store.add_link(&a, &b, None, sub.as_deref(), None).unwrap();
            }

            prop_assert_eq!(store.outgoing(&a), &[b.clone()]);
            prop_assert_eq!(store.incoming(&b), &[a.clone()]);
        }

        /// The link index rebuilt from annotations equals the incremental one
        #[test]
        fn rebuild_matches_incremental(
            edges in prop::collection::vec(
                (
                    0usize..4,
                    0usize..4,
                    prop::option::of(prop_oneof![Just("cites"), Just("likes")]),
                    prop::option::of(Just("since")),
                    link_value_strategy(),
                ),
                0..10,
            )
        ) {
            let mut store = Store::memory();
            let ids = ["A", "B", "C", "D"];
            for id in ids {
                store.new_item(models::GENERIC, Some(id)).unwrap();
            }
            for (source, target, name, path, value) in edges {
                // A scalar annotation blocks later named ones on the same target
                let _ = store.add_link(ids[source], ids[target], name, path, value);
            }

            let incremental = store.link_index().clone();
            store.rebuild_links();
            let rebuilt = store.link_index().clone();

            let mut expected: Vec<_> = incremental.pairs().collect();
            let mut actual: Vec<_> = rebuilt.pairs().collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(actual, expected);
        }
    }
}

// =============================================================================
// PERSISTENCE PROPERTIES
// =============================================================================

mod persistence_properties {
    use super::*;

    fn populated(options: StoreOptions, content: &MemoryContentStore, items: &[Item]) -> Store {
        let mut store = Store::init(options, Box::new(content.clone())).unwrap();
        for item in items {
            store.push(item.clone()).unwrap();
            store.index(models::ASSET, item.id()).unwrap();
        }
        if items.len() > 1 {
            store.add_link(items[0].id(), items[1].id(), None, None, None).unwrap();
            store
                .add_link(
                    items[1].id(),
                    items[0].id(),
                    Some("cites"),
                    Some("weight"),
                    Some(Value::from(0.1)),
                )
                .unwrap();
        }
        store
    }

    proptest! {
        /// Directory snapshots reload deep-equal
        #[test]
        fn directory_round_trip(a in item_strategy("A"), b in item_strategy("B")) {
            let content = MemoryContentStore::new();
            let options = StoreOptions::directory("ocean", "/data");
            let mut store = populated(options.clone(), &content, &[a, b]);
            store.save().unwrap();

            let reloaded = Store::init(options, Box::new(content)).unwrap();
            let before: Vec<&Item> = store.items().collect();
            let after: Vec<&Item> = reloaded.items().collect();
            prop_assert_eq!(after, before);
            prop_assert_eq!(reloaded.value_index(), store.value_index());
            prop_assert_eq!(reloaded.link_index(), store.link_index());

            let mut rebuilt = reloaded;
            rebuilt.rebuild_links();
            prop_assert_eq!(rebuilt.link_index(), store.link_index());
        }

        /// Single-file snapshots reload deep-equal, including the last update
        #[test]
        fn single_file_round_trip(a in item_strategy("A"), b in item_strategy("B")) {
            let content = MemoryContentStore::new();
            let options = StoreOptions::file("ocean.json", "/data");
            let mut store = populated(options.clone(), &content, &[a, b]);
            store.save().unwrap();

            let reloaded = Store::init(options, Box::new(content)).unwrap();
            let before: Vec<&Item> = store.items().collect();
            let after: Vec<&Item> = reloaded.items().collect();
            prop_assert_eq!(after, before);
            prop_assert_eq!(reloaded.value_index(), store.value_index());
            prop_assert_eq!(reloaded.link_index(), store.link_index());
            prop_assert_eq!(reloaded.last_update(), store.last_update());
        }
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

#[test]
fn test_timestamp_ids_are_distinct_and_ordered() {
    let ids: Vec<String> = (0..100).map(|_| IdGenerator::next()).collect();

    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
    }
}
