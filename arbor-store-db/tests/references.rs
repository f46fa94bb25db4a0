// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Reference integrity across inserts, deletes and save batches.

use arbor_store_core::{Property, Value};
use arbor_store_db::{ContentStore, Error, NewNode};
use rstest::{fixture, rstest};

const UNSTRUCTURED: &str = "nt:unstructured";
const MISSING: &str = "00000000-0000-4000-8000-000000000000";

#[fixture]
fn store() -> ContentStore {
    ContentStore::open_memory().unwrap()
}

fn add(store: &mut ContentStore, node_path: &str) -> String {
    store.insert_node(NewNode::new(node_path, UNSTRUCTURED)).unwrap()
}

fn link(store: &mut ContentStore, node_path: &str, value: Value) {
    store
        .insert_node(NewNode::new(node_path, UNSTRUCTURED).property(Property::single("link", value)))
        .unwrap();
}

/// A strong reference to a missing node is refused and nothing is written.
#[rstest]
fn test_dangling_strong_reference(mut store: ContentStore) {
    let result = store.insert_node(
        NewNode::new("/src", UNSTRUCTURED)
            .property(Property::single("link", Value::Reference(MISSING.into()))),
    );
    match result {
        Err(Error::ReferentialIntegrity { paths, .. }) => assert_eq!(paths, ["/src/link"]),
        other => panic!("expected a referential integrity error, got {other:?}"),
    }
    assert!(!store.node_exists("/src").unwrap());
}

#[rstest]
fn test_weak_reference_may_dangle(mut store: ContentStore) {
    link(&mut store, "/src", Value::WeakReference(MISSING.into()));
    assert!(store.node_exists("/src").unwrap());

    let target = add(&mut store, "/target");
    link(&mut store, "/weak", Value::WeakReference(target));
    assert_eq!(store.get_weak_references("/target", None).unwrap(), ["/weak/link"]);
    assert!(store.get_references("/target", None).unwrap().is_empty());
}

/// Deleting a referenced node fails and leaves the whole subtree in place.
#[test_log::test]
fn test_delete_blocked_by_referrer() {
    let mut store = ContentStore::open_memory().unwrap();
    let target = add(&mut store, "/target");
    add(&mut store, "/target/child");
    link(&mut store, "/src", Value::Reference(target));

    match store.delete_node("/target") {
        Err(Error::ReferentialIntegrity { paths, message }) => {
            assert_eq!(paths, ["/src/link"]);
            assert!(message.contains("/target"), "{message}");
        }
        other => panic!("expected a referential integrity error, got {other:?}"),
    }
    assert!(store.node_exists("/target").unwrap());
    assert!(store.node_exists("/target/child").unwrap());
    assert_eq!(store.get_references("/target", None).unwrap(), ["/src/link"]);
}

#[rstest]
fn test_references_within_deleted_subtree(mut store: ContentStore) {
    let target = add(&mut store, "/t");
    link(&mut store, "/t/child", Value::Reference(target));
    store.delete_node("/t").unwrap();
    assert!(!store.node_exists("/t").unwrap());
}

#[rstest]
fn test_path_valued_reference(mut store: ContentStore) {
    add(&mut store, "/target");
    link(&mut store, "/src", Value::Reference("/target".into()));
    assert_eq!(store.get_references("/target", Some("link")).unwrap(), ["/src/link"]);
    assert!(store.get_references("/target", Some("other")).unwrap().is_empty());
}

#[rstest]
fn test_dropping_the_property_releases_the_target(mut store: ContentStore) {
    let target = add(&mut store, "/target");
    link(&mut store, "/src", Value::Reference(target));
    store.delete_property("/src/link").unwrap();
    store.delete_node("/target").unwrap();
}

#[rstest]
fn test_update_rederives_edges(mut store: ContentStore) {
    let first = add(&mut store, "/first");
    let second = add(&mut store, "/second");
    link(&mut store, "/src", Value::Reference(first));

    let mut node = store.get_node("/src", 0).unwrap();
    node.properties
        .insert(Property::single("link", Value::Reference(second)));
    store.update_node("/src", &node.properties).unwrap();

    assert!(store.get_references("/first", None).unwrap().is_empty());
    assert_eq!(store.get_references("/second", None).unwrap(), ["/src/link"]);
    store.delete_node("/first").unwrap();
}

#[rstest]
fn test_deleting_weak_target_purges_edges(mut store: ContentStore) {
    let target = add(&mut store, "/target");
    link(&mut store, "/src", Value::WeakReference(target));
    store.delete_node("/target").unwrap();

    let edges: i64 = store
        .connection()
        .query_row("SELECT count(*) FROM weak_references", [], |r| r.get(0))
        .unwrap();
    assert_eq!(edges, 0);
}

/// A batch may delete a target together with everything referencing it.
#[rstest]
fn test_batch_deletes_referrer_and_target(mut store: ContentStore) {
    let target = add(&mut store, "/target");
    link(&mut store, "/src", Value::Reference(target));

    store.prepare_save().unwrap();
    store.delete_node("/target").unwrap();
    store.delete_node("/src").unwrap();
    store.finish_save().unwrap();

    assert!(!store.node_exists("/target").unwrap());
    assert!(!store.node_exists("/src").unwrap());
}

/// A failing flush keeps the batch open so it can still be rolled back.
#[test_log::test]
fn test_failed_finish_keeps_batch() {
    let mut store = ContentStore::open_memory().unwrap();
    let target = add(&mut store, "/target");
    link(&mut store, "/src", Value::Reference(target));

    store.prepare_save().unwrap();
    store.delete_node("/target").unwrap();
    assert!(matches!(
        store.finish_save(),
        Err(Error::ReferentialIntegrity { .. })
    ));
    // Still in the batch: finishing again fails the same way.
    assert!(matches!(
        store.finish_save(),
        Err(Error::ReferentialIntegrity { .. })
    ));

    store.rollback_save().unwrap();
    assert!(store.node_exists("/target").unwrap());
    assert_eq!(store.get_references("/target", None).unwrap(), ["/src/link"]);
}

/// References inside a batch are checked when the batch finishes.
#[rstest]
fn test_batch_defers_reference_checks(mut store: ContentStore) {
    let id = "6f1d2c3b-4a59-4e8d-9c7b-5a4f3e2d1c0b";
    store.prepare_save().unwrap();
    link(&mut store, "/src", Value::Reference(id.into()));
    store
        .insert_node(NewNode::new("/target", UNSTRUCTURED).with_identifier(id))
        .unwrap();
    store.finish_save().unwrap();

    assert_eq!(store.get_references("/target", None).unwrap(), ["/src/link"]);
}
