// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Explicit transactions, save batches and the registries they cover.

use arbor_store_core::{NodeTypeDefinition, NodeTypeRegistry};
use arbor_store_db::{ContentStore, Error, NewNode};
use rstest::{fixture, rstest};

const UNSTRUCTURED: &str = "nt:unstructured";

#[fixture]
fn store() -> ContentStore {
    ContentStore::open_memory().unwrap()
}

/// Rolling back restores the exact namespace map seen at begin.
#[rstest]
fn test_namespace_rollback(mut store: ContentStore) {
    store.register_namespace("keep", "urn:keep").unwrap();
    store.register_namespace("gone", "urn:gone").unwrap();
    let before = store.namespaces().clone();

    store.begin_transaction().unwrap();
    store.register_namespace("fresh", "urn:fresh").unwrap();
    store.register_namespace("keep", "urn:changed").unwrap();
    store.unregister_namespace("gone").unwrap();
    assert_eq!(store.namespace_uri("keep"), Some("urn:changed"));
    store.rollback_transaction().unwrap();

    assert_eq!(store.namespaces(), &before);
    let persisted: i64 = store
        .connection()
        .query_row("SELECT count(*) FROM namespaces", [], |r| r.get(0))
        .unwrap();
    assert_eq!(persisted, 2);
}

#[rstest]
fn test_namespace_commit(mut store: ContentStore) {
    store.begin_transaction().unwrap();
    store.register_namespace("app", "urn:app").unwrap();
    store.commit_transaction().unwrap();
    assert_eq!(store.namespace_uri("app"), Some("urn:app"));
    assert!(!store.in_transaction());
}

#[rstest]
#[case("jcr", "urn:x")]
#[case("xmlfoo", "urn:x")]
#[case("app", "")]
#[case("a:b", "urn:x")]
fn test_namespace_rejections(mut store: ContentStore, #[case] prefix: &str, #[case] uri: &str) {
    assert!(matches!(
        store.register_namespace(prefix, uri),
        Err(Error::Namespace(_))
    ));
}

#[rstest]
fn test_namespace_removal(mut store: ContentStore) {
    assert!(matches!(store.unregister_namespace("nt"), Err(Error::Namespace(_))));
    assert!(matches!(store.unregister_namespace("app"), Err(Error::NotFound(_))));

    store.register_namespace("app", "urn:app").unwrap();
    store.register_namespace("other", "urn:app").unwrap();
    // Rebinding the URI drops the old prefix.
    assert_eq!(store.namespace_uri("app"), None);
    assert_eq!(store.namespace_uri("other"), Some("urn:app"));
}

#[rstest]
fn test_rollback_discards_nodes(mut store: ContentStore) {
    store.begin_transaction().unwrap();
    store.insert_node(NewNode::new("/temp", UNSTRUCTURED)).unwrap();
    assert!(store.node_exists("/temp").unwrap());
    store.rollback_transaction().unwrap();
    assert!(!store.node_exists("/temp").unwrap());
}

#[rstest]
fn test_rollback_discards_node_types(mut store: ContentStore) {
    store.register_namespace("app", "urn:app").unwrap();
    store.begin_transaction().unwrap();
    store
        .register_node_types(&[NodeTypeDefinition::new("app:page")], false)
        .unwrap();
    store.rollback_transaction().unwrap();

    assert!(!store.type_registry().has_type("app:page"));
    assert!(matches!(
        store.insert_node(NewNode::new("/p", "app:page")),
        Err(Error::ConstraintViolation(_))
    ));
}

#[rstest]
fn test_batch_inside_transaction(mut store: ContentStore) {
    store.begin_transaction().unwrap();
    store.prepare_save().unwrap();
    store.insert_node(NewNode::new("/a", UNSTRUCTURED)).unwrap();
    assert!(matches!(store.commit_transaction(), Err(Error::Usage(_))));
    store.finish_save().unwrap();
    store.commit_transaction().unwrap();
    assert!(store.node_exists("/a").unwrap());
}

#[rstest]
fn test_rollback_save_discards_batch(mut store: ContentStore) {
    store.insert_node(NewNode::new("/kept", UNSTRUCTURED)).unwrap();
    store.prepare_save().unwrap();
    store.insert_node(NewNode::new("/dropped", UNSTRUCTURED)).unwrap();
    store.delete_node("/kept").unwrap();
    store.rollback_save().unwrap();

    assert!(store.node_exists("/kept").unwrap());
    assert!(!store.node_exists("/dropped").unwrap());
}

/// A failed write inside a batch leaves the earlier writes of the batch.
#[rstest]
fn test_failed_write_inside_batch(mut store: ContentStore) {
    store.prepare_save().unwrap();
    store.insert_node(NewNode::new("/a", UNSTRUCTURED)).unwrap();
    assert!(store.insert_node(NewNode::new("/a", UNSTRUCTURED)).is_err());
    store.finish_save().unwrap();
    assert!(store.node_exists("/a").unwrap());
}

#[rstest]
fn test_misuse_is_reported(mut store: ContentStore) {
    assert!(matches!(store.commit_transaction(), Err(Error::Usage(_))));
    assert!(matches!(store.rollback_transaction(), Err(Error::Usage(_))));
    assert!(matches!(store.finish_save(), Err(Error::Usage(_))));
    assert!(matches!(store.rollback_save(), Err(Error::Usage(_))));

    store.begin_transaction().unwrap();
    assert!(matches!(store.begin_transaction(), Err(Error::Usage(_))));
    store.rollback_transaction().unwrap();

    store.prepare_save().unwrap();
    assert!(matches!(store.prepare_save(), Err(Error::Usage(_))));
    assert!(matches!(store.begin_transaction(), Err(Error::Usage(_))));
    assert!(matches!(store.login("default"), Err(Error::Usage(_))));
    store.finish_save().unwrap();

    assert!(matches!(
        store.set_transaction_timeout(30),
        Err(Error::NotImplemented(_))
    ));
}

#[rstest]
fn test_logged_out_session(mut store: ContentStore) {
    store.logout();
    assert!(matches!(store.current_workspace(), Err(Error::Usage(_))));
    assert!(matches!(store.get_node("/", 0), Err(Error::Usage(_))));

    assert!(matches!(store.login("nowhere"), Ok(())));
    assert!(matches!(store.get_node("/", 0), Err(Error::NotFound(_))));
}
