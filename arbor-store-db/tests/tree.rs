// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Node reads and structural writes against an in-memory store.

use arbor_store_core::{Property, PropertySet, PropertyType, Value, path};
use arbor_store_db::{ContentStore, Error, NewNode, OpenMode, ROOT_TYPE};
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

const UNSTRUCTURED: &str = "nt:unstructured";

#[fixture]
fn store() -> ContentStore {
    ContentStore::open_memory().unwrap()
}

fn add(store: &mut ContentStore, node_path: &str) -> String {
    store.insert_node(NewNode::new(node_path, UNSTRUCTURED)).unwrap()
}

fn child_names(store: &ContentStore, parent: &str) -> Vec<String> {
    store
        .get_node(parent, 1)
        .unwrap()
        .children
        .iter()
        .map(|c| c.name().to_owned())
        .collect()
}

/// Every stored row keeps parent and depth derived from its path.
fn assert_rows_consistent(store: &ContentStore) {
    let mut stmt = store
        .connection()
        .prepare("SELECT path, parent, depth FROM nodes")
        .unwrap();
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .unwrap();
    for row in rows {
        let (node_path, parent, depth) = row.unwrap();
        assert_eq!(parent.as_deref(), path::parent(&node_path), "parent of {node_path}");
        assert_eq!(depth as usize, path::depth(&node_path), "depth of {node_path}");
    }
}

/// A fresh store has a root node in the default workspace.
#[rstest]
fn test_root_exists(store: ContentStore) {
    let root = store.get_node("/", 0).unwrap();
    assert_eq!(root.primary_type, ROOT_TYPE);
    assert!(root.children.is_empty());
    assert_eq!(store.current_workspace().unwrap(), "default");
}

/// Reads stop at the requested depth below the fetched node.
#[rstest]
fn test_depth_limited_fetch(mut store: ContentStore) {
    add(&mut store, "/a");
    add(&mut store, "/a/b");
    add(&mut store, "/a/b/c");

    let a = store.get_node("/a", 1).unwrap();
    assert_eq!(a.children.len(), 1);
    assert_eq!(a.children[0].path, "/a/b");
    assert!(a.children[0].children.is_empty());

    let deep = store.get_node("/a", 5).unwrap();
    assert_eq!(deep.find("b/c").map(|n| n.path.as_str()), Some("/a/b/c"));

    let flat = store.get_node("/a", 0).unwrap();
    assert!(flat.children.is_empty());
}

#[rstest]
fn test_missing_parent_and_duplicates(mut store: ContentStore) {
    assert!(matches!(
        store.insert_node(NewNode::new("/x/y", UNSTRUCTURED)),
        Err(Error::NotFound(p)) if p == "/x"
    ));
    add(&mut store, "/x");
    assert!(matches!(
        store.insert_node(NewNode::new("/x", UNSTRUCTURED)),
        Err(Error::ItemExists(_))
    ));
    assert!(matches!(
        store.insert_node(NewNode::new("/z", "app:missing")),
        Err(Error::Namespace(_)) | Err(Error::ConstraintViolation(_))
    ));
    assert!(matches!(
        store.insert_node(NewNode::new("/z", UNSTRUCTURED).with_identifier("not-a-uuid")),
        Err(Error::ConstraintViolation(_))
    ));
    assert!(!store.node_exists("/z").unwrap());
}

/// Properties of every type survive a write and read cycle.
#[rstest]
fn test_properties_round_trip(mut store: ContentStore) {
    let created = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
    let node = NewNode::new("/doc", UNSTRUCTURED)
        .property(Property::single("title", Value::String("Hello".into())))
        .property(Property::single("count", Value::Long(42)))
        .property(Property::single("ratio", Value::Double(0.25)))
        .property(Property::single("published", Value::Boolean(true)))
        .property(Property::single("created", Value::date(created)))
        .property(Property::multiple(
            "tags",
            PropertyType::String,
            vec![Value::String("a".into()), Value::String("b".into())],
        ));
    store.insert_node(node).unwrap();

    let read = store.get_node("/doc", 0).unwrap();
    let properties = &read.properties;
    assert_eq!(
        properties.get("title").and_then(Property::value),
        Some(&Value::String("Hello".into()))
    );
    assert_eq!(properties.get("count").and_then(Property::value), Some(&Value::Long(42)));
    assert_eq!(
        properties.get("created").and_then(Property::value),
        Some(&Value::date(created))
    );
    assert_eq!(properties.get("tags").map(|p| p.values.len()), Some(2));
    assert_eq!(read.primary_type, UNSTRUCTURED);
}

#[rstest]
fn test_identifier_lookups(mut store: ContentStore) {
    let a = add(&mut store, "/a");
    let b = add(&mut store, "/b");

    assert_eq!(store.get_node_by_identifier(&a).unwrap().path, "/a");
    assert_eq!(store.get_node_path_for_identifier(&b).unwrap(), "/b");
    // Anything that is not a UUID is looked up as a path.
    assert_eq!(store.get_node_by_identifier("/b").unwrap().identifier, b);

    let missing = "00000000-0000-4000-8000-000000000000";
    let nodes = store.get_nodes_by_identifier(&[&b, missing, &a]).unwrap();
    let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, ["/b", "/a"]);
    assert!(matches!(
        store.get_node_by_identifier(missing),
        Err(Error::NotFound(_))
    ));
}

#[rstest]
fn test_explicit_identifier_is_kept(mut store: ContentStore) {
    let id = "4b2c1f7e-1a2b-4c3d-8e9f-0a1b2c3d4e5f";
    let stored = store
        .insert_node(NewNode::new("/fixed", UNSTRUCTURED).with_identifier(id))
        .unwrap();
    assert_eq!(stored, id);
    assert!(matches!(
        store.insert_node(NewNode::new("/other", UNSTRUCTURED).with_identifier(id)),
        Err(Error::ItemExists(_))
    ));
}

/// Batched reads answer in request order and skip what is missing.
#[rstest]
#[case(0)]
#[case(2)]
fn test_get_nodes_order(mut store: ContentStore, #[case] depth: u32) {
    add(&mut store, "/a");
    add(&mut store, "/a/child");
    add(&mut store, "/b");
    add(&mut store, "/c");

    let nodes = store.get_nodes(&["/c", "/missing", "/a", "/b"], depth).unwrap();
    let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, ["/c", "/a", "/b"]);
    assert_eq!(nodes[1].children.len(), if depth == 0 { 0 } else { 1 });
}

#[rstest]
fn test_get_nodes_many_paths(mut store: ContentStore) {
    let mut paths = Vec::new();
    for i in 0..1200 {
        let p = format!("/n{i}");
        add(&mut store, &p);
        paths.push(p);
    }
    let requested: Vec<&str> = paths.iter().rev().map(String::as_str).collect();
    let nodes = store.get_nodes(&requested, 0).unwrap();
    assert_eq!(nodes.len(), 1200);
    assert_eq!(nodes[0].path, "/n1199");
    assert_eq!(nodes[1199].path, "/n0");
}

#[rstest]
fn test_update_replaces_properties(mut store: ContentStore) {
    store
        .insert_node(
            NewNode::new("/a", UNSTRUCTURED)
                .property(Property::single("old", Value::Long(1))),
        )
        .unwrap();

    let mut properties = PropertySet::new();
    properties.insert(Property::single("new", Value::String("v".into())));
    store.update_node("/a", &properties).unwrap();

    let node = store.get_node("/a", 0).unwrap();
    assert!(node.properties.get("old").is_none());
    assert!(node.properties.contains("new"));

    store.delete_property("/a/new").unwrap();
    assert!(store.get_node("/a", 0).unwrap().properties.is_empty());
    assert!(matches!(store.delete_property("/a/new"), Err(Error::NotFound(_))));
    assert!(matches!(
        store.update_node("/missing", &properties),
        Err(Error::NotFound(_))
    ));
}

#[rstest]
fn test_binary_payloads(mut store: ContentStore) {
    store
        .insert_node(
            NewNode::new("/file", UNSTRUCTURED)
                .property(Property::single("data", Value::binary(b"hello".to_vec())))
                .property(Property::single("name", Value::String("f".into()))),
        )
        .unwrap();
    assert_eq!(store.get_binary_stream("/file/data").unwrap(), vec![b"hello".to_vec()]);
    assert!(matches!(
        store.get_binary_stream("/file/name"),
        Err(Error::ConstraintViolation(_))
    ));
    assert!(matches!(store.get_binary_stream("/file/nope"), Err(Error::NotFound(_))));

    // Writing back the read value keeps the stored bytes.
    let read = store.get_node("/file", 0).unwrap();
    store.update_node("/file", &read.properties).unwrap();
    assert_eq!(store.get_binary_stream("/file/data").unwrap(), vec![b"hello".to_vec()]);

    let mut without = read.properties.clone();
    without.remove("data");
    store.update_node("/file", &without).unwrap();
    let count: i64 = store
        .connection()
        .query_row("SELECT count(*) FROM binary_data", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[rstest]
fn test_delete_subtree(mut store: ContentStore) {
    add(&mut store, "/a");
    add(&mut store, "/a/b");
    add(&mut store, "/ab");
    store.delete_node("/a").unwrap();

    assert!(!store.node_exists("/a").unwrap());
    assert!(!store.node_exists("/a/b").unwrap());
    assert!(store.node_exists("/ab").unwrap());
    assert!(matches!(store.delete_node("/a"), Err(Error::NotFound(_))));
    assert!(matches!(store.delete_node("/"), Err(Error::ConstraintViolation(_))));
}

/// A moved subtree is reachable only at its new location.
#[rstest]
fn test_move_then_lookup(mut store: ContentStore) {
    let a = add(&mut store, "/a");
    let b = add(&mut store, "/a/b");
    add(&mut store, "/a/b/c");
    add(&mut store, "/other");

    store.move_node("/a", "/other/c").unwrap();

    assert!(matches!(store.get_node("/a", 0), Err(Error::NotFound(_))));
    let moved = store.get_node("/other/c", 2).unwrap();
    assert_eq!(moved.identifier, a);
    assert_eq!(moved.child("b").map(|n| n.identifier.as_str()), Some(b.as_str()));
    assert!(store.node_exists("/other/c/b/c").unwrap());
    assert_eq!(store.get_node_path_for_identifier(&b).unwrap(), "/other/c/b");
    assert_rows_consistent(&store);
}

#[rstest]
fn test_move_appends_after_siblings(mut store: ContentStore) {
    add(&mut store, "/p");
    add(&mut store, "/p/x");
    add(&mut store, "/p/y");
    add(&mut store, "/q");
    store.move_node("/q", "/p/q").unwrap();
    assert_eq!(child_names(&store, "/p"), ["x", "y", "q"]);
}

#[rstest]
fn test_move_rejections(mut store: ContentStore) {
    add(&mut store, "/a");
    add(&mut store, "/a/b");
    add(&mut store, "/c");

    assert!(matches!(store.move_node("/", "/z"), Err(Error::ConstraintViolation(_))));
    assert!(matches!(store.move_node("/a", "/a/b/z"), Err(Error::ConstraintViolation(_))));
    assert!(matches!(store.move_node("/a", "/c"), Err(Error::ItemExists(_))));
    assert!(matches!(store.move_node("/a", "/nope/a"), Err(Error::NotFound(_))));
    assert!(matches!(store.move_node("/missing", "/z"), Err(Error::NotFound(_))));
    assert!(store.node_exists("/a/b").unwrap());
}

/// Copies get new identifiers and internal references follow the copy.
#[rstest]
fn test_copy_isolation(mut store: ContentStore) {
    let outside = add(&mut store, "/outside");
    let a = add(&mut store, "/a");
    store
        .insert_node(
            NewNode::new("/a/b", UNSTRUCTURED)
                .property(Property::single("up", Value::Reference(a.clone())))
                .property(Property::single("out", Value::Reference(outside.clone())))
                .property(Property::single("data", Value::binary(vec![1, 2, 3]))),
        )
        .unwrap();

    let copy = store.copy_node("/a", "/d", None).unwrap();
    assert_ne!(copy, a);

    let d = store.get_node("/d", 1).unwrap();
    assert_eq!(d.identifier, copy);
    let b = d.child("b").unwrap();
    assert_eq!(b.properties.get("up").and_then(Property::value), Some(&Value::Reference(copy.clone())));
    assert_eq!(b.properties.get("out").and_then(Property::value), Some(&Value::Reference(outside)));
    assert_eq!(store.get_binary_stream("/d/b/data").unwrap(), vec![vec![1, 2, 3]]);

    // The original is untouched.
    let original = store.get_node("/a/b", 0).unwrap();
    assert_ne!(original.identifier, b.identifier);
    assert_eq!(original.properties.get("up").and_then(Property::value), Some(&Value::Reference(a)));

    assert_eq!(store.get_references("/d", None).unwrap(), ["/d/b/up"]);
    assert_eq!(store.get_references("/outside", None).unwrap(), ["/a/b/out", "/d/b/out"]);
    assert_rows_consistent(&store);
}

#[rstest]
fn test_copy_rewrites_uuid_property(mut store: ContentStore) {
    let id = "0b6f7a1c-2d3e-4f50-8a9b-1c2d3e4f5a6b";
    store
        .insert_node(
            NewNode::new("/ref", UNSTRUCTURED)
                .property(Property::single("jcr:uuid", Value::String(id.into()))),
        )
        .unwrap();

    let copy = store.copy_node("/ref", "/ref2", None).unwrap();
    let node = store.get_node("/ref2", 0).unwrap();
    assert_eq!(
        node.properties.get("jcr:uuid").and_then(Property::value),
        Some(&Value::String(copy))
    );
    assert!(matches!(store.copy_node("/ref", "/ref/inner", None), Err(Error::ConstraintViolation(_))));
}

#[rstest]
fn test_copy_across_workspaces(mut store: ContentStore) {
    add(&mut store, "/a");
    add(&mut store, "/a/b");
    store.create_workspace("staging").unwrap();
    store.login("staging").unwrap();

    store.copy_node("/a", "/a", Some("default")).unwrap();
    assert!(store.node_exists("/a/b").unwrap());
    assert!(matches!(
        store.copy_node("/a", "/x", Some("nowhere")),
        Err(Error::NotFound(_))
    ));
}

/// Listed children take the slots they occupied together, in list order.
#[rstest]
fn test_reorder_children(mut store: ContentStore) {
    add(&mut store, "/p");
    for name in ["x", "y", "z"] {
        add(&mut store, &format!("/p/{name}"));
    }

    store.reorder_children("/p", &["z", "x"]).unwrap();
    assert_eq!(child_names(&store, "/p"), ["z", "y", "x"]);

    store.reorder_children("/p", &["x", "y", "z"]).unwrap();
    assert_eq!(child_names(&store, "/p"), ["x", "y", "z"]);

    assert!(matches!(store.reorder_children("/p", &["x", "x"]), Err(Error::ConstraintViolation(_))));
    assert!(matches!(store.reorder_children("/p", &["w"]), Err(Error::NotFound(_))));
    assert_eq!(child_names(&store, "/p"), ["x", "y", "z"]);
}

#[rstest]
fn test_workspaces_are_separate(mut store: ContentStore) {
    add(&mut store, "/only-default");
    store.create_workspace("other").unwrap();
    store.login("other").unwrap();
    assert!(!store.node_exists("/only-default").unwrap());
    assert!(store.node_exists("/").unwrap());

    store.login("default").unwrap();
    store.delete_workspace("other").unwrap();
    assert_eq!(store.list_workspaces().unwrap(), ["default"]);
}

#[test]
fn test_reopen_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("content.sqlite");

    assert!(matches!(
        ContentStore::open(&db, OpenMode::ReadWrite),
        Err(Error::DatabaseNotFound(_))
    ));

    let id = {
        let mut store = ContentStore::open(&db, OpenMode::Create).unwrap();
        store.register_namespace("app", "urn:app").unwrap();
        add(&mut store, "/kept")
    };

    let store = ContentStore::open(&db, OpenMode::ReadWrite).unwrap();
    assert_eq!(store.namespace_uri("app"), Some("urn:app"));
    assert_eq!(store.get_node("/kept", 0).unwrap().identifier, id);
}

#[test]
fn test_read_only_refuses_writes() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("content.sqlite");
    drop(ContentStore::open(&db, OpenMode::Create).unwrap());

    let mut store = ContentStore::open(&db, OpenMode::ReadOnly).unwrap();
    assert!(store.node_exists("/").unwrap());
    assert!(matches!(
        store.insert_node(NewNode::new("/a", UNSTRUCTURED)),
        Err(Error::AccessDenied(_))
    ));
}
