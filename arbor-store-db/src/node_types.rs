// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Persistence of user-registered node types.
//!
//! List-valued attributes (supertypes, operators, defaults, required child
//! types) are stored as JSON arrays.

use std::collections::BTreeSet;

use arbor_props::CodecError;
use arbor_store_core::node_type::{ChildDefinition, PropertyDefinition, is_builtin};
use arbor_store_core::{NodeTypeDefinition, NodeTypeRegistry, PropertyType, StaticTypeRegistry, path};
use rusqlite::{Connection, params};
use tracing::info;

use crate::connection::ContentStore;
use crate::error::{Error, Result};

fn to_json(list: &[String]) -> Result<String> {
    Ok(serde_json::to_string(list)?)
}

fn from_json(text: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(text)?)
}

fn property_type(property: &str, tag: Option<String>) -> Result<Option<PropertyType>> {
    match tag {
        None => Ok(None),
        Some(tag) => match tag.parse() {
            Ok(ptype) => Ok(Some(ptype)),
            Err(_) => Err(CodecError::UnknownType {
                property: property.to_owned(),
                tag,
            }
            .into()),
        },
    }
}

/// Every persisted definition, by name.
pub(crate) fn load(conn: &Connection) -> Result<Vec<NodeTypeDefinition>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT id, name, supertypes, is_abstract, is_mixin, queryable,
               orderable_child_nodes, primary_item
        FROM type_nodes ORDER BY name
        "#,
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(2)?,
                NodeTypeDefinition {
                    name: row.get(1)?,
                    supertypes: Vec::new(),
                    is_abstract: row.get(3)?,
                    is_mixin: row.get(4)?,
                    queryable: row.get(5)?,
                    orderable_child_nodes: row.get(6)?,
                    primary_item: row.get(7)?,
                    properties: Vec::new(),
                    children: Vec::new(),
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut definitions = Vec::with_capacity(rows.len());
    for (id, supertypes, mut definition) in rows {
        definition.supertypes = from_json(&supertypes)?;
        definition.properties = load_properties(conn, id)?;
        definition.children = load_children(conn, id)?;
        definitions.push(definition);
    }
    Ok(definitions)
}

fn load_properties(conn: &Connection, type_id: i64) -> Result<Vec<PropertyDefinition>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT name, required_type, multiple, mandatory, auto_created, protected,
               on_parent_version, fulltext_searchable, query_orderable,
               query_operators, default_values
        FROM type_properties WHERE node_type_id = ?1 ORDER BY rowid
        "#,
    )?;
    let rows = stmt
        .query_map(params![type_id], |row| {
            Ok((
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
                PropertyDefinition {
                    name: row.get(0)?,
                    required_type: None,
                    multiple: row.get(2)?,
                    mandatory: row.get(3)?,
                    auto_created: row.get(4)?,
                    protected: row.get(5)?,
                    on_parent_version: row.get(6)?,
                    fulltext_searchable: row.get(7)?,
                    query_orderable: row.get(8)?,
                    query_operators: Vec::new(),
                    default_values: Vec::new(),
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(tag, operators, defaults, mut definition)| {
            definition.required_type = property_type(&definition.name, tag)?;
            definition.query_operators = from_json(&operators)?;
            definition.default_values = from_json(&defaults)?;
            Ok(definition)
        })
        .collect()
}

fn load_children(conn: &Connection, type_id: i64) -> Result<Vec<ChildDefinition>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT name, required_primary_types, default_primary_type, mandatory,
               auto_created, protected, on_parent_version
        FROM type_children WHERE node_type_id = ?1 ORDER BY rowid
        "#,
    )?;
    let rows = stmt
        .query_map(params![type_id], |row| {
            Ok((
                row.get::<_, String>(1)?,
                ChildDefinition {
                    name: row.get(0)?,
                    required_primary_types: Vec::new(),
                    default_primary_type: row.get(2)?,
                    mandatory: row.get(3)?,
                    auto_created: row.get(4)?,
                    protected: row.get(5)?,
                    on_parent_version: row.get(6)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(required, mut definition)| {
            definition.required_primary_types = from_json(&required)?;
            Ok(definition)
        })
        .collect()
}

fn save(conn: &Connection, definition: &NodeTypeDefinition) -> Result<()> {
    for table in ["type_properties", "type_children"] {
        conn.execute(
            &format!(
                "DELETE FROM {table} WHERE node_type_id IN \
                 (SELECT id FROM type_nodes WHERE name = ?1)"
            ),
            params![definition.name],
        )?;
    }
    conn.execute("DELETE FROM type_nodes WHERE name = ?1", params![definition.name])?;

    conn.execute(
        r#"
        INSERT INTO type_nodes (name, supertypes, is_abstract, is_mixin, queryable,
                                orderable_child_nodes, primary_item)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            definition.name,
            to_json(&definition.supertypes)?,
            definition.is_abstract,
            definition.is_mixin,
            definition.queryable,
            definition.orderable_child_nodes,
            definition.primary_item,
        ],
    )?;
    let type_id = conn.last_insert_rowid();

    let mut insert_property = conn.prepare_cached(
        r#"
        INSERT INTO type_properties (node_type_id, name, required_type, multiple, mandatory,
                                     auto_created, protected, on_parent_version,
                                     fulltext_searchable, query_orderable, query_operators,
                                     default_values)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )?;
    for property in &definition.properties {
        insert_property.execute(params![
            type_id,
            property.name,
            property.required_type.map(|t| t.to_string()),
            property.multiple,
            property.mandatory,
            property.auto_created,
            property.protected,
            property.on_parent_version,
            property.fulltext_searchable,
            property.query_orderable,
            to_json(&property.query_operators)?,
            to_json(&property.default_values)?,
        ])?;
    }

    let mut insert_child = conn.prepare_cached(
        r#"
        INSERT INTO type_children (node_type_id, name, required_primary_types,
                                   default_primary_type, mandatory, auto_created, protected,
                                   on_parent_version)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )?;
    for child in &definition.children {
        insert_child.execute(params![
            type_id,
            child.name,
            to_json(&child.required_primary_types)?,
            child.default_primary_type,
            child.mandatory,
            child.auto_created,
            child.protected,
            child.on_parent_version,
        ])?;
    }
    Ok(())
}

impl ContentStore {
    /// Persist `definitions` and make them visible to inserts and queries.
    ///
    /// Without `allow_update` an already registered name fails with
    /// `ItemExists`. Built-in types can never be redefined.
    pub fn register_node_types(
        &mut self,
        definitions: &[NodeTypeDefinition],
        allow_update: bool,
    ) -> Result<()> {
        let batch: BTreeSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        for definition in definitions {
            path::validate_name(&definition.name, |p| self.namespaces.is_registered(p))?;
            if is_builtin(&definition.name) {
                return Err(Error::ConstraintViolation(format!(
                    "built-in type '{}' cannot be redefined",
                    definition.name
                )));
            }
            if !allow_update && self.types.has_type(&definition.name) {
                return Err(Error::ItemExists(definition.name.clone()));
            }
            if let Some(missing) = definition
                .supertypes
                .iter()
                .find(|s| !self.types.has_type(s) && !batch.contains(s.as_str()))
            {
                return Err(Error::ConstraintViolation(format!(
                    "supertype '{missing}' of '{}' is not registered",
                    definition.name
                )));
            }
        }

        self.write_batch(|store| {
            for definition in definitions {
                save(&store.conn, definition)?;
            }
            Ok(())
        })?;

        for definition in definitions {
            self.types.register(definition.clone());
            info!(node_type = %definition.name, "registered node type");
        }
        Ok(())
    }

    /// Definitions persisted in this database; built-ins are not listed.
    pub fn node_types(&self) -> Result<Vec<NodeTypeDefinition>> {
        load(&self.conn)
    }

    /// Rebuild the in-memory registry from the persisted definitions.
    pub(crate) fn reload_types(&mut self) -> Result<()> {
        let mut types = StaticTypeRegistry::with_builtins();
        for definition in load(&self.conn)? {
            types.register(definition);
        }
        self.types = types;
        Ok(())
    }

    /// Registry of built-in and persisted types as seen by this store.
    pub fn type_registry(&self) -> &StaticTypeRegistry {
        &self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> NodeTypeDefinition {
        let mut page = NodeTypeDefinition::new("app:page").with_supertypes(&["nt:unstructured"]);
        page.primary_item = Some("title".into());
        page.properties.push(PropertyDefinition {
            mandatory: true,
            query_operators: vec!["=".into(), "LIKE".into()],
            ..PropertyDefinition::new("title", Some(PropertyType::String))
        });
        page.children.push(ChildDefinition {
            default_primary_type: Some("nt:unstructured".into()),
            ..ChildDefinition::new("body", vec!["nt:base".into()])
        });
        page
    }

    fn store() -> ContentStore {
        let mut store = ContentStore::open_memory().unwrap();
        store.register_namespace("app", "urn:app").unwrap();
        store
    }

    #[test]
    fn definitions_round_trip() {
        let mut store = store();
        store.register_node_types(&[page()], false).unwrap();
        assert_eq!(store.node_types().unwrap(), vec![page()]);
        assert!(store.type_registry().is_node_type("app:page", "nt:base"));
    }

    #[test]
    fn existing_names_need_update() {
        let mut store = store();
        store.register_node_types(&[page()], false).unwrap();
        assert!(matches!(
            store.register_node_types(&[page()], false),
            Err(Error::ItemExists(name)) if name == "app:page"
        ));

        let mut changed = page();
        changed.is_mixin = true;
        store.register_node_types(&[changed.clone()], true).unwrap();
        assert_eq!(store.node_types().unwrap(), vec![changed]);
    }

    #[test]
    fn builtins_and_unknown_supertypes_are_rejected() {
        let mut store = store();
        assert!(matches!(
            store.register_node_types(&[NodeTypeDefinition::new("nt:folder")], true),
            Err(Error::ConstraintViolation(_))
        ));
        let orphan = NodeTypeDefinition::new("app:orphan").with_supertypes(&["app:missing"]);
        assert!(matches!(
            store.register_node_types(&[orphan], false),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(matches!(
            store.register_node_types(&[NodeTypeDefinition::new("zz:x")], false),
            Err(Error::Namespace(_))
        ));
    }
}
