// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Node and property writes.

use std::collections::BTreeSet;

use arbor_props::BinaryPayload;
use arbor_store_core::node::{is_identifier, new_identifier};
use arbor_store_core::{NodeTypeRegistry, Property, PropertySet, PropertyType, path};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::connection::ContentStore;
use crate::error::{Error, Result, exists_on_conflict};
use crate::row::depth_of;

/// Node to be inserted by [`ContentStore::insert_node`].
#[derive(Debug, Clone)]
pub struct NewNode {
    pub path: String,
    pub primary_type: String,
    /// Identifier to use; the `jcr:uuid` property or a fresh UUID otherwise.
    pub identifier: Option<String>,
    pub properties: PropertySet,
}

impl NewNode {
    pub fn new(path: impl Into<String>, primary_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            primary_type: primary_type.into(),
            identifier: None,
            properties: PropertySet::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.insert(property);
        self
    }

    fn resolve_identifier(&self) -> Result<String> {
        let identifier = match &self.identifier {
            Some(id) => id.clone(),
            None => match self.properties.get("jcr:uuid").and_then(Property::value) {
                Some(value) => value.to_text(),
                None => new_identifier(),
            },
        };
        if !is_identifier(&identifier) {
            return Err(Error::ConstraintViolation(format!(
                "'{identifier}' is not a valid node identifier"
            )));
        }
        Ok(identifier)
    }
}

/// Properties as persisted: the primary type lives in its own column.
fn stored(properties: &PropertySet) -> PropertySet {
    properties
        .iter()
        .filter(|p| p.name != "jcr:primaryType")
        .cloned()
        .collect()
}

/// Store side-channel payloads of `node_id`.
pub(crate) fn write_binaries(
    conn: &Connection,
    node_id: i64,
    workspace: &str,
    payloads: &[BinaryPayload],
) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO binary_data (node_id, property_name, workspace_name, idx, data) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for payload in payloads {
        stmt.execute(params![
            node_id,
            payload.property,
            workspace,
            payload.index as i64,
            payload.data
        ])?;
    }
    Ok(())
}

/// Drop binary rows that no longer have a binary value to back them.
fn prune_binaries(conn: &Connection, node_id: i64, properties: &PropertySet) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT property_name FROM binary_data WHERE node_id = ?1",
    )?;
    let stored = stmt
        .query_map(params![node_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;

    for name in stored {
        match properties.get(&name) {
            Some(property) if property.ptype == PropertyType::Binary => {
                conn.execute(
                    "DELETE FROM binary_data WHERE node_id = ?1 AND property_name = ?2 AND idx >= ?3",
                    params![node_id, name, property.values.len() as i64],
                )?;
            }
            _ => {
                conn.execute(
                    "DELETE FROM binary_data WHERE node_id = ?1 AND property_name = ?2",
                    params![node_id, name],
                )?;
            }
        }
    }
    Ok(())
}

impl ContentStore {
    fn check_type(&self, primary_type: &str) -> Result<()> {
        if self.types.has_type(primary_type) {
            Ok(())
        } else {
            Err(Error::ConstraintViolation(format!(
                "node type '{primary_type}' is not registered"
            )))
        }
    }

    fn check_property_names(&self, properties: &PropertySet) -> Result<()> {
        for property in properties.iter() {
            path::validate_name(&property.name, |p| self.namespaces.is_registered(p))?;
            if !arbor_props::is_addressable(&property.name) {
                return Err(Error::ConstraintViolation(format!(
                    "'{}' cannot be used as a property name",
                    property.name
                )));
            }
        }
        Ok(())
    }

    /// Insert one node below an existing parent and return its identifier.
    pub fn insert_node(&mut self, node: NewNode) -> Result<String> {
        self.validate_path(&node.path)?;
        self.check_type(&node.primary_type)?;
        self.check_property_names(&node.properties)?;
        let identifier = node.resolve_identifier()?;
        let encoded = arbor_props::encode(&stored(&node.properties))?;

        let id = self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            let parent = path::parent(&node.path);
            let sort_order = match parent {
                Some(parent) => {
                    if store.find_row(&workspace, parent)?.is_none() {
                        return Err(Error::NotFound(parent.to_owned()));
                    }
                    store.next_sort_order(&workspace, parent)?
                }
                None => 0,
            };
            let (prefix, local) = path::split_name(path::name(&node.path));

            store
                .conn
                .prepare_cached(
                    r#"
                    INSERT INTO nodes (identifier, path, parent, local_name, namespace, type,
                                       workspace_name, props, numerical_props, depth, sort_order)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                )?
                .execute(params![
                    identifier,
                    node.path,
                    parent,
                    local,
                    prefix,
                    node.primary_type,
                    workspace,
                    encoded.document,
                    encoded.numeric_document,
                    depth_of(&node.path),
                    sort_order,
                ])
                .map_err(exists_on_conflict(&node.path))?;
            let id = store.conn.last_insert_rowid();

            write_binaries(&store.conn, id, &workspace, &encoded.binaries)?;
            if !encoded.references.is_empty() {
                store.staged.references.insert(id);
            }
            Ok(id)
        })?;

        self.cache.get_mut().insert(&node.path, &identifier);
        debug!(path = %node.path, id, %identifier, "inserted node");
        Ok(identifier)
    }

    /// Replace the properties of the node at `node_path`.
    ///
    /// Binary values without a payload keep their stored bytes.
    pub fn update_node(&mut self, node_path: &str, properties: &PropertySet) -> Result<()> {
        self.validate_path(node_path)?;
        self.check_property_names(properties)?;
        let properties = stored(properties);
        let encoded = arbor_props::encode(&properties)?;

        self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            let row = store
                .find_row(&workspace, node_path)?
                .ok_or_else(|| Error::NotFound(node_path.to_owned()))?;

            store.conn.execute(
                "UPDATE nodes SET props = ?1, numerical_props = ?2 WHERE id = ?3",
                params![encoded.document, encoded.numeric_document, row.id],
            )?;
            prune_binaries(&store.conn, row.id, &properties)?;
            write_binaries(&store.conn, row.id, &workspace, &encoded.binaries)?;
            store.staged.references.insert(row.id);
            debug!(path = node_path, id = row.id, "updated node");
            Ok(())
        })
    }

    /// Delete the node at `node_path` and its whole subtree.
    pub fn delete_node(&mut self, node_path: &str) -> Result<()> {
        self.validate_path(node_path)?;
        if path::is_root(node_path) {
            return Err(Error::ConstraintViolation("the root node cannot be deleted".into()));
        }
        let (lower, upper) = path::subtree_bounds(node_path);

        self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            let doomed = {
                let mut stmt = store.conn.prepare_cached(
                    "SELECT id, path FROM nodes WHERE workspace_name = ?1 \
                     AND (path = ?2 OR (path >= ?3 AND path < ?4))",
                )?;
                stmt.query_map(params![workspace, node_path, lower, upper], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?
            };
            if doomed.is_empty() {
                return Err(Error::NotFound(node_path.to_owned()));
            }

            store.conn.execute(
                "DELETE FROM binary_data WHERE node_id IN (SELECT id FROM nodes \
                 WHERE workspace_name = ?1 AND (path = ?2 OR (path >= ?3 AND path < ?4)))",
                params![workspace, node_path, lower, upper],
            )?;
            store.conn.execute(
                "DELETE FROM nodes WHERE workspace_name = ?1 \
                 AND (path = ?2 OR (path >= ?3 AND path < ?4))",
                params![workspace, node_path, lower, upper],
            )?;

            debug!(path = node_path, rows = doomed.len(), "deleted subtree");
            for (id, deleted) in doomed {
                store.staged.references.remove(&id);
                store.staged.deletions.insert(id, deleted);
            }
            store.cache.get_mut().invalidate_subtree(node_path);
            Ok(())
        })
    }

    /// Remove one property from its node.
    pub fn delete_property(&mut self, property_path: &str) -> Result<()> {
        let (node_path, name) = path::split_property_path(property_path)
            .ok_or_else(|| Error::NotFound(property_path.to_owned()))?;
        self.validate_path(node_path)?;

        self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            let row = store
                .find_row(&workspace, node_path)?
                .ok_or_else(|| Error::NotFound(node_path.to_owned()))?;
            let mut properties = arbor_props::decode(&row.props, None)?;
            if properties.remove(name).is_none() {
                return Err(Error::NotFound(property_path.to_owned()));
            }
            let encoded = arbor_props::encode(&properties)?;

            store.conn.execute(
                "UPDATE nodes SET props = ?1, numerical_props = ?2 WHERE id = ?3",
                params![encoded.document, encoded.numeric_document, row.id],
            )?;
            store.conn.execute(
                "DELETE FROM binary_data WHERE node_id = ?1 AND property_name = ?2",
                params![row.id, name],
            )?;
            for table in ["\"references\"", "weak_references"] {
                store.conn.execute(
                    &format!("DELETE FROM {table} WHERE source_id = ?1 AND source_property_name = ?2"),
                    params![row.id, name],
                )?;
            }
            debug!(path = property_path, "deleted property");
            Ok(())
        })
    }
}
