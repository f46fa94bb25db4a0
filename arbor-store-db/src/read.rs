// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Node reads: by path, by identifier, in batches, binaries and referrers.

use std::collections::HashMap;

use arbor_store_core::node::is_identifier;
use arbor_store_core::{Node, Property, PropertyType, path};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::chunk::{chunks, placeholders};
use crate::connection::ContentStore;
use crate::error::{Error, Result};
use crate::row::{NODE_COLUMNS, NodeRow, build_tree, depth_of};

impl ContentStore {
    /// Node at `node_path` with descendants down to `depth_limit` further
    /// levels, nested in sibling order.
    pub fn get_node(&self, node_path: &str, depth_limit: u32) -> Result<Node> {
        self.validate_path(node_path)?;
        let workspace = self.current_workspace()?;
        let (lower, upper) = path::subtree_bounds(node_path);

        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE workspace_name = ?1 \
             AND (path = ?2 OR (path >= ?3 AND path < ?4 AND depth <= ?5)) \
             ORDER BY depth, sort_order"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    workspace,
                    node_path,
                    lower,
                    upper,
                    depth_of(node_path) + i64::from(depth_limit)
                ],
                NodeRow::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        self.remember(&rows);
        build_tree(node_path, rows)?.ok_or_else(|| Error::NotFound(node_path.to_owned()))
    }

    /// Nodes at `paths`, in input order; missing paths are skipped.
    pub fn get_nodes(&self, paths: &[&str], depth_limit: u32) -> Result<Vec<Node>> {
        for node_path in paths {
            self.validate_path(node_path)?;
        }
        let workspace = self.current_workspace()?;
        let mut found: HashMap<&str, Node> = HashMap::new();

        for chunk in chunks(paths, 2) {
            let list = placeholders(self.dialect, 3, chunk.len());
            let sql = if depth_limit == 0 {
                format!(
                    "SELECT {NODE_COLUMNS} FROM nodes WHERE workspace_name = ?1 \
                     AND path IN ({list})"
                )
            } else {
                let prefix = "CASE WHEN r.path = '/' THEN '/' ELSE r.path || '/' END";
                format!(
                    "SELECT n.identifier, n.path, n.type, n.props FROM nodes n \
                     WHERE n.workspace_name = ?1 AND EXISTS (\
                     SELECT 1 FROM nodes r WHERE r.workspace_name = n.workspace_name \
                     AND r.path IN ({list}) \
                     AND (n.path = r.path OR ({} AND n.depth <= r.depth + ?2))) \
                     ORDER BY n.depth, n.sort_order",
                    self.dialect.starts_with("n.path", prefix),
                )
            };

            let mut values = vec![
                SqlValue::Text(workspace.to_owned()),
                SqlValue::Integer(i64::from(depth_limit)),
            ];
            values.extend(chunk.iter().map(|p| SqlValue::Text((*p).to_owned())));

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values), NodeRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            self.remember(&rows);

            for requested in chunk {
                let limit = depth_of(requested) + i64::from(depth_limit);
                let subtree = rows.iter().filter(|row| {
                    row.path == *requested
                        || (path::is_descendant(&row.path, requested) && depth_of(&row.path) <= limit)
                });
                if let Some(node) = build_tree(requested, subtree.cloned())? {
                    found.insert(*requested, node);
                }
            }
        }

        Ok(paths.iter().filter_map(|p| found.get(p).cloned()).collect())
    }

    /// Node with identifier `id`; anything that is not a UUID is looked up
    /// as a path.
    pub fn get_node_by_identifier(&self, id: &str) -> Result<Node> {
        if !is_identifier(id) {
            return self.get_node(id, 0);
        }
        let workspace = self.current_workspace()?;
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE workspace_name = ?1 AND {} = ?2",
            self.dialect.case_sensitive("identifier")
        );
        let row = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![workspace, id], NodeRow::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("identifier {id}")))?;
        self.remember(std::slice::from_ref(&row));
        row.into_node()
    }

    /// Nodes for `ids` in input order; unknown identifiers are skipped.
    pub fn get_nodes_by_identifier(&self, ids: &[&str]) -> Result<Vec<Node>> {
        let workspace = self.current_workspace()?;
        let (identifiers, paths): (Vec<&str>, Vec<&str>) =
            ids.iter().copied().partition(|id| is_identifier(id));

        let mut found: HashMap<String, Node> = HashMap::new();
        for node in self.get_nodes(&paths, 0)? {
            found.insert(node.path.clone(), node);
        }

        for chunk in chunks(&identifiers, 1) {
            let sql = format!(
                "SELECT {NODE_COLUMNS} FROM nodes WHERE workspace_name = ?1 AND {} IN ({})",
                self.dialect.case_sensitive("identifier"),
                placeholders(self.dialect, 2, chunk.len())
            );
            let mut values = vec![SqlValue::Text(workspace.to_owned())];
            values.extend(chunk.iter().map(|id| SqlValue::Text((*id).to_owned())));

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values), NodeRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            self.remember(&rows);
            for row in rows {
                found.insert(row.identifier.clone(), row.into_node()?);
            }
        }

        Ok(ids.iter().filter_map(|id| found.get(*id).cloned()).collect())
    }

    pub fn get_node_path_for_identifier(&self, id: &str) -> Result<String> {
        if let Some(cached) = self.cache.borrow().path(id) {
            return Ok(cached.to_owned());
        }
        let workspace = self.current_workspace()?;
        let sql = format!(
            "SELECT path FROM nodes WHERE workspace_name = ?1 AND {} = ?2",
            self.dialect.case_sensitive("identifier")
        );
        let found: Option<String> = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![workspace, id], |row| row.get(0))
            .optional()?;
        let node_path = found.ok_or_else(|| Error::NotFound(format!("identifier {id}")))?;
        self.cache.borrow_mut().insert(&node_path, id);
        Ok(node_path)
    }

    pub fn node_exists(&self, node_path: &str) -> Result<bool> {
        self.validate_path(node_path)?;
        let workspace = self.current_workspace()?;
        Ok(self.find_row(workspace, node_path)?.is_some())
    }

    /// Payloads of the binary property at `property_path`, in value order.
    pub fn get_binary_stream(&self, property_path: &str) -> Result<Vec<Vec<u8>>> {
        let (node_path, name) = path::split_property_path(property_path)
            .ok_or_else(|| Error::NotFound(property_path.to_owned()))?;
        self.validate_path(node_path)?;
        let workspace = self.current_workspace()?;
        let row = self
            .find_row(workspace, node_path)?
            .ok_or_else(|| Error::NotFound(node_path.to_owned()))?;

        let properties = arbor_props::decode(&row.props, Some(&[name]))?;
        match properties.get(name) {
            Some(property) if property.ptype == PropertyType::Binary => {}
            Some(_) => {
                return Err(Error::ConstraintViolation(format!(
                    "{property_path} is not a binary property"
                )));
            }
            None => return Err(Error::NotFound(property_path.to_owned())),
        }

        let mut stmt = self.conn.prepare_cached(
            "SELECT data FROM binary_data WHERE node_id = ?1 AND property_name = ?2 ORDER BY idx",
        )?;
        let payloads = stmt
            .query_map(params![row.id, name], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<Vec<u8>>>>()?;
        Ok(payloads)
    }

    /// Paths of the strong reference properties pointing at `node_path`,
    /// optionally restricted to properties called `name`.
    pub fn get_references(&self, node_path: &str, name: Option<&str>) -> Result<Vec<String>> {
        self.referrers("\"references\"", node_path, name)
    }

    pub fn get_weak_references(&self, node_path: &str, name: Option<&str>) -> Result<Vec<String>> {
        self.referrers("weak_references", node_path, name)
    }

    fn referrers(&self, table: &str, node_path: &str, name: Option<&str>) -> Result<Vec<String>> {
        self.validate_path(node_path)?;
        let workspace = self.current_workspace()?;
        let target = self
            .find_row(workspace, node_path)?
            .ok_or_else(|| Error::NotFound(node_path.to_owned()))?;

        let sql = format!(
            "SELECT n.path, r.source_property_name FROM {table} r \
             JOIN nodes n ON n.id = r.source_id \
             WHERE r.target_id = ?1 AND (?2 IS NULL OR r.source_property_name = ?2) \
             ORDER BY n.path, r.source_property_name"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let paths = stmt
            .query_map(params![target.id, name], |row| {
                let source: String = row.get(0)?;
                let property: String = row.get(1)?;
                Ok(path::join(&source, &property))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(paths)
    }

    /// Single property fetch by path is not offered; read the node instead.
    pub fn get_property(&self, _property_path: &str) -> Result<Property> {
        Err(Error::NotImplemented("fetching a property by path"))
    }

    fn remember(&self, rows: &[NodeRow]) {
        let mut cache = self.cache.borrow_mut();
        for row in rows {
            cache.insert(&row.path, &row.identifier);
        }
    }
}
