// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Structural changes: move, copy and sibling reordering.

use std::collections::{HashMap, HashSet};

use arbor_props::{CodecError, rewrite_references};
use arbor_store_core::node::new_identifier;
use arbor_store_core::{Value, path};
use rusqlite::params;
use tracing::{debug, info};

use crate::connection::ContentStore;
use crate::error::{Error, Result, exists_on_conflict};
use crate::row::depth_of;

/// A row of the subtree being copied.
struct SourceRow {
    id: i64,
    identifier: String,
    path: String,
    local_name: String,
    namespace: String,
    primary_type: String,
    props: String,
    numerical_props: Option<String>,
    sort_order: i64,
}

impl ContentStore {
    /// Checks shared by move and copy; returns the destination parent.
    fn check_destination<'a>(&self, workspace: &str, src: &str, dst: &'a str) -> Result<&'a str> {
        self.validate_path(src)?;
        self.validate_path(dst)?;
        let parent = path::parent(dst).ok_or_else(|| Error::ItemExists(dst.to_owned()))?;
        if self.find_row(workspace, dst)?.is_some() {
            return Err(Error::ItemExists(dst.to_owned()));
        }
        if self.find_row(workspace, parent)?.is_none() {
            return Err(Error::NotFound(parent.to_owned()));
        }
        Ok(parent)
    }

    /// Move the subtree at `src` to `dst`, keeping every identifier.
    ///
    /// The moved root is appended after the last child of its new parent.
    pub fn move_node(&mut self, src: &str, dst: &str) -> Result<()> {
        if path::is_root(src) {
            return Err(Error::ConstraintViolation("the root node cannot be moved".into()));
        }
        if dst == src || path::is_descendant(dst, src) {
            return Err(Error::ConstraintViolation(format!(
                "cannot move {src} into its own subtree"
            )));
        }

        self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            let dst_parent = store.check_destination(&workspace, src, dst)?;
            let (lower, upper) = path::subtree_bounds(src);

            let locked = {
                let sql = format!(
                    "SELECT id FROM nodes WHERE workspace_name = ?1 \
                     AND (path = ?2 OR (path >= ?3 AND path < ?4)){}",
                    store.dialect.for_update()
                );
                let mut stmt = store.conn.prepare_cached(&sql)?;
                stmt.query_map(params![workspace, src, lower, upper], |row| row.get::<_, i64>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            };
            if locked.is_empty() {
                return Err(Error::NotFound(src.to_owned()));
            }

            let sort_order = store.next_sort_order(&workspace, dst_parent)?;
            let (namespace, local_name) = path::split_name(path::name(dst));
            let offset = src.chars().count() as i64 + 1;
            let delta = depth_of(dst) - depth_of(src);

            let moved = store.conn.execute(
                r#"
                UPDATE nodes SET
                    path = CASE WHEN path = ?2 THEN ?3 ELSE ?3 || substr(path, ?4) END,
                    parent = CASE WHEN path = ?2 THEN ?5 ELSE ?3 || substr(parent, ?4) END,
                    depth = depth + ?6,
                    local_name = CASE WHEN path = ?2 THEN ?7 ELSE local_name END,
                    namespace = CASE WHEN path = ?2 THEN ?8 ELSE namespace END,
                    sort_order = CASE WHEN path = ?2 THEN ?9 ELSE sort_order END
                WHERE workspace_name = ?1 AND (path = ?2 OR (path >= ?10 AND path < ?11))
                "#,
                params![
                    workspace, src, dst, offset, dst_parent, delta, local_name, namespace,
                    sort_order, lower, upper
                ],
            )?;

            store.cache.get_mut().invalidate_subtree(src);
            info!(from = src, to = dst, rows = moved, "moved subtree");
            Ok(())
        })
    }

    /// Copy the subtree at `src` (of `src_workspace`, else the current
    /// workspace) to `dst` and return the identifier of the new root.
    ///
    /// Copies get fresh identifiers. References between copied nodes are
    /// redirected to the copies; references leaving the subtree are kept.
    pub fn copy_node(&mut self, src: &str, dst: &str, src_workspace: Option<&str>) -> Result<String> {
        if let Some(source) = src_workspace
            && !self.workspace_exists(source)?
        {
            return Err(Error::NotFound(format!("workspace '{source}'")));
        }

        self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            let source_workspace = src_workspace.unwrap_or(&workspace).to_owned();
            if source_workspace == workspace && (dst == src || path::is_descendant(dst, src)) {
                return Err(Error::ConstraintViolation(format!(
                    "cannot copy {src} into its own subtree"
                )));
            }
            let dst_parent = store.check_destination(&workspace, src, dst)?.to_owned();
            let rows = store.source_rows(&source_workspace, src)?;
            if rows.is_empty() {
                return Err(Error::NotFound(src.to_owned()));
            }

            let mapping: HashMap<String, String> = rows
                .iter()
                .map(|row| (row.identifier.clone(), new_identifier()))
                .collect();
            let root_sort_order = store.next_sort_order(&workspace, &dst_parent)?;
            let (dst_namespace, dst_local) = path::split_name(path::name(dst));

            let mut referencing = Vec::new();
            for row in &rows {
                let identifier = &mapping[&row.identifier];
                let is_root = row.path == src;
                let new_path = path::rebase(&row.path, src, dst);
                let parent = match path::parent(&new_path) {
                    Some(parent) => parent.to_owned(),
                    None => dst_parent.clone(),
                };

                let mut properties = arbor_props::decode(&row.props, None)?;
                if let Some(uuid) = properties.get_mut("jcr:uuid") {
                    let value = Value::parse(uuid.ptype, identifier).map_err(|source| {
                        CodecError::Value {
                            property: uuid.name.clone(),
                            source,
                        }
                    })?;
                    uuid.values = vec![value];
                }
                let has_references = properties.has_references();
                let document = arbor_props::encode(&properties)?.document;

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
                        new_path,
                        parent,
                        if is_root { dst_local } else { row.local_name.as_str() },
                        if is_root { dst_namespace } else { row.namespace.as_str() },
                        row.primary_type,
                        workspace,
                        document,
                        row.numerical_props,
                        depth_of(&new_path),
                        if is_root { root_sort_order } else { row.sort_order },
                    ])
                    .map_err(exists_on_conflict(&new_path))?;
                let id = store.conn.last_insert_rowid();

                store.conn.execute(
                    "INSERT INTO binary_data (node_id, property_name, workspace_name, idx, data) \
                     SELECT ?1, property_name, ?2, idx, data FROM binary_data WHERE node_id = ?3",
                    params![id, workspace, row.id],
                )?;
                store.cache.get_mut().insert(&new_path, identifier);
                if has_references {
                    referencing.push((id, properties));
                }
            }

            for (id, mut properties) in referencing {
                if rewrite_references(&mut properties, &mapping) {
                    let encoded = arbor_props::encode(&properties)?;
                    store.conn.execute(
                        "UPDATE nodes SET props = ?1 WHERE id = ?2",
                        params![encoded.document, id],
                    )?;
                }
                store.staged.references.insert(id);
            }

            info!(from = src, to = dst, rows = rows.len(), "copied subtree");
            Ok(mapping[&rows[0].identifier].clone())
        })
    }

    fn source_rows(&self, workspace: &str, src: &str) -> Result<Vec<SourceRow>> {
        let (lower, upper) = path::subtree_bounds(src);
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT id, identifier, path, local_name, namespace, type, props,
                   numerical_props, sort_order
            FROM nodes
            WHERE workspace_name = ?1 AND (path = ?2 OR (path >= ?3 AND path < ?4))
            ORDER BY depth, sort_order
            "#,
        )?;
        let rows = stmt
            .query_map(params![workspace, src, lower, upper], |row| {
                Ok(SourceRow {
                    id: row.get(0)?,
                    identifier: row.get(1)?,
                    path: row.get(2)?,
                    local_name: row.get(3)?,
                    namespace: row.get(4)?,
                    primary_type: row.get(5)?,
                    props: row.get(6)?,
                    numerical_props: row.get(7)?,
                    sort_order: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Give the children `names` of `parent` the positions they jointly
    /// occupy, in the order listed. Other children keep their positions.
    pub fn reorder_children(&mut self, parent: &str, names: &[&str]) -> Result<()> {
        self.validate_path(parent)?;
        let mut seen = HashSet::new();
        if let Some(duplicate) = names.iter().find(|name| !seen.insert(**name)) {
            return Err(Error::ConstraintViolation(format!(
                "child '{duplicate}' is listed twice"
            )));
        }

        self.write_batch(|store| {
            let workspace = store.current_workspace()?.to_owned();
            if store.find_row(&workspace, parent)?.is_none() {
                return Err(Error::NotFound(parent.to_owned()));
            }

            let children_paths: Vec<String> = names.iter().map(|n| path::join(parent, n)).collect();
            let mut children = Vec::with_capacity(names.len());
            {
                let mut stmt = store.conn.prepare_cached(
                    "SELECT id, sort_order FROM nodes WHERE workspace_name = ?1 AND path = ?2",
                )?;
                for child in &children_paths {
                    let found = stmt
                        .query_row(params![workspace, child], |row| {
                            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                        })
                        .map_err(|e| match e {
                            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(child.clone()),
                            other => other.into(),
                        })?;
                    children.push(found);
                }
            }

            let mut slots: Vec<i64> = children.iter().map(|(_, order)| *order).collect();
            slots.sort_unstable();
            let mut stmt = store
                .conn
                .prepare_cached("UPDATE nodes SET sort_order = ?1 WHERE id = ?2")?;
            for ((id, _), slot) in children.iter().zip(slots) {
                stmt.execute(params![slot, id])?;
            }
            debug!(parent, children = names.len(), "reordered children");
            Ok(())
        })
    }
}
