// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Mapping between `nodes` rows and [`Node`] values.

use arbor_store_core::{Node, path};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

use crate::connection::ContentStore;
use crate::error::Result;

/// Columns read by [`NodeRow::from_row`], in order.
pub(crate) const NODE_COLUMNS: &str = "identifier, path, type, props";

#[derive(Debug, Clone)]
pub(crate) struct NodeRow {
    pub(crate) identifier: String,
    pub(crate) path: String,
    pub(crate) primary_type: String,
    pub(crate) props: String,
}

impl NodeRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            identifier: row.get(0)?,
            path: row.get(1)?,
            primary_type: row.get(2)?,
            props: row.get(3)?,
        })
    }

    pub(crate) fn into_node(self) -> Result<Node> {
        Ok(Node {
            properties: arbor_props::decode(&self.props, None)?,
            identifier: self.identifier,
            path: self.path,
            primary_type: self.primary_type,
            children: Vec::new(),
        })
    }
}

/// Nest `rows`, ordered by depth then sort order, below the row at `root`.
///
/// Returns `None` when `root` itself is not among the rows.
pub(crate) fn build_tree(root: &str, rows: impl IntoIterator<Item = NodeRow>) -> Result<Option<Node>> {
    let mut tree: Option<Node> = None;
    for row in rows {
        match tree.as_mut() {
            None if row.path == root => tree = Some(row.into_node()?),
            None => {}
            Some(top) => {
                if let Err(orphan) = top.attach(row.into_node()?) {
                    debug!(path = %orphan.path, "skipping row without a fetched parent");
                }
            }
        }
    }
    Ok(tree)
}

/// Identity of an existing row.
#[derive(Debug, Clone)]
pub(crate) struct RowId {
    pub(crate) id: i64,
    pub(crate) identifier: String,
    pub(crate) props: String,
}

impl ContentStore {
    /// Row at `node_path` in `workspace`, if any.
    pub(crate) fn find_row(&self, workspace: &str, node_path: &str) -> Result<Option<RowId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, identifier, props FROM nodes WHERE workspace_name = ?1 AND path = ?2",
        )?;
        let found = stmt
            .query_row(params![workspace, node_path], |row| {
                Ok(RowId {
                    id: row.get(0)?,
                    identifier: row.get(1)?,
                    props: row.get(2)?,
                })
            })
            .optional()?;
        if let Some(row) = &found {
            self.cache.borrow_mut().insert(node_path, &row.identifier);
        }
        Ok(found)
    }

    /// Next free sibling position below `parent`.
    pub(crate) fn next_sort_order(&self, workspace: &str, parent: &str) -> Result<i64> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM nodes \
             WHERE workspace_name = ?1 AND parent = ?2",
            params![workspace, parent],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}

pub(crate) fn depth_of(node_path: &str) -> i64 {
    path::depth(node_path) as i64
}
