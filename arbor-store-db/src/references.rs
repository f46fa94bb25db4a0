// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Reference edge maintenance.
//!
//! Edges are derived from the property documents: a strong edge must point
//! at an existing node of the same workspace, a weak edge is recorded only
//! when its target exists. Deleting a node that is still the target of a
//! strong edge from a surviving node is refused.

use std::collections::BTreeMap;

use arbor_store_core::node::is_identifier;
use arbor_store_core::{PropertyType, path};
use rusqlite::{OptionalExtension, params, params_from_iter};
use tracing::{debug, warn};

use crate::chunk::{chunks, placeholders};
use crate::connection::ContentStore;
use crate::error::{Error, Result};

const STRONG: &str = "\"references\"";
const WEAK: &str = "weak_references";

impl ContentStore {
    /// Apply the staged reference work: re-derive edges of updated rows,
    /// then validate deletions. Clears the staged maps on success only.
    pub(crate) fn flush_references(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let workspace = self.current_workspace()?.to_owned();
        let pending: Vec<i64> = self
            .staged
            .references
            .iter()
            .filter(|id| !self.staged.deletions.contains_key(id))
            .copied()
            .collect();

        self.synchronize(&workspace, &pending)?;
        self.validate_deletions(&self.staged.deletions)?;
        self.staged.clear();
        Ok(())
    }

    fn delete_edges_from(&self, table: &str, ids: &[i64]) -> Result<()> {
        for chunk in chunks(ids, 0) {
            self.conn.execute(
                &format!(
                    "DELETE FROM {table} WHERE source_id IN ({})",
                    placeholders(self.dialect, 1, chunk.len())
                ),
                params_from_iter(chunk),
            )?;
        }
        Ok(())
    }

    fn resolve(&self, workspace: &str, target: &str) -> Result<Option<i64>> {
        let column = if is_identifier(target) {
            "identifier"
        } else if target.starts_with('/') {
            "path"
        } else {
            return Ok(None);
        };
        let id = self
            .conn
            .prepare_cached(&format!(
                "SELECT id FROM nodes WHERE workspace_name = ?1 AND {column} = ?2"
            ))?
            .query_row(params![workspace, target], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    /// Replace the outgoing edges of `rows` with the ones their documents hold.
    pub(crate) fn synchronize(&self, workspace: &str, rows: &[i64]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.delete_edges_from(STRONG, rows)?;
        self.delete_edges_from(WEAK, rows)?;

        for &id in rows {
            let found: Option<(String, String)> = self
                .conn
                .prepare_cached("SELECT path, props FROM nodes WHERE id = ?1")?
                .query_row(params![id], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;
            let Some((source, document)) = found else {
                continue;
            };

            for property in arbor_props::decode(&document, None)?.iter() {
                let weak = match property.ptype {
                    PropertyType::Reference => false,
                    PropertyType::WeakReference => true,
                    _ => continue,
                };
                for target in property.reference_targets() {
                    match self.resolve(workspace, target)? {
                        Some(target_id) => {
                            let table = if weak { WEAK } else { STRONG };
                            self.conn
                                .prepare_cached(&format!(
                                    "INSERT OR IGNORE INTO {table} \
                                     (source_id, source_property_name, target_id) VALUES (?1, ?2, ?3)"
                                ))?
                                .execute(params![id, property.name, target_id])?;
                        }
                        None if weak => {}
                        None => {
                            let property_path = path::join(&source, &property.name);
                            return Err(Error::ReferentialIntegrity {
                                message: format!("{property_path} references missing node {target}"),
                                paths: vec![property_path],
                            });
                        }
                    }
                }
            }
        }
        debug!(rows = rows.len(), "synchronized reference edges");
        Ok(())
    }

    /// Refuse deletions that would leave strong references dangling, and purge
    /// weak edges into the deleted rows.
    pub(crate) fn validate_deletions(&self, deleted: &BTreeMap<i64, String>) -> Result<()> {
        if deleted.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = deleted.keys().copied().collect();
        self.delete_edges_from(STRONG, &ids)?;
        self.delete_edges_from(WEAK, &ids)?;

        let mut blocking = Vec::new();
        let mut targets = Vec::new();
        for chunk in chunks(&ids, 0) {
            let sql = format!(
                "SELECT n.path, r.source_property_name, r.target_id FROM {STRONG} r \
                 JOIN nodes n ON n.id = r.source_id \
                 WHERE r.target_id IN ({}) ORDER BY n.path, r.source_property_name",
                placeholders(self.dialect, 1, chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            for row in rows {
                let (source, property, target) = row?;
                blocking.push(path::join(&source, &property));
                if let Some(target_path) = deleted.get(&target)
                    && !targets.contains(target_path)
                {
                    targets.push(target_path.clone());
                }
            }
        }

        if !blocking.is_empty() {
            warn!(?targets, referrers = ?blocking, "refusing to delete referenced nodes");
            return Err(Error::ReferentialIntegrity {
                message: format!("{} still referenced", targets.join(", ")),
                paths: blocking,
            });
        }

        for chunk in chunks(&ids, 0) {
            self.conn.execute(
                &format!(
                    "DELETE FROM {WEAK} WHERE target_id IN ({})",
                    placeholders(self.dialect, 1, chunk.len())
                ),
                params_from_iter(chunk),
            )?;
        }
        Ok(())
    }
}
