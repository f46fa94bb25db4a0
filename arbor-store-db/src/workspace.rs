// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Workspace lifecycle and the session's current workspace.

use arbor_store_core::node::new_identifier;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::connection::ContentStore;
use crate::error::{Error, Result, exists_on_conflict};

/// Workspace every store is logged in to after opening.
pub const DEFAULT_WORKSPACE: &str = "default";

/// Primary type given to workspace roots.
pub const ROOT_TYPE: &str = "nt:unstructured";

fn insert_root(conn: &Connection, workspace: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO nodes (identifier, path, parent, local_name, namespace, type,
                           workspace_name, props, numerical_props, depth, sort_order)
        VALUES (?1, '/', NULL, '', '', ?2, ?3, '{}', NULL, 0, 0)
        "#,
        params![new_identifier(), ROOT_TYPE, workspace],
    )
    .map_err(exists_on_conflict("/"))?;
    Ok(())
}

impl ContentStore {
    /// Create a workspace together with its root node.
    pub fn create_workspace(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::ConstraintViolation(
                "workspace name must not be empty".into(),
            ));
        }
        self.write_batch(|store| {
            store
                .conn
                .execute("INSERT INTO workspaces (name) VALUES (?1)", params![name])
                .map_err(exists_on_conflict(name))?;
            insert_root(&store.conn, name)
        })?;
        info!(workspace = name, "created workspace");
        Ok(())
    }

    pub(crate) fn ensure_workspace(&mut self, name: &str) -> Result<()> {
        if !self.workspace_exists(name)? {
            self.create_workspace(name)?;
        }
        Ok(())
    }

    /// Delete a workspace with all of its nodes, binaries and edges.
    ///
    /// The session is logged out when it was using the workspace.
    pub fn delete_workspace(&mut self, name: &str) -> Result<()> {
        if !self.workspace_exists(name)? {
            return Err(Error::NotFound(format!("workspace '{name}'")));
        }
        self.write_batch(|store| {
            for table in ["\"references\"", "weak_references"] {
                store.conn.execute(
                    &format!(
                        "DELETE FROM {table} WHERE source_id IN \
                         (SELECT id FROM nodes WHERE workspace_name = ?1) \
                         OR target_id IN (SELECT id FROM nodes WHERE workspace_name = ?1)"
                    ),
                    params![name],
                )?;
            }
            store
                .conn
                .execute("DELETE FROM binary_data WHERE workspace_name = ?1", params![name])?;
            store
                .conn
                .execute("DELETE FROM nodes WHERE workspace_name = ?1", params![name])?;
            store
                .conn
                .execute("DELETE FROM workspaces WHERE name = ?1", params![name])?;
            Ok(())
        })?;

        if self.workspace.as_deref() == Some(name) {
            self.logout();
        }
        info!(workspace = name, "deleted workspace");
        Ok(())
    }

    pub fn list_workspaces(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name FROM workspaces ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn workspace_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM workspaces WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Switch the session to `name`. Existence is checked on first use.
    pub fn login(&mut self, name: &str) -> Result<()> {
        if self.tx.batch {
            return Err(Error::Usage(
                "cannot switch workspaces while a save batch is open".into(),
            ));
        }
        self.workspace = Some(name.to_owned());
        self.workspace_checked.set(false);
        self.cache.get_mut().clear();
        Ok(())
    }

    pub fn logout(&mut self) {
        self.workspace = None;
        self.workspace_checked.set(false);
        self.cache.get_mut().clear();
    }

    /// Name of the workspace the session is logged in to.
    pub fn current_workspace(&self) -> Result<&str> {
        let Some(name) = self.workspace.as_deref() else {
            return Err(Error::Usage("not logged in to a workspace".into()));
        };
        if !self.workspace_checked.get() {
            if !self.workspace_exists(name)? {
                return Err(Error::NotFound(format!("workspace '{name}'")));
            }
            self.workspace_checked.set(true);
        }
        Ok(name)
    }

    pub fn clone_from(
        &mut self,
        _source_workspace: &str,
        _source_path: &str,
        _destination_path: &str,
        _remove_existing: bool,
    ) -> Result<()> {
        Err(Error::NotImplemented("cloning between workspaces"))
    }

    pub fn update_node_from_source(&mut self, _path: &str, _source_workspace: &str) -> Result<()> {
        Err(Error::NotImplemented("updating a node from another workspace"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut store = ContentStore::open_memory().unwrap();
        store.create_workspace("drafts").unwrap();
        assert_eq!(store.list_workspaces().unwrap(), ["default", "drafts"]);
        assert!(matches!(
            store.create_workspace("drafts"),
            Err(Error::ItemExists(name)) if name == "drafts"
        ));

        store.login("drafts").unwrap();
        assert!(store.node_exists("/").unwrap());

        store.delete_workspace("drafts").unwrap();
        assert!(matches!(store.current_workspace(), Err(Error::Usage(_))));
        assert!(matches!(
            store.delete_workspace("drafts"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn login_is_checked_lazily() {
        let mut store = ContentStore::open_memory().unwrap();
        store.login("nowhere").unwrap();
        assert!(matches!(store.current_workspace(), Err(Error::NotFound(_))));
        store.create_workspace("nowhere").unwrap();
        assert_eq!(store.current_workspace().unwrap(), "nowhere");
    }

    #[test]
    fn unsupported_operations() {
        let mut store = ContentStore::open_memory().unwrap();
        assert!(matches!(
            store.clone_from("a", "/x", "/y", false),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            store.update_node_from_source("/x", "a"),
            Err(Error::NotImplemented(_))
        ));
    }
}
