// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Namespace registry with a pre-transaction snapshot.

use arbor_store_core::NamespaceMap;
use arbor_store_core::namespace::{core_namespaces, is_core_prefix, is_core_uri};
use arbor_store_core::path;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::connection::ContentStore;
use crate::error::{Error, Result};

#[derive(Debug)]
pub(crate) struct NamespaceRegistry {
    map: NamespaceMap,
    /// Mapping as it was before the first change in the open explicit
    /// transaction.
    snapshot: Option<NamespaceMap>,
}

impl NamespaceRegistry {
    pub(crate) fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            map: read_map(conn)?,
            snapshot: None,
        })
    }

    pub(crate) fn map(&self) -> &NamespaceMap {
        &self.map
    }

    pub(crate) fn is_registered(&self, prefix: &str) -> bool {
        self.map.contains_key(prefix)
    }

    fn snapshot_once(&mut self, in_transaction: bool) {
        if in_transaction && self.snapshot.is_none() {
            self.snapshot = Some(self.map.clone());
        }
    }

    /// Put back the mapping captured before the transaction changed it.
    pub(crate) fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.map = snapshot;
        }
    }

    pub(crate) fn discard_snapshot(&mut self) {
        self.snapshot = None;
    }

    pub(crate) fn reload(&mut self, conn: &Connection) -> Result<()> {
        self.map = read_map(conn)?;
        Ok(())
    }
}

fn read_map(conn: &Connection) -> Result<NamespaceMap> {
    let mut map = core_namespaces();
    let mut stmt = conn.prepare_cached("SELECT prefix, uri FROM namespaces")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        let (prefix, uri) = row?;
        map.insert(prefix, uri);
    }
    Ok(map)
}

fn check_prefix(prefix: &str) -> Result<()> {
    if is_core_prefix(prefix) {
        return Err(Error::Namespace(format!(
            "core prefix '{prefix}' cannot be changed"
        )));
    }
    if prefix.to_ascii_lowercase().starts_with("xml") {
        return Err(Error::Namespace(format!("prefix '{prefix}' is reserved")));
    }
    if prefix.contains(':') || path::validate_name(prefix, |_| true).is_err() {
        return Err(Error::Namespace(format!("'{prefix}' is not a valid prefix")));
    }
    Ok(())
}

impl ContentStore {
    /// Map `prefix` to `uri`, replacing any previous binding of either.
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        check_prefix(prefix)?;
        if uri.is_empty() || is_core_uri(uri) {
            return Err(Error::Namespace(format!(
                "URI '{uri}' cannot be bound to '{prefix}'"
            )));
        }
        if self.namespaces.map.get(prefix).is_some_and(|u| u == uri) {
            return Ok(());
        }

        self.write_batch(|store| {
            store.conn.execute(
                "DELETE FROM namespaces WHERE prefix = ?1 OR uri = ?2",
                params![prefix, uri],
            )?;
            store.conn.execute(
                "INSERT INTO namespaces (prefix, uri) VALUES (?1, ?2)",
                params![prefix, uri],
            )?;
            Ok(())
        })?;

        let in_transaction = self.tx.explicit;
        let registry = &mut self.namespaces;
        registry.snapshot_once(in_transaction);
        registry.map.retain(|_, u| u != uri);
        registry.map.insert(prefix.to_owned(), uri.to_owned());
        debug!(prefix, uri, "registered namespace");
        Ok(())
    }

    pub fn unregister_namespace(&mut self, prefix: &str) -> Result<()> {
        if is_core_prefix(prefix) {
            return Err(Error::Namespace(format!(
                "core prefix '{prefix}' cannot be removed"
            )));
        }
        if !self.namespaces.is_registered(prefix) {
            return Err(Error::NotFound(format!("namespace prefix '{prefix}'")));
        }

        self.write_batch(|store| {
            store
                .conn
                .execute("DELETE FROM namespaces WHERE prefix = ?1", params![prefix])?;
            Ok(())
        })?;

        let in_transaction = self.tx.explicit;
        self.namespaces.snapshot_once(in_transaction);
        self.namespaces.map.remove(prefix);
        debug!(prefix, "unregistered namespace");
        Ok(())
    }

    /// Every registered prefix, core prefixes included.
    pub fn namespaces(&self) -> &NamespaceMap {
        self.namespaces.map()
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.map.get(prefix).map(String::as_str)
    }

    /// Check a node path against the registered prefixes.
    pub(crate) fn validate_path(&self, node_path: &str) -> Result<()> {
        path::validate(node_path, |p| self.namespaces.is_registered(p))?;
        Ok(())
    }
}
