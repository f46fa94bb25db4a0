// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Database connection management.

use std::cell::{Cell, Ref, RefCell};
use std::path::Path;

use arbor_query::{Dialect, Platform, dialect_for};
use arbor_store_core::StaticTypeRegistry;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::cache::IdentifierCache;
use crate::error::{Error, Result};
use crate::namespace::NamespaceRegistry;
use crate::node_types;
use crate::schema::SQLITE_SCHEMA_SQL;
use crate::transaction::{Staged, TransactionState};
use crate::workspace::DEFAULT_WORKSPACE;

/// Database open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access; every write fails with `AccessDenied`
    ReadOnly,
    /// Read-write access to an existing database
    ReadWrite,
    /// Create the database and its schema if they don't exist
    Create,
}

/// Content repository backed by one SQLite connection.
///
/// A store is used from one thread at a time; its caches are not shared.
pub struct ContentStore {
    pub(crate) conn: Connection,
    pub(crate) dialect: &'static dyn Dialect,
    pub(crate) workspace: Option<String>,
    /// Set once the logged-in workspace was found to exist.
    pub(crate) workspace_checked: Cell<bool>,
    pub(crate) cache: RefCell<IdentifierCache>,
    pub(crate) namespaces: NamespaceRegistry,
    pub(crate) types: StaticTypeRegistry,
    pub(crate) tx: TransactionState,
    pub(crate) staged: Staged,
}

impl ContentStore {
    /// Open or create a database at a custom path.
    ///
    /// The session starts logged in to the default workspace, which `Create`
    /// provisions when it is missing.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let flags = match mode {
            OpenMode::ReadOnly => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_ONLY
            }
            OpenMode::ReadWrite => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_WRITE
            }
            OpenMode::Create => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        };

        let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::DatabaseOpen {
            path: path.to_owned(),
            source: e,
        })?;

        if mode != OpenMode::ReadOnly {
            configure_pragmas(&conn)?;
        }
        if mode == OpenMode::Create {
            conn.execute_batch(SQLITE_SCHEMA_SQL)?;
        }

        let mut store = Self::with_connection(conn)?;
        if mode == OpenMode::Create {
            store.ensure_workspace(DEFAULT_WORKSPACE)?;
        }

        debug!("Opened database at {} ({:?})", path.display(), mode);
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    ///
    /// The database is initialized with the full schema and the default
    /// workspace.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_pragmas(&conn)?;
        conn.execute_batch(SQLITE_SCHEMA_SQL)?;
        let mut store = Self::with_connection(conn)?;
        store.ensure_workspace(DEFAULT_WORKSPACE)?;
        debug!("Created in-memory database");
        Ok(store)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // Queries rely on LIKE matching case the way `=` does.
        conn.execute_batch("PRAGMA case_sensitive_like = ON;")?;
        let namespaces = NamespaceRegistry::load(&conn)?;
        let mut types = StaticTypeRegistry::with_builtins();
        for definition in node_types::load(&conn)? {
            types.register(definition);
        }
        Ok(Self {
            conn,
            dialect: dialect_for(Platform::Sqlite),
            workspace: Some(DEFAULT_WORKSPACE.to_owned()),
            workspace_checked: Cell::new(false),
            cache: RefCell::new(IdentifierCache::new()),
            namespaces,
            types,
            tx: TransactionState::default(),
            staged: Staged::default(),
        })
    }

    /// Create the database schema.
    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(SQLITE_SCHEMA_SQL)?;
        info!("Created database schema");
        Ok(())
    }

    /// Check if the database has the node table.
    pub fn has_schema(&self) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='nodes'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get raw connection (for advanced usage).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// SQL dialect queries are compiled for.
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Identifier to path cache, for inspection.
    pub fn identifier_cache(&self) -> Ref<'_, IdentifierCache> {
        self.cache.borrow()
    }
}

fn configure_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
        "#,
    )?;
    Ok(())
}
