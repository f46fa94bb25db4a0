// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Schema scripts and their application to a SQLite database.

use std::path::Path;

use arbor_query::Platform;
use arbor_store_db::schema::{TABLES, create_sql, drop_statements};
use arbor_store_db::{ContentStore, OpenMode};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{CliError, Result};

/// Drop statements (when `drop`) followed by the create statements.
pub fn script(platform: Platform, drop: bool) -> String {
    let mut sql = String::new();
    if drop {
        for statement in drop_statements(platform) {
            sql.push_str(&statement);
            sql.push('\n');
        }
    }
    sql.push_str(create_sql(platform));
    sql
}

/// Tables of the schema that `database` does not have.
pub fn missing_tables(database: &Path) -> Result<Vec<String>> {
    if !database.exists() {
        return Ok(TABLES.iter().map(|t| t.to_string()).collect());
    }
    let conn = Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut missing = Vec::new();
    for table in TABLES {
        let found: Option<String> = stmt.query_row([table], |row| row.get(0)).optional()?;
        if found.is_none() {
            missing.push(table.to_string());
        }
    }
    Ok(missing)
}

/// Fail with the tables a drop script would not find.
pub fn check_droppable(database: &Path) -> Result<()> {
    let tables = missing_tables(database)?;
    if tables.is_empty() {
        return Ok(());
    }
    Err(CliError::MissingTables {
        database: database.to_owned(),
        tables,
    })
}

/// Create the schema in the configured database, dropping it first if
/// asked. Tables that cannot be dropped are reported and skipped.
pub fn apply(config: &Config, drop: bool) -> Result<()> {
    if config.platform != Platform::Sqlite {
        return Err(CliError::UnsupportedPlatform(config.platform));
    }
    let database = &config.database;

    if drop && database.exists() {
        let conn = Connection::open(database)?;
        conn.execute_batch("PRAGMA foreign_keys = OFF")?;
        for statement in drop_statements(Platform::Sqlite) {
            match conn.execute_batch(&statement) {
                Ok(()) => info!("{statement}"),
                Err(e) => warn!("Skipping `{statement}`: {e}"),
            }
        }
    }

    let mut store = ContentStore::open(database, OpenMode::Create)?;
    if !store.workspace_exists(&config.workspace)? {
        store.create_workspace(&config.workspace)?;
    }
    info!(
        "Provisioned {} with workspace {}",
        database.display(),
        config.workspace
    );
    Ok(())
}
