// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use arbor_query::Platform;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] arbor_store_db::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Missing tables in {database}: {}", tables.join(", "))]
    MissingTables { database: PathBuf, tables: Vec<String> },

    #[error("Only sqlite databases can be provisioned directly, not {0}")]
    UnsupportedPlatform(Platform),
}

pub type Result<T> = std::result::Result<T, CliError>;
