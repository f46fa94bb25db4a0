// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use arbor_query::Platform;
use arbor_store_db::DEFAULT_WORKSPACE;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Looked up in the working directory when no file is named.
pub const DEFAULT_CONFIG_FILE: &str = "arbor.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the SQLite database
    pub database: PathBuf,

    /// Engine the dumped statements are written for
    pub platform: Platform,

    /// Workspace provisioned next to the default one
    pub workspace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("arbor.sqlite"),
            platform: Platform::Sqlite,
            workspace: DEFAULT_WORKSPACE.to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| CliError::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// The named file, else `arbor.toml` in `dir` if present, else defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let fallback = dir.join(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::from_file(&fallback);
        }
        Ok(Self::default())
    }
}
