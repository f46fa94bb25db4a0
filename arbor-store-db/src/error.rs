// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Error types for content store operations.

use std::path::PathBuf;

use arbor_props::CodecError;
use arbor_query::QueryError;
use arbor_store_core::PathError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for content store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during content store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing path, identifier, property or workspace
    #[error("Not found: {0}")]
    NotFound(String),

    /// Path collision
    #[error("Item already exists: {0}")]
    ItemExists(String),

    /// Disallowed structural change, e.g. deleting the root
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Unregistered prefix or an attempt to change a core namespace
    #[error("Namespace error: {0}")]
    Namespace(String),

    /// Dangling strong reference on write, or a referenced node on delete
    #[error("Referential integrity violation: {message}")]
    ReferentialIntegrity {
        message: String,
        /// Property paths of the offending references
        paths: Vec<String>,
    },

    /// Query that cannot be compiled
    #[error("Invalid query: {0}")]
    InvalidQuery(#[source] QueryError),

    /// Explicitly unsupported feature
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// API misuse: no workspace, nested transaction, save without a batch
    #[error("Usage error: {0}")]
    Usage(String),

    /// The engine refused the operation
    #[error("Access denied: {0}")]
    AccessDenied(#[source] rusqlite::Error),

    /// Any other backend failure
    #[error("Repository error: {0}")]
    Repository(#[source] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Database file not found
    #[error("Database not found at: {0}")]
    DatabaseNotFound(PathBuf),

    /// Invalid node or property path
    #[error("Invalid path: {0}")]
    Path(PathError),

    /// Stored or submitted property document is unusable
    #[error("Property codec error: {0}")]
    Codec(#[from] CodecError),

    /// Stored node-type column that is not valid JSON
    #[error("Corrupt node type definition: {0}")]
    Definition(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                ErrorCode::PermissionDenied
                | ErrorCode::AuthorizationForStatementDenied
                | ErrorCode::ReadOnly,
            ) => Self::AccessDenied(e),
            _ => Self::Repository(e),
        }
    }
}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        match e {
            PathError::UnknownPrefix { .. } => Self::Namespace(e.to_string()),
            other => Self::Path(other),
        }
    }
}

impl From<QueryError> for Error {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Namespace { .. } => Self::Namespace(e.to_string()),
            QueryError::Codec(codec) => Self::Codec(codec),
            other => Self::InvalidQuery(other),
        }
    }
}

/// True for UNIQUE and PRIMARY KEY constraint failures.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Map a UNIQUE violation on `what` to [`Error::ItemExists`].
pub(crate) fn exists_on_conflict(what: &str) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |e| {
        if is_unique_violation(&e) {
            Error::ItemExists(what.to_owned())
        } else {
            e.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn backend_codes_are_translated() {
        assert!(matches!(
            Error::from(failure(rusqlite::ffi::SQLITE_READONLY)),
            Error::AccessDenied(_)
        ));
        assert!(matches!(
            Error::from(failure(rusqlite::ffi::SQLITE_AUTH)),
            Error::AccessDenied(_)
        ));
        assert!(matches!(
            Error::from(failure(rusqlite::ffi::SQLITE_BUSY)),
            Error::Repository(_)
        ));
    }

    #[test]
    fn unique_violation_becomes_item_exists() {
        let e = failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE);
        assert!(is_unique_violation(&e));
        assert!(matches!(exists_on_conflict("/a")(e), Error::ItemExists(p) if p == "/a"));
    }

    #[test]
    fn unknown_prefix_is_a_namespace_error() {
        let e = PathError::UnknownPrefix {
            name: "x:y".into(),
            prefix: "x".into(),
        };
        assert!(matches!(Error::from(e), Error::Namespace(_)));
        assert!(matches!(
            Error::from(PathError::NotAbsolute("a".into())),
            Error::Path(_)
        ));
    }
}
