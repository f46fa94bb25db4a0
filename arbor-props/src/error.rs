// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Error types for the property codec.
//!
//! Every variant indicates either a caller handing over inconsistent data or
//! a corrupted stored document; none is worth retrying.

use arbor_store_core::{PropertyType, ValueError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    /// A value does not match the declared type of its property
    #[error("property '{property}' is declared {declared} but holds a {found} value")]
    TypeMismatch {
        property: String,
        declared: PropertyType,
        found: PropertyType,
    },

    /// A single-valued property without exactly one value
    #[error("single-valued property '{property}' holds {count} values")]
    Cardinality { property: String, count: usize },

    /// The stored document is not valid JSON or not shaped like a document
    #[error("malformed property document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The stored document names a type this codec does not know
    #[error("property '{property}' has unknown type tag '{tag}'")]
    UnknownType { property: String, tag: String },

    /// A stored value does not parse as its declared type
    #[error("property '{property}': {source}")]
    Value {
        property: String,
        #[source]
        source: ValueError,
    },
}
