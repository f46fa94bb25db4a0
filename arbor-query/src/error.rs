// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Errors raised while compiling a query or assembling its results.

use arbor_props::CodecError;
use arbor_store_core::PathError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("selector '{selector}' uses unknown node type '{node_type}'")]
    UnknownType { selector: String, node_type: String },

    #[error("unknown selector '{0}'")]
    UnknownSelector(String),

    #[error("selector name '{0}' is used more than once")]
    DuplicateSelector(String),

    #[error("the right side of a join must be a selector")]
    NestedJoin,

    #[error("column name '{0}' is reserved")]
    ReservedColumn(String),

    #[error("bind variable '{0}' has no value")]
    UnboundVariable(String),

    #[error("property name '{0}' cannot be used in a query")]
    InvalidPropertyName(String),

    #[error("{0} operands are not supported here")]
    UnsupportedOperand(&'static str),

    #[error("{operator} cannot be applied to a {literal} literal")]
    UnsupportedLiteral {
        operator: &'static str,
        literal: String,
    },

    #[error("namespace prefix '{prefix}' in '{name}' is not registered")]
    Namespace { name: String, prefix: String },

    #[error("invalid path in query: {0}")]
    Path(#[from] PathError),

    #[error("stored properties could not be decoded: {0}")]
    Codec(#[from] CodecError),
}
