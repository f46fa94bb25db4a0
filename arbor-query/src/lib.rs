// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Structured queries over the Arbor node table.
//!
//! A [`Query`] is compiled by [`QueryCompiler`] into a single SQL statement
//! for one of the supported engines. Running the statement is up to the
//! caller; [`assemble`] then turns the raw rows into a [`QueryResult`].
//!
//! # Key Modules
//!
//! - `qom` - the query object model
//! - `dialect` - per-engine SQL fragments behind the [`Dialect`] trait
//! - `compiler` - selectors, joins, constraints, orderings and paging to SQL
//! - `result` - decoding of the selected property documents into rows

mod compiler;
mod dialect;
mod error;
mod fragment;
pub mod qom;
mod result;

pub use compiler::{
    CompiledQuery, OutputColumn, QueryCompiler, RESERVED_COLUMNS, SELECTOR_COLUMNS,
    SelectorBinding,
};
pub use dialect::{Dialect, Mysql, Platform, Postgres, Sqlite, dialect_for, escape_like};
pub use error::{QueryError, Result};
pub use fragment::{Fragment, SqlParam};
pub use qom::Query;
pub use result::{QueryResult, RawNode, Row, RowEntry, SelectedNode, WILDCARD_EXTRAS, assemble};
