// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Core content tree semantics.
//!
//! This crate provides the fundamental types shared by the codec, the query
//! compiler and the database layer. It is intentionally IO-free: everything
//! here operates on values.
//!
//! # Key Modules
//!
//! - `path` - absolute node paths, segment validation, subtree arithmetic
//! - `value` - property types and typed values with their canonical text form
//! - `property` - named properties and ordered property sets
//! - `node` - the nested node graph returned by reads
//! - `namespace` - the core namespace prefixes
//! - `node_type` - node type definitions and the registry consulted by the store

pub mod namespace;
pub mod node;
pub mod node_type;
pub mod path;
pub mod property;
pub mod value;

pub use namespace::NamespaceMap;
pub use node::Node;
pub use node_type::{NodeTypeDefinition, NodeTypeRegistry, StaticTypeRegistry};
pub use path::PathError;
pub use property::{Property, PropertySet};
pub use value::{Binary, PropertyType, Value, ValueError};
