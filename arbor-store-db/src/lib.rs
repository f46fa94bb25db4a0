// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! SQLite-backed hierarchical content store.
//!
//! Nodes live in one `nodes` table keyed by workspace and path. Each row
//! carries its properties as a JSON document plus a numeric side document;
//! binary payloads and reference edges are kept in their own tables.
//!
//! # Key Features
//!
//! - Depth-limited subtree reads by path or identifier
//! - Insert, update, delete, move, copy and reorder with reference checks
//! - Savepoint-wrapped writes, save batches and explicit transactions
//! - Namespace and node-type registries persisted with the content
//! - Structured queries compiled by `arbor-query`
//!
//! # Example
//!
//! ```ignore
//! use arbor_store_db::{ContentStore, NewNode, OpenMode};
//!
//! let mut store = ContentStore::open("content.sqlite", OpenMode::Create)?;
//! store.insert_node(NewNode::new("/a", "nt:unstructured"))?;
//! let node = store.get_node("/a", 1)?;
//! println!("{} has {} children", node.path, node.children.len());
//! ```

mod cache;
mod chunk;
mod connection;
mod error;
mod namespace;
mod node_types;
mod read;
mod references;
mod row;
pub mod schema;
mod search;
mod transaction;
mod tree;
mod unsupported;
mod workspace;
mod write;

pub use cache::IdentifierCache;
pub use connection::{ContentStore, OpenMode};
pub use error::{Error, Result};
pub use workspace::{DEFAULT_WORKSPACE, ROOT_TYPE};
pub use write::NewNode;
