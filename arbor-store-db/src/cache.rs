// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Path to identifier cache owned by one store instance.

use std::collections::HashMap;

use arbor_store_core::path;
use tracing::debug;

/// Two-way map between node paths and identifiers of the current workspace.
///
/// Entries are added by reads and inserts. Moves and deletes must call
/// [`IdentifierCache::invalidate_subtree`]; rollbacks clear the whole cache.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    by_path: HashMap<String, String>,
    by_identifier: HashMap<String, String>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identifier(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn path(&self, identifier: &str) -> Option<&str> {
        self.by_identifier.get(identifier).map(String::as_str)
    }

    pub fn insert(&mut self, path: &str, identifier: &str) {
        if let Some(previous) = self.by_path.insert(path.to_owned(), identifier.to_owned())
            && previous != identifier
        {
            self.by_identifier.remove(&previous);
        }
        if let Some(previous) = self
            .by_identifier
            .insert(identifier.to_owned(), path.to_owned())
            && previous != path
        {
            self.by_path.remove(&previous);
        }
    }

    /// Forget `root` and everything below it.
    pub fn invalidate_subtree(&mut self, root: &str) {
        let before = self.by_path.len();
        let by_identifier = &mut self.by_identifier;
        self.by_path.retain(|p, identifier| {
            let stale = p == root || path::is_descendant(p, root);
            if stale {
                by_identifier.remove(identifier.as_str());
            }
            !stale
        });
        debug!(
            root,
            evicted = before - self.by_path.len(),
            "invalidated identifier cache"
        );
    }

    pub fn clear(&mut self) {
        self.by_path.clear();
        self.by_identifier.clear();
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
