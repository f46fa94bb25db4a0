// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! In-memory node graph returned by reads.

use uuid::Uuid;

use crate::path;
use crate::property::PropertySet;

/// A node with its properties and, for depth-limited reads, its children in
/// sibling order.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub identifier: String,
    pub path: String,
    pub primary_type: String,
    pub properties: PropertySet,
    pub children: Vec<Node>,
}

impl Node {
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    pub fn depth(&self) -> usize {
        path::depth(&self.path)
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name() == name)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.name() == name)
    }

    /// Descendant addressed by a relative path such as `b/c`.
    pub fn find(&self, relative: &str) -> Option<&Node> {
        if relative.is_empty() {
            return Some(self);
        }
        relative
            .split('/')
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Attach `child` below the node addressed by the breadcrumb of its
    /// relative path, e.g. `b/c` attaches `c` under child `b`.
    ///
    /// Returns the child back when an intermediate node is missing.
    pub fn attach(&mut self, child: Node) -> Result<(), Node> {
        let Some(relative) = path::relative(&child.path, &self.path).map(str::to_owned) else {
            return Err(child);
        };
        if relative.is_empty() {
            return Err(child);
        }
        let mut segments: Vec<&str> = relative.split('/').collect();
        segments.pop();
        let mut target: &mut Node = self;
        for segment in segments {
            match target.child_mut(segment) {
                Some(next) => target = next,
                None => return Err(child),
            }
        }
        target.children.push(child);
        Ok(())
    }
}

/// True when `s` is a well-formed UUID; anything else is treated as a path
/// by identifier lookups.
pub fn is_identifier(s: &str) -> bool {
    Uuid::try_parse(s).is_ok()
}

pub fn new_identifier() -> String {
    Uuid::new_v4().to_string()
}
