// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Absolute node paths.
//!
//! A path is `/` for the root, otherwise a `/`-separated list of qualified
//! names (`prefix:local` or `local`). Paths are plain `&str` values; the
//! helpers here never allocate unless they have to build a new path.

use thiserror::Error;

/// The reserved root path.
pub const ROOT: &str = "/";

/// Characters that may never appear in a local name.
const FORBIDDEN: &[char] = &['/', ':', '[', ']', '|', '*'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path '{0}' is not absolute")]
    NotAbsolute(String),
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),
    #[error("path '{path}' contains the relative segment '{segment}'")]
    RelativeSegment { path: String, segment: String },
    #[error("name '{name}' contains the forbidden character {symbol:?}")]
    InvalidCharacter { name: String, symbol: char },
    #[error("name '{0}' uses a same-name sibling index, which is not supported")]
    SameNameSibling(String),
    #[error("namespace prefix '{prefix}' in '{name}' is not registered")]
    UnknownPrefix { name: String, prefix: String },
    #[error("'{0}' is not a valid name")]
    InvalidName(String),
}

/// Validate an absolute path against the registered namespace prefixes.
pub fn validate(path: &str, is_registered: impl Fn(&str) -> bool) -> Result<(), PathError> {
    if !path.starts_with('/') {
        return Err(PathError::NotAbsolute(path.to_owned()));
    }
    if path == ROOT {
        return Ok(());
    }
    for segment in path[1..].split('/') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(path.to_owned()));
        }
        if segment == "." || segment == ".." {
            return Err(PathError::RelativeSegment {
                path: path.to_owned(),
                segment: segment.to_owned(),
            });
        }
        validate_name(segment, &is_registered)?;
    }
    Ok(())
}

/// Validate a single qualified name (node or property name).
pub fn validate_name(name: &str, is_registered: impl Fn(&str) -> bool) -> Result<(), PathError> {
    if name.ends_with(']') && name.contains('[') {
        return Err(PathError::SameNameSibling(name.to_owned()));
    }
    let (prefix, local) = split_name(name);
    if local.is_empty() || local.trim().is_empty() {
        return Err(PathError::InvalidName(name.to_owned()));
    }
    if let Some(symbol) = local.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(PathError::InvalidCharacter {
            name: name.to_owned(),
            symbol,
        });
    }
    if !prefix.is_empty() {
        if let Some(symbol) = prefix.chars().find(|c| FORBIDDEN.contains(c)) {
            return Err(PathError::InvalidCharacter {
                name: name.to_owned(),
                symbol,
            });
        }
        if !is_registered(prefix) {
            return Err(PathError::UnknownPrefix {
                name: name.to_owned(),
                prefix: prefix.to_owned(),
            });
        }
    }
    Ok(())
}

/// Split a qualified name into `(prefix, local_name)`; the prefix is empty
/// when the name is unqualified.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", name),
    }
}

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Parent path, `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of the path (empty for the root).
pub fn name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Number of segments; 0 for the root.
pub fn depth(path: &str) -> usize {
    if is_root(path) {
        0
    } else {
        path.matches('/').count()
    }
}

pub fn join(parent: &str, name: &str) -> String {
    if is_root(parent) {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// True when `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if is_root(ancestor) {
        return !is_root(path) && path.starts_with('/');
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// `path` relative to `ancestor`, without a leading slash. `None` when the
/// path is not inside the ancestor's subtree; `Some("")` for the ancestor.
pub fn relative<'a>(path: &'a str, ancestor: &str) -> Option<&'a str> {
    if path == ancestor {
        Some("")
    } else if is_descendant(path, ancestor) {
        let offset = if is_root(ancestor) { 1 } else { ancestor.len() + 1 };
        Some(&path[offset..])
    } else {
        None
    }
}

/// Replace the `from` prefix of `path` with `to`.
///
/// `path` must be `from` or one of its descendants.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    match relative(path, from) {
        Some("") => to.to_owned(),
        Some(rest) => join(to, rest),
        None => path.to_owned(),
    }
}

/// Half-open text range `[lower, upper)` containing every strict descendant
/// of `path` under binary collation.
///
/// For the root the range also contains the root itself.
pub fn subtree_bounds(path: &str) -> (String, String) {
    if is_root(path) {
        // '0' is the successor of '/'
        (ROOT.to_owned(), "0".to_owned())
    } else {
        (format!("{path}/"), format!("{path}0"))
    }
}

/// Split a property path into `(node_path, property_name)`.
pub fn split_property_path(path: &str) -> Option<(&str, &str)> {
    let node = parent(path)?;
    let property = name(path);
    if property.is_empty() {
        None
    } else {
        Some((node, property))
    }
}
