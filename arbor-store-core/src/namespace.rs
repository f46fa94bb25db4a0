// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Namespace prefixes.

use std::collections::BTreeMap;

/// Prefix to URI mapping.
pub type NamespaceMap = BTreeMap<String, String>;

/// Prefixes every repository knows; they can be neither remapped nor removed.
pub const CORE_NAMESPACES: [(&str, &str); 6] = [
    ("", ""),
    ("jcr", "http://www.jcp.org/jcr/1.0"),
    ("mix", "http://www.jcp.org/jcr/mix/1.0"),
    ("nt", "http://www.jcp.org/jcr/nt/1.0"),
    ("sv", "http://www.jcp.org/jcr/sv/1.0"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
];

pub fn is_core_prefix(prefix: &str) -> bool {
    CORE_NAMESPACES.iter().any(|(p, _)| *p == prefix)
}

pub fn is_core_uri(uri: &str) -> bool {
    CORE_NAMESPACES.iter().any(|(_, u)| *u == uri)
}

pub fn core_namespaces() -> NamespaceMap {
    CORE_NAMESPACES
        .iter()
        .map(|(p, u)| ((*p).to_owned(), (*u).to_owned()))
        .collect()
}
