// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Property document codec.
//!
//! A node's properties are persisted as two JSON documents:
//!
//! - the **property document**, one member per property in insertion order:
//!
//!   ```json
//!   {"title": {"type": "String", "multiple": false, "lengths": [5], "values": ["hello"]}}
//!   ```
//!
//!   Binary members keep their byte lengths but no values; the payloads are
//!   returned beside the document and stored out of line.
//!
//! - the **numeric document**, holding only LONG, DOUBLE and DECIMAL
//!   properties as `{"name": [values]}` so range predicates can compare
//!   numbers without parsing the property document as text. It is absent
//!   when a node has no numeric property.
//!
//! The layout constants below are shared with the query compiler, which
//! addresses values by JSON path.

mod decode;
mod encode;
mod error;

pub use decode::decode;
pub use encode::{BinaryPayload, EncodedProperties, ReferenceEdge, encode, rewrite_references};
pub use error::{CodecError, Result};

/// Member holding the type tag of a property record.
pub const TYPE_KEY: &str = "type";
/// Member holding the multiplicity flag of a property record.
pub const MULTIPLE_KEY: &str = "multiple";
/// Member holding per-value lengths of a property record.
pub const LENGTHS_KEY: &str = "lengths";
/// Member holding the canonical text values of a property record.
pub const VALUES_KEY: &str = "values";

/// True when `name` can be embedded as a quoted member in a JSON path
/// expression (`$."name"`) on every supported engine.
pub fn is_addressable(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| matches!(c, '"' | '\\' | '\'') || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressable_names() {
        assert!(is_addressable("jcr:title"));
        assert!(is_addressable("my prop"));
        assert!(!is_addressable(""));
        assert!(!is_addressable("a\"b"));
        assert!(!is_addressable("it's"));
    }
}
