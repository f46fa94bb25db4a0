// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use arbor_store_core::{Property, PropertySet, PropertyType, Value};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// One member of the property document.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Record {
    #[serde(rename = "type")]
    pub(crate) ptype: String,
    pub(crate) multiple: bool,
    pub(crate) lengths: Vec<u64>,
    pub(crate) values: Vec<String>,
}

/// Binary payload split off the property document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub property: String,
    /// Position of the value within its property.
    pub index: usize,
    pub data: Vec<u8>,
}

/// Reference value found while encoding, still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEdge {
    pub property: String,
    /// Identifier or absolute path of the target node.
    pub target: String,
    pub weak: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedProperties {
    pub document: String,
    /// `None` when no LONG, DOUBLE or DECIMAL property is present.
    pub numeric_document: Option<String>,
    pub binaries: Vec<BinaryPayload>,
    pub references: Vec<ReferenceEdge>,
}

struct Document<'a>(&'a [(&'a str, Record)]);

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, record) in self.0 {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

/// Encode `properties` into the two documents plus side channels.
pub fn encode(properties: &PropertySet) -> Result<EncodedProperties> {
    let mut records = Vec::with_capacity(properties.len());
    let mut numeric = serde_json::Map::new();
    let mut binaries = Vec::new();
    let mut references = Vec::new();

    for property in properties {
        check(property)?;

        let mut record = Record {
            ptype: property.ptype.to_string(),
            multiple: property.multiple,
            lengths: Vec::with_capacity(property.values.len()),
            values: Vec::with_capacity(property.values.len()),
        };

        for (index, value) in property.values.iter().enumerate() {
            record.lengths.push(value.length());
            match value {
                Value::Binary(binary) => {
                    if let Some(data) = binary.data() {
                        binaries.push(BinaryPayload {
                            property: property.name.clone(),
                            index,
                            data: data.to_vec(),
                        });
                    }
                }
                other => record.values.push(other.to_text()),
            }
            if let Some(target) = value.reference_target() {
                references.push(ReferenceEdge {
                    property: property.name.clone(),
                    target: target.to_owned(),
                    weak: property.ptype == PropertyType::WeakReference,
                });
            }
        }

        if property.ptype.is_numeric() {
            let values = property.values.iter().map(numeric_value).collect();
            numeric.insert(property.name.clone(), serde_json::Value::Array(values));
        }

        records.push((property.name.as_str(), record));
    }

    let document = serde_json::to_string(&Document(&records))?;
    let numeric_document = if numeric.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&numeric)?)
    };

    Ok(EncodedProperties {
        document,
        numeric_document,
        binaries,
        references,
    })
}

fn check(property: &Property) -> Result<()> {
    if !property.multiple && property.values.len() != 1 {
        return Err(CodecError::Cardinality {
            property: property.name.clone(),
            count: property.values.len(),
        });
    }
    match property
        .values
        .iter()
        .find(|v| v.property_type() != property.ptype)
    {
        Some(value) => Err(CodecError::TypeMismatch {
            property: property.name.clone(),
            declared: property.ptype,
            found: value.property_type(),
        }),
        None => Ok(()),
    }
}

fn numeric_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Long(n) => serde_json::Value::from(*n),
        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.to_text())),
        other => serde_json::Value::String(other.to_text()),
    }
}

/// Replace reference values whose target appears in `mapping`.
///
/// Returns true when at least one value changed.
pub fn rewrite_references(properties: &mut PropertySet, mapping: &HashMap<String, String>) -> bool {
    let mut changed = false;
    for property in properties.iter_mut() {
        for value in &mut property.values {
            if let Value::Reference(target) | Value::WeakReference(target) = value
                && let Some(replacement) = mapping.get(target.as_str())
            {
                *target = replacement.clone();
                changed = true;
            }
        }
    }
    changed
}
