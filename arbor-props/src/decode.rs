// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

use std::fmt;

use arbor_store_core::{Binary, Property, PropertySet, PropertyType, Value};
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};

use crate::encode::Record;
use crate::error::{CodecError, Result};

/// Visits a property document, materializing only the wanted members.
struct DocumentSeed<'a> {
    only: Option<&'a [&'a str]>,
}

impl<'de> DeserializeSeed<'de> for DocumentSeed<'_> {
    type Value = Vec<(String, Record)>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for DocumentSeed<'_> {
    type Value = Vec<(String, Record)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a property document object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut records = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            if self.only.is_none_or(|names| names.contains(&name.as_str())) {
                let record = map.next_value::<Record>()?;
                records.push((name, record));
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(records)
    }
}

/// Decode a property document.
///
/// With `only`, members not named there are skipped without being parsed
/// into values; names that are absent from the document are ignored.
pub fn decode(document: &str, only: Option<&[&str]>) -> Result<PropertySet> {
    let mut deserializer = serde_json::Deserializer::from_str(document);
    let records = DocumentSeed { only }.deserialize(&mut deserializer)?;
    deserializer.end()?;

    records
        .into_iter()
        .map(|(name, record)| into_property(name, record))
        .collect()
}

fn into_property(name: String, record: Record) -> Result<Property> {
    let ptype: PropertyType = match record.ptype.parse() {
        Ok(ptype) => ptype,
        Err(_) => {
            return Err(CodecError::UnknownType {
                property: name,
                tag: record.ptype,
            });
        }
    };

    let values = if ptype == PropertyType::Binary {
        record
            .lengths
            .iter()
            .map(|len| Value::Binary(Binary::stored(*len)))
            .collect()
    } else {
        match record
            .values
            .iter()
            .map(|text| Value::parse(ptype, text))
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            Ok(values) => values,
            Err(source) => return Err(CodecError::Value { property: name, source }),
        }
    };

    Ok(Property {
        name,
        ptype,
        multiple: record.multiple,
        values,
    })
}
