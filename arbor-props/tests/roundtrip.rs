// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Encode/decode round-trip over every property type and multiplicity.

use arbor_props::{decode, encode};
use arbor_store_core::{Binary, Property, PropertySet, PropertyType, Value};
use chrono::DateTime;
use proptest::prelude::*;

fn value_strategy(ptype: PropertyType) -> BoxedStrategy<Value> {
    match ptype {
        PropertyType::String => any::<String>().prop_map(Value::String).boxed(),
        PropertyType::Name => "[a-z]{1,8}(:[a-z]{1,8})?".prop_map(Value::Name).boxed(),
        PropertyType::Path => "(/[a-z]{1,6}){0,4}".prop_map(Value::Path).boxed(),
        PropertyType::Uri => "https://[a-z]{1,10}\\.org/[a-z]{0,6}".prop_map(Value::Uri).boxed(),
        PropertyType::Reference => any::<u128>()
            .prop_map(|n| Value::Reference(uuid_text(n)))
            .boxed(),
        PropertyType::WeakReference => any::<u128>()
            .prop_map(|n| Value::WeakReference(uuid_text(n)))
            .boxed(),
        PropertyType::Long => any::<i64>().prop_map(Value::Long).boxed(),
        PropertyType::Double => any::<f64>()
            .prop_filter("finite", |d| d.is_finite())
            .prop_map(Value::Double)
            .boxed(),
        PropertyType::Decimal => (any::<i32>(), 0u32..1_000_000)
            .prop_map(|(int, frac)| Value::Decimal(format!("{int}.{frac}")))
            .boxed(),
        PropertyType::Boolean => any::<bool>().prop_map(Value::Boolean).boxed(),
        PropertyType::Date => (0i64..4_102_444_800_000)
            .prop_filter_map("representable", DateTime::from_timestamp_millis)
            .prop_map(Value::Date)
            .boxed(),
        PropertyType::Binary => proptest::collection::vec(any::<u8>(), 0..64)
            .prop_map(Value::binary)
            .boxed(),
    }
}

fn uuid_text(n: u128) -> String {
    let hex = format!("{n:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}

fn property_strategy() -> impl Strategy<Value = Property> {
    (proptest::sample::select(PropertyType::ALL.to_vec()), any::<bool>())
        .prop_flat_map(|(ptype, multiple)| {
            let count = if multiple { 0..4usize } else { 1..2usize };
            (
                "[a-z]{1,6}(:[a-z]{1,6})?",
                proptest::collection::vec(value_strategy(ptype), count),
            )
                .prop_map(move |(name, values)| Property {
                    name,
                    ptype,
                    multiple,
                    values,
                })
        })
}

/// Binaries come back as length-only placeholders.
fn as_stored(mut property: Property) -> Property {
    for value in &mut property.values {
        if let Value::Binary(binary) = value {
            *binary = Binary::stored(binary.len());
        }
    }
    property
}

proptest! {
    #[test]
    fn decode_inverts_encode(properties in proptest::collection::vec(property_strategy(), 0..6)) {
        let set: PropertySet = properties.into_iter().collect();
        let encoded = encode(&set).unwrap();
        let decoded = decode(&encoded.document, None).unwrap();

        let expected: PropertySet = set.clone().into_iter().map(as_stored).collect();
        prop_assert_eq!(&decoded, &expected);

        for payload in &encoded.binaries {
            let original = &set.get(&payload.property).unwrap().values[payload.index];
            prop_assert_eq!(original.length(), payload.data.len() as u64);
        }
        prop_assert_eq!(
            encoded.numeric_document.is_some(),
            set.iter().any(|p| p.ptype.is_numeric())
        );
    }

    #[test]
    fn reencoding_a_decoded_document_is_stable(properties in proptest::collection::vec(property_strategy(), 0..6)) {
        let set: PropertySet = properties.into_iter().collect();
        let first = encode(&set).unwrap();
        let second = encode(&decode(&first.document, None).unwrap()).unwrap();
        prop_assert_eq!(first.document, second.document);
        prop_assert_eq!(first.numeric_document, second.numeric_document);
        prop_assert!(second.binaries.is_empty());
    }
}
