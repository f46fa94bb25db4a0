// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Property types and typed values.
//!
//! Every value has a canonical text form used by the property document and
//! by query literals:
//!
//! | type                  | text form                                   |
//! |-----------------------|---------------------------------------------|
//! | `Boolean`             | `1` / `0`                                   |
//! | `Long`                | decimal integer                             |
//! | `Double`              | shortest round-trip form (`2.0`, `1e300`)   |
//! | `Date`                | UTC RFC 3339 with milliseconds              |
//! | `Binary`              | payload length in bytes                     |
//! | everything else       | the string itself                           |

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use derive_more::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum PropertyType {
    #[display("String")]
    String,
    #[display("Binary")]
    Binary,
    #[display("Long")]
    Long,
    #[display("Double")]
    Double,
    #[display("Date")]
    Date,
    #[display("Boolean")]
    Boolean,
    #[display("Name")]
    Name,
    #[display("Path")]
    Path,
    #[display("Reference")]
    Reference,
    #[display("WeakReference")]
    WeakReference,
    #[display("URI")]
    Uri,
    #[display("Decimal")]
    Decimal,
}

impl PropertyType {
    pub const ALL: [PropertyType; 12] = [
        PropertyType::String,
        PropertyType::Binary,
        PropertyType::Long,
        PropertyType::Double,
        PropertyType::Date,
        PropertyType::Boolean,
        PropertyType::Name,
        PropertyType::Path,
        PropertyType::Reference,
        PropertyType::WeakReference,
        PropertyType::Uri,
        PropertyType::Decimal,
    ];

    /// Types mirrored into the numeric document.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PropertyType::Long | PropertyType::Double | PropertyType::Decimal
        )
    }

    pub fn is_reference(self) -> bool {
        matches!(self, PropertyType::Reference | PropertyType::WeakReference)
    }
}

impl FromStr for PropertyType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValueError::UnknownType(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unknown property type '{0}'")]
    UnknownType(String),
    #[error("'{text}' is not a valid {ptype} value: {reason}")]
    Parse {
        ptype: PropertyType,
        text: String,
        reason: String,
    },
    #[error("'{0}' is not a valid decimal")]
    InvalidDecimal(String),
}

/// A binary value: its length, and the payload when it has been loaded or
/// is about to be written.
///
/// Values decoded from a property document only know their length; the
/// payload lives in the binary table and is fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    len: u64,
    data: Option<Vec<u8>>,
}

impl Binary {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            len: data.len() as u64,
            data: Some(data),
        }
    }

    /// A placeholder for a payload already stored out of line.
    pub fn stored(len: u64) -> Self {
        Self { len, data: None }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Binary(Binary),
    Long(i64),
    Double(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
    Name(String),
    Path(String),
    /// Target identifier (or absolute path) of a strong reference.
    Reference(String),
    /// Target identifier (or absolute path) of a weak reference.
    WeakReference(String),
    Uri(String),
    /// Decimal kept in its textual form; validated on construction.
    Decimal(String),
}

impl Value {
    /// Build a date value, normalizing the instant to UTC.
    pub fn date<Tz: TimeZone>(instant: DateTime<Tz>) -> Self {
        Value::Date(instant.with_timezone(&Utc))
    }

    pub fn decimal(text: impl Into<String>) -> Result<Self, ValueError> {
        let text = text.into();
        if is_decimal(text.trim()) {
            Ok(Value::Decimal(text.trim().to_owned()))
        } else {
            Err(ValueError::InvalidDecimal(text))
        }
    }

    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Value::Binary(Binary::new(data.into()))
    }

    pub fn property_type(&self) -> PropertyType {
        match self {
            Value::String(_) => PropertyType::String,
            Value::Binary(_) => PropertyType::Binary,
            Value::Long(_) => PropertyType::Long,
            Value::Double(_) => PropertyType::Double,
            Value::Date(_) => PropertyType::Date,
            Value::Boolean(_) => PropertyType::Boolean,
            Value::Name(_) => PropertyType::Name,
            Value::Path(_) => PropertyType::Path,
            Value::Reference(_) => PropertyType::Reference,
            Value::WeakReference(_) => PropertyType::WeakReference,
            Value::Uri(_) => PropertyType::Uri,
            Value::Decimal(_) => PropertyType::Decimal,
        }
    }

    /// Canonical text form.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s)
            | Value::Name(s)
            | Value::Path(s)
            | Value::Reference(s)
            | Value::WeakReference(s)
            | Value::Uri(s)
            | Value::Decimal(s) => s.clone(),
            Value::Binary(b) => b.len().to_string(),
            Value::Long(n) => n.to_string(),
            Value::Double(d) => format!("{d:?}"),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, false),
            Value::Boolean(true) => "1".to_owned(),
            Value::Boolean(false) => "0".to_owned(),
        }
    }

    /// Length recorded in the property document: bytes for binaries,
    /// characters for everything else.
    pub fn length(&self) -> u64 {
        match self {
            Value::Binary(b) => b.len(),
            other => other.to_text().chars().count() as u64,
        }
    }

    /// Parse the canonical text form of a value of type `ptype`.
    ///
    /// For binaries the text is the stored length and the result is a
    /// payload-less placeholder.
    pub fn parse(ptype: PropertyType, text: &str) -> Result<Self, ValueError> {
        let fail = |reason: String| ValueError::Parse {
            ptype,
            text: text.to_owned(),
            reason,
        };
        Ok(match ptype {
            PropertyType::String => Value::String(text.to_owned()),
            PropertyType::Name => Value::Name(text.to_owned()),
            PropertyType::Path => Value::Path(text.to_owned()),
            PropertyType::Uri => Value::Uri(text.to_owned()),
            PropertyType::Reference => Value::Reference(text.to_owned()),
            PropertyType::WeakReference => Value::WeakReference(text.to_owned()),
            PropertyType::Decimal => Value::decimal(text)?,
            PropertyType::Long => Value::Long(text.parse().map_err(|e| fail(format!("{e}")))?),
            PropertyType::Double => {
                Value::Double(text.parse().map_err(|e| fail(format!("{e}")))?)
            }
            PropertyType::Binary => {
                Value::Binary(Binary::stored(text.parse().map_err(|e| fail(format!("{e}")))?))
            }
            PropertyType::Boolean => match text {
                "1" | "true" => Value::Boolean(true),
                "0" | "false" => Value::Boolean(false),
                _ => return Err(fail("expected 1 or 0".to_owned())),
            },
            PropertyType::Date => Value::Date(
                DateTime::parse_from_rfc3339(text)
                    .map_err(|e| fail(format!("{e}")))?
                    .with_timezone(&Utc),
            ),
        })
    }

    /// Reference target for `Reference` and `WeakReference` values.
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            Value::Reference(t) | Value::WeakReference(t) => Some(t),
            _ => None,
        }
    }
}

fn is_decimal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (s, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = (!int.is_empty() || !frac.is_empty()) && digits(int) && digits(frac);
    let exponent_ok = exponent.is_none_or(|e| {
        let e = e.strip_prefix(['+', '-']).unwrap_or(e);
        !e.is_empty() && digits(e)
    });
    mantissa_ok && exponent_ok
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Value::Boolean(true), "1")]
    #[case(Value::Boolean(false), "0")]
    #[case(Value::Long(-42), "-42")]
    #[case(Value::Double(2.0), "2.0")]
    #[case(Value::Double(0.1), "0.1")]
    #[case(Value::binary(vec![1, 2, 3]), "3")]
    #[case(Value::Decimal("12.50".into()), "12.50")]
    fn canonical_text(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_text(), expected);
    }

    #[test]
    fn dates_normalize_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let value = Value::date(local);
        assert_eq!(value.to_text(), "2024-03-01T10:30:00.000+00:00");
        assert_eq!(
            Value::parse(PropertyType::Date, "2024-03-01T12:30:00+02:00").unwrap(),
            value
        );
    }

    #[rstest]
    #[case("0")]
    #[case("-1.5")]
    #[case(".5")]
    #[case("1e10")]
    #[case("+3.25E-2")]
    fn decimals_accepted(#[case] text: &str) {
        assert!(Value::decimal(text).is_ok(), "{text}");
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1.2.3")]
    #[case("1e")]
    #[case("--1")]
    fn decimals_rejected(#[case] text: &str) {
        assert_eq!(
            Value::decimal(text),
            Err(ValueError::InvalidDecimal(text.to_owned()))
        );
    }

    #[test]
    fn type_names_parse_case_insensitively() {
        assert_eq!("weakreference".parse(), Ok(PropertyType::WeakReference));
        assert_eq!("URI".parse(), Ok(PropertyType::Uri));
        assert_eq!(
            "Blob".parse::<PropertyType>(),
            Err(ValueError::UnknownType("Blob".into()))
        );
    }

    #[test]
    fn binary_parse_yields_placeholder() {
        let value = Value::parse(PropertyType::Binary, "17").unwrap();
        assert_eq!(value, Value::Binary(Binary::stored(17)));
        assert_eq!(value.length(), 17);
    }

    #[test]
    fn boolean_rejects_garbage() {
        assert!(Value::parse(PropertyType::Boolean, "yes").is_err());
    }
}
