// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Engine-specific SQL fragments.
//!
//! A [`Dialect`] is picked once per store from its [`Platform`]; the
//! compiler never branches on the engine itself. Property names handed to
//! these methods have already been checked with
//! [`arbor_props::is_addressable`], so they can be quoted verbatim.

use std::fmt;
use std::str::FromStr;

use arbor_props::{LENGTHS_KEY, VALUES_KEY};
use derive_more::Display;
use serde::Deserialize;

use crate::fragment::{Fragment, SqlParam};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[display("sqlite")]
    Sqlite,
    #[display("postgres")]
    #[serde(alias = "postgresql")]
    Postgres,
    #[display("mysql")]
    Mysql,
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Platform::Sqlite),
            "postgres" | "postgresql" => Ok(Platform::Postgres),
            "mysql" => Ok(Platform::Mysql),
            other => Err(format!("unsupported platform '{other}'")),
        }
    }
}

pub trait Dialect: fmt::Debug + Sync {
    fn platform(&self) -> Platform;

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Text of value `index` of `property` in the property document held by
    /// `column`.
    fn extract_value(&self, column: &str, property: &str, index: usize) -> String;

    /// Recorded length of value `index` of `property`.
    fn extract_length(&self, column: &str, property: &str, index: usize) -> String;

    /// First element of `property` in the numeric document held by `column`.
    fn extract_numeric(&self, column: &str, property: &str) -> String;

    /// FROM item yielding one row per value of `property`, exposed as
    /// `alias.value`.
    fn value_elements(&self, column: &str, property: &str, alias: &str) -> String;

    /// FROM item yielding one row per element of `property` in the numeric
    /// document, exposed as `alias.value`.
    fn numeric_elements(&self, column: &str, property: &str, alias: &str) -> String;

    /// FROM items yielding one row per value of every property in the
    /// document, exposed as `alias.value`. `property_alias` names the
    /// intermediate per-property rows.
    fn all_values(&self, column: &str, property_alias: &str, alias: &str) -> String;

    /// True when any numeric value of `property` equals `value`.
    fn numeric_membership(
        &self,
        column: &str,
        property: &str,
        alias: &str,
        value: SqlParam,
    ) -> Fragment {
        let mut f = Fragment::text(format!(
            "EXISTS (SELECT 1 FROM {} WHERE {} = ",
            self.numeric_elements(column, property, alias),
            self.decimal(&format!("{alias}.value")),
        ));
        f.push_str("CAST(")
            .push_param(value)
            .push_str(format!(" AS {}))", self.decimal_type()));
        f
    }

    /// True when the property document in `column` has a member `property`.
    fn property_exists(&self, column: &str, property: &str) -> String;

    fn concat(&self, parts: &[&str]) -> String {
        format!("({})", parts.join(" || "))
    }

    /// [`Dialect::concat`] over fragments that may carry parameters.
    fn concat_fragments(&self, parts: Vec<Fragment>) -> Fragment {
        let mut f = Fragment::text("(");
        f.append(Fragment::join(parts, " || "));
        f.push_str(")");
        f
    }

    /// Case-sensitive prefix test.
    fn starts_with(&self, text: &str, prefix: &str) -> String;

    fn decimal_type(&self) -> &'static str {
        "NUMERIC"
    }

    fn decimal(&self, expr: &str) -> String {
        format!("CAST({expr} AS {})", self.decimal_type())
    }

    /// Force a case-sensitive comparison of `expr`, LIKE included. SQLite
    /// connections get this from `PRAGMA case_sensitive_like`.
    fn case_sensitive(&self, expr: &str) -> String {
        expr.to_owned()
    }

    /// Clause following a pattern built with [`escape_like`], with its
    /// leading space.
    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    /// Row locking clause appended to a SELECT, with its leading space.
    fn for_update(&self) -> &'static str {
        " FOR UPDATE"
    }

    /// Paging clause with its leading space; empty without limit and offset.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

pub fn dialect_for(platform: Platform) -> &'static dyn Dialect {
    match platform {
        Platform::Sqlite => &Sqlite,
        Platform::Postgres => &Postgres,
        Platform::Mysql => &Mysql,
    }
}

/// Escape the LIKE wildcards in `text` so it matches literally.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn json_path(property: &str, rest: &str) -> String {
    format!("'$.\"{property}\"{rest}'")
}

/// Paging for engines that need a LIMIT before any OFFSET.
fn limit_with_max(limit: Option<u64>, offset: Option<u64>, max: u64) -> String {
    match (limit, offset) {
        (None, None) => String::new(),
        (Some(limit), None) => format!(" LIMIT {}", limit.min(max)),
        (limit, Some(offset)) => format!(
            " LIMIT {} OFFSET {}",
            limit.unwrap_or(max).min(max),
            offset.min(max)
        ),
    }
}

impl Dialect for Sqlite {
    fn platform(&self) -> Platform {
        Platform::Sqlite
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn extract_value(&self, column: &str, property: &str, index: usize) -> String {
        format!(
            "json_extract({column}, {})",
            json_path(property, &format!(".{VALUES_KEY}[{index}]"))
        )
    }

    fn extract_length(&self, column: &str, property: &str, index: usize) -> String {
        format!(
            "json_extract({column}, {})",
            json_path(property, &format!(".{LENGTHS_KEY}[{index}]"))
        )
    }

    fn extract_numeric(&self, column: &str, property: &str) -> String {
        format!("json_extract({column}, {})", json_path(property, "[0]"))
    }

    fn value_elements(&self, column: &str, property: &str, alias: &str) -> String {
        format!(
            "json_each({column}, {}) AS {alias}",
            json_path(property, &format!(".{VALUES_KEY}"))
        )
    }

    fn numeric_elements(&self, column: &str, property: &str, alias: &str) -> String {
        format!("json_each({column}, {}) AS {alias}", json_path(property, ""))
    }

    fn all_values(&self, column: &str, property_alias: &str, alias: &str) -> String {
        format!(
            "json_each({column}) AS {property_alias}, json_each({property_alias}.value, '$.{VALUES_KEY}') AS {alias}"
        )
    }

    fn property_exists(&self, column: &str, property: &str) -> String {
        format!(
            "json_type({column}, {}) IS NOT NULL",
            json_path(property, "")
        )
    }

    fn starts_with(&self, text: &str, prefix: &str) -> String {
        format!("substr({text}, 1, length({prefix})) = {prefix}")
    }

    fn for_update(&self) -> &'static str {
        ""
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        limit_with_max(limit, offset, i64::MAX as u64)
    }
}

impl Dialect for Postgres {
    fn platform(&self) -> Platform {
        Platform::Postgres
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn extract_value(&self, column: &str, property: &str, index: usize) -> String {
        format!("({column} -> '{property}' -> '{VALUES_KEY}' ->> {index})")
    }

    fn extract_length(&self, column: &str, property: &str, index: usize) -> String {
        format!("({column} -> '{property}' -> '{LENGTHS_KEY}' ->> {index})")
    }

    fn extract_numeric(&self, column: &str, property: &str) -> String {
        format!("({column} -> '{property}' ->> 0)")
    }

    fn value_elements(&self, column: &str, property: &str, alias: &str) -> String {
        format!(
            "jsonb_array_elements_text({column} -> '{property}' -> '{VALUES_KEY}') AS {alias}(value)"
        )
    }

    fn numeric_elements(&self, column: &str, property: &str, alias: &str) -> String {
        format!("jsonb_array_elements_text({column} -> '{property}') AS {alias}(value)")
    }

    fn all_values(&self, column: &str, property_alias: &str, alias: &str) -> String {
        format!(
            "jsonb_each({column}) AS {property_alias}(key, value), jsonb_array_elements_text({property_alias}.value -> '{VALUES_KEY}') AS {alias}(value)"
        )
    }

    fn property_exists(&self, column: &str, property: &str) -> String {
        format!("({column} -> '{property}') IS NOT NULL")
    }

    fn starts_with(&self, text: &str, prefix: &str) -> String {
        format!("starts_with({text}, {prefix})")
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut clause = String::new();
        if let Some(limit) = limit {
            clause.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            clause.push_str(&format!(" OFFSET {offset}"));
        }
        clause
    }
}

impl Dialect for Mysql {
    fn platform(&self) -> Platform {
        Platform::Mysql
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_owned()
    }

    fn extract_value(&self, column: &str, property: &str, index: usize) -> String {
        format!(
            "JSON_UNQUOTE(JSON_EXTRACT({column}, {}))",
            json_path(property, &format!(".{VALUES_KEY}[{index}]"))
        )
    }

    fn extract_length(&self, column: &str, property: &str, index: usize) -> String {
        format!(
            "JSON_EXTRACT({column}, {})",
            json_path(property, &format!(".{LENGTHS_KEY}[{index}]"))
        )
    }

    fn extract_numeric(&self, column: &str, property: &str) -> String {
        format!(
            "JSON_UNQUOTE(JSON_EXTRACT({column}, {}))",
            json_path(property, "[0]")
        )
    }

    fn value_elements(&self, column: &str, property: &str, alias: &str) -> String {
        format!(
            "JSON_TABLE({column}, {} COLUMNS (value LONGTEXT PATH '$')) AS {alias}",
            json_path(property, &format!(".{VALUES_KEY}[*]"))
        )
    }

    fn numeric_elements(&self, column: &str, property: &str, alias: &str) -> String {
        format!(
            "JSON_TABLE({column}, {} COLUMNS (value LONGTEXT PATH '$')) AS {alias}",
            json_path(property, "[*]")
        )
    }

    /// A single `JSON_TABLE` over `$.*.values[*]`; `property_alias` is unused.
    fn all_values(&self, column: &str, _property_alias: &str, alias: &str) -> String {
        format!(
            "JSON_TABLE({column}, '$.*.{VALUES_KEY}[*]' COLUMNS (value LONGTEXT PATH '$')) AS {alias}"
        )
    }

    /// Matches against the numeric array flattened to `2,10,12.50`, which
    /// also covers multi-valued properties without a derived table.
    fn numeric_membership(
        &self,
        column: &str,
        property: &str,
        _alias: &str,
        value: SqlParam,
    ) -> Fragment {
        let text = match value {
            SqlParam::Integer(n) => n.to_string(),
            SqlParam::Real(d) => format!("{d:?}"),
            SqlParam::Text(s) => s,
        };
        let set = format!(
            "REPLACE(REPLACE(REPLACE(REPLACE(JSON_EXTRACT({column}, {}), '[', ''), ']', ''), ' ', ''), '\"', '')",
            json_path(property, "")
        );
        let mut f = Fragment::text("FIND_IN_SET(");
        f.push_param(SqlParam::Text(text))
            .push_str(format!(", {set}) > 0"));
        f
    }

    fn property_exists(&self, column: &str, property: &str) -> String {
        format!(
            "JSON_CONTAINS_PATH({column}, 'one', {}) = 1",
            json_path(property, "")
        )
    }

    fn concat(&self, parts: &[&str]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    fn concat_fragments(&self, parts: Vec<Fragment>) -> Fragment {
        let mut f = Fragment::text("CONCAT(");
        f.append(Fragment::join(parts, ", "));
        f.push_str(")");
        f
    }

    fn starts_with(&self, text: &str, prefix: &str) -> String {
        format!("BINARY LEFT({text}, CHAR_LENGTH({prefix})) = {prefix}")
    }

    fn decimal_type(&self) -> &'static str {
        "DECIMAL(65, 30)"
    }

    fn case_sensitive(&self, expr: &str) -> String {
        format!("BINARY {expr}")
    }

    // Backslash is the string escape inside MySQL literals.
    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\\\'"
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        limit_with_max(limit, offset, u64::MAX)
    }
}
