// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! SQL text interleaved with bound parameters.
//!
//! Placeholders are only rendered once the whole statement is assembled, so
//! engines with numbered placeholders (`?1`, `$1`) are numbered in text
//! order.

use crate::dialect::Dialect;

/// A value bound to a statement parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Real(f64),
}

#[derive(Clone, Debug, PartialEq)]
enum Piece {
    Text(String),
    Param(SqlParam),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    pieces: Vec<Piece>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.push_str(text);
        fragment
    }

    pub fn param(param: SqlParam) -> Self {
        let mut fragment = Self::new();
        fragment.push_param(param);
        fragment
    }

    pub fn push_str(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        match self.pieces.last_mut() {
            Some(Piece::Text(last)) => last.push_str(&text),
            _ => self.pieces.push(Piece::Text(text)),
        }
        self
    }

    pub fn push_param(&mut self, param: SqlParam) -> &mut Self {
        self.pieces.push(Piece::Param(param));
        self
    }

    pub fn append(&mut self, other: Fragment) -> &mut Self {
        for piece in other.pieces {
            match piece {
                Piece::Text(text) => {
                    self.push_str(text);
                }
                Piece::Param(param) => {
                    self.push_param(param);
                }
            }
        }
        self
    }

    /// Join fragments with a separator, e.g. `" AND "`.
    pub fn join(parts: impl IntoIterator<Item = Fragment>, separator: &str) -> Fragment {
        let mut joined = Fragment::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                joined.push_str(separator);
            }
            joined.append(part);
        }
        joined
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Render to SQL text with placeholders numbered from 1.
    pub fn render(self, dialect: &dyn Dialect) -> (String, Vec<SqlParam>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        for piece in self.pieces {
            match piece {
                Piece::Text(text) => sql.push_str(&text),
                Piece::Param(param) => {
                    params.push(param);
                    sql.push_str(&dialect.placeholder(params.len()));
                }
            }
        }
        (sql, params)
    }
}
