// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Execution of structured queries against the current workspace.

use std::collections::HashMap;

use arbor_query::{
    CompiledQuery, Query, QueryCompiler, QueryResult, RawNode, SELECTOR_COLUMNS, SqlParam,
    assemble,
};
use arbor_store_core::Value;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use tracing::debug;

use crate::connection::ContentStore;
use crate::error::Result;

fn to_sql(param: SqlParam) -> SqlValue {
    match param {
        SqlParam::Text(text) => SqlValue::Text(text),
        SqlParam::Integer(i) => SqlValue::Integer(i),
        SqlParam::Real(f) => SqlValue::Real(f),
    }
}

impl ContentStore {
    /// Compile `query` for this store without running it.
    pub fn compile_query(
        &self,
        query: &Query,
        bindings: &HashMap<String, Value>,
    ) -> Result<CompiledQuery> {
        let workspace = self.current_workspace()?;
        let compiler = QueryCompiler::new(self.dialect, &self.types, self.namespaces.map());
        Ok(compiler.compile(query, workspace, bindings)?)
    }

    /// Run `query` with `bindings` for its bind variables.
    pub fn query(&self, query: &Query, bindings: &HashMap<String, Value>) -> Result<QueryResult> {
        let compiled = self.compile_query(query, bindings)?;
        let selectors = compiled.selectors.len();

        let mut stmt = self.conn.prepare(&compiled.sql)?;
        let params = compiled.params.iter().cloned().map(to_sql);
        let raw = stmt
            .query_map(params_from_iter(params), |row| {
                (0..selectors)
                    .map(|s| {
                        let base = s * SELECTOR_COLUMNS;
                        let path: Option<String> = row.get(base)?;
                        match path {
                            None => Ok(None),
                            Some(path) => Ok(Some(RawNode {
                                path,
                                identifier: row.get(base + 1)?,
                                primary_type: row.get(base + 2)?,
                                document: row.get(base + 3)?,
                            })),
                        }
                    })
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(rows = raw.len(), selectors, "query executed");
        Ok(assemble(&compiled, raw)?)
    }
}
