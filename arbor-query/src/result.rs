// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Result rows assembled from the raw per-selector columns of a compiled
//! query.

use arbor_store_core::{Property, Value};

use crate::compiler::{CompiledQuery, OutputColumn};
use crate::error::Result;

/// Housekeeping properties always reported by wildcard columns.
pub const WILDCARD_EXTRAS: [&str; 2] = ["jcr:created", "jcr:createdBy"];

/// The four columns fetched for one selector; `None` for the missing side
/// of an outer join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawNode {
    pub path: String,
    pub identifier: String,
    pub primary_type: String,
    pub document: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowEntry {
    pub name: String,
    pub selector: String,
    /// `None` when the node lacks the property or the selector matched
    /// nothing.
    pub value: Option<Property>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectedNode {
    pub selector: String,
    pub path: Option<String>,
    pub identifier: Option<String>,
    /// Scores are not computed: 1.0 for a matched node, 0.0 otherwise.
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub entries: Vec<RowEntry>,
    pub nodes: Vec<SelectedNode>,
}

impl Row {
    pub fn value(&self, column: &str) -> Option<&Property> {
        self.entries
            .iter()
            .find(|e| e.name == column)
            .and_then(|e| e.value.as_ref())
    }

    pub fn node(&self, selector: &str) -> Option<&SelectedNode> {
        self.nodes.iter().find(|n| n.selector == selector)
    }

    pub fn path(&self, selector: &str) -> Option<&str> {
        self.node(selector)?.path.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    /// Column names in first-seen order; wildcard columns contribute the
    /// properties actually found.
    pub columns: Vec<String>,
    pub selectors: Vec<String>,
    pub rows: Vec<Row>,
}

/// Properties to decode per selector: `None` means all of them.
fn wanted(columns: &[OutputColumn], selector: &str) -> Option<Vec<String>> {
    let mut names = Vec::new();
    for column in columns.iter().filter(|c| c.selector == selector) {
        match &column.property {
            None => return None,
            Some(property) => names.push(property.clone()),
        }
    }
    Some(names)
}

fn synthetic(node: &RawNode, property: &str) -> Option<Property> {
    match property {
        "jcr:primaryType" => Some(Property::single(
            property,
            Value::Name(node.primary_type.clone()),
        )),
        "jcr:path" => Some(Property::single(property, Value::Path(node.path.clone()))),
        "jcr:uuid" => Some(Property::single(
            property,
            Value::String(node.identifier.clone()),
        )),
        _ => None,
    }
}

/// Build the result from `raw` rows holding one entry per selector, in the
/// order of [`CompiledQuery::selectors`].
pub fn assemble(compiled: &CompiledQuery, raw: Vec<Vec<Option<RawNode>>>) -> Result<QueryResult> {
    let wanted: Vec<Option<Vec<String>>> = compiled
        .selectors
        .iter()
        .map(|s| wanted(&compiled.columns, &s.name))
        .collect();

    let mut result = QueryResult {
        columns: Vec::new(),
        selectors: compiled.selectors.iter().map(|s| s.name.clone()).collect(),
        rows: Vec::with_capacity(raw.len()),
    };
    for column in compiled.columns.iter().filter(|c| c.property.is_some()) {
        result.columns.push(column.name.clone());
    }

    for nodes in raw {
        let mut decoded = Vec::with_capacity(nodes.len());
        for (node, names) in nodes.iter().zip(&wanted) {
            decoded.push(match node {
                Some(node) => {
                    let only: Option<Vec<&str>> =
                        names.as_ref().map(|n| n.iter().map(String::as_str).collect());
                    Some(arbor_props::decode(&node.document, only.as_deref())?)
                }
                None => None,
            });
        }

        let mut entries = Vec::new();
        for column in &compiled.columns {
            let Some(index) = compiled
                .selectors
                .iter()
                .position(|s| s.name == column.selector)
            else {
                continue;
            };
            let node = nodes.get(index).and_then(Option::as_ref);
            let properties = decoded.get(index).and_then(Option::as_ref);

            match &column.property {
                Some(property) => entries.push(RowEntry {
                    name: column.name.clone(),
                    selector: column.selector.clone(),
                    value: node.and_then(|n| synthetic(n, property)).or_else(|| {
                        properties.and_then(|p| p.get(property)).cloned()
                    }),
                }),
                None => {
                    let mut expanded = Vec::new();
                    if let Some(properties) = properties {
                        expanded.extend(properties.iter().map(|p| (p.name.clone(), Some(p.clone()))));
                    }
                    if !expanded.iter().any(|(name, _)| name == "jcr:primaryType") {
                        expanded.push((
                            "jcr:primaryType".to_owned(),
                            node.and_then(|n| synthetic(n, "jcr:primaryType")),
                        ));
                    }
                    for extra in WILDCARD_EXTRAS {
                        if !expanded.iter().any(|(name, _)| name == extra) {
                            expanded.push((extra.to_owned(), None));
                        }
                    }
                    for (property, value) in expanded {
                        let name = format!("{}{property}", column.name);
                        if !result.columns.contains(&name) {
                            result.columns.push(name.clone());
                        }
                        entries.push(RowEntry {
                            name,
                            selector: column.selector.clone(),
                            value,
                        });
                    }
                }
            }
        }

        let selected = compiled
            .selectors
            .iter()
            .zip(&nodes)
            .map(|(binding, node)| SelectedNode {
                selector: binding.name.clone(),
                path: node.as_ref().map(|n| n.path.clone()),
                identifier: node.as_ref().map(|n| n.identifier.clone()),
                score: if node.is_some() { 1.0 } else { 0.0 },
            })
            .collect();

        result.rows.push(Row {
            entries,
            nodes: selected,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SelectorBinding;

    fn compiled(columns: Vec<OutputColumn>) -> CompiledQuery {
        CompiledQuery {
            sql: String::new(),
            params: Vec::new(),
            selectors: vec![SelectorBinding {
                name: "s".into(),
                alias: "n0".into(),
            }],
            columns,
        }
    }

    fn raw(document: &str) -> RawNode {
        RawNode {
            path: "/a".into(),
            identifier: "id-a".into(),
            primary_type: "nt:unstructured".into(),
            document: document.into(),
        }
    }

    const DOC: &str = r#"{"title":{"type":"String","multiple":false,"lengths":[2],"values":["hi"]},"jcr:createdBy":{"type":"String","multiple":false,"lengths":[5],"values":["admin"]}}"#;

    #[test]
    fn wildcard_adds_housekeeping_columns() {
        let query = compiled(vec![OutputColumn {
            selector: "s".into(),
            property: None,
            name: String::new(),
        }]);
        let result = assemble(&query, vec![vec![Some(raw(DOC))]]).unwrap();
        assert_eq!(
            result.columns,
            ["title", "jcr:createdBy", "jcr:primaryType", "jcr:created"]
        );
        let row = &result.rows[0];
        assert_eq!(
            row.value("jcr:primaryType").unwrap().values,
            vec![Value::Name("nt:unstructured".into())]
        );
        assert!(row.value("jcr:created").is_none());
        assert_eq!(row.path("s"), Some("/a"));
        assert_eq!(row.node("s").unwrap().score, 1.0);
    }

    #[test]
    fn explicit_columns_decode_only_what_is_asked() {
        let query = compiled(vec![
            OutputColumn {
                selector: "s".into(),
                property: Some("title".into()),
                name: "t".into(),
            },
            OutputColumn {
                selector: "s".into(),
                property: Some("missing".into()),
                name: "missing".into(),
            },
        ]);
        let result = assemble(&query, vec![vec![Some(raw(DOC))]]).unwrap();
        assert_eq!(result.columns, ["t", "missing"]);
        let row = &result.rows[0];
        assert_eq!(row.entries.len(), 2);
        assert_eq!(row.value("t").unwrap().values, vec![Value::String("hi".into())]);
        assert!(row.value("missing").is_none());
    }

    #[test]
    fn node_columns_come_from_the_row() {
        let query = compiled(vec![
            OutputColumn {
                selector: "s".into(),
                property: Some("jcr:uuid".into()),
                name: "id".into(),
            },
            OutputColumn {
                selector: "s".into(),
                property: Some("jcr:path".into()),
                name: "location".into(),
            },
        ]);
        let result = assemble(&query, vec![vec![Some(raw(DOC))]]).unwrap();
        let row = &result.rows[0];
        assert_eq!(row.value("id").unwrap().values, vec![Value::String("id-a".into())]);
        assert_eq!(row.value("location").unwrap().values, vec![Value::Path("/a".into())]);
    }

    #[test]
    fn outer_join_miss_yields_empty_entries() {
        let query = compiled(vec![OutputColumn {
            selector: "s".into(),
            property: Some("title".into()),
            name: "title".into(),
        }]);
        let result = assemble(&query, vec![vec![None]]).unwrap();
        let row = &result.rows[0];
        assert!(row.value("title").is_none());
        assert_eq!(row.path("s"), None);
        assert_eq!(row.node("s").unwrap().score, 0.0);
    }

    #[test]
    fn corrupt_document_fails() {
        let query = compiled(Vec::new());
        assert!(assemble(&query, vec![vec![Some(raw("{oops"))]]).is_err());
    }
}
