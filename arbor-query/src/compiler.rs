// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Translation of the query object model to one SQL statement.
//!
//! Every selector becomes an aliased scan of `nodes` (`n0`, `n1`, ...)
//! restricted to the workspace and to the selector's type plus its subtypes.
//! The statement selects `path, identifier, type, props` for each selector in
//! binding order; [`crate::result::assemble`] relies on that layout.

use std::collections::HashMap;

use arbor_props::is_addressable;
use arbor_store_core::{NamespaceMap, NodeTypeRegistry, PathError, Value, path};
use tracing::debug;

use crate::dialect::{Dialect, escape_like};
use crate::error::{QueryError, Result};
use crate::fragment::{Fragment, SqlParam};
use crate::qom::{
    Column, Constraint, DynamicOperand, JoinCondition, JoinType, Operator, Query, Selector,
    Source, StaticOperand,
};

/// Columns selected per selector, in order.
pub const SELECTOR_COLUMNS: usize = 4;

/// Column names that identify per-selector entries of a result row.
pub const RESERVED_COLUMNS: [&str; 2] = ["path", "score"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorBinding {
    pub name: String,
    pub alias: String,
}

/// A requested result column. `property: None` expands to every stored
/// property of the selector, each named `name + property`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputColumn {
    pub selector: String,
    pub property: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub selectors: Vec<SelectorBinding>,
    pub columns: Vec<OutputColumn>,
}

pub struct QueryCompiler<'a> {
    dialect: &'a dyn Dialect,
    registry: &'a dyn NodeTypeRegistry,
    namespaces: &'a NamespaceMap,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(
        dialect: &'a dyn Dialect,
        registry: &'a dyn NodeTypeRegistry,
        namespaces: &'a NamespaceMap,
    ) -> Self {
        Self {
            dialect,
            registry,
            namespaces,
        }
    }

    pub fn compile(
        &self,
        query: &Query,
        workspace: &str,
        bindings: &HashMap<String, Value>,
    ) -> Result<CompiledQuery> {
        let mut unit = Compilation {
            dialect: self.dialect,
            registry: self.registry,
            namespaces: self.namespaces,
            bindings,
            workspace,
            selectors: Vec::new(),
            elements: 0,
        };

        let (from, mut filters) = unit.source(&query.source)?;
        if let Some(constraint) = &query.constraint {
            filters.push(unit.constraint(constraint)?);
        }
        let columns = unit.columns(&query.columns)?;
        let orderings = unit.orderings(query)?;

        let select = unit
            .selectors
            .iter()
            .map(|s| {
                let a = &s.alias;
                format!("{a}.path, {a}.identifier, {a}.type, {a}.props")
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut statement = Fragment::text(format!("SELECT {select} FROM "));
        statement.append(from);
        if !filters.is_empty() {
            statement.push_str(" WHERE ");
            statement.append(Fragment::join(filters, " AND "));
        }
        if !orderings.is_empty() {
            statement.push_str(format!(" ORDER BY {}", orderings.join(", ")));
        }
        statement.push_str(self.dialect.limit_offset(query.limit, query.offset));

        let (sql, params) = statement.render(self.dialect);
        debug!(%sql, params = params.len(), "compiled query");
        Ok(CompiledQuery {
            sql,
            params,
            selectors: unit.selectors,
            columns,
        })
    }
}

/// A dynamic operand lowered to SQL. With `from`, `expr` is evaluated once
/// per value of a property, over the rows produced by `from`.
struct Operand {
    from: Option<String>,
    expr: String,
}

impl Operand {
    fn scalar(expr: String) -> Self {
        Self { from: None, expr }
    }

    fn map(self, f: impl Fn(&str) -> String) -> Self {
        Self {
            from: self.from,
            expr: f(&self.expr),
        }
    }

    /// `predicate`, quantified over the operand's value rows if it has any.
    fn quantify(from: Vec<String>, predicate: Fragment) -> Fragment {
        if from.is_empty() {
            return predicate;
        }
        let mut f = Fragment::text(format!("EXISTS (SELECT 1 FROM {} WHERE ", from.join(", ")));
        f.append(predicate);
        f.push_str(")");
        f
    }
}

/// Pseudo-properties backed by node columns instead of the document.
fn column_property(alias: &str, property: &str) -> Option<String> {
    match property {
        "jcr:path" => Some(format!("{alias}.path")),
        "jcr:uuid" => Some(format!("{alias}.identifier")),
        "jcr:primaryType" => Some(format!("{alias}.type")),
        _ => None,
    }
}

fn is_column_property(property: &str) -> bool {
    column_property("", property).is_some()
}

fn check_property(property: &str) -> Result<()> {
    if is_addressable(property) {
        Ok(())
    } else {
        Err(QueryError::InvalidPropertyName(property.to_owned()))
    }
}

struct Compilation<'q> {
    dialect: &'q dyn Dialect,
    registry: &'q dyn NodeTypeRegistry,
    namespaces: &'q NamespaceMap,
    bindings: &'q HashMap<String, Value>,
    workspace: &'q str,
    selectors: Vec<SelectorBinding>,
    elements: usize,
}

impl Compilation<'_> {
    fn bind(&mut self, selector: &Selector) -> Result<String> {
        if !self.registry.has_type(&selector.node_type) {
            return Err(QueryError::UnknownType {
                selector: selector.name.clone(),
                node_type: selector.node_type.clone(),
            });
        }
        if self.selectors.iter().any(|s| s.name == selector.name) {
            return Err(QueryError::DuplicateSelector(selector.name.clone()));
        }
        let alias = format!("n{}", self.selectors.len());
        self.selectors.push(SelectorBinding {
            name: selector.name.clone(),
            alias: alias.clone(),
        });
        Ok(alias)
    }

    fn alias(&self, selector: &str) -> Result<String> {
        self.selectors
            .iter()
            .find(|s| s.name == selector)
            .map(|s| s.alias.clone())
            .ok_or_else(|| QueryError::UnknownSelector(selector.to_owned()))
    }

    fn element_alias(&mut self, prefix: &str) -> String {
        self.elements += 1;
        format!("{prefix}{}", self.elements)
    }

    fn scan_filter(&self, selector: &Selector, alias: &str) -> Fragment {
        let mut types = vec![selector.node_type.clone()];
        types.extend(self.registry.subtypes(&selector.node_type));

        let mut f = Fragment::text(format!("{alias}.workspace_name = "));
        f.push_param(SqlParam::Text(self.workspace.to_owned()));
        f.push_str(format!(" AND {alias}.type IN ("));
        f.append(Fragment::join(
            types
                .into_iter()
                .map(|t| Fragment::param(SqlParam::Text(t))),
            ", ",
        ));
        f.push_str(")");
        f
    }

    /// FROM clause and the scan filters that belong in WHERE.
    fn source(&mut self, source: &Source) -> Result<(Fragment, Vec<Fragment>)> {
        match source {
            Source::Selector(selector) => {
                let alias = self.bind(selector)?;
                let filter = self.scan_filter(selector, &alias);
                Ok((Fragment::text(format!("nodes AS {alias}")), vec![filter]))
            }
            Source::Join(join) => {
                let Source::Selector(right) = &join.right else {
                    return Err(QueryError::NestedJoin);
                };
                let (mut from, left_filters) = self.source(&join.left)?;
                let alias = self.bind(right)?;
                let right_filter = self.scan_filter(right, &alias);

                let mut on = vec![self.join_condition(&join.condition)?];
                let mut filters = Vec::new();
                // Filters of the optional side must not remove the NULL rows.
                match join.join_type {
                    JoinType::Inner => {
                        filters.extend(left_filters);
                        filters.push(right_filter);
                    }
                    JoinType::LeftOuter => {
                        filters.extend(left_filters);
                        on.push(right_filter);
                    }
                    JoinType::RightOuter => {
                        on.extend(left_filters);
                        filters.push(right_filter);
                    }
                }

                from.push_str(format!(" {} nodes AS {alias} ON ", join.join_type));
                from.append(Fragment::join(on, " AND "));
                Ok((from, filters))
            }
        }
    }

    /// Prefix shared by every descendant of the node in `alias`.
    fn descendant_prefix(&self, alias: &str) -> String {
        format!(
            "CASE WHEN {alias}.path = '/' THEN '/' ELSE {} END",
            self.dialect.concat(&[&format!("{alias}.path"), "'/'"])
        )
    }

    fn join_condition(&mut self, condition: &JoinCondition) -> Result<Fragment> {
        let d = self.dialect;
        match condition {
            JoinCondition::Equi {
                selector1,
                property1,
                selector2,
                property2,
            } => {
                let left = self.property_operand(selector1, property1)?;
                let right = self.property_operand(selector2, property2)?;
                let predicate = Fragment::text(format!(
                    "{} = {}",
                    d.case_sensitive(&left.expr),
                    right.expr
                ));
                let from = left.from.into_iter().chain(right.from).collect();
                Ok(Operand::quantify(from, predicate))
            }
            JoinCondition::SameNode {
                selector1,
                selector2,
                path: None,
            } => {
                let (a1, a2) = (self.alias(selector1)?, self.alias(selector2)?);
                Ok(Fragment::text(format!(
                    "{} = {a2}.identifier",
                    d.case_sensitive(&format!("{a1}.identifier"))
                )))
            }
            JoinCondition::SameNode {
                selector1,
                selector2,
                path: Some(relative),
            } => {
                let (a1, a2) = (self.alias(selector1)?, self.alias(selector2)?);
                self.validate_path(&path::join(path::ROOT, relative))?;
                let mut f = Fragment::text(format!(
                    "{} = ",
                    d.case_sensitive(&format!("{a1}.path"))
                ));
                f.append(d.concat_fragments(vec![
                    Fragment::text(format!(
                        "CASE WHEN {a2}.path = '/' THEN '' ELSE {a2}.path END"
                    )),
                    Fragment::param(SqlParam::Text(format!("/{relative}"))),
                ]));
                Ok(f)
            }
            JoinCondition::ChildNode {
                child_selector,
                parent_selector,
            } => {
                let (child, parent) = (self.alias(child_selector)?, self.alias(parent_selector)?);
                Ok(Fragment::text(format!(
                    "{} AND {child}.depth = {parent}.depth + 1",
                    d.starts_with(&format!("{child}.path"), &self.descendant_prefix(&parent))
                )))
            }
            JoinCondition::DescendantNode {
                descendant_selector,
                ancestor_selector,
            } => {
                let (desc, anc) = (
                    self.alias(descendant_selector)?,
                    self.alias(ancestor_selector)?,
                );
                Ok(Fragment::text(format!(
                    "{} AND {desc}.depth > {anc}.depth",
                    d.starts_with(&format!("{desc}.path"), &self.descendant_prefix(&anc))
                )))
            }
        }
    }

    fn resolve(&self, operand: &StaticOperand) -> Result<Value> {
        match operand {
            StaticOperand::Literal(value) => Ok(value.clone()),
            StaticOperand::BindVariable(name) => self
                .bindings
                .get(name)
                .cloned()
                .ok_or_else(|| QueryError::UnboundVariable(name.clone())),
        }
    }

    fn validate_path(&self, p: &str) -> Result<()> {
        path::validate(p, |prefix| self.namespaces.contains_key(prefix)).map_err(|e| match e {
            PathError::UnknownPrefix { name, prefix } => QueryError::Namespace { name, prefix },
            other => QueryError::Path(other),
        })
    }

    fn node_name(&self, alias: &str) -> String {
        self.dialect.concat(&[
            &format!("{alias}.namespace"),
            &format!("CASE WHEN {alias}.namespace = '' THEN '' ELSE ':' END"),
            &format!("{alias}.local_name"),
        ])
    }

    fn property_operand(&mut self, selector: &str, property: &str) -> Result<Operand> {
        let alias = self.alias(selector)?;
        if let Some(column) = column_property(&alias, property) {
            return Ok(Operand::scalar(column));
        }
        check_property(property)?;
        let element = self.element_alias("je");
        Ok(Operand {
            from: Some(
                self.dialect
                    .value_elements(&format!("{alias}.props"), property, &element),
            ),
            expr: format!("{element}.value"),
        })
    }

    fn operand(&mut self, operand: &DynamicOperand) -> Result<Operand> {
        match operand {
            DynamicOperand::PropertyValue { selector, property } => {
                self.property_operand(selector, property)
            }
            DynamicOperand::Length { selector, property } => {
                let alias = self.alias(selector)?;
                check_property(property)?;
                Ok(Operand::scalar(self.dialect.extract_length(
                    &format!("{alias}.props"),
                    property,
                    0,
                )))
            }
            DynamicOperand::NodeName { selector } => {
                let alias = self.alias(selector)?;
                Ok(Operand::scalar(self.node_name(&alias)))
            }
            DynamicOperand::NodeLocalName { selector } => {
                Ok(Operand::scalar(format!("{}.local_name", self.alias(selector)?)))
            }
            DynamicOperand::FullTextSearchScore { .. } => {
                Err(QueryError::UnsupportedOperand("full-text score"))
            }
            DynamicOperand::LowerCase(inner) => {
                Ok(self.operand(inner)?.map(|e| format!("LOWER({e})")))
            }
            DynamicOperand::UpperCase(inner) => {
                Ok(self.operand(inner)?.map(|e| format!("UPPER({e})")))
            }
        }
    }

    /// `operand op literal`, numerically when the literal is a number.
    fn compare(&self, operand: Operand, operator: Operator, literal: &Value) -> Result<Fragment> {
        let d = self.dialect;
        let (param, numeric) = match literal {
            Value::Long(n) => (SqlParam::Integer(*n), true),
            Value::Double(x) => (SqlParam::Real(*x), true),
            Value::Decimal(s) => (SqlParam::Text(s.clone()), true),
            Value::Binary(_) => {
                return Err(QueryError::UnsupportedLiteral {
                    operator: "a comparison",
                    literal: literal.property_type().to_string(),
                });
            }
            other => (SqlParam::Text(other.to_text()), false),
        };
        if numeric && operator == Operator::Like {
            return Err(QueryError::UnsupportedLiteral {
                operator: "LIKE",
                literal: literal.property_type().to_string(),
            });
        }

        let mut predicate;
        if numeric {
            predicate = Fragment::text(format!("{} {operator} CAST(", d.decimal(&operand.expr)));
            predicate
                .push_param(param)
                .push_str(format!(" AS {})", d.decimal_type()));
        } else {
            predicate = Fragment::text(format!("{} {operator} ", d.case_sensitive(&operand.expr)));
            predicate.push_param(param);
            if operator == Operator::Like {
                predicate.push_str(d.like_escape());
            }
        }
        Ok(Operand::quantify(operand.from.into_iter().collect(), predicate))
    }

    fn property_comparison(
        &mut self,
        selector: &str,
        property: &str,
        operator: Operator,
        literal: &Value,
    ) -> Result<Fragment> {
        let alias = self.alias(selector)?;
        check_property(property)?;
        let d = self.dialect;
        let props = format!("{alias}.props");
        match literal {
            Value::Long(_) | Value::Double(_) | Value::Decimal(_)
                if operator == Operator::EqualTo =>
            {
                let param = match literal {
                    Value::Long(n) => SqlParam::Integer(*n),
                    Value::Double(x) => SqlParam::Real(*x),
                    other => SqlParam::Text(other.to_text()),
                };
                let element = self.element_alias("ne");
                Ok(d.numeric_membership(
                    &format!("{alias}.numerical_props"),
                    property,
                    &element,
                    param,
                ))
            }
            Value::Long(_) | Value::Double(_) | Value::Decimal(_) => self.compare(
                Operand::scalar(d.extract_value(&props, property, 0)),
                operator,
                literal,
            ),
            Value::Boolean(b) => {
                let mut f = Fragment::text(format!(
                    "{} {operator} ",
                    d.extract_value(&props, property, 0)
                ));
                f.push_param(SqlParam::Text(if *b { "1" } else { "0" }.to_owned()));
                Ok(f)
            }
            other => {
                let operand = self.property_operand(selector, property)?;
                self.compare(operand, operator, other)
            }
        }
    }

    fn constraint(&mut self, constraint: &Constraint) -> Result<Fragment> {
        let d = self.dialect;
        match constraint {
            Constraint::And(a, b) | Constraint::Or(a, b) => {
                let separator = match constraint {
                    Constraint::And(..) => " AND ",
                    _ => " OR ",
                };
                let parts = [self.constraint(a)?, self.constraint(b)?];
                let mut f = Fragment::text("(");
                f.append(Fragment::join(parts, separator));
                f.push_str(")");
                Ok(f)
            }
            Constraint::Not(inner) => {
                let mut f = Fragment::text("NOT (");
                f.append(self.constraint(inner)?);
                f.push_str(")");
                Ok(f)
            }
            Constraint::Comparison {
                operand1,
                operator,
                operand2,
            } => {
                let literal = self.resolve(operand2)?;
                match operand1 {
                    DynamicOperand::PropertyValue { selector, property }
                        if !is_column_property(property) =>
                    {
                        self.property_comparison(selector, property, *operator, &literal)
                    }
                    DynamicOperand::NodeName { .. } => {
                        let name = literal.to_text();
                        let (prefix, _) = path::split_name(&name);
                        if !prefix.is_empty() && !self.namespaces.contains_key(prefix) {
                            return Err(QueryError::Namespace {
                                prefix: prefix.to_owned(),
                                name,
                            });
                        }
                        let operand = self.operand(operand1)?;
                        self.compare(operand, *operator, &Value::Name(name))
                    }
                    other => {
                        let operand = self.operand(other)?;
                        self.compare(operand, *operator, &literal)
                    }
                }
            }
            Constraint::PropertyExistence { selector, property } => {
                let alias = self.alias(selector)?;
                if is_column_property(property) {
                    return Ok(Fragment::text("1 = 1"));
                }
                check_property(property)?;
                Ok(Fragment::text(
                    d.property_exists(&format!("{alias}.props"), property),
                ))
            }
            Constraint::FullTextSearch {
                selector,
                property,
                expression,
            } => {
                let operand = match property {
                    Some(property) => self.property_operand(selector, property)?,
                    None => {
                        let alias = self.alias(selector)?;
                        let owner = self.element_alias("jp");
                        let element = self.element_alias("je");
                        Operand {
                            from: Some(d.all_values(
                                &format!("{alias}.props"),
                                &owner,
                                &element,
                            )),
                            expr: format!("{element}.value"),
                        }
                    }
                };
                let mut predicate =
                    Fragment::text(format!("{} LIKE ", d.case_sensitive(&operand.expr)));
                predicate
                    .push_param(SqlParam::Text(format!("%{}%", escape_like(expression))))
                    .push_str(d.like_escape());
                Ok(Operand::quantify(operand.from.into_iter().collect(), predicate))
            }
            Constraint::SameNode { selector, path } => {
                let alias = self.alias(selector)?;
                self.validate_path(path)?;
                let mut f = Fragment::text(format!(
                    "{} = ",
                    d.case_sensitive(&format!("{alias}.path"))
                ));
                f.push_param(SqlParam::Text(path.clone()));
                Ok(f)
            }
            Constraint::ChildNode {
                selector,
                parent_path,
            } => {
                let alias = self.alias(selector)?;
                self.validate_path(parent_path)?;
                let mut f = Fragment::text(format!(
                    "{} = ",
                    d.case_sensitive(&format!("{alias}.parent"))
                ));
                f.push_param(SqlParam::Text(parent_path.clone()));
                Ok(f)
            }
            Constraint::DescendantNode {
                selector,
                ancestor_path,
            } => {
                let alias = self.alias(selector)?;
                self.validate_path(ancestor_path)?;
                let column = d.case_sensitive(&format!("{alias}.path"));
                let (lower, upper) = path::subtree_bounds(ancestor_path);
                let mut f = Fragment::text(format!("({column} >= "));
                f.push_param(SqlParam::Text(lower))
                    .push_str(format!(" AND {column} < "))
                    .push_param(SqlParam::Text(upper));
                if path::is_root(ancestor_path) {
                    f.push_str(format!(" AND {alias}.path <> '/'"));
                }
                f.push_str(")");
                Ok(f)
            }
        }
    }

    fn columns(&self, columns: &[Column]) -> Result<Vec<OutputColumn>> {
        let qualified = self.selectors.len() > 1;
        let prefix = |selector: &str| {
            if qualified {
                format!("{selector}.")
            } else {
                String::new()
            }
        };

        if columns.is_empty() {
            return Ok(self
                .selectors
                .iter()
                .map(|s| OutputColumn {
                    selector: s.name.clone(),
                    property: None,
                    name: prefix(&s.name),
                })
                .collect());
        }

        columns
            .iter()
            .map(|column| {
                self.alias(&column.selector)?;
                if let Some(property) = &column.property
                    && !is_column_property(property)
                {
                    check_property(property)?;
                }
                let name = match (&column.column_name, &column.property) {
                    (Some(name), _) => name.clone(),
                    (None, Some(property)) => format!("{}{property}", prefix(&column.selector)),
                    (None, None) => prefix(&column.selector),
                };
                if RESERVED_COLUMNS.contains(&name.as_str()) {
                    return Err(QueryError::ReservedColumn(name));
                }
                Ok(OutputColumn {
                    selector: column.selector.clone(),
                    property: column.property.clone(),
                    name,
                })
            })
            .collect()
    }

    fn orderings(&self, query: &Query) -> Result<Vec<String>> {
        let mut clauses = Vec::new();
        for ordering in &query.orderings {
            for expr in self.ordering_exprs(&ordering.operand, false)? {
                clauses.push(format!("{expr} {}", ordering.order));
            }
        }
        Ok(clauses)
    }

    /// Sort keys for `operand`. Properties sort by their numeric value first
    /// and their text second, unless `text_only` (case-folded orderings).
    fn ordering_exprs(&self, operand: &DynamicOperand, text_only: bool) -> Result<Vec<String>> {
        let d = self.dialect;
        Ok(match operand {
            // Scores are not computed; every row ranks the same.
            DynamicOperand::FullTextSearchScore { selector } => {
                self.alias(selector)?;
                Vec::new()
            }
            DynamicOperand::PropertyValue { selector, property } => {
                let alias = self.alias(selector)?;
                if let Some(column) = column_property(&alias, property) {
                    return Ok(vec![column]);
                }
                check_property(property)?;
                let text = d.extract_value(&format!("{alias}.props"), property, 0);
                if text_only {
                    vec![text]
                } else {
                    let numeric =
                        d.extract_numeric(&format!("{alias}.numerical_props"), property);
                    vec![d.decimal(&numeric), text]
                }
            }
            DynamicOperand::Length { selector, property } => {
                let alias = self.alias(selector)?;
                check_property(property)?;
                vec![d.decimal(&d.extract_length(&format!("{alias}.props"), property, 0))]
            }
            DynamicOperand::NodeName { selector } => vec![self.node_name(&self.alias(selector)?)],
            DynamicOperand::NodeLocalName { selector } => {
                vec![format!("{}.local_name", self.alias(selector)?)]
            }
            DynamicOperand::LowerCase(inner) => self
                .ordering_exprs(inner, true)?
                .into_iter()
                .map(|e| format!("LOWER({e})"))
                .collect(),
            DynamicOperand::UpperCase(inner) => self
                .ordering_exprs(inner, true)?
                .into_iter()
                .map(|e| format!("UPPER({e})"))
                .collect(),
        })
    }
}
