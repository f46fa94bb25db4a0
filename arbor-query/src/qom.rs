// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Query object model.
//!
//! A structured query is a source (one selector or a left-deep tree of
//! joins), an optional constraint tree, orderings, result columns and
//! paging. Every category is a closed enum so the compiler can match
//! exhaustively.

use arbor_store_core::Value;
use derive_more::Display;

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub source: Source,
    pub constraint: Option<Constraint>,
    pub orderings: Vec<Ordering>,
    /// Empty means every property of every selector.
    pub columns: Vec<Column>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    /// A query over a single selector with no constraint.
    pub fn select(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: Source::Selector(Selector::new(node_type, name)),
            constraint: None,
            orderings: Vec::new(),
            columns: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn order_by(mut self, operand: DynamicOperand, order: Order) -> Self {
        self.orderings.push(Ordering { operand, order });
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }
}

/// Binding of a query to one node type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub node_type: String,
    pub name: String,
}

impl Selector {
    pub fn new(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Selector(Selector),
    Join(Box<Join>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub left: Source,
    /// Must be a selector; only left-deep trees are supported.
    pub right: Source,
    pub join_type: JoinType,
    pub condition: JoinCondition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum JoinType {
    #[display("INNER JOIN")]
    Inner,
    #[display("LEFT OUTER JOIN")]
    LeftOuter,
    #[display("RIGHT OUTER JOIN")]
    RightOuter,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinCondition {
    /// A value of `property1` on `selector1` equals a value of `property2`
    /// on `selector2`.
    Equi {
        selector1: String,
        property1: String,
        selector2: String,
        property2: String,
    },
    /// Both selectors match the same node, or `selector1` matches the node
    /// at `path` relative to `selector2`.
    SameNode {
        selector1: String,
        selector2: String,
        path: Option<String>,
    },
    ChildNode {
        child_selector: String,
        parent_selector: String,
    },
    DescendantNode {
        descendant_selector: String,
        ancestor_selector: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
    Not(Box<Constraint>),
    Comparison {
        operand1: DynamicOperand,
        operator: Operator,
        operand2: StaticOperand,
    },
    PropertyExistence {
        selector: String,
        property: String,
    },
    /// Substring match over a property's values, or over every property
    /// when `property` is `None`.
    FullTextSearch {
        selector: String,
        property: Option<String>,
        expression: String,
    },
    SameNode {
        selector: String,
        path: String,
    },
    ChildNode {
        selector: String,
        parent_path: String,
    },
    DescendantNode {
        selector: String,
        ancestor_path: String,
    },
}

impl Constraint {
    pub fn and(self, other: Constraint) -> Self {
        Constraint::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Constraint) -> Self {
        Constraint::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Constraint::Not(Box::new(self))
    }

    pub fn compare(operand1: DynamicOperand, operator: Operator, operand2: StaticOperand) -> Self {
        Constraint::Comparison {
            operand1,
            operator,
            operand2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DynamicOperand {
    PropertyValue { selector: String, property: String },
    /// Length of the first value of a property.
    Length { selector: String, property: String },
    NodeName { selector: String },
    NodeLocalName { selector: String },
    FullTextSearchScore { selector: String },
    LowerCase(Box<DynamicOperand>),
    UpperCase(Box<DynamicOperand>),
}

impl DynamicOperand {
    pub fn property(selector: impl Into<String>, property: impl Into<String>) -> Self {
        DynamicOperand::PropertyValue {
            selector: selector.into(),
            property: property.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StaticOperand {
    Literal(Value),
    BindVariable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Operator {
    #[display("=")]
    EqualTo,
    #[display("<>")]
    NotEqualTo,
    #[display("<")]
    LessThan,
    #[display("<=")]
    LessThanOrEqualTo,
    #[display(">")]
    GreaterThan,
    #[display(">=")]
    GreaterThanOrEqualTo,
    #[display("LIKE")]
    Like,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Order {
    #[display("ASC")]
    Ascending,
    #[display("DESC")]
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ordering {
    pub operand: DynamicOperand,
    pub order: Order,
}

/// A result column. `property: None` selects every property of the selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub selector: String,
    pub property: Option<String>,
    pub column_name: Option<String>,
}

impl Column {
    pub fn new(selector: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            property: Some(property.into()),
            column_name: None,
        }
    }

    pub fn all(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            property: None,
            column_name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }
}
