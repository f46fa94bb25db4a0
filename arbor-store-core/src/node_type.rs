// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Node type definitions and the registry consulted by the store.
//!
//! The store only asks three questions of a registry (does a type exist,
//! which types derive from it, does one type derive from another), so the
//! registry is a trait. [`StaticTypeRegistry`] is an in-memory implementation
//! seeded with the built-in types.

use std::collections::{BTreeMap, BTreeSet};

use crate::value::PropertyType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    /// Property name, or `*` for a residual definition.
    pub name: String,
    /// `None` means any type is accepted.
    pub required_type: Option<PropertyType>,
    pub multiple: bool,
    pub mandatory: bool,
    pub auto_created: bool,
    pub protected: bool,
    pub on_parent_version: String,
    pub fulltext_searchable: bool,
    pub query_orderable: bool,
    pub query_operators: Vec<String>,
    pub default_values: Vec<String>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, required_type: Option<PropertyType>) -> Self {
        Self {
            name: name.into(),
            required_type,
            multiple: false,
            mandatory: false,
            auto_created: false,
            protected: false,
            on_parent_version: "COPY".to_owned(),
            fulltext_searchable: true,
            query_orderable: true,
            query_operators: Vec::new(),
            default_values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildDefinition {
    /// Child name, or `*` for a residual definition.
    pub name: String,
    pub required_primary_types: Vec<String>,
    pub default_primary_type: Option<String>,
    pub mandatory: bool,
    pub auto_created: bool,
    pub protected: bool,
    pub on_parent_version: String,
}

impl ChildDefinition {
    pub fn new(name: impl Into<String>, required_primary_types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            required_primary_types,
            default_primary_type: None,
            mandatory: false,
            auto_created: false,
            protected: false,
            on_parent_version: "COPY".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDefinition {
    pub name: String,
    pub supertypes: Vec<String>,
    pub is_abstract: bool,
    pub is_mixin: bool,
    pub queryable: bool,
    pub orderable_child_nodes: bool,
    pub primary_item: Option<String>,
    pub properties: Vec<PropertyDefinition>,
    pub children: Vec<ChildDefinition>,
}

impl NodeTypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            is_abstract: false,
            is_mixin: false,
            queryable: true,
            orderable_child_nodes: false,
            primary_item: None,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_supertypes(mut self, supertypes: &[&str]) -> Self {
        self.supertypes = supertypes.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn mixin(mut self) -> Self {
        self.is_mixin = true;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

pub trait NodeTypeRegistry {
    fn has_type(&self, name: &str) -> bool;

    /// Every type that directly or transitively derives from `name`,
    /// excluding `name` itself.
    fn subtypes(&self, name: &str) -> Vec<String>;

    /// True when `type_name` is `candidate` or derives from it.
    fn is_node_type(&self, type_name: &str, candidate: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct StaticTypeRegistry {
    types: BTreeMap<String, NodeTypeDefinition>,
}

impl StaticTypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for definition in builtin_types() {
            registry.register(definition);
        }
        registry
    }

    /// Add or replace a definition.
    pub fn register(&mut self, definition: NodeTypeDefinition) {
        self.types.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, name: &str) -> Option<&NodeTypeDefinition> {
        self.types.get(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &NodeTypeDefinition> {
        self.types.values()
    }

    fn derives(&self, type_name: &str, candidate: &str, seen: &mut BTreeSet<String>) -> bool {
        if type_name == candidate {
            return true;
        }
        if !seen.insert(type_name.to_owned()) {
            return false;
        }
        self.types.get(type_name).is_some_and(|def| {
            def.supertypes
                .iter()
                .any(|s| self.derives(s, candidate, seen))
        })
    }
}

impl NodeTypeRegistry for StaticTypeRegistry {
    fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn subtypes(&self, name: &str) -> Vec<String> {
        self.types
            .keys()
            .filter(|t| t.as_str() != name && self.is_node_type(t, name))
            .cloned()
            .collect()
    }

    fn is_node_type(&self, type_name: &str, candidate: &str) -> bool {
        self.derives(type_name, candidate, &mut BTreeSet::new())
    }
}

/// True for the types every registry starts with; they cannot be redefined.
pub fn is_builtin(name: &str) -> bool {
    builtin_types().iter().any(|t| t.name == name)
}

fn builtin_types() -> Vec<NodeTypeDefinition> {
    let mut unstructured = NodeTypeDefinition::new("nt:unstructured").with_supertypes(&["nt:base"]);
    unstructured.orderable_child_nodes = true;
    unstructured.properties.push(PropertyDefinition {
        multiple: true,
        ..PropertyDefinition::new("*", None)
    });
    unstructured
        .children
        .push(ChildDefinition::new("*", vec!["nt:base".to_owned()]));

    let mut file = NodeTypeDefinition::new("nt:file").with_supertypes(&["nt:hierarchyNode"]);
    file.primary_item = Some("jcr:content".to_owned());
    file.children.push(ChildDefinition {
        mandatory: true,
        ..ChildDefinition::new("jcr:content", vec!["nt:base".to_owned()])
    });

    let mut resource =
        NodeTypeDefinition::new("nt:resource").with_supertypes(&["nt:base", "mix:referenceable"]);
    resource.primary_item = Some("jcr:data".to_owned());
    resource.properties.push(PropertyDefinition {
        mandatory: true,
        ..PropertyDefinition::new("jcr:data", Some(PropertyType::Binary))
    });

    let mut referenceable = NodeTypeDefinition::new("mix:referenceable").mixin();
    referenceable.properties.push(PropertyDefinition {
        mandatory: true,
        auto_created: true,
        protected: true,
        on_parent_version: "INITIALIZE".to_owned(),
        ..PropertyDefinition::new("jcr:uuid", Some(PropertyType::String))
    });

    let mut created = NodeTypeDefinition::new("mix:created").mixin();
    for (name, ptype) in [
        ("jcr:created", PropertyType::Date),
        ("jcr:createdBy", PropertyType::String),
    ] {
        created.properties.push(PropertyDefinition {
            auto_created: true,
            protected: true,
            ..PropertyDefinition::new(name, Some(ptype))
        });
    }

    vec![
        NodeTypeDefinition::new("nt:base").abstract_type(),
        unstructured,
        NodeTypeDefinition::new("nt:hierarchyNode")
            .with_supertypes(&["nt:base", "mix:created"])
            .abstract_type(),
        NodeTypeDefinition::new("nt:folder").with_supertypes(&["nt:hierarchyNode"]),
        file,
        resource,
        referenceable,
        created,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_hierarchy() {
        let registry = StaticTypeRegistry::with_builtins();
        assert!(registry.has_type("nt:folder"));
        assert!(registry.is_node_type("nt:folder", "nt:base"));
        assert!(registry.is_node_type("nt:file", "mix:created"));
        assert!(!registry.is_node_type("nt:unstructured", "nt:hierarchyNode"));

        let subtypes = registry.subtypes("nt:hierarchyNode");
        assert_eq!(subtypes, ["nt:file", "nt:folder"]);
    }

    #[test]
    fn cycles_terminate() {
        let mut registry = StaticTypeRegistry::empty();
        registry.register(NodeTypeDefinition::new("a").with_supertypes(&["b"]));
        registry.register(NodeTypeDefinition::new("b").with_supertypes(&["a"]));
        assert!(!registry.is_node_type("a", "c"));
        assert_eq!(registry.subtypes("a"), ["b"]);
    }
}
