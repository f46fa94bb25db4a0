// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Named properties and ordered property sets.

use crate::value::{PropertyType, Value};

/// A typed, possibly multi-valued property.
///
/// Fields are public; consistency between `ptype` and the values is checked
/// when the property is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ptype: PropertyType,
    pub multiple: bool,
    pub values: Vec<Value>,
}

impl Property {
    /// A single-valued property typed after its value.
    pub fn single(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            ptype: value.property_type(),
            multiple: false,
            values: vec![value],
        }
    }

    pub fn multiple(name: impl Into<String>, ptype: PropertyType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            ptype,
            multiple: true,
            values,
        }
    }

    /// First value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Reference targets held by this property (empty for other types).
    pub fn reference_targets(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(Value::reference_target)
    }
}

/// Properties of one node, in insertion order, unique by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (in place) the property with the same name.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => Some(std::mem::replace(existing, property)),
            None => {
                self.properties.push(property);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let idx = self.properties.iter().position(|p| p.name == name)?;
        Some(self.properties.remove(idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Property> {
        self.properties.iter_mut()
    }

    pub fn has_references(&self) -> bool {
        self.properties.iter().any(|p| p.ptype.is_reference())
    }
}

impl FromIterator<Property> for PropertySet {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for property in iter {
            set.insert(property);
        }
        set
    }
}

impl IntoIterator for PropertySet {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut set: PropertySet = [
            Property::single("a", Value::Long(1)),
            Property::single("b", Value::Long(2)),
        ]
        .into_iter()
        .collect();

        let old = set.insert(Property::single("a", Value::String("x".into())));
        assert_eq!(old.unwrap().values, vec![Value::Long(1)]);

        let names: Vec<_> = set.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(set.get("a").unwrap().ptype, PropertyType::String);
    }

    #[test]
    fn reference_targets_skip_other_types() {
        let p = Property::multiple(
            "refs",
            PropertyType::Reference,
            vec![Value::Reference("t1".into()), Value::Reference("t2".into())],
        );
        assert_eq!(p.reference_targets().collect::<Vec<_>>(), ["t1", "t2"]);
        assert_eq!(
            Property::single("s", Value::String("t1".into()))
                .reference_targets()
                .count(),
            0
        );
    }
}
