//! Field definition model
//!
//! A `FieldSchema` is an insertion-ordered mapping of field key to
//! `FieldDefinition`. Iteration order is definition order; the validation
//! engine reports violations in this order.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Data format of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    #[default]
    Text,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    Map,
}

/// Form section grouping for a field
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldGroup {
    pub name: String,
    pub order: u32,
}

/// An enumerated allowed value, with an optional display title
#[derive(Debug, Clone, Serialize)]
pub struct FieldOption {
    pub value: String,
    pub title: String,
}

impl FieldOption {
    pub fn plain(value: &str) -> Self {
        Self {
            value: value.to_string(),
            title: value.to_string(),
        }
    }
}

/// Declarative definition of a single record field
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Display name
    pub label: String,

    /// Data format
    pub format: FieldFormat,

    /// Human-readable description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Named view -> whether the field is shown in that view
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub visibility: BTreeMap<String, bool>,

    /// Named view -> widget hint
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,

    /// Form section grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<FieldGroup>,

    /// Enumerated allowed values
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,

    /// Minimum value for number fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Maximum value for number fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Input step for number fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Whether the field must be present and non-empty
    pub required: bool,

    /// Element separator for array fields serialized from flat text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Key/value separator for map fields serialized from flat text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_value_separator: Option<String>,

    /// Embedded schema for object fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<FieldSchema>>,
}

/// Insertion-ordered field key -> definition mapping
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    entries: Vec<(String, FieldDefinition)>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field definition, preserving insertion order
    pub fn with(mut self, key: &str, definition: FieldDefinition) -> Self {
        self.entries.push((key.to_string(), definition));
        self
    }

    /// Look up a field definition by key
    pub fn get(&self, key: &str) -> Option<&FieldDefinition> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, def)| def)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate fields in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.entries.iter().map(|(k, def)| (k.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, def) in &self.entries {
            map.serialize_entry(key, def)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let schema = FieldSchema::new()
            .with("zeta", FieldDefinition::default())
            .with("alpha", FieldDefinition::default())
            .with("mid", FieldDefinition::default());

        let keys: Vec<&str> = schema.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let schema = FieldSchema::new()
            .with(
                "b",
                FieldDefinition {
                    label: "B".into(),
                    ..Default::default()
                },
            )
            .with(
                "a",
                FieldDefinition {
                    label: "A".into(),
                    ..Default::default()
                },
            );

        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }

    #[test]
    fn test_lookup() {
        let schema = FieldSchema::new().with(
            "symbol",
            FieldDefinition {
                label: "Symbol".into(),
                required: true,
                ..Default::default()
            },
        );

        assert!(schema.contains_key("symbol"));
        assert!(schema.get("symbol").unwrap().required);
        assert!(schema.get("missing").is_none());
    }
}
