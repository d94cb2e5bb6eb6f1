//! Structured-output schema trees.
//!
//! A schema is a recursive [`SchemaField`] in the persisted JSON shape
//!
//! ```text
//! { "type": "object",
//!   "properties": { "name": { "type": "string" }, ... },   // insertion order kept
//!   "required": ["name"],
//!   "additionalProperties": false }
//! ```
//!
//! Trees are values. Every edit in [`ops`] takes a tree by reference and
//! returns a new one; nothing is mutated in place. [`SchemaEditor`] layers the
//! edit-session state (backup, active path) and change notification on top.
//!
//! ## Invariants
//!
//! - The root is an object.
//! - Depth, counted in named-property steps (array `items` do not count), is
//!   at most [`MAX_SCHEMA_DEPTH`].
//! - Sibling names are unique; `required` only names existing siblings.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::SchemaError;

mod infer;
mod ops;
mod outline;
mod path;
mod session;

pub use infer::infer_schema;
pub use ops::{Applied, Effect, SchemaOp, apply, field_at};
pub use outline::{OutlineRow, outline};
pub use path::{PathStep, SchemaPath};
pub use session::{EditMode, EditSession, Notice, SchemaEditor};

pub const MAX_SCHEMA_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// Element type of an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    String,
    Number,
    Boolean,
    Object,
}

impl ItemType {
    pub fn field_type(self) -> FieldType {
        match self {
            ItemType::String => FieldType::String,
            ItemType::Number => FieldType::Number,
            ItemType::Boolean => FieldType::Boolean,
            ItemType::Object => FieldType::Object,
        }
    }

    fn from_field_type(ty: FieldType) -> Option<Self> {
        match ty {
            FieldType::String => Some(ItemType::String),
            FieldType::Number => Some(ItemType::Number),
            FieldType::Boolean => Some(ItemType::Boolean),
            FieldType::Object => Some(ItemType::Object),
            FieldType::Array => None,
        }
    }
}

/// A type a field can be changed to, as offered by the type picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    String,
    Number,
    Boolean,
    Object,
    Array(ItemType),
}

impl TargetType {
    /// The picker label of `field`'s current type. `None` for arrays whose
    /// items are arrays or missing.
    pub fn of(field: &SchemaField) -> Option<Self> {
        Some(match field.field_type {
            FieldType::String => TargetType::String,
            FieldType::Number => TargetType::Number,
            FieldType::Boolean => TargetType::Boolean,
            FieldType::Object => TargetType::Object,
            FieldType::Array => TargetType::Array(ItemType::from_field_type(field.items.as_ref()?.field_type)?),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::String => "string",
            TargetType::Number => "number",
            TargetType::Boolean => "boolean",
            TargetType::Object => "object",
            TargetType::Array(ItemType::String) => "array[string]",
            TargetType::Array(ItemType::Number) => "array[number]",
            TargetType::Array(ItemType::Boolean) => "array[boolean]",
            TargetType::Array(ItemType::Object) => "array[object]",
        }
    }

    /// Whether fields of this type keep an `enum` list.
    pub fn supports_enum(self) -> bool {
        matches!(self, TargetType::String | TargetType::Number)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "string" => TargetType::String,
            "number" => TargetType::Number,
            "boolean" => TargetType::Boolean,
            "object" => TargetType::Object,
            "array[string]" => TargetType::Array(ItemType::String),
            "array[number]" => TargetType::Array(ItemType::Number),
            "array[boolean]" => TargetType::Array(ItemType::Boolean),
            "array[object]" => TargetType::Array(ItemType::Object),
            other => return Err(SchemaError::UnknownType(other.to_string())),
        })
    }
}

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "additionalProperties", default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

impl SchemaField {
    /// A bare field of `field_type` with no container keys.
    pub fn scalar(field_type: FieldType) -> Self {
        SchemaField {
            field_type,
            properties: None,
            items: None,
            required: None,
            description: None,
            enum_values: None,
            additional_properties: None,
        }
    }

    /// An empty object: no properties, nothing required, closed.
    pub fn object() -> Self {
        SchemaField {
            properties: Some(Properties::default()),
            required: Some(Vec::new()),
            additional_properties: Some(false),
            ..Self::scalar(FieldType::Object)
        }
    }

    pub fn array_of(item: ItemType) -> Self {
        let items = match item {
            ItemType::Object => Self::object(),
            other => Self::scalar(other.field_type()),
        };
        SchemaField { items: Some(Box::new(items)), ..Self::scalar(FieldType::Array) }
    }

    pub fn with_property(mut self, name: impl Into<String>, field: SchemaField) -> Self {
        self.properties.get_or_insert_with(Properties::default).push(name.into(), field);
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.as_ref().is_some_and(|r| r.iter().any(|n| n == name))
    }

    /// Nesting depth below this field, in named-property steps.
    pub fn depth(&self) -> usize {
        let props = self
            .properties
            .as_ref()
            .map(|p| p.iter().map(|(_, child)| 1 + child.depth()).max().unwrap_or(0))
            .unwrap_or(0);
        let items = self.items.as_ref().map(|i| i.depth()).unwrap_or(0);
        props.max(items)
    }

    /// Parse and validate a persisted root schema.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let root: SchemaField = serde_json::from_str(json)?;
        root.validate()?;
        Ok(root)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the root invariants. Sibling uniqueness is already enforced by
    /// [`Properties`] deserialization; unnamed properties only exist inside
    /// an open adding-field session and never validate.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.field_type != FieldType::Object {
            return Err(SchemaError::RootNotObject);
        }
        let depth = self.depth();
        if depth > MAX_SCHEMA_DEPTH {
            return Err(SchemaError::DepthExceeded { depth, max: MAX_SCHEMA_DEPTH });
        }
        self.check_fields(&SchemaPath::root())
    }

    fn check_fields(&self, at: &SchemaPath) -> Result<(), SchemaError> {
        if self.properties.as_ref().is_some_and(|p| p.contains("")) {
            return Err(SchemaError::EmptyPropertyName(at.to_string()));
        }
        for name in self.required.iter().flatten() {
            if !self.properties.as_ref().is_some_and(|p| p.contains(name)) {
                return Err(SchemaError::DanglingRequired { path: at.to_string(), name: name.clone() });
            }
        }
        for (name, child) in self.properties.iter().flat_map(Properties::iter) {
            child.check_fields(&at.property(name))?;
        }
        if let Some(items) = &self.items {
            items.check_fields(&at.items())?;
        }
        Ok(())
    }
}

/// Named children of an object, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, SchemaField)>);

impl Properties {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.0.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut SchemaField> {
        self.0.iter_mut().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Append; callers check uniqueness first.
    pub(crate) fn push(&mut self, name: String, field: SchemaField) {
        self.0.push((name, field));
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<SchemaField> {
        let idx = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(idx).1)
    }

    /// Rename in place, keeping the position.
    pub(crate) fn rename(&mut self, from: &str, to: &str) -> bool {
        match self.0.iter_mut().find(|(n, _)| n == from) {
            Some(entry) => {
                entry.0 = to.to_string();
                true
            }
            None => false,
        }
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, field) in &self.0 {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to schema fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Properties, A::Error> {
                let mut props = Properties::default();
                while let Some((name, field)) = access.next_entry::<String, SchemaField>()? {
                    if props.contains(&name) {
                        return Err(serde::de::Error::custom(format!("duplicate property '{name}'")));
                    }
                    props.push(name, field);
                }
                Ok(props)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested(levels: usize) -> SchemaField {
        (0..levels).fold(SchemaField::scalar(FieldType::String), |inner, i| {
            SchemaField::object().with_property(format!("l{i}"), inner)
        })
    }

    #[test]
    fn property_order_survives_json() {
        let json = r#"{"type":"object","properties":{"zeta":{"type":"string"},"alpha":{"type":"number"}},"required":["zeta"]}"#;
        let root = SchemaField::from_json(json).unwrap();
        let names: Vec<&str> = root.properties.as_ref().unwrap().names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let back = SchemaField::from_json(&root.to_json().unwrap()).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn validation_rejects_broken_trees() {
        assert!(matches!(SchemaField::from_json(r#"{"type":"string"}"#), Err(SchemaError::RootNotObject)));
        assert!(matches!(
            SchemaField::from_json(r#"{"type":"object","properties":{},"required":["ghost"]}"#),
            Err(SchemaError::DanglingRequired { .. })
        ));
        assert!(matches!(
            SchemaField::from_json(r#"{"type":"object","properties":{"a":{"type":"string"},"a":{"type":"number"}}}"#),
            Err(SchemaError::Json(_))
        ));
        assert!(matches!(
            SchemaField::from_json(r#"{"type":"object","properties":{"meta":{"type":"object","properties":{"":{"type":"string"}}}}}"#),
            Err(SchemaError::EmptyPropertyName(path)) if path == "meta"
        ));
    }

    #[test]
    fn depth_counts_property_steps_only() {
        let list = SchemaField::object().with_property(
            "rows",
            SchemaField { items: Some(Box::new(nested(2))), ..SchemaField::scalar(FieldType::Array) },
        );
        assert_eq!(list.depth(), 3);

        assert!(nested(MAX_SCHEMA_DEPTH).validate().is_ok());
        assert!(matches!(nested(MAX_SCHEMA_DEPTH + 1).validate(), Err(SchemaError::DepthExceeded { depth: 11, .. })));
    }

    #[test]
    fn target_type_labels_parse_back() {
        for label in ["string", "number", "boolean", "object", "array[string]", "array[object]"] {
            assert_eq!(label.parse::<TargetType>().unwrap().to_string(), label);
        }
        assert!(matches!("date".parse::<TargetType>(), Err(SchemaError::UnknownType(_))));
    }
}
