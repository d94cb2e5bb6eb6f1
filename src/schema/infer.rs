//! Schema inference from a sample JSON value.
//!
//! - objects become object fields; every sample key is required
//! - arrays take their item type from the first element (`string` when empty)
//! - `null` falls back to `string`
//! - properties keep the sample's key order
//!
//! Nesting is capped at `MAX_SCHEMA_DEPTH`: objects at the bound are kept
//! but lose their properties.

use serde_json::Value;
use tracing::debug;

use super::{FieldType, ItemType, MAX_SCHEMA_DEPTH, SchemaField};
use crate::error::SchemaError;

pub fn infer_schema(sample: &Value) -> Result<SchemaField, SchemaError> {
    if !sample.is_object() {
        return Err(SchemaError::RootNotObject);
    }
    let root = infer_field(sample, 0);
    debug!(depth = root.depth(), "schema inferred");
    Ok(root)
}

/// `depth` is the property depth of the field being built.
fn infer_field(value: &Value, depth: usize) -> SchemaField {
    match value {
        Value::Object(map) => {
            let mut field = SchemaField::object();
            if depth < MAX_SCHEMA_DEPTH {
                for (key, child) in map {
                    field = field.with_property(key.clone(), infer_field(child, depth + 1)).with_required(key.clone());
                }
            }
            field
        }
        Value::Array(elements) => match elements.first() {
            Some(first @ Value::Object(_)) => SchemaField {
                items: Some(Box::new(infer_field(first, depth))),
                ..SchemaField::scalar(FieldType::Array)
            },
            Some(Value::Number(_)) => SchemaField::array_of(ItemType::Number),
            Some(Value::Bool(_)) => SchemaField::array_of(ItemType::Boolean),
            _ => SchemaField::array_of(ItemType::String),
        },
        Value::Number(_) => SchemaField::scalar(FieldType::Number),
        Value::Bool(_) => SchemaField::scalar(FieldType::Boolean),
        Value::String(_) | Value::Null => SchemaField::scalar(FieldType::String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TargetType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn infers_nested_shapes() {
        let root = infer_schema(&json!({
            "title": "x",
            "score": 4.5,
            "done": false,
            "tags": [],
            "authors": [{ "name": "a", "age": 3 }],
            "extra": null
        }))
        .unwrap();

        let props = root.properties.as_ref().unwrap();
        assert_eq!(props.names().collect::<Vec<_>>(), vec!["title", "score", "done", "tags", "authors", "extra"]);
        let label = |name: &str| TargetType::of(props.get(name).unwrap()).map(|t| t.to_string());
        assert_eq!(label("title").as_deref(), Some("string"));
        assert_eq!(label("score").as_deref(), Some("number"));
        assert_eq!(label("done").as_deref(), Some("boolean"));
        assert_eq!(label("tags").as_deref(), Some("array[string]"));
        assert_eq!(label("authors").as_deref(), Some("array[object]"));
        assert_eq!(label("extra").as_deref(), Some("string"));
        assert!(root.is_required("authors"));
        assert!(root.validate().is_ok());
    }

    #[test]
    fn keys_keep_sample_order() {
        let root = infer_schema(&json!({ "zeta": 1, "alpha": "x" })).unwrap();
        let names: Vec<&str> = root.properties.as_ref().unwrap().names().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(root.required, Some(vec!["zeta".to_string(), "alpha".to_string()]));
    }

    #[test]
    fn inference_is_depth_capped() {
        let mut sample = json!({ "leaf": 1 });
        for _ in 0..MAX_SCHEMA_DEPTH + 3 {
            sample = json!({ "n": sample });
        }
        let root = infer_schema(&sample).unwrap();
        assert_eq!(root.depth(), MAX_SCHEMA_DEPTH);
        assert!(root.validate().is_ok());
    }

    #[test]
    fn root_must_be_an_object() {
        assert!(matches!(infer_schema(&json!([1, 2])), Err(SchemaError::RootNotObject)));
    }
}
