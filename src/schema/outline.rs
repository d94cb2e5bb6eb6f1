//! Flattened, display-ready rows for a schema tree.
//!
//! Rows come out depth-first in property order. Array fields whose items are
//! objects show the item properties directly beneath them, addressed through
//! the `items` step.

use super::path::SchemaPath;
use super::{FieldType, MAX_SCHEMA_DEPTH, SchemaField, TargetType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub path: SchemaPath,
    /// `None` for the truncation marker.
    pub name: Option<String>,
    /// Indentation level; top-level properties are 1.
    pub level: usize,
    /// Picker label, e.g. `array[object]`.
    pub type_label: String,
    pub required: bool,
    pub description: Option<String>,
    pub can_expand: bool,
    pub can_add_field: bool,
    /// Stands in for children hidden by the depth bound.
    pub truncated: bool,
}

pub fn outline(root: &SchemaField) -> Vec<OutlineRow> {
    let mut rows = Vec::new();
    walk(root, &SchemaPath::root(), &mut rows);
    rows
}

/// The object whose properties are shown under `field`, if any.
fn child_object<'f>(field: &'f SchemaField, path: &SchemaPath) -> Option<(&'f SchemaField, SchemaPath)> {
    match field.field_type {
        FieldType::Object => Some((field, path.clone())),
        FieldType::Array => {
            let items = field.items.as_deref()?;
            (items.field_type == FieldType::Object).then(|| (items, path.items()))
        }
        _ => None,
    }
}

fn walk(owner: &SchemaField, owner_path: &SchemaPath, rows: &mut Vec<OutlineRow>) {
    for (name, field) in owner.properties.iter().flat_map(|p| p.iter()) {
        let path = owner_path.property(name);
        let level = path.depth();
        let children = child_object(field, &path);
        let has_children = children.as_ref().is_some_and(|(obj, _)| obj.properties.as_ref().is_some_and(|p| !p.is_empty()));
        let at_bound = level >= MAX_SCHEMA_DEPTH;

        rows.push(OutlineRow {
            path: path.clone(),
            name: Some(name.to_string()),
            level,
            type_label: TargetType::of(field).map(|t| t.to_string()).unwrap_or_else(|| "array".to_string()),
            required: owner.is_required(name),
            description: field.description.clone(),
            can_expand: has_children && !at_bound,
            can_add_field: children.is_some() && !at_bound,
            truncated: false,
        });

        let Some((object, object_path)) = children else {
            continue;
        };
        if at_bound {
            if has_children {
                rows.push(OutlineRow {
                    path: object_path,
                    name: None,
                    level: level + 1,
                    type_label: String::new(),
                    required: false,
                    description: None,
                    can_expand: false,
                    can_add_field: false,
                    truncated: true,
                });
            }
        } else {
            walk(object, &object_path, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ItemType;
    use pretty_assertions::assert_eq;

    fn row_names(rows: &[OutlineRow]) -> Vec<(usize, String)> {
        rows.iter().map(|r| (r.level, r.path.to_string())).collect()
    }

    #[test]
    fn rows_follow_property_order_and_items() {
        let root = SchemaField::object()
            .with_property("title", SchemaField::scalar(FieldType::String))
            .with_property(
                "authors",
                SchemaField {
                    items: Some(Box::new(
                        SchemaField::object().with_property("name", SchemaField::scalar(FieldType::String)),
                    )),
                    ..SchemaField::scalar(FieldType::Array)
                },
            )
            .with_property("tags", SchemaField::array_of(ItemType::String))
            .with_required("title");

        let rows = outline(&root);
        assert_eq!(
            row_names(&rows),
            vec![(1, "title".into()), (1, "authors".into()), (2, "authors[].name".into()), (1, "tags".into())]
        );
        assert!(rows[0].required);
        assert_eq!(rows[1].type_label, "array[object]");
        assert!(rows[1].can_expand && rows[1].can_add_field);
        assert!(!rows[3].can_expand && !rows[3].can_add_field);
    }

    #[test]
    fn depth_bound_truncates_children() {
        // Built without validation: an object at the bound that still has children.
        let mut deepest = SchemaField::object().with_property("leaf", SchemaField::scalar(FieldType::String));
        for i in (0..MAX_SCHEMA_DEPTH).rev() {
            deepest = SchemaField::object().with_property(format!("l{i}"), deepest);
        }
        let rows = outline(&deepest);
        let last = rows.last().unwrap();
        assert!(last.truncated);
        assert_eq!(last.level, MAX_SCHEMA_DEPTH + 1);

        let at_bound = &rows[rows.len() - 2];
        assert_eq!(at_bound.level, MAX_SCHEMA_DEPTH);
        assert!(!at_bound.can_expand && !at_bound.can_add_field);
    }
}
