//! Path-addressed schema edits.
//!
//! [`apply`] is a pure function `(tree, path, op) -> (tree', effect)`. Every
//! user-reachable outcome is an [`Effect`]; only host misuse (a path that
//! addresses nothing, an operation the addressed node cannot take) is a
//! `SchemaError`.
//!
//! ```text
//! rename          -> Updated | Unchanged | NameCollision | InvalidName
//! change_type     -> Updated | Unchanged
//! toggle_required -> Updated
//! edit_meta       -> Updated | Unchanged
//! delete          -> Updated
//! insert_field    -> Inserted | NameCollision | Unavailable
//! ```
//!
//! When the effect is not `Updated`/`Inserted`, the returned tree equals the
//! input.

use serde_json::Value;
use tracing::debug;

use super::path::{PathStep, SchemaPath};
use super::{FieldType, MAX_SCHEMA_DEPTH, SchemaField, TargetType};
use crate::error::SchemaError;

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOp {
    Rename { name: String },
    ChangeType { to: TargetType },
    ToggleRequired,
    /// Only `description` and `enum` are editable here; `None` clears.
    EditMeta { description: Option<String>, enum_values: Option<Vec<Value>> },
    Delete,
    /// Append an empty-named string field to the addressed object.
    InsertField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Updated,
    /// A field was added at `path`.
    Inserted { path: SchemaPath },
    /// A sibling already uses `name`; nothing changed.
    NameCollision { name: String },
    InvalidName { name: String },
    /// The depth bound leaves no room for the operation.
    Unavailable,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub tree: SchemaField,
    pub effect: Effect,
}

impl Applied {
    fn unchanged(tree: &SchemaField, effect: Effect) -> Self {
        Applied { tree: tree.clone(), effect }
    }

    pub fn changed(&self) -> bool {
        matches!(self.effect, Effect::Updated | Effect::Inserted { .. })
    }
}

pub fn field_at<'t>(tree: &'t SchemaField, path: &SchemaPath) -> Option<&'t SchemaField> {
    path.steps().iter().try_fold(tree, |field, step| match step {
        PathStep::Property(name) => field.properties.as_ref()?.get(name),
        PathStep::Items => field.items.as_deref(),
    })
}

fn field_at_mut<'t>(tree: &'t mut SchemaField, path: &SchemaPath) -> Option<&'t mut SchemaField> {
    path.steps().iter().try_fold(tree, |field, step| match step {
        PathStep::Property(name) => field.properties.as_mut()?.get_mut(name),
        PathStep::Items => field.items.as_deref_mut(),
    })
}

/// Apply `op` to the field at `path` and return the new tree.
pub fn apply(tree: &SchemaField, path: &SchemaPath, op: &SchemaOp) -> Result<Applied, SchemaError> {
    let field = field_at(tree, path).ok_or_else(|| SchemaError::PathNotFound(path.to_string()))?;

    let applied = match op {
        SchemaOp::Rename { name } => rename(tree, path, name)?,
        SchemaOp::ChangeType { to } => change_type(tree, path, field, *to)?,
        SchemaOp::ToggleRequired => toggle_required(tree, path)?,
        SchemaOp::EditMeta { description, enum_values } => edit_meta(tree, path, field, description, enum_values)?,
        SchemaOp::Delete => delete(tree, path)?,
        SchemaOp::InsertField => insert_field(tree, path, field)?,
    };

    debug!(path = %path, op = ?op, effect = ?applied.effect, "schema op");
    Ok(applied)
}

fn is_valid_name(name: &str) -> bool {
    regex!(r"^[a-zA-Z_][a-zA-Z0-9_]{0,49}$").is_match(name)
}

/// Split a property path into `(owner path, name)`.
fn owner_of(path: &SchemaPath) -> Result<(SchemaPath, &str), SchemaError> {
    match (path.parent(), path.name()) {
        (Some(parent), Some(name)) => Ok((parent, name)),
        _ => Err(SchemaError::NotAProperty(path.to_string())),
    }
}

fn with_field<F>(tree: &SchemaField, path: &SchemaPath, edit: F) -> Result<SchemaField, SchemaError>
where
    F: FnOnce(&mut SchemaField),
{
    let mut next = tree.clone();
    let target = field_at_mut(&mut next, path).ok_or_else(|| SchemaError::PathNotFound(path.to_string()))?;
    edit(target);
    Ok(next)
}

fn rename(tree: &SchemaField, path: &SchemaPath, new_name: &str) -> Result<Applied, SchemaError> {
    let (owner_path, old_name) = owner_of(path)?;
    if old_name == new_name {
        return Ok(Applied::unchanged(tree, Effect::Unchanged));
    }
    if !is_valid_name(new_name) {
        return Ok(Applied::unchanged(tree, Effect::InvalidName { name: new_name.to_string() }));
    }
    let owner = field_at(tree, &owner_path).ok_or_else(|| SchemaError::PathNotFound(owner_path.to_string()))?;
    if owner.properties.as_ref().is_some_and(|p| p.contains(new_name)) {
        return Ok(Applied::unchanged(tree, Effect::NameCollision { name: new_name.to_string() }));
    }

    let next = with_field(tree, &owner_path, |owner| {
        if let Some(props) = owner.properties.as_mut() {
            props.rename(old_name, new_name);
        }
        for entry in owner.required.iter_mut().flatten() {
            if *entry == old_name {
                *entry = new_name.to_string();
            }
        }
    })?;
    Ok(Applied { tree: next, effect: Effect::Updated })
}

fn change_type(
    tree: &SchemaField,
    path: &SchemaPath,
    current: &SchemaField,
    to: TargetType,
) -> Result<Applied, SchemaError> {
    if path.is_root() {
        return match to {
            TargetType::Object => Ok(Applied::unchanged(tree, Effect::Unchanged)),
            _ => Err(SchemaError::RootNotObject),
        };
    }
    if TargetType::of(current) == Some(to) {
        return Ok(Applied::unchanged(tree, Effect::Unchanged));
    }

    let next = with_field(tree, path, |field| {
        let description = field.description.take();
        let enum_values = field.enum_values.take().filter(|_| to.supports_enum());
        let mut replacement = match to {
            TargetType::Object => SchemaField::object(),
            TargetType::Array(item) => SchemaField::array_of(item),
            TargetType::String => SchemaField::scalar(FieldType::String),
            TargetType::Number => SchemaField::scalar(FieldType::Number),
            TargetType::Boolean => SchemaField::scalar(FieldType::Boolean),
        };
        replacement.description = description;
        replacement.enum_values = enum_values;
        *field = replacement;
    })?;
    Ok(Applied { tree: next, effect: Effect::Updated })
}

fn toggle_required(tree: &SchemaField, path: &SchemaPath) -> Result<Applied, SchemaError> {
    let (owner_path, name) = owner_of(path)?;
    let next = with_field(tree, &owner_path, |owner| {
        let required = owner.required.get_or_insert_with(Vec::new);
        match required.iter().position(|n| n == name) {
            Some(idx) => {
                required.remove(idx);
            }
            None => required.push(name.to_string()),
        }
    })?;
    Ok(Applied { tree: next, effect: Effect::Updated })
}

fn edit_meta(
    tree: &SchemaField,
    path: &SchemaPath,
    current: &SchemaField,
    description: &Option<String>,
    enum_values: &Option<Vec<Value>>,
) -> Result<Applied, SchemaError> {
    let description = description.clone().filter(|d| !d.is_empty());
    let enum_values = enum_values.clone().filter(|e| !e.is_empty());
    if current.description == description && current.enum_values == enum_values {
        return Ok(Applied::unchanged(tree, Effect::Unchanged));
    }
    let next = with_field(tree, path, |field| {
        field.description = description;
        field.enum_values = enum_values;
    })?;
    Ok(Applied { tree: next, effect: Effect::Updated })
}

fn delete(tree: &SchemaField, path: &SchemaPath) -> Result<Applied, SchemaError> {
    let (owner_path, name) = owner_of(path)?;
    let next = with_field(tree, &owner_path, |owner| {
        if let Some(props) = owner.properties.as_mut() {
            props.remove(name);
        }
        if let Some(required) = owner.required.as_mut() {
            required.retain(|n| n != name);
        }
    })?;
    Ok(Applied { tree: next, effect: Effect::Updated })
}

fn insert_field(tree: &SchemaField, path: &SchemaPath, target: &SchemaField) -> Result<Applied, SchemaError> {
    if target.field_type != FieldType::Object {
        return Err(SchemaError::NotAnObject(path.to_string()));
    }
    if path.depth() + 1 > MAX_SCHEMA_DEPTH {
        return Ok(Applied::unchanged(tree, Effect::Unavailable));
    }
    if target.properties.as_ref().is_some_and(|p| p.contains("")) {
        return Ok(Applied::unchanged(tree, Effect::NameCollision { name: String::new() }));
    }

    let next = with_field(tree, path, |object| {
        object.properties.get_or_insert_with(Default::default).push(String::new(), SchemaField::scalar(FieldType::String));
    })?;
    Ok(Applied { tree: next, effect: Effect::Inserted { path: path.property("") } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ItemType;
    use pretty_assertions::assert_eq;

    fn root() -> SchemaField {
        SchemaField::object()
            .with_property("name", SchemaField::scalar(FieldType::String).with_description("full name"))
            .with_property(
                "address",
                SchemaField::object().with_property("city", SchemaField::scalar(FieldType::String)).with_required("city"),
            )
            .with_property("age", SchemaField::scalar(FieldType::Number))
            .with_required("name")
    }

    fn at(names: &[&str]) -> SchemaPath {
        names.iter().fold(SchemaPath::root(), |p, n| p.property(*n))
    }

    fn names(tree: &SchemaField) -> Vec<String> {
        tree.properties.as_ref().unwrap().names().map(str::to_string).collect()
    }

    #[test]
    fn rename_collision_leaves_tree_unchanged() {
        let tree = root();
        let out = apply(&tree, &at(&["age"]), &SchemaOp::Rename { name: "name".into() }).unwrap();
        assert_eq!(out.effect, Effect::NameCollision { name: "name".into() });
        assert_eq!(out.tree, tree);
    }

    #[test]
    fn rename_keeps_position_and_required_entry() {
        let out = apply(&root(), &at(&["name"]), &SchemaOp::Rename { name: "full_name".into() }).unwrap();
        assert_eq!(out.effect, Effect::Updated);
        assert_eq!(names(&out.tree), vec!["full_name", "address", "age"]);
        assert!(out.tree.is_required("full_name"));
        assert!(!out.tree.is_required("name"));
        assert!(out.tree.validate().is_ok());
    }

    #[test]
    fn rename_rejects_invalid_names() {
        let out = apply(&root(), &at(&["age"]), &SchemaOp::Rename { name: "two words".into() }).unwrap();
        assert_eq!(out.effect, Effect::InvalidName { name: "two words".into() });
    }

    #[test]
    fn rename_on_items_is_misuse() {
        let tree = SchemaField::object().with_property("tags", SchemaField::array_of(ItemType::String));
        let err = apply(&tree, &at(&["tags"]).items(), &SchemaOp::Rename { name: "x".into() }).unwrap_err();
        assert!(matches!(err, SchemaError::NotAProperty(_)));
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = apply(&root(), &at(&["ghost"]), &SchemaOp::Delete).unwrap_err();
        assert!(matches!(err, SchemaError::PathNotFound(_)));
    }

    #[test]
    fn object_to_array_cascade() {
        let out = apply(&root(), &at(&["address"]), &SchemaOp::ChangeType { to: TargetType::Array(ItemType::String) })
            .unwrap();
        let field = field_at(&out.tree, &at(&["address"])).unwrap();
        assert_eq!(field, &SchemaField::array_of(ItemType::String));
        assert!(field.properties.is_none() && field.required.is_none() && field.additional_properties.is_none());
    }

    #[test]
    fn array_to_object_cascade() {
        let tree = SchemaField::object().with_property("tags", SchemaField::array_of(ItemType::Number));
        let out = apply(&tree, &at(&["tags"]), &SchemaOp::ChangeType { to: TargetType::Object }).unwrap();
        assert_eq!(field_at(&out.tree, &at(&["tags"])), Some(&SchemaField::object()));
    }

    #[test]
    fn array_of_objects_gets_scaffolding() {
        let out = apply(&root(), &at(&["age"]), &SchemaOp::ChangeType { to: TargetType::Array(ItemType::Object) })
            .unwrap();
        let items = field_at(&out.tree, &at(&["age"]).items()).unwrap();
        assert_eq!(items, &SchemaField::object());
    }

    #[test]
    fn scalar_change_keeps_description_and_enum_only_where_supported() {
        let tree = SchemaField::object().with_property(
            "level",
            SchemaField {
                enum_values: Some(vec![Value::from("low"), Value::from("high")]),
                ..SchemaField::scalar(FieldType::String).with_description("priority")
            },
        );
        let to_number = apply(&tree, &at(&["level"]), &SchemaOp::ChangeType { to: TargetType::Number }).unwrap();
        let field = field_at(&to_number.tree, &at(&["level"])).unwrap();
        assert_eq!(field.description.as_deref(), Some("priority"));
        assert!(field.enum_values.is_some());

        let to_bool = apply(&tree, &at(&["level"]), &SchemaOp::ChangeType { to: TargetType::Boolean }).unwrap();
        assert_eq!(field_at(&to_bool.tree, &at(&["level"])).unwrap().enum_values, None);
    }

    #[test]
    fn root_must_stay_an_object() {
        let err = apply(&root(), &SchemaPath::root(), &SchemaOp::ChangeType { to: TargetType::String }).unwrap_err();
        assert!(matches!(err, SchemaError::RootNotObject));
    }

    #[test]
    fn toggle_required_flips_membership() {
        let once = apply(&root(), &at(&["age"]), &SchemaOp::ToggleRequired).unwrap();
        assert!(once.tree.is_required("age"));
        let twice = apply(&once.tree, &at(&["age"]), &SchemaOp::ToggleRequired).unwrap();
        assert!(!twice.tree.is_required("age"));
    }

    #[test]
    fn delete_removes_required_entry() {
        let out = apply(&root(), &at(&["address", "city"]), &SchemaOp::Delete).unwrap();
        let address = field_at(&out.tree, &at(&["address"])).unwrap();
        assert!(address.properties.as_ref().unwrap().is_empty());
        assert_eq!(address.required, Some(vec![]));
    }

    #[test]
    fn edit_meta_touches_only_meta() {
        let op = SchemaOp::EditMeta { description: Some("years".into()), enum_values: None };
        let out = apply(&root(), &at(&["age"]), &op).unwrap();
        let age = field_at(&out.tree, &at(&["age"])).unwrap();
        assert_eq!(age.description.as_deref(), Some("years"));
        assert_eq!(age.field_type, FieldType::Number);

        let again = apply(&out.tree, &at(&["age"]), &op).unwrap();
        assert_eq!(again.effect, Effect::Unchanged);
    }

    #[test]
    fn insert_field_appends_and_reports_path() {
        let out = apply(&root(), &at(&["address"]), &SchemaOp::InsertField).unwrap();
        assert_eq!(out.effect, Effect::Inserted { path: at(&["address", ""]) });

        let second = apply(&out.tree, &at(&["address"]), &SchemaOp::InsertField).unwrap();
        assert_eq!(second.effect, Effect::NameCollision { name: String::new() });
        assert_eq!(second.tree, out.tree);

        let err = apply(&root(), &at(&["age"]), &SchemaOp::InsertField).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject(_)));
    }

    #[test]
    fn insert_beyond_depth_bound_is_unavailable() {
        let mut tree = SchemaField::object();
        let mut path = SchemaPath::root();
        for i in 0..MAX_SCHEMA_DEPTH {
            let out = apply(&tree, &path, &SchemaOp::InsertField).unwrap();
            assert!(matches!(out.effect, Effect::Inserted { .. }), "level {i}");
            let inserted = path.property("");
            let renamed = apply(&out.tree, &inserted, &SchemaOp::Rename { name: format!("l{i}") }).unwrap().tree;
            path = path.property(format!("l{i}"));
            tree = apply(&renamed, &path, &SchemaOp::ChangeType { to: TargetType::Object }).unwrap().tree;
        }
        assert_eq!(tree.depth(), MAX_SCHEMA_DEPTH);

        let out = apply(&tree, &path, &SchemaOp::InsertField).unwrap();
        assert_eq!(out.effect, Effect::Unavailable);
        assert_eq!(out.tree, tree);
        assert!(tree.validate().is_ok());
    }
}
