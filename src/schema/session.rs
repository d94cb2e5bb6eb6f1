//! Edit sessions over a schema tree.
//!
//! [`SchemaEditor`] owns the current tree and at most one [`EditSession`]:
//!
//! ```text
//!            start_edit / InsertField
//!   None ─────────────────────────────▶ AdvancedEdit | AddingField
//!    ▲                                     │  backup = whole tree
//!    └──── confirm (drop backup) ──────────┤
//!    └──── cancel  (restore backup) ───────┘
//! ```
//!
//! Opening a session while another is active cancels the old one first and
//! emits `QuitEditing` so every open field editor closes.

use std::fmt;

use tracing::{debug, info};

use super::ops::{self, Effect, SchemaOp, field_at};
use super::path::SchemaPath;
use super::SchemaField;
use crate::bus::{BusEvent, EventBus};
use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    None,
    AdvancedEdit,
    AddingField,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    pub active_path: Option<SchemaPath>,
    pub mode: EditMode,
    /// Tree as it was when the session opened.
    pub backup: Option<SchemaField>,
}

impl EditSession {
    pub fn is_active(&self) -> bool {
        self.mode != EditMode::None
    }
}

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NameCollision { name: String },
    InvalidName { name: String },
    DepthLimit,
}

type ChangeListener = Box<dyn FnMut(&SchemaField)>;

pub struct SchemaEditor {
    tree: SchemaField,
    session: EditSession,
    listeners: Vec<ChangeListener>,
}

impl SchemaEditor {
    pub fn new(tree: SchemaField) -> Result<Self, SchemaError> {
        tree.validate()?;
        Ok(SchemaEditor { tree, session: EditSession::default(), listeners: Vec::new() })
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::new(SchemaField::from_json(json)?)
    }

    pub fn tree(&self) -> &SchemaField {
        &self.tree
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Called with the new tree after every change.
    pub fn on_change(&mut self, listener: impl FnMut(&SchemaField) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Open an advanced-edit session on the field at `path`.
    pub fn start_edit(&mut self, path: &SchemaPath, bus: &mut EventBus) -> Result<(), SchemaError> {
        if field_at(&self.tree, path).is_none() {
            return Err(SchemaError::PathNotFound(path.to_string()));
        }
        self.end_active(bus);
        self.open(path.clone(), EditMode::AdvancedEdit, self.tree.clone());
        Ok(())
    }

    /// Apply one edit to the current tree.
    ///
    /// Returns a notice when the edit was refused for a reason the user
    /// should see. Host misuse is an `Err`.
    pub fn apply(&mut self, path: &SchemaPath, op: &SchemaOp, bus: &mut EventBus) -> Result<Option<Notice>, SchemaError> {
        if *op == SchemaOp::InsertField {
            return self.insert_field(path, bus);
        }

        let applied = ops::apply(&self.tree, path, op)?;
        match applied.effect {
            Effect::Updated => {
                self.follow(path, op);
                self.publish(applied.tree);
                Ok(None)
            }
            Effect::NameCollision { name } => {
                self.restore_name(path, bus);
                Ok(Some(Notice::NameCollision { name }))
            }
            Effect::InvalidName { name } => {
                self.restore_name(path, bus);
                Ok(Some(Notice::InvalidName { name }))
            }
            Effect::Unavailable => Ok(Some(Notice::DepthLimit)),
            Effect::Unchanged | Effect::Inserted { .. } => Ok(None),
        }
    }

    /// Keep the edits made in the session.
    ///
    /// A field added in the session that never got a name is not kept: the
    /// session is cancelled instead.
    pub fn confirm(&mut self) -> bool {
        if !self.session.is_active() {
            return false;
        }
        if self.session.mode == EditMode::AddingField && self.session.active_path.as_ref().and_then(SchemaPath::name) == Some("") {
            debug!("new field left unnamed; dropped on confirm");
            return self.cancel();
        }
        debug!(path = ?self.session.active_path, "edit session confirmed");
        self.session = EditSession::default();
        true
    }

    /// Drop the edits made in the session and restore the backup verbatim.
    pub fn cancel(&mut self) -> bool {
        let session = std::mem::take(&mut self.session);
        if !session.is_active() {
            return false;
        }
        debug!(path = ?session.active_path, "edit session cancelled");
        if let Some(backup) = session.backup {
            if backup != self.tree {
                self.publish(backup);
            }
        }
        true
    }

    fn insert_field(&mut self, path: &SchemaPath, bus: &mut EventBus) -> Result<Option<Notice>, SchemaError> {
        // Validate against the tree the insert will actually see.
        let current = if self.session.is_active() {
            self.session.backup.clone().unwrap_or_else(|| self.tree.clone())
        } else {
            self.tree.clone()
        };
        let applied = ops::apply(&current, path, &SchemaOp::InsertField)?;

        match applied.effect {
            Effect::Inserted { path: inserted } => {
                self.end_active(bus);
                let backup = self.tree.clone();
                self.publish(applied.tree);
                self.open(inserted, EditMode::AddingField, backup);
                Ok(None)
            }
            Effect::NameCollision { name } => Ok(Some(Notice::NameCollision { name })),
            Effect::Unavailable => Ok(Some(Notice::DepthLimit)),
            _ => Ok(None),
        }
    }

    fn open(&mut self, path: SchemaPath, mode: EditMode, backup: SchemaField) {
        debug!(path = %path, ?mode, "edit session opened");
        self.session = EditSession { active_path: Some(path), mode, backup: Some(backup) };
    }

    fn end_active(&mut self, bus: &mut EventBus) {
        if self.cancel() {
            bus.emit(BusEvent::QuitEditing);
        }
    }

    /// Keep the active path pointing at the same field across renames and
    /// close the session when its field is deleted or an ancestor changes
    /// type (the field is gone with the old shape).
    fn follow(&mut self, path: &SchemaPath, op: &SchemaOp) {
        let Some(active) = self.session.active_path.as_ref() else {
            return;
        };
        if !active.starts_with(path) {
            return;
        }
        match op {
            SchemaOp::Rename { name } => {
                let renamed = path.parent().map(|p| p.property(name.as_str()));
                self.session.active_path = renamed.and_then(|to| active.rebase(path, &to));
            }
            SchemaOp::Delete => {
                debug!(path = %path, "active field deleted; session closed");
                self.session = EditSession::default();
            }
            SchemaOp::ChangeType { .. } if active != path => {
                debug!(path = %path, "ancestor of the active field changed type; session closed");
                self.session = EditSession::default();
            }
            _ => {}
        }
    }

    fn restore_name(&self, path: &SchemaPath, bus: &mut EventBus) {
        let previous = path.name().unwrap_or_default().to_string();
        info!(path = %path, previous = %previous, "rename refused");
        bus.emit(BusEvent::RestoreName { path: path.clone(), previous });
    }

    fn publish(&mut self, tree: SchemaField) {
        self.tree = tree;
        for listener in &mut self.listeners {
            listener(&self.tree);
        }
    }
}

impl fmt::Debug for SchemaEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaEditor")
            .field("tree", &self.tree)
            .field("session", &self.session)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::recording_bus;
    use crate::schema::{FieldType, TargetType};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn editor() -> SchemaEditor {
        SchemaEditor::new(
            SchemaField::object()
                .with_property("title", SchemaField::scalar(FieldType::String))
                .with_property("meta", SchemaField::object().with_property("tag", SchemaField::scalar(FieldType::String)))
                .with_required("title"),
        )
        .unwrap()
    }

    fn at(names: &[&str]) -> SchemaPath {
        names.iter().fold(SchemaPath::root(), |p, n| p.property(*n))
    }

    #[test]
    fn cancel_restores_the_backup_verbatim() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        let before = ed.tree().clone();

        ed.start_edit(&at(&["title"]), &mut bus).unwrap();
        ed.apply(&at(&["title"]), &SchemaOp::ChangeType { to: TargetType::Number }, &mut bus).unwrap();
        ed.apply(&at(&["title"]), &SchemaOp::ToggleRequired, &mut bus).unwrap();
        assert_ne!(ed.tree(), &before);

        assert!(ed.cancel());
        assert_eq!(ed.tree(), &before);
        assert_eq!(ed.session(), &EditSession::default());
    }

    #[test]
    fn confirm_keeps_edits_and_drops_backup() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        ed.start_edit(&at(&["title"]), &mut bus).unwrap();
        ed.apply(&at(&["title"]), &SchemaOp::ToggleRequired, &mut bus).unwrap();

        assert!(ed.confirm());
        assert!(!ed.tree().is_required("title"));
        assert!(ed.session().backup.is_none());
        assert!(!ed.cancel());
    }

    #[test]
    fn second_session_cancels_the_first() {
        let mut ed = editor();
        let (mut bus, log) = recording_bus();
        let before = ed.tree().clone();

        ed.start_edit(&at(&["title"]), &mut bus).unwrap();
        ed.apply(&at(&["title"]), &SchemaOp::Delete, &mut bus).unwrap();
        assert!(!ed.session().is_active());

        ed.start_edit(&at(&["meta"]), &mut bus).unwrap();
        ed.apply(&at(&["meta", "tag"]), &SchemaOp::ToggleRequired, &mut bus).unwrap();
        ed.start_edit(&at(&["title"]), &mut bus).unwrap_err();
        ed.start_edit(&at(&["meta", "tag"]), &mut bus).unwrap();

        assert!(matches!(log.borrow().as_slice(), [BusEvent::QuitEditing]));
        assert_eq!(ed.session().active_path, Some(at(&["meta", "tag"])));
        assert_eq!(ed.session().backup.as_ref().and_then(|b| b.properties.as_ref()).map(|p| p.contains("title")), Some(false));
        assert_ne!(ed.tree(), &before);
    }

    #[test]
    fn rename_collision_restores_the_old_name() {
        let mut ed = editor();
        let (mut bus, log) = recording_bus();
        let before = ed.tree().clone();

        let notice = ed.apply(&at(&["meta"]), &SchemaOp::Rename { name: "title".into() }, &mut bus).unwrap();
        assert_eq!(notice, Some(Notice::NameCollision { name: "title".into() }));
        assert_eq!(ed.tree(), &before);
        assert!(matches!(
            log.borrow().as_slice(),
            [BusEvent::RestoreName { previous, .. }] if previous == "meta"
        ));
    }

    #[test]
    fn rename_keeps_the_session_on_the_same_field() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        ed.start_edit(&at(&["meta", "tag"]), &mut bus).unwrap();
        ed.apply(&at(&["meta"]), &SchemaOp::Rename { name: "info".into() }, &mut bus).unwrap();
        assert_eq!(ed.session().active_path, Some(at(&["info", "tag"])));
    }

    #[test]
    fn ancestor_type_change_closes_the_session() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        ed.start_edit(&at(&["meta", "tag"]), &mut bus).unwrap();
        ed.apply(&at(&["meta"]), &SchemaOp::ChangeType { to: TargetType::String }, &mut bus).unwrap();

        assert!(!ed.session().is_active());
        assert!(field_at(ed.tree(), &at(&["meta", "tag"])).is_none());
        assert!(!ed.cancel());

        ed.start_edit(&at(&["title"]), &mut bus).unwrap();
        ed.apply(&at(&["title"]), &SchemaOp::ChangeType { to: TargetType::Number }, &mut bus).unwrap();
        assert_eq!(ed.session().active_path, Some(at(&["title"])));
    }

    #[test]
    fn insert_opens_an_adding_field_session() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        let before = ed.tree().clone();

        assert_eq!(ed.apply(&at(&["meta"]), &SchemaOp::InsertField, &mut bus).unwrap(), None);
        assert_eq!(ed.session().mode, EditMode::AddingField);
        assert_eq!(ed.session().active_path, Some(at(&["meta", ""])));

        ed.cancel();
        assert_eq!(ed.tree(), &before);
    }

    #[test]
    fn confirming_an_unnamed_field_drops_it() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        let before = ed.tree().clone();

        ed.apply(&at(&["meta"]), &SchemaOp::InsertField, &mut bus).unwrap();
        assert!(ed.confirm());
        assert_eq!(ed.tree(), &before);
        assert!(!ed.session().is_active());

        assert_eq!(ed.apply(&at(&["meta"]), &SchemaOp::InsertField, &mut bus).unwrap(), None);
        ed.apply(&at(&["meta", ""]), &SchemaOp::Rename { name: "note".into() }, &mut bus).unwrap();
        assert!(ed.confirm());
        let names: Vec<&str> = field_at(ed.tree(), &at(&["meta"])).unwrap().properties.as_ref().unwrap().names().collect();
        assert_eq!(names, vec!["tag", "note"]);
        assert!(ed.tree().validate().is_ok());
    }

    #[test]
    fn listeners_fire_on_every_change() {
        let mut ed = editor();
        let (mut bus, _) = recording_bus();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        ed.on_change(move |_| seen.set(seen.get() + 1));

        ed.apply(&at(&["title"]), &SchemaOp::ToggleRequired, &mut bus).unwrap();
        ed.apply(&at(&["title"]), &SchemaOp::Rename { name: "title".into() }, &mut bus).unwrap();
        ed.apply(&at(&["meta"]), &SchemaOp::Rename { name: "title".into() }, &mut bus).unwrap();
        assert_eq!(calls.get(), 1);
    }
}
