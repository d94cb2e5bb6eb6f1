//! Addresses of fields inside a schema tree.
//!
//! The wire form alternates container keys and names:
//!
//! ```text
//! ["properties", "user", "items", "properties", "email"]
//!   └─ Property("user") ─┘└Items┘└─ Property("email") ─┘
//! ```
//!
//! The empty path addresses the root.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Property(String),
    Items,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SchemaPath(Vec<PathStep>);

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_wire<S: AsRef<str>>(wire: &[S]) -> Result<Self, SchemaError> {
        let mut steps = Vec::new();
        let mut it = wire.iter().map(AsRef::as_ref);
        while let Some(key) = it.next() {
            match key {
                "properties" => match it.next() {
                    Some(name) => steps.push(PathStep::Property(name.to_string())),
                    None => return Err(SchemaError::MalformedPath(wire_debug(wire))),
                },
                "items" => steps.push(PathStep::Items),
                _ => return Err(SchemaError::MalformedPath(wire_debug(wire))),
            }
        }
        Ok(SchemaPath(steps))
    }

    pub fn to_wire(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.0.len() * 2);
        for step in &self.0 {
            match step {
                PathStep::Property(name) => {
                    out.push("properties".to_string());
                    out.push(name.clone());
                }
                PathStep::Items => out.push("items".to_string()),
            }
        }
        out
    }

    pub fn property(&self, name: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Property(name.into()));
        SchemaPath(steps)
    }

    pub fn items(&self) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Items);
        SchemaPath(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of named-property steps.
    pub fn depth(&self) -> usize {
        self.0.iter().filter(|s| matches!(s, PathStep::Property(_))).count()
    }

    pub fn parent(&self) -> Option<SchemaPath> {
        let (_, rest) = self.0.split_last()?;
        Some(SchemaPath(rest.to_vec()))
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.0.last()
    }

    /// Property name of the addressed field, if the last step is a property.
    pub fn name(&self) -> Option<&str> {
        match self.0.last()? {
            PathStep::Property(name) => Some(name),
            PathStep::Items => None,
        }
    }

    pub fn starts_with(&self, prefix: &SchemaPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Swap the `from` prefix for `to`; `None` when `from` is not a prefix.
    pub fn rebase(&self, from: &SchemaPath, to: &SchemaPath) -> Option<SchemaPath> {
        let rest = self.0.strip_prefix(from.0.as_slice())?;
        let mut steps = to.0.clone();
        steps.extend_from_slice(rest);
        Some(SchemaPath(steps))
    }
}

fn wire_debug<S: AsRef<str>>(wire: &[S]) -> String {
    format!("{:?}", wire.iter().map(AsRef::as_ref).collect::<Vec<_>>())
}

impl TryFrom<Vec<String>> for SchemaPath {
    type Error = SchemaError;

    fn try_from(wire: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_wire(&wire)
    }
}

impl From<SchemaPath> for Vec<String> {
    fn from(path: SchemaPath) -> Self {
        path.to_wire()
    }
}

/// `$` for the root, otherwise names joined with `.` and `[]` for items.
impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Property(name) if i == 0 => f.write_str(name)?,
                PathStep::Property(name) => write!(f, ".{name}")?,
                PathStep::Items => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}
