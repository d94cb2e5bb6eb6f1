//! Error types.
//!
//! Only conditions a host can hit through misuse or bad input live here.
//! Everything a user can trigger through normal editing (no match, a name
//! collision, an unresolved reference, the depth bound) is reported as a
//! value instead: `None`, an `Effect`, or `valid == false`.

use thiserror::Error;

use crate::entity::{EntityId, EntityKind};

/// Setup-time misconfiguration. Fatal: the transformer cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("entity kind '{}' is enabled but its node type is not registered with the host", .0.name())]
    UnregisteredKind(EntityKind),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("variable path must have at least one non-empty segment")]
pub struct EmptyPathError;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("variable path: {0}")]
    Path(#[from] EmptyPathError),

    #[error("'{text}' is not a well-formed {} placeholder", .kind.name())]
    Malformed { kind: EntityKind, text: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("segment {0} is out of range")]
    SegmentOutOfRange(usize),

    #[error("segment {0} is not a text segment")]
    NotText(usize),

    #[error("offset {offset} is not a char boundary of segment {segment}")]
    NotCharBoundary { segment: usize, offset: usize },

    #[error("no entity with id {0}")]
    EntityNotFound(EntityId),

    #[error("'{text}' is not a well-formed {} placeholder", .kind.name())]
    Malformed { kind: EntityKind, text: String },
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no schema field at path '{0}'")]
    PathNotFound(String),

    #[error("malformed schema path: {0}")]
    MalformedPath(String),

    #[error("field at '{0}' is not an object")]
    NotAnObject(String),

    #[error("operation needs a named property but '{0}' addresses array items or the root")]
    NotAProperty(String),

    #[error("schema root must be an object")]
    RootNotObject,

    #[error("schema nesting depth {depth} exceeds the maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("'{name}' is listed as required at '{path}' but no such property exists")]
    DanglingRequired { path: String, name: String },

    #[error("object at '{0}' has a property with an empty name")]
    EmptyPropertyName(String),

    #[error("unknown field type '{0}'")]
    UnknownType(String),
}
