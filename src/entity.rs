//! Entity node model.
//!
//! An entity is a structured, non-text unit embedded inline in a document. The
//! kinds form a closed set; every kind carries only its own payload and all
//! per-kind behavior dispatches on [`EntityPayload`] in one place:
//!
//! ```text
//! EntityPayload ──┬─ canonical_placeholder()  -> wire text, e.g. {{#query#}}
//!                 ├─ to_snapshot()            -> {"type": "query", "version": 1}
//!                 └─ is_well_formed()         -> projection re-parses to itself
//! ```
//!
//! Display data (node titles, pool types) is deliberately absent: it is read
//! from the current `Context` at render time, so a metadata refresh never
//! requires touching the nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::resolver::VariablePath;

/// Snapshot format version written by [`EntityNode::to_snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Context,
    Query,
    History,
    VariableValue,
    WorkflowVariable,
    Current,
    ErrorMessage,
    LastRun,
    RequestUrl,
    HitlInput,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Context,
        EntityKind::Query,
        EntityKind::History,
        EntityKind::VariableValue,
        EntityKind::WorkflowVariable,
        EntityKind::Current,
        EntityKind::ErrorMessage,
        EntityKind::LastRun,
        EntityKind::RequestUrl,
        EntityKind::HitlInput,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Context => "context",
            EntityKind::Query => "query",
            EntityKind::History => "history",
            EntityKind::VariableValue => "variable-value",
            EntityKind::WorkflowVariable => "workflow-variable",
            EntityKind::Current => "current",
            EntityKind::ErrorMessage => "error-message",
            EntityKind::LastRun => "last-run",
            EntityKind::RequestUrl => "request-url",
            EntityKind::HitlInput => "hitl-input",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Wire token of the bare keyword kinds (`{{#<token>#}}`).
    pub fn keyword_token(self) -> Option<&'static str> {
        match self {
            EntityKind::Context => Some("context"),
            EntityKind::Query => Some("query"),
            EntityKind::History => Some("histories"),
            EntityKind::Current => Some("current"),
            EntityKind::ErrorMessage => Some("error_message"),
            EntityKind::LastRun => Some("last_run"),
            EntityKind::RequestUrl => Some("url"),
            EntityKind::VariableValue | EntityKind::WorkflowVariable | EntityKind::HitlInput => None,
        }
    }

    pub fn flag(self) -> KindSet {
        match self {
            EntityKind::Context => KindSet::CONTEXT,
            EntityKind::Query => KindSet::QUERY,
            EntityKind::History => KindSet::HISTORY,
            EntityKind::VariableValue => KindSet::VARIABLE_VALUE,
            EntityKind::WorkflowVariable => KindSet::WORKFLOW_VARIABLE,
            EntityKind::Current => KindSet::CURRENT,
            EntityKind::ErrorMessage => KindSet::ERROR_MESSAGE,
            EntityKind::LastRun => KindSet::LAST_RUN,
            EntityKind::RequestUrl => KindSet::REQUEST_URL,
            EntityKind::HitlInput => KindSet::HITL_INPUT,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// A set of entity kinds: the kinds an editor enables, or the node types a
    /// host has registered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindSet: u16 {
        const CONTEXT           = 1 << 0;
        const QUERY             = 1 << 1;
        const HISTORY           = 1 << 2;
        const VARIABLE_VALUE    = 1 << 3;
        const WORKFLOW_VARIABLE = 1 << 4;
        const CURRENT           = 1 << 5;
        const ERROR_MESSAGE     = 1 << 6;
        const LAST_RUN          = 1 << 7;
        const REQUEST_URL       = 1 << 8;
        const HITL_INPUT        = 1 << 9;
    }
}

impl KindSet {
    pub fn has(self, kind: EntityKind) -> bool {
        self.contains(kind.flag())
    }

    /// Kinds in the set, in [`EntityKind::ALL`] order.
    pub fn kinds(self) -> impl Iterator<Item = EntityKind> {
        EntityKind::ALL.into_iter().filter(move |k| self.has(*k))
    }
}

impl FromIterator<EntityKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = EntityKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::empty(), |set, kind| set | kind.flag())
    }
}

/// Identity key of an entity within one document lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityPayload {
    Context,
    Query,
    History,
    Current,
    ErrorMessage,
    LastRun,
    RequestUrl,
    /// `{{name}}`
    VariableValue { name: String },
    /// `{{#seg.seg...#}}`
    WorkflowVariable { path: VariablePath },
    /// `{{#$output.field#}}`
    HitlInput { field: String },
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Context => EntityKind::Context,
            EntityPayload::Query => EntityKind::Query,
            EntityPayload::History => EntityKind::History,
            EntityPayload::Current => EntityKind::Current,
            EntityPayload::ErrorMessage => EntityKind::ErrorMessage,
            EntityPayload::LastRun => EntityKind::LastRun,
            EntityPayload::RequestUrl => EntityKind::RequestUrl,
            EntityPayload::VariableValue { .. } => EntityKind::VariableValue,
            EntityPayload::WorkflowVariable { .. } => EntityKind::WorkflowVariable,
            EntityPayload::HitlInput { .. } => EntityKind::HitlInput,
        }
    }

    /// Payload of a bare keyword kind; `None` for kinds that carry data.
    pub fn keyword(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Context => Some(EntityPayload::Context),
            EntityKind::Query => Some(EntityPayload::Query),
            EntityKind::History => Some(EntityPayload::History),
            EntityKind::Current => Some(EntityPayload::Current),
            EntityKind::ErrorMessage => Some(EntityPayload::ErrorMessage),
            EntityKind::LastRun => Some(EntityPayload::LastRun),
            EntityKind::RequestUrl => Some(EntityPayload::RequestUrl),
            EntityKind::VariableValue | EntityKind::WorkflowVariable | EntityKind::HitlInput => None,
        }
    }

    /// The wire form persisted in documents.
    pub fn canonical_placeholder(&self) -> String {
        match self {
            EntityPayload::VariableValue { name } => format!("{{{{{name}}}}}"),
            EntityPayload::WorkflowVariable { path } => format!("{{{{#{}#}}}}", path.dotted()),
            EntityPayload::HitlInput { field } => format!("{{{{#$output.{field}#}}}}"),
            keyword => {
                let token = keyword.kind().keyword_token().unwrap_or_default();
                format!("{{{{#{token}#}}}}")
            }
        }
    }

    /// True when the canonical placeholder is recognized, whole, by this
    /// kind's own matcher and yields this payload back.
    pub fn is_well_formed(&self) -> bool {
        let text = self.canonical_placeholder();
        match crate::rules::for_kind(self.kind()).capture(&text) {
            Some((span, payload)) => span.start == 0 && span.end == text.len() && payload == *self,
            None => false,
        }
    }

    fn to_body(&self) -> SnapshotBody {
        match self {
            EntityPayload::Context => SnapshotBody::Context,
            EntityPayload::Query => SnapshotBody::Query,
            EntityPayload::History => SnapshotBody::History,
            EntityPayload::Current => SnapshotBody::Current,
            EntityPayload::ErrorMessage => SnapshotBody::ErrorMessage,
            EntityPayload::LastRun => SnapshotBody::LastRun,
            EntityPayload::RequestUrl => SnapshotBody::RequestUrl,
            EntityPayload::VariableValue { name } => SnapshotBody::VariableValue { name: name.clone() },
            EntityPayload::WorkflowVariable { path } => {
                SnapshotBody::WorkflowVariable { variables: path.segments().to_vec() }
            }
            EntityPayload::HitlInput { field } => SnapshotBody::HitlInput { variable_name: field.clone() },
        }
    }

    fn from_body(body: &SnapshotBody) -> Result<Self, SnapshotError> {
        Ok(match body {
            SnapshotBody::Context => EntityPayload::Context,
            SnapshotBody::Query => EntityPayload::Query,
            SnapshotBody::History => EntityPayload::History,
            SnapshotBody::Current => EntityPayload::Current,
            SnapshotBody::ErrorMessage => EntityPayload::ErrorMessage,
            SnapshotBody::LastRun => EntityPayload::LastRun,
            SnapshotBody::RequestUrl => EntityPayload::RequestUrl,
            SnapshotBody::VariableValue { name } => EntityPayload::VariableValue { name: name.clone() },
            SnapshotBody::WorkflowVariable { variables } => {
                EntityPayload::WorkflowVariable { path: VariablePath::new(variables.iter().cloned())? }
            }
            SnapshotBody::HitlInput { variable_name } => EntityPayload::HitlInput { field: variable_name.clone() },
        })
    }
}

/// An entity as it sits in a document: identity plus payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityNode {
    id: EntityId,
    payload: EntityPayload,
}

impl EntityNode {
    pub fn from_payload(id: EntityId, payload: EntityPayload) -> Self {
        EntityNode { id, payload }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &EntityPayload {
        &self.payload
    }

    /// Plain-text form of the node: its canonical placeholder.
    pub fn text_projection(&self) -> String {
        self.payload.canonical_placeholder()
    }

    pub fn to_snapshot(&self) -> EntitySnapshot {
        EntitySnapshot { body: self.payload.to_body(), version: SNAPSHOT_VERSION }
    }

    /// Rebuild a node from a snapshot, assigning it `id`.
    pub fn from_snapshot(id: EntityId, snapshot: &EntitySnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion { found: snapshot.version, expected: SNAPSHOT_VERSION });
        }
        let payload = EntityPayload::from_body(&snapshot.body)?;
        if !payload.is_well_formed() {
            return Err(SnapshotError::Malformed { kind: payload.kind(), text: payload.canonical_placeholder() });
        }
        Ok(EntityNode { id, payload })
    }

    /// Same payload under a new identity (copy/paste, duplication).
    pub fn clone_with_id(&self, id: EntityId) -> Self {
        EntityNode { id, payload: self.payload.clone() }
    }
}

/// Structured export of one entity, `{"type": <kind>, "version": 1, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(flatten)]
    body: SnapshotBody,
    version: u32,
}

impl EntitySnapshot {
    pub fn kind(&self) -> EntityKind {
        match &self.body {
            SnapshotBody::Context => EntityKind::Context,
            SnapshotBody::Query => EntityKind::Query,
            SnapshotBody::History => EntityKind::History,
            SnapshotBody::Current => EntityKind::Current,
            SnapshotBody::ErrorMessage => EntityKind::ErrorMessage,
            SnapshotBody::LastRun => EntityKind::LastRun,
            SnapshotBody::RequestUrl => EntityKind::RequestUrl,
            SnapshotBody::VariableValue { .. } => EntityKind::VariableValue,
            SnapshotBody::WorkflowVariable { .. } => EntityKind::WorkflowVariable,
            SnapshotBody::HitlInput { .. } => EntityKind::HitlInput,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum SnapshotBody {
    Context,
    Query,
    History,
    Current,
    ErrorMessage,
    LastRun,
    RequestUrl,
    VariableValue { name: String },
    WorkflowVariable { variables: Vec<String> },
    HitlInput { variable_name: String },
}
