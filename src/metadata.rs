//! Inbound metadata supplied by the host.
//!
//! The host pushes a fresh [`Metadata`] snapshot whenever the workflow graph or
//! one of the variable pools changes (see `BusEvent::MetadataUpdated`). The
//! core never mutates a snapshot; it only reads the latest one it was given.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Host callback resolving the value type of a node output: `(node_id, path)`.
pub type TypeResolver = Arc<dyn Fn(&str, &[String]) -> Option<VarType> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// What the core knows about one workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub title: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
}

impl NodeInfo {
    pub fn titled(title: impl Into<String>) -> Self {
        NodeInfo { title: title.into(), node_type: String::new(), position: Position::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "secret")]
    Secret,
    #[serde(rename = "array[string]")]
    ArrayString,
    #[serde(rename = "array[number]")]
    ArrayNumber,
    #[serde(rename = "array[boolean]")]
    ArrayBoolean,
    #[serde(rename = "array[object]")]
    ArrayObject,
    #[serde(rename = "array[file]")]
    ArrayFile,
    #[serde(rename = "any")]
    Any,
}

impl VarType {
    pub fn as_str(self) -> &'static str {
        match self {
            VarType::String => "string",
            VarType::Number => "number",
            VarType::Integer => "integer",
            VarType::Boolean => "boolean",
            VarType::Object => "object",
            VarType::File => "file",
            VarType::Secret => "secret",
            VarType::ArrayString => "array[string]",
            VarType::ArrayNumber => "array[number]",
            VarType::ArrayBoolean => "array[boolean]",
            VarType::ArrayObject => "array[object]",
            VarType::ArrayFile => "array[file]",
            VarType::Any => "any",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared variable in a flat pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolVar {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
}

impl PoolVar {
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        PoolVar { name: name.into(), var_type }
    }
}

/// The pool-backed variable scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolScope {
    Environment,
    Conversation,
    Rag,
}

impl PoolScope {
    /// Leading path segment that selects this scope.
    pub fn prefix(self) -> &'static str {
        match self {
            PoolScope::Environment => "env",
            PoolScope::Conversation => "conversation",
            PoolScope::Rag => "rag",
        }
    }
}

/// Snapshot of everything path resolution reads.
///
/// A pool set to `None` has not been supplied yet; that is different from an
/// empty pool, which positively declares "no variables".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub nodes: HashMap<String, NodeInfo>,
    #[serde(default)]
    pub environment: Option<Vec<PoolVar>>,
    #[serde(default)]
    pub conversation: Option<Vec<PoolVar>>,
    #[serde(default)]
    pub rag: Option<Vec<PoolVar>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, id: impl Into<String>, info: NodeInfo) -> Self {
        self.nodes.insert(id.into(), info);
        self
    }

    pub fn with_pool(mut self, scope: PoolScope, vars: Vec<PoolVar>) -> Self {
        match scope {
            PoolScope::Environment => self.environment = Some(vars),
            PoolScope::Conversation => self.conversation = Some(vars),
            PoolScope::Rag => self.rag = Some(vars),
        }
        self
    }

    pub fn node(&self, id: &str) -> Option<&NodeInfo> {
        self.nodes.get(id)
    }

    pub fn pool(&self, scope: PoolScope) -> Option<&[PoolVar]> {
        match scope {
            PoolScope::Environment => self.environment.as_deref(),
            PoolScope::Conversation => self.conversation.as_deref(),
            PoolScope::Rag => self.rag.as_deref(),
        }
    }
}
