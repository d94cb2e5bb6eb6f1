//! Variable path resolution.
//!
//! A workflow-variable placeholder carries a dotted path such as
//! `node1.output`, `sys.query` or `env.api_key`. Resolution answers three
//! questions about such a path without evaluating anything:
//!
//! ```text
//! path ──┬─ env.*           -> Environment   (pool-backed)
//!        ├─ conversation.*  -> Conversation  (pool-backed)
//!        ├─ rag.*           -> Rag           (pool-backed)
//!        ├─ <id in nodes>.* -> WorkflowNode
//!        ├─ sys.*           -> System
//!        └─ anything else   -> WorkflowNode (unresolved, invalid)
//! ```
//!
//! - **category**: which scope the path lives in (first matching rule above).
//! - **valid**: whether the scope actually declares it.
//! - **display name**: the short label shown inline.
//!
//! [`classify`] is a pure function of `(path, metadata)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EmptyPathError;
use crate::metadata::{Metadata, PoolScope, PoolVar};

/// Namespace keyword for system variables (`sys.query`, `sys.files`, ...).
pub const SYSTEM_NAMESPACE: &str = "sys";

/// Node output names that only exist on a node's error branch.
const EXCEPTION_OUTPUTS: &[&str] = &["error_message", "error_type"];

/// An ordered, non-empty list of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct VariablePath(Vec<String>);

impl VariablePath {
    /// Build a path from segments. Empty paths and empty segments are rejected.
    pub fn new<I, S>(segments: I) -> Result<Self, EmptyPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(EmptyPathError);
        }
        Ok(VariablePath(segments))
    }

    /// Split a dotted string strictly on `.`.
    pub fn parse(dotted: &str) -> Result<Self, EmptyPathError> {
        Self::new(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn head(&self) -> &str {
        &self.0[0]
    }

    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_system(&self) -> bool {
        self.head() == SYSTEM_NAMESPACE
    }

    /// Dotted join of all segments.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// Segments with `sys.<name>` collapsed into one logical unit.
    ///
    /// `["sys", "query"]` -> `["sys.query"]`,
    /// `["sys", "files", "url"]` -> `["sys.files", "url"]`.
    pub fn logical_segments(&self) -> Vec<String> {
        if self.is_system() && self.0.len() >= 2 {
            let mut out = Vec::with_capacity(self.0.len() - 1);
            out.push(format!("{}.{}", self.0[0], self.0[1]));
            out.extend(self.0[2..].iter().cloned());
            out
        } else {
            self.0.clone()
        }
    }

    /// Replace the first segment, keeping the rest.
    pub fn with_head(&self, head: impl Into<String>) -> Result<Self, EmptyPathError> {
        let mut segments = self.0.clone();
        segments[0] = head.into();
        Self::new(segments)
    }

    fn pool_scope(&self) -> Option<PoolScope> {
        [PoolScope::Environment, PoolScope::Conversation, PoolScope::Rag]
            .into_iter()
            .find(|scope| self.head() == scope.prefix())
    }
}

impl TryFrom<Vec<String>> for VariablePath {
    type Error = EmptyPathError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VariablePath> for Vec<String> {
    fn from(path: VariablePath) -> Self {
        path.0
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Scope a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Environment,
    Conversation,
    Rag,
    System,
    WorkflowNode,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Environment => "environment",
            Category::Conversation => "conversation",
            Category::Rag => "rag",
            Category::System => "system",
            Category::WorkflowNode => "workflow-node",
        }
    }

    fn from_scope(scope: PoolScope) -> Self {
        match scope {
            PoolScope::Environment => Category::Environment,
            PoolScope::Conversation => Category::Conversation,
            PoolScope::Rag => Category::Rag,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub valid: bool,
    pub display_name: String,
    /// Output of a node's error branch (`error_message` / `error_type`).
    pub exception: bool,
}

/// Classify `path` against the pools and node map in `metadata`.
///
/// The node map is taken as complete: a node id missing from it makes a
/// workflow-node path invalid, even when the map is empty. Before metadata
/// has arrived `valid` means nothing: `render_entity` still takes the category
/// and display name from here but reports the entity as `Pending`.
pub fn classify(path: &VariablePath, metadata: &Metadata) -> Classification {
    let (category, valid) = match path.pool_scope() {
        Some(scope) => {
            // A pool that was never supplied cannot disprove the path.
            let valid = metadata.pool(scope).is_none_or(|pool| pool_entry(path, pool).is_some());
            (Category::from_scope(scope), valid)
        }
        None if metadata.node(path.head()).is_some() => (Category::WorkflowNode, true),
        None if path.is_system() => (Category::System, true),
        None => (Category::WorkflowNode, false),
    };

    let exception = category == Category::WorkflowNode && path.len() >= 2 && EXCEPTION_OUTPUTS.contains(&path.last());

    Classification { category, valid, display_name: display_name(path, category), exception }
}

/// The full dotted path, for tooltips and other on-demand lookups.
pub fn full_path(path: &VariablePath) -> String {
    path.dotted()
}

/// Find the pool declaration backing a pool-scoped path.
pub(crate) fn pool_var<'m>(path: &VariablePath, metadata: &'m Metadata) -> Option<&'m PoolVar> {
    let scope = path.pool_scope()?;
    pool_entry(path, metadata.pool(scope)?)
}

fn pool_entry<'p>(path: &VariablePath, pool: &'p [PoolVar]) -> Option<&'p PoolVar> {
    let joined = path.dotted();
    let unscoped = path.segments()[1..].join(".");
    pool.iter().find(|var| var.name == joined || (!unscoped.is_empty() && var.name == unscoped))
}

fn display_name(path: &VariablePath, category: Category) -> String {
    let segments = path.segments();
    match category {
        Category::System => format!("{}.{}", SYSTEM_NAMESPACE, path.last()),
        Category::WorkflowNode if segments.len() >= 3 => segments[segments.len() - 2..].join("."),
        _ => path.last().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{NodeInfo, VarType};

    fn path(dotted: &str) -> VariablePath {
        VariablePath::parse(dotted).unwrap()
    }

    fn graph() -> Metadata {
        Metadata::new()
            .with_node("node1", NodeInfo::titled("Node A"))
            .with_node("llm", NodeInfo::titled("LLM"))
            .with_pool(PoolScope::Environment, vec![PoolVar::new("env.api_key", VarType::Secret)])
            .with_pool(PoolScope::Conversation, vec![PoolVar::new("memory", VarType::String)])
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert_eq!(VariablePath::parse(""), Err(EmptyPathError));
        assert_eq!(VariablePath::parse("a..b"), Err(EmptyPathError));
        assert_eq!(path("a.b.c").segments(), ["a", "b", "c"]);
    }

    #[test]
    fn system_prefix_collapses_into_one_logical_segment() {
        assert_eq!(path("sys.query").logical_segments(), ["sys.query"]);
        assert_eq!(path("sys.files.url").logical_segments(), ["sys.files", "url"]);
        assert_eq!(path("node1.sys").logical_segments(), ["node1", "sys"]);
    }

    #[test]
    fn node_output_is_a_valid_workflow_node_path() {
        let c = classify(&path("node1.output"), &graph());
        assert_eq!(c.category, Category::WorkflowNode);
        assert!(c.valid);
        assert_eq!(c.display_name, "output");
        assert!(!c.exception);
    }

    #[test]
    fn deep_node_paths_show_last_two_segments() {
        let c = classify(&path("llm.structured_output.user.name"), &graph());
        assert_eq!(c.display_name, "user.name");
        assert_eq!(full_path(&path("llm.structured_output.user.name")), "llm.structured_output.user.name");
    }

    #[test]
    fn unknown_node_is_invalid_but_classified() {
        let c = classify(&path("ghost.text"), &graph());
        assert_eq!(c.category, Category::WorkflowNode);
        assert!(!c.valid);

        // An empty node map is complete, not unknown.
        assert!(!classify(&path("node1.text"), &Metadata::new()).valid);
    }

    #[test]
    fn system_keyword_is_always_valid() {
        let c = classify(&path("sys.query"), &Metadata::new());
        assert_eq!(c.category, Category::System);
        assert!(c.valid);
        assert_eq!(c.display_name, "sys.query");
    }

    #[test]
    fn node_id_takes_priority_over_system_keyword() {
        let meta = Metadata::new().with_node("sys", NodeInfo::titled("Odd"));
        assert_eq!(classify(&path("sys.query"), &meta).category, Category::WorkflowNode);
    }

    #[test]
    fn pool_prefix_takes_priority_over_node_ids() {
        let meta = graph().with_node("env", NodeInfo::titled("Shadow"));
        let c = classify(&path("env.api_key"), &meta);
        assert_eq!(c.category, Category::Environment);
        assert!(c.valid);
    }

    #[test]
    fn pool_membership_decides_validity() {
        let meta = graph();
        assert!(classify(&path("env.api_key"), &meta).valid);
        assert!(!classify(&path("env.missing"), &meta).valid);
        // Entries may be declared without their scope prefix.
        assert!(classify(&path("conversation.memory"), &meta).valid);
    }

    #[test]
    fn absent_pool_cannot_disprove_validity() {
        let c = classify(&path("rag.shared.doc_id"), &graph());
        assert_eq!(c.category, Category::Rag);
        assert!(c.valid);

        let empty = Metadata::new().with_pool(PoolScope::Rag, Vec::new());
        assert!(!classify(&path("rag.shared.doc_id"), &empty).valid);
    }

    #[test]
    fn error_branch_outputs_are_flagged() {
        assert!(classify(&path("node1.error_message"), &graph()).exception);
        assert!(classify(&path("node1.error_type"), &graph()).exception);
        assert!(!classify(&path("env.error_type"), &graph()).exception);
    }

    #[test]
    fn classification_is_deterministic() {
        let meta = graph();
        for dotted in ["node1.output", "sys.files", "env.api_key", "ghost.x", "rag.a.b"] {
            let p = path(dotted);
            assert_eq!(classify(&p, &meta), classify(&p, &meta));
        }
    }

    #[test]
    fn pool_var_exposes_the_declared_type() {
        let meta = graph();
        assert_eq!(pool_var(&path("env.api_key"), &meta).map(|v| v.var_type), Some(VarType::Secret));
        assert_eq!(pool_var(&path("node1.output"), &meta), None);
    }
}
