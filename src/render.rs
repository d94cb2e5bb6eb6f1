//! Entity rendering against the current metadata snapshot.
//!
//! Nodes store only their payload. Everything a chip displays (titles,
//! validity, value types) is derived here from the [`Context`] at render
//! time, so a `MetadataUpdated` event re-renders every entity without
//! re-parsing a single placeholder.

use tracing::trace;

use crate::api::Context;
use crate::document::{Document, Segment};
use crate::entity::{EntityId, EntityKind, EntityNode, EntityPayload};
use crate::metadata::{Metadata, VarType};
use crate::resolver::{self, Category, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewStatus {
    Ready,
    /// Needs metadata that has not arrived yet.
    Pending,
    /// Resolves to nothing in the current metadata.
    Invalid,
}

/// Display data for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub label: String,
    /// Title of the owning workflow node, for node-backed paths.
    pub node_title: Option<String>,
    pub category: Option<Category>,
    pub var_type: Option<VarType>,
    pub status: ViewStatus,
    pub exception: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSegment {
    Text(String),
    Entity(EntityView),
}

pub fn render_entity(node: &EntityNode, context: &Context) -> EntityView {
    let mut view = EntityView {
        id: node.id(),
        kind: node.kind(),
        label: String::new(),
        node_title: None,
        category: None,
        var_type: None,
        status: ViewStatus::Ready,
        exception: false,
    };

    match node.payload() {
        EntityPayload::VariableValue { name } => view.label = name.clone(),
        EntityPayload::HitlInput { field } => view.label = field.clone(),
        EntityPayload::WorkflowVariable { path } => {
            let empty = Metadata::default();
            let metadata = context.metadata.as_deref().unwrap_or(&empty);
            let class = classify(path, metadata);

            view.label = class.display_name;
            view.category = Some(class.category);
            view.exception = class.exception;
            view.status = match (&context.metadata, class.valid) {
                (None, _) => ViewStatus::Pending,
                (Some(_), true) => ViewStatus::Ready,
                (Some(_), false) => ViewStatus::Invalid,
            };

            match class.category {
                Category::WorkflowNode => {
                    view.node_title = metadata.node(path.head()).map(|n| n.title.clone());
                    view.var_type = context.resolve_type(path.head(), &path.segments()[1..]);
                }
                Category::System => {
                    view.var_type = context.resolve_type(path.head(), &path.segments()[1..]);
                }
                Category::Environment | Category::Conversation | Category::Rag => {
                    view.var_type = resolver::pool_var(path, metadata).map(|v| v.var_type);
                }
            }
        }
        keyword => view.label = keyword.kind().name().to_string(),
    }

    trace!(id = %view.id, label = %view.label, status = ?view.status, "rendered");
    view
}

pub fn render_document(doc: &Document, context: &Context) -> Vec<RenderedSegment> {
    doc.segments()
        .iter()
        .map(|seg| match seg {
            Segment::Text(text) => RenderedSegment::Text(text.clone()),
            Segment::Entity(node) => RenderedSegment::Entity(render_entity(node, context)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusEvent;
    use crate::entity::EntityId;
    use crate::metadata::{NodeInfo, PoolScope, PoolVar};
    use crate::resolver::VariablePath;
    use std::sync::Arc;

    fn wf(dotted: &str) -> EntityNode {
        EntityNode::from_payload(
            EntityId(7),
            EntityPayload::WorkflowVariable { path: VariablePath::parse(dotted).unwrap() },
        )
    }

    #[test]
    fn workflow_path_is_pending_until_metadata_arrives() {
        let mut context = Context::new();
        let node = wf("node1.output");
        assert_eq!(render_entity(&node, &context).status, ViewStatus::Pending);

        let metadata = Arc::new(Metadata::new().with_node("node1", NodeInfo::titled("Node A")));
        assert!(context.on_event(&BusEvent::MetadataUpdated(metadata)));

        let view = render_entity(&node, &context);
        assert_eq!(view.status, ViewStatus::Ready);
        assert_eq!(view.label, "output");
        assert_eq!(view.node_title.as_deref(), Some("Node A"));
        assert_eq!(view.category, Some(Category::WorkflowNode));
    }

    #[test]
    fn unknown_node_renders_invalid() {
        let context = Context::new().with_metadata(Metadata::new());
        let view = render_entity(&wf("ghost.text"), &context);
        assert_eq!(view.status, ViewStatus::Invalid);
        assert_eq!(view.node_title, None);
    }

    #[test]
    fn types_come_from_pool_or_callback() {
        let metadata = Metadata::new()
            .with_node("llm", NodeInfo::titled("LLM"))
            .with_pool(PoolScope::Environment, vec![PoolVar::new("api_key", VarType::Secret)]);
        let context = Context::new()
            .with_metadata(metadata)
            .with_type_resolver(|node, path| (node == "llm" && path == ["text"]).then_some(VarType::String));

        assert_eq!(render_entity(&wf("env.api_key"), &context).var_type, Some(VarType::Secret));
        assert_eq!(render_entity(&wf("llm.text"), &context).var_type, Some(VarType::String));
        assert_eq!(render_entity(&wf("llm.usage"), &context).var_type, None);
    }

    #[test]
    fn exception_outputs_are_flagged() {
        let context = Context::new().with_metadata(Metadata::new().with_node("code", NodeInfo::titled("Code")));
        assert!(render_entity(&wf("code.error_message"), &context).exception);
        assert!(!render_entity(&wf("code.result"), &context).exception);
    }

    #[test]
    fn keywords_never_wait_for_metadata() {
        let node = EntityNode::from_payload(EntityId(1), EntityPayload::History);
        let view = render_entity(&node, &Context::new());
        assert_eq!(view.status, ViewStatus::Ready);
        assert_eq!(view.label, "history");
    }
}
