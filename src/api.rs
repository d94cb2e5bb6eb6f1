use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::{BusEvent, EventBus};
use crate::document::Document;
use crate::engine::{NodeRegistry, Transformer};
use crate::entity::KindSet;
use crate::error::SetupError;
use crate::metadata::{Metadata, TypeResolver, VarType};
use crate::render::{RenderedSegment, render_document};

/// Resolution context.
///
/// Holds the latest metadata snapshot the host pushed and the optional
/// variable-type callback. `metadata == None` means nothing has arrived yet;
/// node-backed entities render as pending until it does.
#[derive(Clone, Default)]
pub struct Context {
    pub metadata: Option<Arc<Metadata>>,
    pub type_resolver: Option<TypeResolver>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(self, metadata: Metadata) -> Self {
        self.with_shared_metadata(Arc::new(metadata))
    }

    pub fn with_shared_metadata(mut self, metadata: Arc<Metadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_type_resolver(
        mut self,
        resolver: impl Fn(&str, &[String]) -> Option<VarType> + Send + Sync + 'static,
    ) -> Self {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }

    /// Apply a bus event. Returns true when the snapshot was swapped and
    /// views should re-render.
    pub fn on_event(&mut self, event: &BusEvent) -> bool {
        match event {
            BusEvent::MetadataUpdated(metadata) => {
                self.metadata = Some(Arc::clone(metadata));
                true
            }
            _ => false,
        }
    }

    pub fn resolve_type(&self, node_id: &str, path: &[String]) -> Option<VarType> {
        self.type_resolver.as_ref().and_then(|resolve| resolve(node_id, path))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("metadata", &self.metadata)
            .field("type_resolver", &self.type_resolver.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Options that affect which placeholders convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Entity kinds the editor converts. Every enabled kind must also be
    /// registered with the host's `NodeRegistry`.
    pub enabled: KindSet,
}

impl Default for Options {
    fn default() -> Self {
        Options { enabled: KindSet::all() }
    }
}

/// Result from [`transform`] and [`transform_with`].
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Persisted text form of the output; equal to the input text.
    pub text: String,
    pub document: Document,
    /// Output rendered against the context.
    pub segments: Vec<RenderedSegment>,
    /// Number of `EntityInserted` events emitted.
    pub inserted: usize,
    pub elapsed: Duration,
}

/// A compact per-pass trace.
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub pass: usize,
    pub duration: Duration,
    pub runs_scanned: usize,
    pub runs_gated: usize,
    pub replaced: usize,
    /// `kind: text` previews; empty unless debug logging is enabled.
    pub samples: Vec<String>,
}

/// Additional details returned by [`transform_verbose_with`].
#[derive(Debug, Clone)]
pub struct TransformDetails {
    pub total: Duration,
    pub passes: Vec<PassSummary>,
    /// Names of the enabled matchers, in priority order.
    pub matchers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TransformResultVerbose {
    pub result: TransformResult,
    pub details: TransformDetails,
}

/// Transform `text` with every kind enabled and no metadata.
///
/// # Example
/// ```
/// use promptsync::transform;
///
/// let out = transform("Hello {{#query#}}").unwrap();
/// assert_eq!(out.document.entities().count(), 1);
/// ```
pub fn transform(text: &str) -> Result<TransformResult, SetupError> {
    transform_with(text, &Context::default(), &Options::default())
}

/// Transform `text` to saturation and render it against `context`.
///
/// Stands in for a host that registered every node type.
pub fn transform_with(text: &str, context: &Context, options: &Options) -> Result<TransformResult, SetupError> {
    Ok(transform_verbose_with(text, context, options)?.result)
}

/// Like [`transform_with`], plus per-pass details for debugging.
pub fn transform_verbose_with(
    text: &str,
    context: &Context,
    options: &Options,
) -> Result<TransformResultVerbose, SetupError> {
    let transformer = Transformer::new(&NodeRegistry::with_all(), options)?;
    let mut bus = EventBus::new();
    let run = transformer.saturate(&Document::from_text(text), &mut bus);

    let passes = run
        .metrics
        .passes
        .iter()
        .enumerate()
        .map(|(pass, m)| PassSummary {
            pass,
            duration: m.duration,
            runs_scanned: m.runs_scanned,
            runs_gated: m.runs_gated,
            replaced: m.replaced,
            samples: m.samples.iter().take(8).map(|(kind, text)| format!("{kind}: {}", preview(text))).collect(),
        })
        .collect();

    let result = TransformResult {
        text: run.document.to_text(),
        segments: render_document(&run.document, context),
        inserted: bus.emitted(),
        elapsed: run.metrics.total,
        document: run.document,
    };
    let details = TransformDetails {
        total: run.metrics.total,
        passes,
        matchers: transformer.matcher_names().into_iter().map(str::to_string).collect(),
    };

    Ok(TransformResultVerbose { result, details })
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, EntityPayload};
    use crate::metadata::NodeInfo;
    use crate::render::ViewStatus;
    use crate::resolver::{Category, VariablePath};
    use pretty_assertions::assert_eq;

    fn graph() -> Context {
        Context::new().with_metadata(Metadata::new().with_node("node1", NodeInfo::titled("Node A")))
    }

    #[test]
    fn end_to_end_with_metadata() {
        let out = transform_with("Hello {{#query#}} and {{#node1.output#}}", &graph(), &Options::default()).unwrap();

        assert_eq!(out.text, "Hello {{#query#}} and {{#node1.output#}}");
        assert_eq!(out.inserted, 2);
        let [
            RenderedSegment::Text(hello),
            RenderedSegment::Entity(query),
            RenderedSegment::Text(and),
            RenderedSegment::Entity(var),
        ] = out.segments.as_slice()
        else {
            panic!("unexpected segments: {:?}", out.segments);
        };
        assert_eq!(hello, "Hello ");
        assert_eq!(query.kind, EntityKind::Query);
        assert_eq!(and, " and ");
        assert_eq!(var.kind, EntityKind::WorkflowVariable);
        assert_eq!(var.label, "output");
        assert_eq!(var.category, Some(Category::WorkflowNode));
        assert_eq!(var.status, ViewStatus::Ready);

        let payload = out.document.entity(var.id).map(|n| n.payload().clone());
        assert_eq!(payload, Some(EntityPayload::WorkflowVariable { path: VariablePath::parse("node1.output").unwrap() }));
    }

    #[test]
    fn default_transform_leaves_node_paths_pending() {
        let out = transform("{{#node1.output#}}").unwrap();
        let RenderedSegment::Entity(view) = &out.segments[0] else {
            panic!("expected an entity");
        };
        assert_eq!(view.status, ViewStatus::Pending);
    }

    #[test]
    fn verbose_reports_every_pass() {
        let out = transform_verbose_with("{{#query#}} {{#context#}} {{x}}", &Context::new(), &Options::default()).unwrap();
        let replaced: Vec<usize> = out.details.passes.iter().map(|p| p.replaced).collect();
        // Pass 1 converts only the longer keyword; the two runs it leaves both convert in pass 2.
        assert_eq!(replaced, vec![1, 2, 0]);
        assert_eq!(out.details.matchers.len(), EntityKind::ALL.len());
    }

    #[test]
    fn metadata_events_swap_the_snapshot() {
        let mut context = Context::new();
        assert!(!context.on_event(&BusEvent::QuitEditing));
        assert!(context.metadata.is_none());
        assert!(context.on_event(&BusEvent::MetadataUpdated(Arc::new(Metadata::new()))));
        assert!(context.metadata.is_some());
    }
}
