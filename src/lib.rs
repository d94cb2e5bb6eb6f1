#[macro_use]
mod macros;
mod api;
mod bus;
mod document;
mod engine;
mod entity;
mod error;
mod metadata;
mod references;
mod render;
mod resolver;
mod rules;
pub mod schema;

pub use api::{
    Context, Options, PassSummary, TransformDetails, TransformResult, TransformResultVerbose, transform,
    transform_verbose_with, transform_with,
};
pub use bus::{BusEvent, EventBus, SubscriptionId, Topic};
pub use document::{Document, DocumentSnapshot, Segment, SegmentSnapshot};
pub use engine::{NodeRegistry, PassMetrics, PassOutcome, RunMetrics, RunResult, Transformer, TriggerInfo, TriggerMask};
pub use entity::{EntityId, EntityKind, EntityNode, EntityPayload, EntitySnapshot, KindSet, SNAPSHOT_VERSION};
pub use error::{DocumentError, EmptyPathError, SchemaError, SetupError, SnapshotError};
pub use metadata::{Metadata, NodeInfo, PoolScope, PoolVar, Position, TypeResolver, VarType};
pub use references::{extract_references, remap_node_ids};
pub use render::{EntityView, RenderedSegment, ViewStatus, render_document, render_entity};
pub use resolver::{Category, Classification, VariablePath, classify, full_path};
pub use rules::{Matcher, Tier};

// --- Internal types ---------------------------------------------------------

/// A matched placeholder inside one text run.
///
/// `start`/`end` are byte offsets (end exclusive). Spans are transient: they
/// are produced by a matcher, consumed by the transform pass that splits the
/// run, and never stored on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
