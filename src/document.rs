//! Immutable document revisions.
//!
//! A [`Document`] is a flat run of inline segments, plain text or entities,
//! as the host editor sees one paragraph-free stream of content. Documents are
//! values: every operation here takes `&self` and returns a *new* revision,
//! so a consumer holding an older revision never observes a partial edit.
//!
//! ```text
//! rev 3: [Text("Hello {{#query#}}")]
//!            │ transform pass
//!            ▼
//! rev 4: [Text("Hello "), Entity(#0 query)]
//! ```
//!
//! The revision counter only moves when content changes, which is what makes
//! "transforming an already-transformed document is a no-op" observable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::{BusEvent, EventBus};
use crate::entity::{EntityId, EntityNode, EntityPayload, EntitySnapshot, SNAPSHOT_VERSION};
use crate::error::{DocumentError, SnapshotError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Entity(EntityNode),
}

impl Segment {
    /// Plain-text form: the text itself or the entity's placeholder.
    pub fn projection(&self) -> String {
        match self {
            Segment::Text(text) => text.clone(),
            Segment::Entity(node) => node.text_projection(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(text) => Some(text),
            Segment::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityNode> {
        match self {
            Segment::Entity(node) => Some(node),
            Segment::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    segments: Vec<Segment>,
    revision: u64,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding `text` as one plain run.
    pub fn from_text(text: &str) -> Self {
        let segments = if text.is_empty() { Vec::new() } else { vec![Segment::Text(text.to_string())] };
        Document { segments, revision: 0, next_id: 0 }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityNode> {
        self.segments.iter().filter_map(Segment::as_entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityNode> {
        self.entities().find(|n| n.id() == id)
    }

    /// The persisted text form of the whole document.
    pub fn to_text(&self) -> String {
        self.segments.iter().map(Segment::projection).collect()
    }

    /// Id the next created entity will receive.
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Publish `segments` as the next revision.
    pub(crate) fn successor(&self, segments: Vec<Segment>, next_id: u64) -> Document {
        Document { segments, revision: self.revision + 1, next_id }
    }

    /// Explicit insertion command: place a new entity at byte `offset` of text
    /// segment `segment`. `segment == len()` appends at the end.
    pub fn insert_entity(
        &self,
        segment: usize,
        offset: usize,
        payload: EntityPayload,
        bus: &mut EventBus,
    ) -> Result<Document, DocumentError> {
        if !payload.is_well_formed() {
            return Err(DocumentError::Malformed { kind: payload.kind(), text: payload.canonical_placeholder() });
        }

        let node = EntityNode::from_payload(EntityId(self.next_id), payload);
        let mut segments = self.segments.clone();

        if segment == segments.len() {
            segments.push(Segment::Entity(node.clone()));
        } else {
            let text = match segments.get(segment) {
                Some(Segment::Text(text)) => text.clone(),
                Some(Segment::Entity(_)) => return Err(DocumentError::NotText(segment)),
                None => return Err(DocumentError::SegmentOutOfRange(segment)),
            };
            if !text.is_char_boundary(offset) {
                return Err(DocumentError::NotCharBoundary { segment, offset });
            }
            let (prefix, suffix) = text.split_at(offset);
            let mut replacement = Vec::with_capacity(3);
            if !prefix.is_empty() {
                replacement.push(Segment::Text(prefix.to_string()));
            }
            replacement.push(Segment::Entity(node.clone()));
            if !suffix.is_empty() {
                replacement.push(Segment::Text(suffix.to_string()));
            }
            segments.splice(segment..=segment, replacement);
        }

        debug!(id = %node.id(), kind = %node.kind(), "entity inserted by command");
        bus.emit(BusEvent::EntityInserted { id: node.id(), kind: node.kind() });
        Ok(self.successor(segments, self.next_id + 1))
    }

    /// Delete an entity. Text on both sides is merged into one run.
    pub fn remove_entity(&self, id: EntityId, bus: &mut EventBus) -> Result<Document, DocumentError> {
        let index = self.entity_index(id)?;
        let mut segments = self.segments.clone();
        let removed = segments.remove(index);

        if let Segment::Entity(node) = &removed {
            debug!(id = %node.id(), kind = %node.kind(), "entity removed");
            bus.emit(BusEvent::EntityDeleted { id: node.id(), kind: node.kind() });
        }
        Ok(self.successor(merge_text(segments), self.next_id))
    }

    /// Edit the backing text of an entity. Unless the new text is still the
    /// entity's canonical placeholder, the entity is destroyed and `new_text`
    /// stays behind as plain text.
    pub fn edit_entity_text(&self, id: EntityId, new_text: &str, bus: &mut EventBus) -> Result<Document, DocumentError> {
        let index = self.entity_index(id)?;
        let Segment::Entity(node) = &self.segments[index] else {
            return Err(DocumentError::EntityNotFound(id));
        };
        if node.text_projection() == new_text {
            return Ok(self.clone());
        }

        debug!(id = %node.id(), kind = %node.kind(), "entity degraded to text");
        bus.emit(BusEvent::EntityDeleted { id: node.id(), kind: node.kind() });

        let mut segments = self.segments.clone();
        segments[index] = Segment::Text(new_text.to_string());
        Ok(self.successor(merge_text(segments), self.next_id))
    }

    /// Replace the content of text segment `segment`.
    pub fn edit_text(&self, segment: usize, new_text: &str) -> Result<Document, DocumentError> {
        match self.segments.get(segment) {
            Some(Segment::Text(text)) if text == new_text => Ok(self.clone()),
            Some(Segment::Text(_)) => {
                let mut segments = self.segments.clone();
                segments[segment] = Segment::Text(new_text.to_string());
                Ok(self.successor(merge_text(segments), self.next_id))
            }
            Some(Segment::Entity(_)) => Err(DocumentError::NotText(segment)),
            None => Err(DocumentError::SegmentOutOfRange(segment)),
        }
    }

    pub fn to_snapshot(&self) -> DocumentSnapshot {
        let segments = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Text(text) => SegmentSnapshot::Text { text: text.clone() },
                Segment::Entity(node) => SegmentSnapshot::Entity { entity: node.to_snapshot() },
            })
            .collect();
        DocumentSnapshot { version: SNAPSHOT_VERSION, segments }
    }

    /// Import a snapshot. Entities get fresh ids in document order.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Document, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion { found: snapshot.version, expected: SNAPSHOT_VERSION });
        }

        let mut next_id = 0;
        let mut segments = Vec::with_capacity(snapshot.segments.len());
        for seg in &snapshot.segments {
            match seg {
                SegmentSnapshot::Text { text } => segments.push(Segment::Text(text.clone())),
                SegmentSnapshot::Entity { entity } => {
                    segments.push(Segment::Entity(EntityNode::from_snapshot(EntityId(next_id), entity)?));
                    next_id += 1;
                }
            }
        }
        Ok(Document { segments: merge_text(segments), revision: 0, next_id })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Document, SnapshotError> {
        let snapshot: DocumentSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    fn entity_index(&self, id: EntityId) -> Result<usize, DocumentError> {
        self.segments
            .iter()
            .position(|s| s.as_entity().is_some_and(|n| n.id() == id))
            .ok_or(DocumentError::EntityNotFound(id))
    }
}

/// Join adjacent text runs and drop empty ones.
fn merge_text(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match (out.last_mut(), seg) {
            (_, Segment::Text(text)) if text.is_empty() => {}
            (Some(Segment::Text(prev)), Segment::Text(text)) => prev.push_str(&text),
            (_, seg) => out.push(seg),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub version: u32,
    pub segments: Vec<SegmentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "segment", rename_all = "lowercase")]
pub enum SegmentSnapshot {
    Text { text: String },
    Entity { entity: EntitySnapshot },
}
