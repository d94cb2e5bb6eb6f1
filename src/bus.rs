//! Typed message bus.
//!
//! Independent editor islands (the text editor, the schema editor, pickers)
//! talk through one fixed catalog of messages instead of an ambient global
//! emitter. The bus is injected where it is needed (`&mut EventBus`), and
//! delivery is synchronous: `emit` returns after every subscriber ran.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::entity::{EntityId, EntityKind};
use crate::metadata::Metadata;
use crate::schema::SchemaPath;

#[derive(Debug, Clone)]
pub enum BusEvent {
    /// An entity was created, by a transform or an explicit insertion.
    EntityInserted { id: EntityId, kind: EntityKind },
    /// An entity was removed or degraded back to text.
    EntityDeleted { id: EntityId, kind: EntityKind },
    /// A new node map / pool snapshot is available.
    MetadataUpdated(Arc<Metadata>),
    /// Any open field editor should close.
    QuitEditing,
    /// A rejected rename: the field editor at `path` should show `previous` again.
    RestoreName { path: SchemaPath, previous: String },
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::EntityInserted { .. } => Topic::Insert,
            BusEvent::EntityDeleted { .. } => Topic::Delete,
            BusEvent::MetadataUpdated(_) => Topic::MetadataUpdated,
            BusEvent::QuitEditing => Topic::QuitEditing,
            BusEvent::RestoreName { .. } => Topic::Restore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Insert,
    Delete,
    MetadataUpdated,
    QuitEditing,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&BusEvent)>;

struct Subscriber {
    id: SubscriptionId,
    topic: Option<Topic>,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    emitted: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event.
    pub fn subscribe(&mut self, handler: impl FnMut(&BusEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(handler))
    }

    /// Receive only events of `topic`.
    pub fn subscribe_to(&mut self, topic: Topic, handler: impl FnMut(&BusEvent) + 'static) -> SubscriptionId {
        self.add(Some(topic), Box::new(handler))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: BusEvent) {
        let topic = event.topic();
        trace!(?topic, subscribers = self.subscribers.len(), "bus emit");
        self.emitted += 1;
        for sub in &mut self.subscribers {
            if sub.topic.is_none_or(|t| t == topic) {
                (sub.handler)(&event);
            }
        }
    }

    /// Number of events emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn add(&mut self, topic: Option<Topic>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, topic, handler });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}

/// Test helper: a bus that records every event it sees.
#[cfg(test)]
pub(crate) fn recording_bus() -> (EventBus, std::rc::Rc<std::cell::RefCell<Vec<BusEvent>>>) {
    let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let mut bus = EventBus::new();
    let sink = log.clone();
    bus.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    (bus, log)
}
