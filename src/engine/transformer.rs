//! Candidate selection, transform passes and saturation.
//!
//! The transformer owns no document state. It is built once from the host's
//! registry and the editor options, then applied to document revisions:
//!
//! ```text
//! (0) trigger scan per run  -> skip plain runs, gate matchers
//! (1) collect candidates    -> every match of every gated matcher
//! (2) select                -> min by (tier, -len, start, index)
//! (3) split + emit          -> [prefix][entity][suffix], one Insert event
//! ```
//!
//! Output is deterministic for a given document and option set.

use std::cmp::Reverse;
use std::time::Instant;

use tracing::{Level, debug, enabled, trace};

use super::build::split_run;
use super::metrics::{PassMetrics, PassOutcome, RunMetrics, RunResult};
use super::registry::{CompiledMatchers, NodeRegistry};
use super::trigger::TriggerInfo;
use crate::Span;
use crate::api::Options;
use crate::bus::{BusEvent, EventBus};
use crate::document::{Document, Segment};
use crate::entity::{EntityId, EntityNode, EntityPayload, KindSet};
use crate::error::SetupError;
use crate::rules::{Matcher, Tier};

/// One match a matcher proposes for a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub span: Span,
    pub payload: EntityPayload,
    pub tier: Tier,
    /// Position of the matcher in the compiled list.
    pub index: usize,
    pub matcher: &'static str,
}

impl Candidate {
    fn rank(&self) -> (Tier, Reverse<usize>, usize, usize) {
        (self.tier, Reverse(self.span.len()), self.span.start, self.index)
    }
}

#[derive(Debug, Clone)]
pub struct Transformer {
    compiled: CompiledMatchers,
}

impl Transformer {
    /// Compile the matchers for `options.enabled`.
    ///
    /// Fails when an enabled kind has no registered node type; the host is
    /// expected to propagate this, not recover from it.
    pub fn new(registry: &NodeRegistry, options: &Options) -> Result<Self, SetupError> {
        let compiled = CompiledMatchers::new(registry, options.enabled)?;
        debug!(matchers = ?compiled.names(), "transformer ready");
        Ok(Transformer { compiled })
    }

    pub fn kinds(&self) -> KindSet {
        self.compiled.kinds
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.compiled.names()
    }

    /// All matches the gated matchers find in `text`, in matcher order.
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        let info = TriggerInfo::scan(text);
        if info.is_plain() {
            return Vec::new();
        }
        self.gated(&info)
            .flat_map(|(index, m)| {
                m.capture_all(text).into_iter().map(move |(span, payload)| Candidate {
                    span,
                    payload,
                    tier: m.tier,
                    index,
                    matcher: m.name,
                })
            })
            .collect()
    }

    /// The one match that converts in `text` this pass, if any.
    pub fn select(&self, text: &str) -> Option<Candidate> {
        self.candidates(text).into_iter().min_by_key(Candidate::rank)
    }

    fn gated<'s>(&'s self, info: &'s TriggerInfo) -> impl Iterator<Item = (usize, &'static Matcher)> + 's {
        self.compiled.matchers.iter().copied().enumerate().filter(move |(_, m)| {
            let ok = info.satisfies(m.triggers);
            if !ok {
                trace!(matcher = m.name, "gated out");
            }
            ok
        })
    }

    /// Convert at most one placeholder per text run of `doc`.
    ///
    /// Returns `doc` itself (same revision) when nothing converts.
    pub fn transform_pass(&self, doc: &Document, bus: &mut EventBus) -> PassOutcome {
        let start = Instant::now();
        let sampling = enabled!(target: "promptsync", Level::DEBUG);
        let mut metrics = PassMetrics::default();
        let mut next_id = doc.next_id();
        let mut segments = Vec::with_capacity(doc.segments().len());
        let mut created = Vec::new();

        for seg in doc.segments() {
            let Segment::Text(text) = seg else {
                segments.push(seg.clone());
                continue;
            };
            metrics.runs_scanned += 1;

            if TriggerInfo::scan(text).is_plain() {
                metrics.runs_gated += 1;
                segments.push(seg.clone());
                continue;
            }

            match self.select(text) {
                Some(candidate) => {
                    trace!(
                        matcher = candidate.matcher,
                        start = candidate.span.start,
                        end = candidate.span.end,
                        "selected"
                    );
                    if sampling {
                        metrics
                            .samples
                            .push((candidate.payload.kind(), text[candidate.span.start..candidate.span.end].to_string()));
                    }
                    let node = EntityNode::from_payload(EntityId(next_id), candidate.payload);
                    next_id += 1;
                    created.push((node.id(), node.kind()));
                    segments.extend(split_run(text, candidate.span, node));
                }
                None => segments.push(seg.clone()),
            }
        }

        metrics.replaced = created.len();
        metrics.duration = start.elapsed();

        if created.is_empty() {
            return PassOutcome { document: doc.clone(), metrics };
        }

        for (id, kind) in created {
            bus.emit(BusEvent::EntityInserted { id, kind });
        }
        debug!(replaced = metrics.replaced, runs = metrics.runs_scanned, "transform pass");
        PassOutcome { document: doc.successor(segments, next_id), metrics }
    }

    /// Run passes until one converts nothing.
    pub fn saturate(&self, doc: &Document, bus: &mut EventBus) -> RunResult {
        let start = Instant::now();
        let mut passes = Vec::new();
        let mut current = doc.clone();

        loop {
            let outcome = self.transform_pass(&current, bus);
            let changed = outcome.changed();
            passes.push(outcome.metrics);
            current = outcome.document;
            if !changed {
                break;
            }
        }

        debug!(passes = passes.len(), "saturated");
        RunResult { document: current, metrics: RunMetrics { total: start.elapsed(), passes } }
    }
}
