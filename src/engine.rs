//! Text-to-entity transform engine.
//!
//! This module is the public entry point for turning placeholder text into
//! entity nodes. The implementation is split into focused submodules under
//! `src/engine/` while the public paths stay flat (`crate::engine::Transformer`,
//! `crate::engine::TriggerMask`).
//!
//! ## How the parts work together
//!
//! ```text
//! rules::all() ──┐
//! NodeRegistry ──┤  CompiledMatchers::new        (registry.rs)
//! Options ───────┘    - setup check: enabled ⊆ registered
//!                 │
//!                 v
//! Document ── for each text run ─────────────────────────────
//!               TriggerInfo::scan                 (trigger.rs)
//!                 - skip runs with no `{{`
//!                 - skip matchers whose triggers are missing
//!               Transformer::select               (transformer.rs)
//!                 - tier, longest, earliest, registration order
//!               split_run                         (build.rs)
//!                 - [prefix][entity][suffix]
//!                 │
//!                 v
//!           new Document revision + one Insert event per entity
//! ```
//!
//! A single pass converts at most one placeholder per text run and never
//! re-scans the pieces it produced. [`Transformer::saturate`] repeats passes
//! until one converts nothing, the same way a host editor keeps calling the
//! transform on every follow-up change notification.
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: host node registration and the enabled matcher list.
//! - `trigger.rs`: byte-level features of a run, used for gating.
//! - `transformer.rs`: candidate selection, passes and saturation.
//! - `build.rs`: splitting a run around the selected span.
//! - `metrics.rs`: per-pass timing and counters.
//!
//! ## Debugging
//!
//! Run with `PROMPTSYNC_LOG=promptsync=debug` (or `trace`) to log gating,
//! selection and conversion decisions.

#[path = "engine/build.rs"]
mod build;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/transformer.rs"]
mod transformer;
#[path = "engine/trigger.rs"]
mod trigger;

pub use metrics::{PassMetrics, PassOutcome, RunMetrics, RunResult};
pub use registry::{CompiledMatchers, NodeRegistry};
pub use transformer::{Candidate, Transformer};
pub use trigger::{TriggerInfo, TriggerMask};
