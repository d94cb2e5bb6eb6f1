//! Transform run metrics.
//!
//! - `Transformer::transform_pass` reports one [`PassMetrics`].
//! - `Transformer::saturate` collects one per pass into [`RunMetrics`].
//!
//! `PassMetrics::samples` is only filled when the `promptsync` target is
//! enabled at `DEBUG`, so the hot path does not allocate summaries.

use std::time::Duration;

use crate::document::Document;
use crate::entity::EntityKind;

#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    pub duration: Duration,
    /// Text runs present in the input document.
    pub runs_scanned: usize,
    /// Runs skipped by trigger gating without trying any regex.
    pub runs_gated: usize,
    /// Placeholders converted into entities.
    pub replaced: usize,
    /// `(kind, matched text)` for each conversion, debug only.
    pub samples: Vec<(EntityKind, String)>,
}

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    pub total: Duration,
    pub passes: Vec<PassMetrics>,
}

impl RunMetrics {
    pub fn replaced(&self) -> usize {
        self.passes.iter().map(|p| p.replaced).sum()
    }
}

/// Result of a single transform pass.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub document: Document,
    pub metrics: PassMetrics,
}

impl PassOutcome {
    pub fn changed(&self) -> bool {
        self.metrics.replaced > 0
    }
}

/// Result of running passes until nothing converts.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub document: Document,
    pub metrics: RunMetrics,
}
