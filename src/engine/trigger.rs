//! Trigger scanning (text-run pre-classification).
//!
//! Most text runs in a prompt contain no placeholder at all. Before any regex
//! runs, the transformer scans each run once for a handful of byte-level
//! features and only tries matchers whose declared `triggers` are all present.
//!
//! - `OPEN_BRACES`: the run contains `{{`.
//! - `HASH_OPEN`: the run contains `{{#`.
//! - `CALL_OPEN`: the run contains `{{#$`.
//! - `DOTTED`: the run contains a `.`.
//!
//! This is a *necessary-condition* scan: a feature may be present without any
//! grammar matching, but a grammar can never match when one of its features is
//! missing. Gating therefore never changes which match gets selected.

bitflags::bitflags! {
    /// Coarse features of a text run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TriggerMask: u8 {
        const OPEN_BRACES = 1 << 0;
        const HASH_OPEN   = 1 << 1;
        const CALL_OPEN   = 1 << 2;
        const DOTTED      = 1 << 3;
    }
}

/// Features detected in one text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerInfo {
    pub mask: TriggerMask,
}

impl TriggerInfo {
    /// Scan `input` for the coarse features.
    pub fn scan(input: &str) -> Self {
        let mut mask = TriggerMask::empty();

        if let Some(first) = input.find("{{") {
            mask |= TriggerMask::OPEN_BRACES;
            if input[first..].contains("{{#") {
                mask |= TriggerMask::HASH_OPEN;
                if input[first..].contains("{{#$") {
                    mask |= TriggerMask::CALL_OPEN;
                }
            }
        }

        if input.contains('.') {
            mask |= TriggerMask::DOTTED;
        }

        TriggerInfo { mask }
    }

    /// True when nothing in the run can possibly start a placeholder.
    pub fn is_plain(&self) -> bool {
        !self.mask.contains(TriggerMask::OPEN_BRACES)
    }

    pub fn satisfies(&self, required: TriggerMask) -> bool {
        self.mask.contains(required)
    }
}
