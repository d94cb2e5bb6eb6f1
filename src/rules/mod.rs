//! Placeholder grammars.
//!
//! Every entity kind owns exactly one [`Matcher`]: a static regex anchored to
//! the kind's wire token plus a production that turns the captures into an
//! [`EntityPayload`]. Matchers hold no scan state: each call starts at byte 0
//! of the text it is given, so the same input always yields the same match.
//!
//! ## Priority
//!
//! When several matchers hit one text run, the transformer keeps one match per
//! run per pass, picked by:
//!
//! ```text
//! tier (Keyword < Call < Path < Interpolation)
//!   └─ then longest span
//!        └─ then earliest start
//!             └─ then position in `get()`
//! ```
//!
//! ## Adding a grammar
//!
//! Add a `rule_*` constructor in the matching submodule, list it in that
//! module's `get()`, and give the kind a canonical placeholder in
//! `EntityPayload::canonical_placeholder` so the round-trip tests cover it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::Span;
use crate::engine::TriggerMask;
use crate::entity::{EntityKind, EntityPayload};

pub mod call;
pub mod interpolation;
pub mod keyword;
pub mod path;

#[cfg(test)]
mod tests;

/// Priority tier of a grammar; lower tiers win overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Bare keyword tokens such as `{{#query#}}`.
    Keyword,
    /// Call-style human-input references, `{{#$output.field#}}`.
    Call,
    /// Dotted variable paths, `{{#node.output#}}`.
    Path,
    /// Simple value interpolation, `{{name}}`.
    Interpolation,
}

pub(crate) type Production = fn(&Captures<'_>) -> Option<EntityPayload>;

/// A stateless recognizer for one entity kind.
#[derive(Debug)]
pub struct Matcher {
    pub name: &'static str,
    pub kind: EntityKind,
    pub tier: Tier,
    /// Static compiled pattern (see the `regex!` macro).
    pub regex: &'static Regex,
    /// Input features that must be present before the regex is tried.
    pub triggers: TriggerMask,
    pub production: Production,
}

impl Matcher {
    /// First span in `text` this grammar converts, if any.
    pub fn find(&self, text: &str) -> Option<Span> {
        self.capture(text).map(|(span, _)| span)
    }

    /// First match in `text` whose production accepts it.
    pub fn capture(&self, text: &str) -> Option<(Span, EntityPayload)> {
        self.regex.captures_iter(text).find_map(|caps| self.produce(&caps))
    }

    /// Every non-overlapping match in `text`, left to right.
    pub fn capture_all(&self, text: &str) -> Vec<(Span, EntityPayload)> {
        self.regex.captures_iter(text).filter_map(|caps| self.produce(&caps)).collect()
    }

    fn produce(&self, caps: &Captures<'_>) -> Option<(Span, EntityPayload)> {
        let whole = caps.get(0)?;
        let payload = (self.production)(caps)?;
        Some((Span { start: whole.start(), end: whole.end() }, payload))
    }
}

/// All matchers, in registration order (keywords first).
pub fn get() -> Vec<Matcher> {
    let mut out = keyword::get();
    out.extend(call::get());
    out.extend(path::get());
    out.extend(interpolation::get());
    out
}

static ALL: Lazy<Vec<Matcher>> = Lazy::new(get);

/// Shared, lazily built matcher table.
pub(crate) fn all() -> &'static [Matcher] {
    &ALL
}

/// The matcher owning `kind`.
pub(crate) fn for_kind(kind: EntityKind) -> &'static Matcher {
    // `get()` registers one matcher per kind; the table test enforces it.
    all().iter().find(|m| m.kind == kind).unwrap_or_else(|| unreachable!("no matcher for {kind}"))
}
