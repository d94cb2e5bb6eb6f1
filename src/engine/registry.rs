//! Node registration and matcher compilation.
//!
//! This module holds the *static* side of the engine, built once per editor:
//!
//! 1. The host declares which entity node types its document engine knows
//!    about ([`NodeRegistry`]).
//! 2. The editor's `Options` enable a subset of kinds.
//! 3. [`CompiledMatchers::new`] checks that every enabled kind is registered
//!    and keeps the enabled matchers in priority order.
//!
//! A kind that is enabled but not registered is a programmer error in the host
//! setup, reported as [`SetupError::UnregisteredKind`] before any text is
//! touched.
//!
//! ## Invariants
//!
//! - `CompiledMatchers::matchers` is sorted by `Tier` and, inside a tier, by
//!   registration order in `rules::get()`. The transformer relies on the
//!   index as the final tie-breaker.

use crate::entity::{EntityKind, KindSet};
use crate::error::SetupError;
use crate::rules::{self, Matcher};

/// Entity node types the host document engine has registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRegistry {
    registered: KindSet,
}

impl NodeRegistry {
    /// A registry with nothing registered.
    pub fn new() -> Self {
        NodeRegistry { registered: KindSet::empty() }
    }

    /// A registry with every entity kind registered.
    pub fn with_all() -> Self {
        NodeRegistry { registered: KindSet::all() }
    }

    pub fn register(mut self, kind: EntityKind) -> Self {
        self.registered |= kind.flag();
        self
    }

    pub fn register_all(mut self, kinds: KindSet) -> Self {
        self.registered |= kinds;
        self
    }

    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.registered.has(kind)
    }

    pub fn registered(&self) -> KindSet {
        self.registered
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Enabled matchers in priority order.
#[derive(Debug, Clone)]
pub struct CompiledMatchers {
    pub matchers: Vec<&'static Matcher>,
    pub kinds: KindSet,
}

impl CompiledMatchers {
    /// Select the matchers for `enabled`, verifying registration first.
    pub fn new(registry: &NodeRegistry, enabled: KindSet) -> Result<Self, SetupError> {
        if let Some(missing) = enabled.kinds().find(|k| !registry.is_registered(*k)) {
            return Err(SetupError::UnregisteredKind(missing));
        }

        let mut matchers: Vec<&'static Matcher> = rules::all().iter().filter(|m| enabled.has(m.kind)).collect();
        // Stable: registration order survives inside a tier.
        matchers.sort_by_key(|m| m.tier);

        Ok(CompiledMatchers { matchers, kinds: enabled })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name).collect()
    }
}
