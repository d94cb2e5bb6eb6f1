//! Dotted variable paths: `{{#node.output#}}`, `{{#sys.query#}}`,
//! `{{#env.api_key#}}`, `{{#rag.1711.doc#}}`, ...
//!
//! The head segment is a node id or scope keyword (ids may be numeric or
//! contain `-`); an optional numeric segment may follow it; then come 1-10
//! identifier segments.

use crate::engine::TriggerMask;
use crate::entity::{EntityKind, EntityPayload};
use crate::resolver::VariablePath;
use crate::rules::{Matcher, Tier};

/// "{{#1711617514996.text#}}", "{{#llm.structured_output.user.name#}}"
pub fn rule_workflow_variable() -> Matcher {
    matcher! {
        name: "workflow variable",
        kind: EntityKind::WorkflowVariable,
        tier: Tier::Path,
        pattern: r"\{\{#([a-zA-Z0-9_-]{1,50}(?:\.[0-9]+)?(?:\.[a-zA-Z_][a-zA-Z0-9_]{0,29}){1,10})#\}\}",
        triggers: TriggerMask::HASH_OPEN | TriggerMask::DOTTED,
        prod: |caps| {
            let path = VariablePath::parse(caps.get(1)?.as_str()).ok()?;
            Some(EntityPayload::WorkflowVariable { path })
        }
    }
}

pub fn get() -> Vec<Matcher> {
    vec![rule_workflow_variable()]
}
