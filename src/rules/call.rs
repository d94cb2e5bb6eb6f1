//! Call-style references to human-input form fields: `{{#$output.<field>#}}`.

use crate::engine::TriggerMask;
use crate::entity::{EntityKind, EntityPayload};
use crate::rules::{Matcher, Tier};

/// "{{#$output.approval_note#}}"
pub fn rule_hitl_input() -> Matcher {
    matcher! {
        name: "human input field",
        kind: EntityKind::HitlInput,
        tier: Tier::Call,
        pattern: r"\{\{#\$output\.([a-zA-Z_][a-zA-Z0-9_]{0,49})#\}\}",
        triggers: TriggerMask::CALL_OPEN | TriggerMask::DOTTED,
        prod: |caps| {
            let field = caps.get(1)?.as_str().to_string();
            Some(EntityPayload::HitlInput { field })
        }
    }
}

pub fn get() -> Vec<Matcher> {
    vec![rule_hitl_input()]
}
