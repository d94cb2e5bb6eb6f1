//! Simple value interpolation: `{{name}}`.

use crate::engine::TriggerMask;
use crate::entity::{EntityKind, EntityPayload};
use crate::rules::{Matcher, Tier};

/// "{{customer_name}}"
pub fn rule_variable_value() -> Matcher {
    matcher! {
        name: "variable value",
        kind: EntityKind::VariableValue,
        tier: Tier::Interpolation,
        pattern: r"\{\{([a-zA-Z_][a-zA-Z0-9_]{0,29})\}\}",
        triggers: TriggerMask::OPEN_BRACES,
        prod: |caps| {
            let name = caps.get(1)?.as_str().to_string();
            Some(EntityPayload::VariableValue { name })
        }
    }
}

pub fn get() -> Vec<Matcher> {
    vec![rule_variable_value()]
}
