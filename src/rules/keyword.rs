//! Bare keyword tokens: `{{#context#}}`, `{{#query#}}`, ...

use crate::engine::TriggerMask;
use crate::entity::{EntityKind, EntityPayload};
use crate::rules::{Matcher, Tier};

/// "{{#context#}}"
pub fn rule_context() -> Matcher {
    matcher! {
        name: "context",
        kind: EntityKind::Context,
        tier: Tier::Keyword,
        pattern: r"\{\{#context#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::Context) }
    }
}

/// "{{#query#}}"
pub fn rule_query() -> Matcher {
    matcher! {
        name: "query",
        kind: EntityKind::Query,
        tier: Tier::Keyword,
        pattern: r"\{\{#query#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::Query) }
    }
}

/// "{{#histories#}}"
pub fn rule_history() -> Matcher {
    matcher! {
        name: "history",
        kind: EntityKind::History,
        tier: Tier::Keyword,
        pattern: r"\{\{#histories#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::History) }
    }
}

/// "{{#current#}}"
pub fn rule_current() -> Matcher {
    matcher! {
        name: "current",
        kind: EntityKind::Current,
        tier: Tier::Keyword,
        pattern: r"\{\{#current#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::Current) }
    }
}

/// "{{#error_message#}}"
pub fn rule_error_message() -> Matcher {
    matcher! {
        name: "error message",
        kind: EntityKind::ErrorMessage,
        tier: Tier::Keyword,
        pattern: r"\{\{#error_message#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::ErrorMessage) }
    }
}

/// "{{#last_run#}}"
pub fn rule_last_run() -> Matcher {
    matcher! {
        name: "last run",
        kind: EntityKind::LastRun,
        tier: Tier::Keyword,
        pattern: r"\{\{#last_run#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::LastRun) }
    }
}

/// "{{#url#}}"
pub fn rule_request_url() -> Matcher {
    matcher! {
        name: "request url",
        kind: EntityKind::RequestUrl,
        tier: Tier::Keyword,
        pattern: r"\{\{#url#\}\}",
        triggers: TriggerMask::HASH_OPEN,
        prod: |_caps| { Some(EntityPayload::RequestUrl) }
    }
}

pub fn get() -> Vec<Matcher> {
    vec![
        rule_context(),
        rule_query(),
        rule_history(),
        rule_current(),
        rule_error_message(),
        rule_last_run(),
        rule_request_url(),
    ]
}
