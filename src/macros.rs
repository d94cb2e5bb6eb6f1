#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("placeholder pattern must compile"));
        &*RE
    }};
}

/// Declare a placeholder matcher.
///
/// `triggers` lists the cheap input features (see `TriggerMask`) a run must
/// have before the regex is even tried. The production receives the regex
/// captures of one match and returns the payload, or `None` to reject it.
#[macro_export]
macro_rules! matcher {
    (
        name: $name:expr,
        kind: $kind:expr,
        tier: $tier:expr,
        pattern: $pat:literal
        $(, triggers: $triggers:expr)?
        , prod: |$caps:ident| $body:block
        $(,)?
    ) => {{
        $crate::rules::Matcher {
            name: $name,
            kind: $kind,
            tier: $tier,
            regex: $crate::regex!($pat),
            triggers: { $crate::engine::TriggerMask::empty() $(| $triggers)? },
            production: |$caps: &regex::Captures<'_>| -> Option<$crate::entity::EntityPayload> { $body },
        }
    }};
}
