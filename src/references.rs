//! Reference utilities over persisted prompt text.
//!
//! Both functions work on the wire form directly, without building a
//! document: hosts use them when copying nodes between workflows or when
//! checking which nodes a prompt depends on.

use std::collections::HashMap;

use regex::Captures;
use tracing::debug;

use crate::entity::{EntityKind, EntityPayload};
use crate::resolver::VariablePath;
use crate::rules;

/// Every workflow-variable path in `text`, in order of first appearance.
pub fn extract_references(text: &str) -> Vec<VariablePath> {
    let mut out: Vec<VariablePath> = Vec::new();
    for (_, payload) in rules::for_kind(EntityKind::WorkflowVariable).capture_all(text) {
        if let EntityPayload::WorkflowVariable { path } = payload {
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }
    out
}

/// Rewrite the node id of every path placeholder whose head is a key of
/// `map`. Other placeholders and plain text are left untouched.
pub fn remap_node_ids(text: &str, map: &HashMap<String, String>) -> String {
    let matcher = rules::for_kind(EntityKind::WorkflowVariable);
    let mut rewritten = 0usize;

    let out = matcher.regex.replace_all(text, |caps: &Captures<'_>| {
        let original = caps[0].to_string();
        let Some(EntityPayload::WorkflowVariable { path }) = (matcher.production)(caps) else {
            return original;
        };
        let Some(new_head) = map.get(path.head()) else {
            return original;
        };
        match path.with_head(new_head.as_str()) {
            Ok(remapped) => {
                let payload = EntityPayload::WorkflowVariable { path: remapped };
                if payload.is_well_formed() {
                    rewritten += 1;
                    payload.canonical_placeholder()
                } else {
                    original
                }
            }
            Err(_) => original,
        }
    });

    debug!(rewritten, "remapped node ids");
    out.into_owned()
}
