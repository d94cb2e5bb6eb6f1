//! Splitting a text run around a converted span.
//!
//! ```text
//! "Hello {{#query#}} world"
//!        ^ span.start   ^ span.end
//!
//! -> [Text("Hello "), Entity(query), Text(" world")]
//! ```
//!
//! Empty prefix or suffix pieces are dropped so the document never holds an
//! empty text segment.

use crate::Span;
use crate::document::Segment;
use crate::entity::EntityNode;

pub(crate) fn split_run(text: &str, span: Span, node: EntityNode) -> Vec<Segment> {
    let prefix = &text[..span.start];
    let suffix = &text[span.end..];

    let mut out = Vec::with_capacity(3);
    if !prefix.is_empty() {
        out.push(Segment::Text(prefix.to_string()));
    }
    out.push(Segment::Entity(node));
    if !suffix.is_empty() {
        out.push(Segment::Text(suffix.to_string()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntityPayload};

    #[test]
    fn drops_empty_pieces() {
        let node = EntityNode::from_payload(EntityId(0), EntityPayload::Query);
        let whole = split_run("{{#query#}}", Span { start: 0, end: 11 }, node.clone());
        assert_eq!(whole, vec![Segment::Entity(node.clone())]);

        let tail = split_run("a {{#query#}}", Span { start: 2, end: 13 }, node.clone());
        assert_eq!(tail, vec![Segment::Text("a ".into()), Segment::Entity(node)]);
    }
}
