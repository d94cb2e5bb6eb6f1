use crate::entity::{EntityKind, EntityPayload};
use crate::resolver::VariablePath;
use crate::rules;

fn wf(dotted: &str) -> EntityPayload {
    EntityPayload::WorkflowVariable { path: VariablePath::parse(dotted).unwrap() }
}

#[test]
fn placeholder_examples_matching() {
    // (input, expected payload, expected matched text)
    let cases: Vec<(&str, EntityPayload, &str)> = vec![
        ("{{#context#}}", EntityPayload::Context, "{{#context#}}"),
        ("use {{#query#}} here", EntityPayload::Query, "{{#query#}}"),
        ("{{#histories#}}", EntityPayload::History, "{{#histories#}}"),
        ("x{{#current#}}y", EntityPayload::Current, "{{#current#}}"),
        ("{{#error_message#}}", EntityPayload::ErrorMessage, "{{#error_message#}}"),
        ("{{#last_run#}}", EntityPayload::LastRun, "{{#last_run#}}"),
        ("GET {{#url#}}", EntityPayload::RequestUrl, "{{#url#}}"),
        ("Dear {{customer}},", EntityPayload::VariableValue { name: "customer".into() }, "{{customer}}"),
        ("{{_x1}}", EntityPayload::VariableValue { name: "_x1".into() }, "{{_x1}}"),
        ("{{#node1.output#}}", wf("node1.output"), "{{#node1.output#}}"),
        ("a {{#sys.query#}} b", wf("sys.query"), "{{#sys.query#}}"),
        ("{{#env.api_key#}}", wf("env.api_key"), "{{#env.api_key#}}"),
        ("{{#conversation.memory#}}", wf("conversation.memory"), "{{#conversation.memory#}}"),
        ("{{#rag.1711.doc_id#}}", wf("rag.1711.doc_id"), "{{#rag.1711.doc_id#}}"),
        ("{{#1711617514996.text#}}", wf("1711617514996.text"), "{{#1711617514996.text#}}"),
        ("{{#llm-2.structured_output.user.name#}}", wf("llm-2.structured_output.user.name"), "{{#llm-2.structured_output.user.name#}}"),
        ("{{#$output.approval#}}", EntityPayload::HitlInput { field: "approval".into() }, "{{#$output.approval#}}"),
    ];

    for (input, expected, body) in cases {
        let matcher = rules::for_kind(expected.kind());
        let (span, payload) =
            matcher.capture(input).unwrap_or_else(|| panic!("'{}' produced no {} match", input, matcher.name));
        assert_eq!(payload, expected, "wrong payload for '{}'", input);
        assert_eq!(&input[span.start..span.end], body, "wrong span for '{}'", input);
    }
}

#[test]
fn placeholder_non_examples() {
    // (kind, input) pairs that must not match.
    let cases: Vec<(EntityKind, &str)> = vec![
        (EntityKind::Query, "{{query}}"),
        (EntityKind::Query, "{{#Query#}}"),
        (EntityKind::Query, "{#query#}"),
        (EntityKind::History, "{{#history#}}"),
        (EntityKind::VariableValue, "{{1abc}}"),
        (EntityKind::VariableValue, "{{has space}}"),
        (EntityKind::VariableValue, "{{#query#}}"),
        (EntityKind::VariableValue, "{{abcdefghijklmnopqrstuvwxyz12345}}"),
        (EntityKind::WorkflowVariable, "{{#query#}}"),
        (EntityKind::WorkflowVariable, "{{#node1.#}}"),
        (EntityKind::WorkflowVariable, "{{#node1..x#}}"),
        (EntityKind::WorkflowVariable, "{{#$output.field#}}"),
        (EntityKind::WorkflowVariable, "{{node1.output}}"),
        (EntityKind::HitlInput, "{{#$input.field#}}"),
        (EntityKind::HitlInput, "{{#output.field#}}"),
    ];

    for (kind, input) in cases {
        let matcher = rules::for_kind(kind);
        assert_eq!(matcher.find(input), None, "{} unexpectedly matched '{}'", matcher.name, input);
    }
}

#[test]
fn matchers_are_pure() {
    let input = "{{#a.b#}} and {{#c.d#}}";
    let matcher = rules::for_kind(EntityKind::WorkflowVariable);
    let first = matcher.capture(input);
    for _ in 0..5 {
        assert_eq!(matcher.capture(input), first);
    }
    // A call on other input in between does not move the scan position.
    let _ = matcher.capture("{{#x.y#}}");
    assert_eq!(matcher.find(input).map(|s| s.start), Some(0));
}

#[test]
fn capture_all_walks_left_to_right() {
    let matcher = rules::for_kind(EntityKind::WorkflowVariable);
    let all = matcher.capture_all("{{#a.b#}} {{#query#}} {{#c.d.e#}}");
    let paths: Vec<String> = all
        .into_iter()
        .map(|(_, p)| match p {
            EntityPayload::WorkflowVariable { path } => path.dotted(),
            other => panic!("unexpected payload {other:?}"),
        })
        .collect();
    assert_eq!(paths, vec!["a.b", "c.d.e"]);
}

#[test]
fn one_matcher_per_kind_in_tier_order() {
    let all = rules::get();
    assert_eq!(all.len(), EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        assert_eq!(all.iter().filter(|m| m.kind == kind).count(), 1, "kind {kind}");
    }
    assert!(all.windows(2).all(|w| w[0].tier <= w[1].tier));
}
