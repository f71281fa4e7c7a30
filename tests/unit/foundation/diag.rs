use super::*;

#[test]
fn entries_keep_order_and_filter_by_id() {
    let mut d = Diagnostics::default();
    assert!(d.is_empty());
    d.push(Subject::Clip, "a/visual-0", "dropped");
    d.push(Subject::Transition, "x", "skipped");
    d.push(Subject::Clip, "a/visual-0", "probe failed");

    assert_eq!(d.len(), 3);
    assert_eq!(d.entries()[1].id, "x");
    let reasons: Vec<&str> = d.about("a/visual-0").map(|e| e.reason.as_str()).collect();
    assert_eq!(reasons, vec!["dropped", "probe failed"]);
}

#[test]
fn display_names_subject_and_id() {
    let mut d = Diagnostics::default();
    d.push(Subject::Effect, "fade-1", "fade is missing 'type'; skipped");
    assert_eq!(
        d.entries()[0].to_string(),
        "effect 'fade-1': fade is missing 'type'; skipped"
    );
}

#[test]
fn extend_appends_without_reordering() {
    let mut a = Diagnostics::default();
    a.push(Subject::Block, "a", "one");
    let mut b = Diagnostics::default();
    b.push(Subject::Graph, "output", "two");
    a.extend(b);
    let ids: Vec<&str> = a.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "output"]);
    assert_eq!(
        serde_json::to_value(&a).unwrap()[1]["subject"],
        serde_json::json!("graph")
    );
}
