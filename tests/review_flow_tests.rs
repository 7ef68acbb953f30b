use judgemark::markdown::Document;
use judgemark::mentions::{build_identity_keys, format_display_mention, normalize, parse_tokens, strip};
use judgemark::parsing::html_to_document::HtmlToDocumentConverter;
use judgemark::placement::{PopoverKind, Rect, Side, place_popover};
use judgemark::review::{ReviewPayload, Severity};
use judgemark::reviewers::{Reviewer, Roster};
use judgemark::{ReviewOverlay, SuggestionStatus, ThreadStore, build_line_index, resolve};

const DRAFT: &str = r#"
<h1>Mission Brief</h1>
<p>The rover launches in <strong>March</strong>.</p>
<ul>
  <li><p>Stage one burns for 90 seconds.</p>
    <ol>
      <li>Booster separation</li>
      <li>Fairing jettison</li>
    </ol>
  </li>
  <li>Stage two always ignites on time.</li>
</ul>
<blockquote><p>Quoted telemetry.</p></blockquote>
<p>Closing remarks.</p>
"#;

const PAYLOAD: &str = r#"{
  "reviewId": "pass-1",
  "annotations": [
    {"id": "a1", "judgeId": "fact_integrity_reviewer", "judgeName": "Fact Integrity Reviewer",
     "severity": "critical", "message": "Source for launch month?", "startLine": 2, "endLine": 2},
    {"id": "a2", "judgeId": "fact_integrity_reviewer", "judgeName": "Fact Integrity Reviewer",
     "severity": "warning", "message": "Overclaim", "startLine": 6, "endLine": 6,
     "suggestion": {"original": "always", "replacement": "usually"}},
    {"id": "a3", "judgeId": "style", "judgeName": "Style Judge",
     "severity": "blocker", "message": "Wrong section", "startLine": 42, "endLine": 43},
    {"id": "a4", "judgeId": "style", "judgeName": "Style Judge",
     "severity": "info", "message": "List spans", "startLine": 3, "endLine": 5}
  ]
}"#;

fn draft() -> Document {
    HtmlToDocumentConverter::new().convert(DRAFT)
}

#[test]
fn test_every_leaf_block_is_a_line_including_nested_list_items() {
    let doc = draft();
    let index = build_line_index(&doc);
    let texts: Vec<String> = doc.leaf_blocks().iter().map(|b| b.plain_text()).collect();

    assert_eq!(
        texts,
        vec![
            "Mission Brief",
            "The rover launches in March.",
            "Stage one burns for 90 seconds.",
            "Booster separation",
            "Fairing jettison",
            "Stage two always ignites on time.",
            "Quoted telemetry.",
            "Closing remarks.",
        ]
    );
    assert_eq!(index.len(), texts.len());
    for (i, span) in index.iter().enumerate() {
        assert_eq!(span.line, i + 1);
        assert_eq!(span.width(), texts[i].chars().count());
    }
    assert!(index.windows(2).all(|w| w[0].end < w[1].start));
}

#[test]
fn test_payload_resolves_into_highlights_and_sidebar() {
    let doc = draft();
    let payload = ReviewPayload::from_json(PAYLOAD).unwrap();
    let overlay = ReviewOverlay::build(&doc, &payload.annotations);

    assert_eq!(overlay.highlights().len(), 3);
    assert_eq!(overlay.unanchored().len(), 1);
    assert_eq!(overlay.unanchored()[0].id, "a3");
    assert_eq!(overlay.unanchored()[0].severity, Severity::Info);

    let index = build_line_index(&doc);
    let spans_list = overlay.highlight("a4").unwrap();
    assert_eq!(spans_list.range.start, index[2].start);
    assert_eq!(spans_list.range.end, index[4].end);
}

#[test]
fn test_accept_then_rebuild_index_then_revert() {
    let mut doc = draft();
    let payload = ReviewPayload::from_json(PAYLOAD).unwrap();
    let mut store = ThreadStore::new();
    store.apply_review_pass(&payload.annotations);

    let before = build_line_index(&doc);
    assert!(store.accept("t1-a2", &mut doc));
    assert_eq!(doc.leaf_blocks()[5].plain_text(), "Stage two usually ignites on time.");

    // The edit changes the text length, so the old table is stale.
    let after = build_line_index(&doc);
    assert_eq!(after.len(), before.len());
    assert_eq!(after[5].width(), before[5].width() + 1);
    assert_eq!(after[6].start, before[6].start + 1);

    assert!(store.revert("t1-a2", &mut doc));
    assert_eq!(build_line_index(&doc), before);
    assert_eq!(
        store.get("t1-a2").unwrap().suggestion_status(),
        Some(SuggestionStatus::Pending)
    );

    assert!(store.resolve("t1-a2"));
    assert!(!store.accept("t1-a2", &mut doc));
    assert_eq!(build_line_index(&doc), before);
}

#[test]
fn test_resolver_properties_on_ten_line_document() {
    let html: String = (1..=10).map(|n| format!("<p>Line number {n}</p>")).collect();
    let doc = HtmlToDocumentConverter::new().convert(&html);
    let index = build_line_index(&doc);

    assert_eq!(index.len(), 10);
    assert_eq!(resolve(&index, 999, 999), None);
    let degraded = resolve(&index, 5, 3).unwrap();
    assert_eq!((degraded.start, degraded.end), (index[4].start, index[4].end));
}

#[test]
fn test_empty_document_still_has_line_one() {
    let doc = HtmlToDocumentConverter::new().convert("<html><body></body></html>");
    let index = build_line_index(&doc);

    assert_eq!(index.len(), 1);
    assert!(resolve(&index, 1, 1).is_some());
}

#[test]
fn test_mention_contract() {
    assert_eq!(
        strip("Draft this with @mission_planner then @{Fact Integrity Reviewer}"),
        "Draft this with then"
    );
    assert!(
        parse_tokens(&format_display_mention("Fact Integrity Reviewer"))
            .contains(&"Fact Integrity Reviewer".to_string())
    );
    assert_eq!(
        build_identity_keys("fact_integrity_reviewer", "Fact Integrity Reviewer"),
        vec!["fact_integrity_reviewer"]
    );

    for s in ["  Mixed CASE  name ", "x__y", "@{weird}", "名前 abc", ""] {
        assert_eq!(normalize(&normalize(s)), normalize(s));
    }

    let roster = Roster::new(vec![Reviewer::new(
        "fact_integrity_reviewer",
        "Fact Integrity Reviewer",
    )]);
    let hits = roster.resolve_mentions("@fact_integrity_reviewer and @{FACT integrity   reviewer}");
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_placement_flip() {
    let below = place_popover(Rect::new(0.0, 50.0, 120.0, 18.0), PopoverKind::Tooltip);
    let above = place_popover(Rect::new(0.0, 300.0, 120.0, 18.0), PopoverKind::Tooltip);

    assert_eq!(below.side, Side::Below);
    assert_eq!(above.side, Side::Above);
    assert_eq!(below.left, 60.0);
    assert_eq!(above.left, 60.0);
}

#[test]
fn test_accepting_inside_styled_paragraph_shifts_later_lines_by_the_edit() {
    let html = r#"<p>The <strong>rover</strong> launches, see <a href="https://example.com">docs</a> <img alt="diagram" src="d.png"></p><p>Next.</p>"#;
    let mut doc = HtmlToDocumentConverter::new().convert(html);
    let payload = ReviewPayload::from_json(
        r#"[{"id":"s","judgeId":"style","judgeName":"Style Judge","severity":null,
             "message":"Tense","startLine":1,"endLine":1,
             "suggestion":{"original":"launches","replacement":"flies"}}]"#,
    )
    .unwrap();
    let mut store = ThreadStore::new();
    store.apply_review_pass(&payload.annotations);

    let before = build_line_index(&doc);
    assert!(store.accept("t1-s", &mut doc));
    let after = build_line_index(&doc);

    assert_eq!(after[0].width() + 3, before[0].width());
    assert_eq!(after[1].start + 3, before[1].start);

    assert!(store.revert("t1-s", &mut doc));
    assert_eq!(build_line_index(&doc), before);
}
