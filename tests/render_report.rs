use rubber_qc::{
    QcError,
    aggregate::{ACTION_APPROVED, aggregate_at},
    render::{RenderOptions, ScoreTier, build_view, render, truncate_name},
    report::{BatchMetadata, BatchReport, ClassProbability, SampleAssessment, Severity},
};
use time::OffsetDateTime;

const GOOD: &str = "Good Quality with No Defects";

fn mk_assessment(name: &str, class: &str, confidence: f64) -> SampleAssessment {
    let defective = class != GOOD;
    SampleAssessment {
        image_name: name.into(),
        predictions: vec![
            ClassProbability::new(GOOD, if defective { 1.0 - confidence } else { confidence }),
            ClassProbability::new(class, confidence),
        ],
        predicted_class: class.into(),
        confidence,
        defect_detected: defective,
        severity: if !defective {
            Severity::Low
        } else if confidence > 0.8 {
            Severity::High
        } else {
            Severity::Medium
        },
    }
}

fn mk_report(assessments: Vec<SampleAssessment>) -> BatchReport {
    let meta = BatchMetadata {
        batch_id: "BATCH-2025-0007".into(),
        category: "RSS3".into(),
        tester_name: "Q <Lab>".into(),
        sheet_count: 12,
        batch_weight: 80.0,
    };
    aggregate_at(meta, assessments, "2025-02-03T04:05:06Z".into()).unwrap()
}

fn clean_batch(n: usize) -> BatchReport {
    mk_report(
        (0..n)
            .map(|i| mk_assessment(&format!("image_{}.jpg", i + 1), GOOD, 0.9))
            .collect(),
    )
}

#[test]
fn clean_batch_scores_one_hundred() {
    let r = clean_batch(5);
    assert_eq!(r.recommended_action, ACTION_APPROVED);
    let doc = render(&r, &RenderOptions::default(), OffsetDateTime::UNIX_EPOCH).unwrap();
    assert_eq!(doc.view.quality_score, 100.0);
    assert_eq!(doc.view.score_tier, ScoreTier::Good);
    assert!(doc.html.contains("100.0%"));
    assert!(doc.html.contains("No defect data available"));
}

#[test]
fn metadata_sections_are_stable_across_renders() {
    let r = clean_batch(4);
    let opts = RenderOptions::default();
    let a = render(&r, &opts, OffsetDateTime::UNIX_EPOCH).unwrap();
    let b = render(&r, &opts, OffsetDateTime::now_utc()).unwrap();

    for (sa, sb) in a.sections.iter().zip(&b.sections) {
        if sa.name == "footer" {
            continue;
        }
        assert_eq!(sa, sb, "section {} differs", sa.name);
    }
    assert_eq!(a.view, b.view);
}

#[test]
fn sections_come_in_document_order() {
    let doc = render(&clean_batch(1), &RenderOptions::default(), OffsetDateTime::UNIX_EPOCH).unwrap();
    let names: Vec<_> = doc.sections.iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        [
            "header",
            "metadata",
            "summary",
            "highlights",
            "defect_tally",
            "recommendation",
            "footer"
        ]
    );
    let mut last = 0;
    for s in &doc.sections {
        let pos = doc.html.find(&s.html).unwrap();
        assert!(pos >= last);
        last = pos;
    }
}

#[test]
fn metadata_splits_timestamp_and_escapes_text() {
    let doc = render(&clean_batch(1), &RenderOptions::default(), OffsetDateTime::UNIX_EPOCH).unwrap();
    assert_eq!(doc.view.date, "2025-02-03");
    assert_eq!(doc.view.time, "04:05:06");
    let meta = &doc.section("metadata").unwrap().html;
    assert!(meta.contains("Q &lt;Lab&gt;"));
    assert!(meta.contains("PASS"));
}

#[test]
fn highlights_cover_first_three_images_with_truncated_names() {
    let r = mk_report(vec![
        mk_assessment("a_really_long_sample_image_name.jpg", "Reaper Marks Defect", 0.91),
        mk_assessment("b.jpg", GOOD, 0.75),
        mk_assessment("c.jpg", GOOD, 0.6),
        mk_assessment("d.jpg", GOOD, 0.6),
    ]);
    let view = build_view(&r, &RenderOptions::default()).unwrap();
    assert_eq!(view.highlights.len(), 3);
    assert_eq!(view.highlights[0].image_name, "a_really_long_sample...");
    assert_eq!(view.highlights[0].predicted_class, "Reaper Marks Defect");
    assert_eq!(view.highlights[0].confidence_pct, "91.0%");
    assert_eq!(view.highlights[1].image_name, "b.jpg");
}

#[test]
fn highlight_tie_keeps_first_listed_class() {
    let r = mk_report(vec![mk_assessment("tie.jpg", "Reaper Marks Defect", 0.5)]);
    let view = build_view(&r, &RenderOptions::default()).unwrap();
    assert_eq!(view.highlights[0].predicted_class, GOOD);
    assert_eq!(view.highlights[0].confidence_pct, "50.0%");
}

#[test]
fn tally_counts_confident_defects_in_first_seen_order() {
    let labels = ["D1", "D2", "D3", "D4", "D5", "D6"];
    let mut batch = vec![
        mk_assessment("x.jpg", "D1", 0.9),
        mk_assessment("y.jpg", "D2", 0.5),
        mk_assessment("z.jpg", GOOD, 0.99),
    ];
    for (i, l) in labels.iter().enumerate() {
        batch.push(mk_assessment(&format!("{i}.jpg"), l, 0.7));
    }
    // D6 is the most frequent but was seen last.
    for i in 0..4 {
        batch.push(mk_assessment(&format!("extra{i}.jpg"), "D6", 0.7));
    }

    let view = build_view(&mk_report(batch), &RenderOptions::default()).unwrap();
    let tally: Vec<_> = view
        .defect_tally
        .iter()
        .map(|t| (t.label.as_str(), t.count))
        .collect();
    assert_eq!(
        tally,
        [("D1", 2), ("D2", 1), ("D3", 1), ("D4", 1), ("D5", 1)]
    );
}

#[test]
fn score_clamps_at_zero_and_reflects_defects() {
    let r = mk_report(vec![
        mk_assessment("a.jpg", "D1", 0.9),
        mk_assessment("b.jpg", "D1", 0.9),
        mk_assessment("c.jpg", GOOD, 0.9),
        mk_assessment("d.jpg", GOOD, 0.9),
    ]);
    let view = build_view(&r, &RenderOptions::default()).unwrap();
    assert_eq!(view.quality_score, 50.0);
    assert_eq!(view.score_tier, ScoreTier::Critical);
    assert_eq!(view.quality_score_display(), "50.0");
}

#[test]
fn incomplete_report_is_a_render_error() {
    let mut r = clean_batch(2);
    r.batch_id = "  ".into();
    assert!(matches!(
        render(&r, &RenderOptions::default(), OffsetDateTime::UNIX_EPOCH),
        Err(QcError::Render(_))
    ));

    let mut r = clean_batch(2);
    r.predictions.clear();
    assert!(matches!(
        build_view(&r, &RenderOptions::default()),
        Err(QcError::Render(_))
    ));
}

#[test]
fn report_json_without_batch_id_fails_to_render() {
    let mut v = serde_json::to_value(clean_batch(1)).unwrap();
    v.as_object_mut().unwrap().remove("batchId");
    let r: BatchReport = serde_json::from_value(v).unwrap();
    assert!(matches!(
        build_view(&r, &RenderOptions::default()),
        Err(QcError::Render(_))
    ));
}

#[test]
fn truncation_counts_chars() {
    assert_eq!(truncate_name("exactly_twenty_chars", 20), "exactly_twenty_chars");
    assert_eq!(truncate_name(&"é".repeat(21), 20), format!("{}...", "é".repeat(20)));
}
