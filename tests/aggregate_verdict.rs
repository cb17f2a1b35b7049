use rubber_qc::{
    QcError,
    aggregate::{
        ACTION_APPROVED, ACTION_MINOR, ACTION_REJECTED, ACTION_SIGNIFICANT, ActionTier, aggregate,
        aggregate_at,
    },
    report::{BatchMetadata, ClassProbability, QualityVerdict, SampleAssessment, Severity},
};

fn mk_assessment(i: usize, defective: bool, confidence: f64) -> SampleAssessment {
    let (class, severity) = if defective {
        (
            "Pin Head Bubbles Defect",
            if confidence > 0.8 { Severity::High } else { Severity::Medium },
        )
    } else {
        ("Good Quality with No Defects", Severity::Low)
    };
    SampleAssessment {
        image_name: format!("image_{}.jpg", i + 1),
        predictions: vec![ClassProbability::new(class, confidence)],
        predicted_class: class.into(),
        confidence,
        defect_detected: defective,
        severity,
    }
}

fn mk_batch(total: usize, defects: usize) -> Vec<SampleAssessment> {
    (0..total).map(|i| mk_assessment(i, i < defects, 0.7)).collect()
}

fn meta() -> BatchMetadata {
    BatchMetadata {
        batch_id: "BATCH-2025-0001".into(),
        category: "RSS1".into(),
        tester_name: "Tester".into(),
        sheet_count: 40,
        batch_weight: 250.5,
    }
}

fn tier_for(total: usize, defects: usize) -> (QualityVerdict, String) {
    let r = aggregate_at(meta(), mk_batch(total, defects), "2025-01-01T00:00:00Z".into()).unwrap();
    (r.overall_quality, r.recommended_action)
}

#[test]
fn verdict_boundaries() {
    assert_eq!(tier_for(10, 0), (QualityVerdict::Pass, ACTION_APPROVED.into()));
    assert_eq!(tier_for(10, 1), (QualityVerdict::ConditionalPass, ACTION_MINOR.into()));
    assert_eq!(
        tier_for(10_000, 1_001),
        (QualityVerdict::ConditionalPass, ACTION_SIGNIFICANT.into())
    );
    assert_eq!(tier_for(10, 3), (QualityVerdict::ConditionalPass, ACTION_SIGNIFICANT.into()));
    assert_eq!(tier_for(10_000, 3_001), (QualityVerdict::Fail, ACTION_REJECTED.into()));
}

#[test]
fn tier_from_percentage() {
    assert_eq!(ActionTier::from_defect_percentage(0.0), ActionTier::Approved);
    assert_eq!(ActionTier::from_defect_percentage(10.0), ActionTier::Minor);
    assert_eq!(ActionTier::from_defect_percentage(10.01), ActionTier::Significant);
    assert_eq!(ActionTier::from_defect_percentage(30.0), ActionTier::Significant);
    assert_eq!(ActionTier::from_defect_percentage(30.01), ActionTier::Rejected);
    assert_eq!(ActionTier::from_action(ACTION_MINOR), Some(ActionTier::Minor));
}

#[test]
fn counts_match_predictions() {
    let r = aggregate(meta(), mk_batch(7, 3)).unwrap();
    assert_eq!(r.total_images_analyzed, r.predictions.len());
    assert_eq!(
        r.defects_found,
        r.predictions.iter().filter(|p| p.defect_detected).count()
    );
    assert!(r.defects_found <= r.total_images_analyzed);
}

#[test]
fn metadata_passes_through() {
    let r = aggregate(meta(), mk_batch(2, 0)).unwrap();
    assert_eq!(r.batch_id, "BATCH-2025-0001");
    assert_eq!(r.category, "RSS1");
    assert_eq!(r.tester_name, "Tester");
    assert_eq!(r.sheet_count, 40);
    assert_eq!(r.batch_weight, 250.5);
    assert!(!r.timestamp.is_empty());
}

#[test]
fn empty_batch_is_rejected() {
    assert!(matches!(
        aggregate(meta(), Vec::new()),
        Err(QcError::Validation(_))
    ));
}

#[test]
fn ten_images_one_high_defect() {
    let mut batch: Vec<_> = (0..10).map(|i| mk_assessment(i, false, 0.9)).collect();
    batch[4] = mk_assessment(4, true, 0.85);

    let r = aggregate(meta(), batch).unwrap();
    assert_eq!(r.defects_found, 1);
    assert_eq!(r.defect_percentage(), 10.0);
    assert_eq!(r.overall_quality, QualityVerdict::ConditionalPass);
    assert_eq!(r.recommended_action, ACTION_MINOR);
    assert_eq!(r.predictions[4].severity, Severity::High);
    assert_eq!(r.highest_severity(), Severity::High);
}

#[test]
fn aggregation_is_deterministic_for_fixed_timestamp() {
    let ts = "2025-06-01T10:00:00Z".to_string();
    let a = aggregate_at(meta(), mk_batch(5, 2), ts.clone()).unwrap();
    let b = aggregate_at(meta(), mk_batch(5, 2), ts).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn report_serializes_with_wire_field_names() {
    let r = aggregate_at(meta(), mk_batch(1, 1), "2025-01-01T00:00:00Z".into()).unwrap();
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["batchId"], "BATCH-2025-0001");
    assert_eq!(v["overallQuality"], "FAIL");
    assert_eq!(v["predictions"][0]["severity"], "MEDIUM");
    assert_eq!(v["predictions"][0]["predictions"][0]["class"], "Pin Head Bubbles Defect");
}
