use rubber_qc::{
    QcError,
    assess::{Assessor, predicted_class},
    classifier::LabelSet,
    report::{ClassProbability, SampleClassification, Severity},
};

const GOOD: &str = "Good Quality with No Defects";
const BUBBLES: &str = "Pin Head Bubbles Defect";
const REAPER: &str = "Reaper Marks Defect";

fn mk_sample(dist: &[(&str, f64)]) -> SampleClassification {
    SampleClassification {
        image_label: "image_1.jpg".into(),
        class_probabilities: dist
            .iter()
            .map(|(l, c)| ClassProbability::new(*l, *c))
            .collect(),
    }
}

fn assessor() -> Assessor {
    Assessor::new(LabelSet::default(), 0.8)
}

#[test]
fn argmax_picks_highest_confidence() {
    let labels = LabelSet::default();
    let s = mk_sample(&[(GOOD, 0.1), (BUBBLES, 0.2), (REAPER, 0.7)]);
    assert_eq!(predicted_class(&labels, &s), Some((REAPER, 0.7)));
}

#[test]
fn ties_go_to_earlier_label_regardless_of_input_order() {
    let labels = LabelSet::default();
    let s = mk_sample(&[(REAPER, 0.45), (BUBBLES, 0.45), (GOOD, 0.1)]);
    assert_eq!(predicted_class(&labels, &s), Some((BUBBLES, 0.45)));

    let s = mk_sample(&[(REAPER, 0.5), (GOOD, 0.5)]);
    assert_eq!(predicted_class(&labels, &s), Some((GOOD, 0.5)));
}

#[test]
fn unknown_labels_are_ignored() {
    let labels = LabelSet::default();
    let s = mk_sample(&[("Mould", 0.99), (BUBBLES, 0.6), (GOOD, 0.4)]);
    assert_eq!(predicted_class(&labels, &s), Some((BUBBLES, 0.6)));
}

#[test]
fn no_known_labels_is_a_validation_error() {
    let s = mk_sample(&[("Mould", 0.99)]);
    assert!(matches!(assessor().assess(&s), Err(QcError::Validation(_))));
}

#[test]
fn no_defect_is_low_severity() {
    let a = assessor()
        .assess(&mk_sample(&[(GOOD, 0.95), (BUBBLES, 0.025), (REAPER, 0.025)]))
        .unwrap();
    assert!(!a.defect_detected);
    assert_eq!(a.severity, Severity::Low);
    assert_eq!(a.predicted_class, GOOD);
}

#[test]
fn high_severity_needs_confidence_strictly_above_threshold() {
    let high = assessor()
        .assess(&mk_sample(&[(GOOD, 0.075), (BUBBLES, 0.85), (REAPER, 0.075)]))
        .unwrap();
    assert!(high.defect_detected);
    assert_eq!(high.severity, Severity::High);

    let edge = assessor()
        .assess(&mk_sample(&[(GOOD, 0.1), (BUBBLES, 0.1), (REAPER, 0.8)]))
        .unwrap();
    assert_eq!(edge.severity, Severity::Medium);
}

#[test]
fn assessment_keeps_full_distribution() {
    let a = assessor()
        .assess(&mk_sample(&[(GOOD, 0.2), (BUBBLES, 0.6), (REAPER, 0.2)]))
        .unwrap();
    assert_eq!(a.predictions.len(), 3);
    assert_eq!(a.confidence, 0.6);
    assert_eq!(a.image_name, "image_1.jpg");
}
