use crate::{
    classifier::LabelSet,
    config::Config,
    error::{QcError, QcResult},
    report::{SampleAssessment, SampleClassification, Severity},
};

/// Turns one classifier distribution into a defect decision and severity.
#[derive(Debug, Clone)]
pub struct Assessor {
    labels: LabelSet,
    high_severity_confidence: f64,
}

impl Assessor {
    pub fn new(labels: LabelSet, high_severity_confidence: f64) -> Self {
        Self {
            labels,
            high_severity_confidence,
        }
    }

    pub fn from_config(cfg: &Config, labels: LabelSet) -> Self {
        Self::new(labels, cfg.assessment.high_severity_confidence)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn assess(&self, sample: &SampleClassification) -> QcResult<SampleAssessment> {
        let (predicted, confidence) = predicted_class(&self.labels, sample).ok_or_else(|| {
            QcError::Validation(format!(
                "classification for {} has no known labels",
                sample.image_label
            ))
        })?;

        let defect_detected = self.labels.is_defect(predicted);
        let severity = if !defect_detected {
            Severity::Low
        } else if confidence > self.high_severity_confidence {
            Severity::High
        } else {
            Severity::Medium
        };

        Ok(SampleAssessment {
            image_name: sample.image_label.clone(),
            predictions: sample.class_probabilities.clone(),
            predicted_class: predicted.to_string(),
            confidence,
            defect_detected,
            severity,
        })
    }
}

/// Argmax over the label set. Walks labels in set order and only replaces the
/// current best on a strictly greater confidence, so ties go to the earlier
/// label. Entries outside the set or with a non-finite confidence are ignored.
pub fn predicted_class<'a>(
    labels: &'a LabelSet,
    sample: &SampleClassification,
) -> Option<(&'a str, f64)> {
    let mut best: Option<(&'a str, f64)> = None;
    for label in labels.labels() {
        let Some(p) = sample
            .class_probabilities
            .iter()
            .find(|p| &p.label == label)
            .filter(|p| p.confidence.is_finite())
        else {
            continue;
        };
        match best {
            Some((_, c)) if p.confidence <= c => {}
            _ => best = Some((label.as_str(), p.confidence)),
        }
    }
    best
}
