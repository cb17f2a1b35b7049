use serde::{Deserialize, Serialize};

/// One (label, confidence) entry of a classifier distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
}

impl ClassProbability {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Raw classifier output for a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleClassification {
    pub image_label: String,
    pub class_probabilities: Vec<ClassProbability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityVerdict {
    Pass,
    ConditionalPass,
    Fail,
}

impl QualityVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::ConditionalPass => "CONDITIONAL_PASS",
            Self::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleAssessment {
    pub image_name: String,
    pub predictions: Vec<ClassProbability>,
    pub predicted_class: String,
    pub confidence: f64,
    pub defect_detected: bool,
    pub severity: Severity,
}

/// Caller-supplied batch fields carried into the report untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    pub batch_id: String,
    pub category: String,
    pub tester_name: String,
    pub sheet_count: u32,
    pub batch_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    #[serde(default)]
    pub batch_id: String,
    pub category: String,
    pub tester_name: String,
    pub sheet_count: u32,
    pub batch_weight: f64,
    pub total_images_analyzed: usize,
    pub defects_found: usize,
    pub overall_quality: QualityVerdict,
    pub recommended_action: String,
    #[serde(default)]
    pub predictions: Vec<SampleAssessment>,
    pub timestamp: String,
}

impl BatchReport {
    pub fn defect_percentage(&self) -> f64 {
        if self.total_images_analyzed == 0 {
            return 0.0;
        }
        self.defects_found as f64 * 100.0 / self.total_images_analyzed as f64
    }

    pub fn highest_severity(&self) -> Severity {
        self.predictions
            .iter()
            .filter(|p| p.defect_detected)
            .map(|p| p.severity)
            .max()
            .unwrap_or(Severity::Low)
    }
}
