use crate::{
    error::{QcError, QcResult},
    report::{BatchMetadata, BatchReport, QualityVerdict, SampleAssessment},
    util::now_rfc3339,
};
use serde::{Deserialize, Serialize};

pub const ACTION_APPROVED: &str =
    "Batch approved for production. All samples passed quality inspection.";
pub const ACTION_MINOR: &str = "Batch conditionally approved. Minor defects detected. Recommend manual inspection of flagged samples.";
pub const ACTION_SIGNIFICANT: &str = "Batch requires review. Significant defects detected in multiple samples. Manual inspection recommended.";
pub const ACTION_REJECTED: &str = "Batch rejected. High defect rate detected. Do not proceed to production. Investigate root cause.";

/// The four recommended-action bands. `Minor` and `Significant` share the
/// CONDITIONAL_PASS verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTier {
    Approved,
    Minor,
    Significant,
    Rejected,
}

impl ActionTier {
    /// Bands: 0 | (0, 10] | (10, 30] | > 30.
    pub fn from_defect_percentage(pct: f64) -> Self {
        if pct == 0.0 {
            Self::Approved
        } else if pct <= 10.0 {
            Self::Minor
        } else if pct <= 30.0 {
            Self::Significant
        } else {
            Self::Rejected
        }
    }

    pub fn verdict(&self) -> QualityVerdict {
        match self {
            Self::Approved => QualityVerdict::Pass,
            Self::Minor | Self::Significant => QualityVerdict::ConditionalPass,
            Self::Rejected => QualityVerdict::Fail,
        }
    }

    pub fn recommended_action(&self) -> &'static str {
        match self {
            Self::Approved => ACTION_APPROVED,
            Self::Minor => ACTION_MINOR,
            Self::Significant => ACTION_SIGNIFICANT,
            Self::Rejected => ACTION_REJECTED,
        }
    }

    pub fn from_action(action: &str) -> Option<Self> {
        [
            Self::Approved,
            Self::Minor,
            Self::Significant,
            Self::Rejected,
        ]
        .into_iter()
        .find(|t| t.recommended_action() == action)
    }
}

pub fn defect_percentage(defects_found: usize, total: usize) -> QcResult<f64> {
    if total == 0 {
        return Err(QcError::Validation(
            "cannot aggregate an empty batch".into(),
        ));
    }
    Ok(defects_found as f64 * 100.0 / total as f64)
}

pub fn aggregate(meta: BatchMetadata, assessments: Vec<SampleAssessment>) -> QcResult<BatchReport> {
    aggregate_at(meta, assessments, now_rfc3339())
}

/// Pure core of the aggregator: same inputs, same report.
pub fn aggregate_at(
    meta: BatchMetadata,
    assessments: Vec<SampleAssessment>,
    timestamp: String,
) -> QcResult<BatchReport> {
    let total = assessments.len();
    let defects = assessments.iter().filter(|a| a.defect_detected).count();
    let tier = ActionTier::from_defect_percentage(defect_percentage(defects, total)?);

    Ok(BatchReport {
        batch_id: meta.batch_id,
        category: meta.category,
        tester_name: meta.tester_name,
        sheet_count: meta.sheet_count,
        batch_weight: meta.batch_weight,
        total_images_analyzed: total,
        defects_found: defects,
        overall_quality: tier.verdict(),
        recommended_action: tier.recommended_action().to_string(),
        predictions: assessments,
        timestamp,
    })
}
