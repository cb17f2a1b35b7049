use crate::{config::Config, error::QcError, error::QcResult};
use serde::{Deserialize, Serialize};

/// Closed, ordered set of classification labels with one designated
/// "no defect" label. Order is the tie-break order for argmax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<String>,
    no_defect: usize,
}

impl LabelSet {
    pub fn new(labels: Vec<String>, no_defect_label: &str) -> QcResult<Self> {
        if labels.is_empty() {
            return Err(QcError::Validation("label set must not be empty".into()));
        }
        let no_defect = labels
            .iter()
            .position(|l| l == no_defect_label)
            .ok_or_else(|| {
                QcError::Validation(format!(
                    "no-defect label {no_defect_label:?} is not in the label set"
                ))
            })?;
        for (i, l) in labels.iter().enumerate() {
            if labels[..i].contains(l) {
                return Err(QcError::Validation(format!("duplicate label {l:?}")));
            }
        }
        Ok(Self { labels, no_defect })
    }

    pub fn from_config(cfg: &Config) -> QcResult<Self> {
        Self::new(
            cfg.classifier.labels.clone(),
            &cfg.classifier.no_defect_label,
        )
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn no_defect_label(&self) -> &str {
        &self.labels[self.no_defect]
    }

    pub fn is_defect(&self, label: &str) -> bool {
        label != self.no_defect_label()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        let c = crate::config::Classifier::default();
        let no_defect = c
            .labels
            .iter()
            .position(|l| l == &c.no_defect_label)
            .unwrap_or(0);
        Self {
            labels: c.labels,
            no_defect,
        }
    }
}
