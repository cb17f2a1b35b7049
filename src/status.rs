use crate::{classifier::Classifier, config::Config, util::now_rfc3339};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_path: String,
    pub model_size: String,
    pub supported_classes: Vec<String>,
    pub timestamp: String,
}

pub fn model_status(cfg: &Config, classifier: &dyn Classifier) -> ModelStatus {
    let path = Path::new(&cfg.paths.model_path);
    let size_bytes = std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len());

    ModelStatus {
        model_loaded: size_bytes.is_some(),
        model_path: cfg.paths.model_path.clone(),
        model_size: format!("{:.2} MB", size_bytes.unwrap_or(0) as f64 / (1024.0 * 1024.0)),
        supported_classes: classifier.labels().labels().to_vec(),
        timestamp: now_rfc3339(),
    }
}

pub fn model_asset_present(cfg: &Config) -> bool {
    Path::new(&cfg.paths.model_path).is_file()
}
