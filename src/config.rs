use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub classifier: Classifier,
    #[serde(default)]
    pub assessment: Assessment,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.classifier.labels.is_empty() {
            anyhow::bail!("classifier.labels must not be empty");
        }
        if !self
            .classifier
            .labels
            .iter()
            .any(|l| l == &self.classifier.no_defect_label)
        {
            anyhow::bail!(
                "classifier.no_defect_label {:?} is not one of classifier.labels",
                self.classifier.no_defect_label
            );
        }
        if self.store.extension.trim().is_empty() {
            anyhow::bail!("store.extension must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub reports_dir: String,
    pub model_path: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            reports_dir: "testReports".into(),
            model_path: "ML_Models/RSS_Defect_Model.tflite".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    pub labels: Vec<String>,
    pub no_defect_label: String,
    /// "random" (OS entropy) or "content_hash" (seeded from image SHA-256).
    pub seed_mode: String,
    pub require_model_asset: bool,
}
impl Default for Classifier {
    fn default() -> Self {
        Self {
            labels: vec![
                "Good Quality with No Defects".into(),
                "Pin Head Bubbles Defect".into(),
                "Reaper Marks Defect".into(),
            ],
            no_defect_label: "Good Quality with No Defects".into(),
            seed_mode: "random".into(),
            require_model_asset: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Assessment {
    pub high_severity_confidence: f64,
}
impl Default for Assessment {
    fn default() -> Self {
        Self {
            high_severity_confidence: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Render {
    pub highlight_count: usize,
    pub name_truncate_chars: usize,
    pub tally_min_confidence: f64,
    pub tally_cap: usize,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            highlight_count: 3,
            name_truncate_chars: 20,
            tally_min_confidence: 0.5,
            tally_cap: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub extension: String,
    pub normalize_unicode: bool,
}
impl Default for Store {
    fn default() -> Self {
        Self {
            extension: "html".into(),
            normalize_unicode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub print_summary: bool,
    pub pretty_json: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            print_summary: true,
            pretty_json: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
