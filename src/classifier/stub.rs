use super::{Classifier, LabelSet};
use crate::{
    config::Config,
    error::{QcError, QcResult},
    report::{ClassProbability, SampleClassification},
    util::sha256_seed,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

/// Formats accepted by signature. A payload counts as an image when its
/// leading bytes match one of these; pixel data is not decoded.
const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/heif",
    "image/avif",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    Random,
    ContentHash,
}

impl SeedMode {
    pub fn parse(raw: &str) -> QcResult<Self> {
        match raw {
            "random" => Ok(Self::Random),
            "content_hash" => Ok(Self::ContentHash),
            other => Err(QcError::Validation(format!(
                "unknown classifier.seed_mode: {other}"
            ))),
        }
    }
}

/// Placeholder classifier. Not a trained model: it picks one label at random,
/// gives it a confidence in [0.5, 1.0) and spreads the remainder evenly.
pub struct StubClassifier {
    labels: LabelSet,
    seed_mode: SeedMode,
}

impl StubClassifier {
    pub fn new(labels: LabelSet, seed_mode: SeedMode) -> Self {
        Self { labels, seed_mode }
    }

    pub fn from_config(cfg: &Config) -> QcResult<Self> {
        Ok(Self::new(
            LabelSet::from_config(cfg)?,
            SeedMode::parse(&cfg.classifier.seed_mode)?,
        ))
    }

    fn distribute<R: Rng>(&self, rng: &mut R) -> Vec<ClassProbability> {
        let n = self.labels.len();
        let chosen = rng.random_range(0..n);
        let base: f64 = 0.5 + rng.random::<f64>() * 0.5;
        let rest = if n > 1 { (1.0 - base) / (n - 1) as f64 } else { 0.0 };

        self.labels
            .labels()
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let c = if i == chosen { base } else { rest };
                ClassProbability::new(label.clone(), round4(c))
            })
            .collect()
    }
}

impl Classifier for StubClassifier {
    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn classify(&self, image_label: &str, bytes: &[u8]) -> QcResult<SampleClassification> {
        if bytes.is_empty() {
            return Err(QcError::InvalidImageData(format!(
                "{image_label}: empty payload"
            )));
        }
        match infer::get(bytes).map(|k| k.mime_type()) {
            Some(mime) if ACCEPTED_IMAGE_TYPES.contains(&mime) => {}
            Some(mime) => {
                return Err(QcError::InvalidImageData(format!(
                    "{image_label}: unsupported format {mime}"
                )));
            }
            None => {
                return Err(QcError::InvalidImageData(format!(
                    "{image_label}: payload is not a recognised image format"
                )));
            }
        }

        let class_probabilities = match self.seed_mode {
            SeedMode::Random => self.distribute(&mut rand::rng()),
            SeedMode::ContentHash => {
                let mut rng = StdRng::seed_from_u64(sha256_seed(bytes));
                self.distribute(&mut rng)
            }
        };
        debug!(image = image_label, bytes = bytes.len(), "stub classification");

        Ok(SampleClassification {
            image_label: image_label.to_string(),
            class_probabilities,
        })
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
