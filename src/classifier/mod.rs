pub mod labels;
pub mod stub;

use crate::{error::QcResult, report::SampleClassification};

pub use labels::LabelSet;
pub use stub::{SeedMode, StubClassifier};

/// Image bytes in, label distribution out.
///
/// Implementations must return a confidence in [0, 1] for every label of
/// [`Classifier::labels`], and fail with `QcError::InvalidImageData` when the
/// payload is not an image.
pub trait Classifier: Send + Sync {
    fn labels(&self) -> &LabelSet;
    fn classify(&self, image_label: &str, bytes: &[u8]) -> QcResult<SampleClassification>;
}
