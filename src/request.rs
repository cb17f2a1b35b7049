use crate::{
    error::{QcError, QcResult},
    report::BatchMetadata,
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

/// Body of a prediction request as the client submits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchRequest {
    /// Base64 payloads, optionally prefixed with `data:image/<fmt>;base64,`.
    pub images: Vec<String>,
    pub batch_id: String,
    pub category: String,
    pub sheet_count: u32,
    pub batch_weight: f64,
    pub tester_name: String,
}

/// A decoded image ready for classification.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl BatchRequest {
    pub fn validate(&self) -> QcResult<()> {
        if self.images.is_empty() {
            return Err(QcError::Validation(
                "No images provided for prediction".into(),
            ));
        }

        let missing: Vec<&str> = [
            ("batchId", &self.batch_id),
            ("category", &self.category),
            ("testerName", &self.tester_name),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if !missing.is_empty() {
            return Err(QcError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn metadata(&self) -> BatchMetadata {
        BatchMetadata {
            batch_id: self.batch_id.clone(),
            category: self.category.clone(),
            tester_name: self.tester_name.clone(),
            sheet_count: self.sheet_count,
            batch_weight: self.batch_weight,
        }
    }

    /// Decodes every payload in submission order; images are named
    /// `image_<n>.jpg`, 1-based.
    pub fn decode_images(&self) -> QcResult<Vec<ImagePayload>> {
        self.images
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let name = format!("image_{}.jpg", i + 1);
                let bytes = decode_base64_image(raw)
                    .map_err(|e| QcError::InvalidImageData(format!("{name}: {e}")))?;
                Ok(ImagePayload { name, bytes })
            })
            .collect()
    }
}

fn strip_data_url(raw: &str) -> &str {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("data:image/") {
        if let Some(idx) = rest.find(";base64,") {
            return &rest[idx + ";base64,".len()..];
        }
    }
    raw
}

pub fn decode_base64_image(raw: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(strip_data_url(raw))
}

pub fn encode_base64_image(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Opaque identity of the authenticated caller, resolved by the outer
/// auth layer and handed to the pipeline explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn anonymous() -> Self {
        Self("anonymous".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `{ success, message, data }` success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Error envelope returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
    #[serde(skip)]
    pub status: u16,
}

impl From<&QcError> for ApiError {
    fn from(err: &QcError) -> Self {
        Self {
            success: false,
            message: err.client_message(),
            status: err.status_code(),
        }
    }
}
