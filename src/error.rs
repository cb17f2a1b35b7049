use thiserror::Error;

#[derive(Debug, Error)]
pub enum QcError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid image data: {0}")]
    InvalidImageData(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("store I/O error: {context}")]
    Store {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model not found: {0}")]
    ModelMissing(String),
}

impl QcError {
    pub fn store(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// HTTP-equivalent status code for the boundary error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidImageData(_) => 400,
            Self::NotFound(_) => 404,
            Self::Render(_) | Self::Store { .. } | Self::ModelMissing(_) => 500,
        }
    }

    /// Message without the kind prefix, as shown to API clients.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(m)
            | Self::InvalidImageData(m)
            | Self::NotFound(m)
            | Self::Render(m)
            | Self::ModelMissing(m) => m.clone(),
            Self::Store { context, source } => format!("{context}: {source}"),
        }
    }
}

pub type QcResult<T> = Result<T, QcError>;
