use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image codec: {0}")]
    Image(#[from] image::ImageError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded: need {needed} bytes, quota {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Classifier error: {0}")]
    Classifier(String),
}

impl From<std::io::Error> for VisionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<tokio::task::JoinError> for VisionError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

pub type VisionResult<T> = Result<T, VisionError>;
