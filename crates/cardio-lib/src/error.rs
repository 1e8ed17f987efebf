use thiserror::Error;

/// Structurally invalid input. Degenerate-but-valid signals never end up here.
#[derive(Debug, Error)]
pub enum CardioError {
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("malformed signal JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON must contain a 'signal' key array")]
    MissingSignal,
    #[error("sample {index} is not a finite number")]
    InvalidSample { index: usize },
    #[error("sampling rate must be positive, got {0}")]
    InvalidSamplingRate(f64),
    #[error("unsupported file format: {0}. Please upload JSON or an image")]
    UnsupportedFormat(String),
    #[error("classifier returned {got} results for {expected} beats")]
    ClassifierMismatch { expected: usize, got: usize },
    #[error("classifier failed: {0}")]
    Classifier(String),
}

pub type Result<T> = std::result::Result<T, CardioError>;
