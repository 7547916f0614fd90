//! Error type shared by every pipeline stage.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input bytes could not be decoded as an image.
    #[error("image preprocessing failed: {0}")]
    Preprocess(#[from] image::ImageError),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("tesseract not found: {0}")]
    TesseractNotFound(String),

    /// A field the diagnostic engine cannot run without was absent.
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    /// One or more screenshots of a batch failed; each entry names one failure.
    #[error("{} screenshot(s) failed: {}", .0.len(), .0.join("; "))]
    Batch(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
