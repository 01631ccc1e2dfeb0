use thiserror::Error;

use dnaexplain_common::error::CommonError;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sandbox(#[from] CommonError),

    #[error("{context} failed ({status})")]
    Status { context: &'static str, status: u16 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (maximum {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to parse PDF: {0}")]
    Pdf(String),

    #[error("No text found in document")]
    Empty,

    #[error("Processing timed out after {0}s")]
    Timeout(u64),
}
