use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network capabilities capped: {0}")]
    Sandbox(String),
}

pub type Result<T> = std::result::Result<T, CommonError>;
