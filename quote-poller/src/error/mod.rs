use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("Quote request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    HttpError(#[source] reqwest::Error),

    #[error("Quote service returned status: {status}")]
    ApiError { status: u16 },

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, PollerError>;
