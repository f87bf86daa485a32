use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Classification the handler matches on to pick an outward status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Transport,
    Decode,
    WriteError,
    Unavailable,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Upstream quote request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Upstream API returned status: {status}")]
    Upstream { status: u16 },

    #[error("Invalid quote payload: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout(_) => ErrorKind::Timeout,
            FetchError::Transport(_) | FetchError::Upstream { .. } => ErrorKind::Transport,
            FetchError::Decode(_) => ErrorKind::Decode,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Quote write timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Write(#[source] sqlx::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Timeout(_) => ErrorKind::Timeout,
            StoreError::Unavailable(_) => ErrorKind::Unavailable,
            StoreError::Write(_) => ErrorKind::WriteError,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => StoreError::Unavailable(err),
            _ => StoreError::Write(err),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Fetch(e) => e.kind(),
            ServiceError::Store(e) => e.kind(),
            ServiceError::Config(_) | ServiceError::Io(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<&ServiceError> for StatusCode {
    fn from(err: &ServiceError) -> Self {
        match err.kind() {
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Transport
            | ErrorKind::Decode
            | ErrorKind::WriteError
            | ErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
