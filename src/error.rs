// src/error.rs
use thiserror::Error;

/// Failure while reading tables from the sheet backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Non-success response. `message` is what the user sees.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response for sheet {table}: {message}")]
    Decode { table: String, message: String },
    #[error("Invalid spreadsheet source: {0}")]
    InvalidSource(String),
}

/// The request URL carries the API key, so it is stripped before the
/// error reaches the user or the log.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.without_url().to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no API key configured for the insight service")]
    MissingKey,
    #[error("insight request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("insight service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not encode sample rows: {0}")]
    Encode(#[from] serde_json::Error),
}
