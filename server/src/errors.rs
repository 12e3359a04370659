//! Error types for the StackPilot server

use thiserror::Error;

/// Main error type for the StackPilot server
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Forge API error: {0}")]
    ForgeError(String),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("Failed to trigger workflow: {0}")]
    DispatchError(String),

    #[error("Failed to list workflow runs: {0}")]
    DiscoveryError(String),

    #[error("Timed out waiting for the new workflow run")]
    DiscoveryTimeout,

    #[error("Status poll failed: {0}")]
    PollError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::ServerError(err.to_string())
    }
}
