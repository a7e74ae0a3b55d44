//! Error types for the edit state engine.

use thiserror::Error;

/// Errors surfaced by the tree, buffer cache, and command surface.
///
/// `Clone` so that a single remote outcome can be handed to every caller
/// waiting on a deduplicated request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The operation referenced a key absent from the relevant model
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The transport rejected or failed the remote call
    #[error("Remote failure: {0}")]
    RemoteFailure(String),

    /// The operation would create a second node with an existing key
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),
}

/// Errors reported by a [`crate::transport::Transport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("No such resource on host: {0}")]
    Missing(String),

    #[error("Host refused request: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Missing(key) => ApiError::NotFound(key),
            other => ApiError::RemoteFailure(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::CatalogError(err.to_string())
    }
}
