//! Error types for relay operations

use crate::store::StoreError;
use thiserror::Error;

/// Relay bot specific errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Insert would violate a uniqueness constraint
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Lookup by id or key missed
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operator input could not be interpreted
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Sending to a single channel failed
    #[error("Delivery to {channel} failed: {reason}")]
    DeliveryFailure {
        channel: String,
        reason: String,
    },

    /// The live exchange-rate source could not be used
    #[error("Exchange rate unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Store(String),

    /// Telegram Bot API rejected a request
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl From<StoreError> for RelayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => RelayError::Duplicate(what),
            StoreError::NotFound(what) => RelayError::NotFound(what),
            StoreError::Backend(reason) => RelayError::Store(reason),
        }
    }
}

impl From<relay_utils::EnvError> for RelayError {
    fn from(err: relay_utils::EnvError) -> Self {
        RelayError::ConfigError(err.to_string())
    }
}
