//! Error types for adrev

use thiserror::Error;

/// Result type alias for adrev operations
pub type Result<T> = std::result::Result<T, AdrevError>;

/// Main error type for adrev
///
/// The ingestion pipeline distinguishes two families: transport failures
/// (object store, reporting API, stored procedure calls) and decode failures
/// (a file or row that does not match the feed layout). Rows rejected by an
/// acceptance rule are not errors and never produce one of these.
#[derive(Error, Debug)]
pub enum AdrevError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),
}

impl AdrevError {
    pub fn transport(msg: impl Into<String>) -> Self {
        AdrevError::Transport(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        AdrevError::Decode(msg.into())
    }

    /// Network or remote-service failure, as opposed to bad input.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AdrevError::Transport(_) | AdrevError::Database(_) | AdrevError::Io(_)
        )
    }
}
