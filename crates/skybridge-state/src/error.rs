//! Error types for the state module.

use thiserror::Error;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// State serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
