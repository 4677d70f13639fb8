//! Error types for the relation module.

use thiserror::Error;

/// Errors that can occur during relation store operations.
///
/// These are transport faults, propagated synchronously to the caller. No
/// retry state machine lives at this layer; retried publishes are safe
/// because slot writes are idempotent overwrites.
#[derive(Debug, Error)]
pub enum RelationError {
    /// The relation has been broken; no counterpart remains to talk to.
    #[error("relation disconnected: {0}")]
    Disconnected(String),

    /// The backing store could not be reached.
    #[error("relation store unavailable: {0}")]
    Unavailable(String),

    /// A counterpart slot held data this side could not interpret.
    #[error("corrupt relation data from {unit}: {reason}")]
    CorruptData { unit: String, reason: String },
}

/// Result type for relation operations.
pub type Result<T> = std::result::Result<T, RelationError>;
