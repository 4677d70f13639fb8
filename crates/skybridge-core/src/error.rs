//! Error types for the skybridge core.

use thiserror::Error;

/// Errors that can occur while building or decoding protocol records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown capability: {0:?}")]
    UnknownCapability(String),

    #[error("invalid endpoint name: {0:?}")]
    InvalidEndpointName(String),

    #[error("invalid unit id: {0:?}")]
    InvalidUnitId(String),

    #[error("malformed field {key:?}: {reason}")]
    MalformedField { key: String, reason: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
