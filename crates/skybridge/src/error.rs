//! Error types for the requirer.

use skybridge_core::CoreError;
use skybridge_relation::RelationError;
use skybridge_state::StateError;
use thiserror::Error;

/// Errors that can occur during requirer operations.
///
/// "The provider hasn't finished yet" is never an error: that is the normal
/// `joined`-but-not-`ready` state, observable through the flags. [`NotReady`]
/// only fires when an accessor is called in that state anyway.
///
/// [`NotReady`]: RequirerError::NotReady
#[derive(Debug, Error)]
pub enum RequirerError {
    /// Malformed request configuration (e.g. an unknown capability name).
    /// The request is dropped; nothing is published.
    #[error("configuration error: {0}")]
    Configuration(#[from] CoreError),

    /// Relation transport fault, propagated synchronously.
    #[error("relation error: {0}")]
    Relation(#[from] RelationError),

    /// Local state persistence fault.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// An accessor was called before the request was fulfilled.
    #[error("{0} not available: integration request not yet fulfilled")]
    NotReady(&'static str),
}

/// Result type for requirer operations.
pub type Result<T> = std::result::Result<T, RequirerError>;
