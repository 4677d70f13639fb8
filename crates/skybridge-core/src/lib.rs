//! # Skybridge Core
//!
//! Pure data model for the skybridge integration protocol: the records a
//! requiring unit publishes, the records a provider answers with, and the
//! canonical encoding that makes both sides agree on content identity.
//!
//! This crate contains no I/O, no storage, no relation transport. It is pure
//! computation over protocol data.
//!
//! ## Key Types
//!
//! - [`RequestRecord`] - The features a unit asks the provider for
//! - [`ResultRecord`] - The provider's per-unit answer
//! - [`Capability`] - The fixed vocabulary of permission grants
//! - [`ContentHash`] - Content-address of a request (Blake3 hash)
//!
//! ## Canonicalization
//!
//! Request records are encoded using deterministic CBOR so the same request
//! hashes identically on every platform. See [`canonical`] module.

pub mod canonical;
pub mod capability;
pub mod error;
pub mod hash;
pub mod request;
pub mod result;
pub mod types;

pub use canonical::{canonical_request_bytes, decode_request};
pub use capability::Capability;
pub use error::CoreError;
pub use hash::ContentHash;
pub use request::{FeatureRequest, RequestRecord};
pub use result::ResultRecord;
pub use types::{EndpointName, RelationData, RelationRole, UnitId};
