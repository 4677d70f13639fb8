//! # Skybridge
//!
//! The requires side of the skybridge cloud integration protocol.
//!
//! ## Overview
//!
//! A requiring application declares a need for cloud-platform features —
//! issued credentials, permission grants, an instance label — without
//! carrying any cloud-specific logic itself. The privileged provider on the
//! other side of the relation owns the credentials and does the actual
//! provisioning; this side only publishes intent and consumes results.
//!
//! ## Key Concepts
//!
//! - **Request record**: one unit's published ask. Overwritten wholesale on
//!   change; the provider unions capabilities across all units.
//! - **Completion marker**: the provider echoes the content hash of the
//!   request it fulfilled. Readiness is hash equality, so a changed ask is
//!   never mistaken for fulfilled.
//! - **Flags**: `endpoint.<name>.joined` and `endpoint.<name>.ready`,
//!   derived in full from relation snapshots on every wake-up. The host
//!   reads them, never writes them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skybridge::{IntegrationRequirer, RelationEvent};
//! use skybridge_relation::RelationStore;
//! use skybridge_state::SqliteStateStore;
//!
//! async fn example(relation: impl RelationStore) {
//!     let store = SqliteStateStore::open("endpoint-state.db").unwrap();
//!     let mut cloud = IntegrationRequirer::new(relation, store).await.unwrap();
//!
//!     // Declare what this unit needs.
//!     cloud.request_credentials().await.unwrap();
//!     cloud.enable_network_management().await.unwrap();
//!
//!     // Wired to the host's relation-changed wake-up.
//!     cloud.on_relation_event(RelationEvent::Changed).await.unwrap();
//!
//!     if cloud.is_ready() {
//!         let credentials = cloud.credentials().unwrap();
//!         let _ = credentials;
//!     }
//! }
//! ```

pub mod error;
pub mod flags;
pub mod requirer;

// Re-export component crates
pub use skybridge_core as core;
pub use skybridge_relation as relation;
pub use skybridge_state as state;

// Re-export main types for convenience
pub use error::{RequirerError, Result};
pub use flags::{Flag, FlagState};
pub use requirer::IntegrationRequirer;

// Re-export commonly used component types
pub use skybridge_core::{
    Capability, ContentHash, EndpointName, FeatureRequest, RequestRecord, ResultRecord, UnitId,
};
pub use skybridge_relation::{RelationEvent, RelationSnapshot, RelationStore};
pub use skybridge_state::{EndpointState, StateStore};
