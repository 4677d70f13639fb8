//! # Skybridge Relation
//!
//! The relation (channel) abstraction between the two integration roles.
//!
//! ## Overview
//!
//! A relation is a reliable, eventually-consistent shared key/value store
//! with one slot per participant unit. Each unit writes only its own slot
//! and reads snapshots of the counterpart side's slots. The transport that
//! replicates slots between hosts is external; this crate defines the seam
//! ([`RelationStore`]) and an in-memory implementation for tests and
//! provider simulations.
//!
//! ## Key Properties
//!
//! - **Slot-scoped writes**: no locking needed, each unit owns its slot
//! - **Snapshot reads**: readers see one coherent instant of the counterpart
//!   side, possibly stale but never torn mid-write
//! - **Lifecycle events**: `Joined` / `Changed` / `Broken` wake the host;
//!   they carry no payload, state always comes from a fresh snapshot

pub mod error;
pub mod event;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{RelationError, Result};
pub use event::RelationEvent;
pub use memory::{MemoryRelation, RelationModel};
pub use snapshot::{extract_scoped, scope_fields, RelationSnapshot};
pub use traits::RelationStore;
