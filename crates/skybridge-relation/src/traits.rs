//! RelationStore trait: the abstract interface to the shared relation data.
//!
//! This trait allows the requirer to be transport-agnostic. Implementations
//! include the in-memory relation (tests, simulations) and whatever the host
//! harness bridges to its real relation transport.

use async_trait::async_trait;
use skybridge_core::{EndpointName, RelationData, UnitId};

use crate::error::Result;
use crate::snapshot::RelationSnapshot;

/// Async interface to one endpoint's shared relation data.
///
/// # Design Notes
///
/// - **Slot-scoped writes**: `publish` overwrites this unit's own slot and
///   nothing else; a retried publish is harmless.
/// - **Snapshot reads**: `snapshot` returns one coherent instant of the
///   counterpart side. Eventual consistency is resolved by re-reading on
///   every change event, not by coordination.
/// - **No retries here**: transport faults surface as errors immediately;
///   retry policy belongs to the transport, not this seam.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// The endpoint this store is bound to.
    fn endpoint(&self) -> &EndpointName;

    /// The local unit whose slot this store writes.
    fn local_unit(&self) -> &UnitId;

    /// Overwrite this unit's slot with `data`.
    async fn publish(&self, data: RelationData) -> Result<()>;

    /// Read back this unit's own slot.
    async fn read_local(&self) -> Result<RelationData>;

    /// Read a snapshot of all counterpart slots.
    ///
    /// An unjoined or broken relation yields an empty snapshot.
    async fn snapshot(&self) -> Result<RelationSnapshot>;
}
