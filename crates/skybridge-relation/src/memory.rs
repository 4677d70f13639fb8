//! In-memory implementation of the RelationStore trait.
//!
//! Primarily for testing and provider simulation. One [`RelationModel`] is
//! the shared relation; each participant attaches to it and gets a
//! [`MemoryRelation`] handle bound to its own slot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use skybridge_core::{EndpointName, RelationData, RelationRole, UnitId};

use crate::error::{RelationError, Result};
use crate::snapshot::RelationSnapshot;
use crate::traits::RelationStore;

/// Shared state of one in-memory relation.
pub struct RelationModel {
    endpoint: EndpointName,
    inner: RwLock<ModelInner>,
}

#[derive(Default)]
struct ModelInner {
    /// Slot data and role per participant unit.
    slots: HashMap<UnitId, (RelationRole, RelationData)>,

    /// How many times each unit has published. Idempotence tests key off
    /// this counter.
    publish_counts: HashMap<UnitId, u64>,

    /// Set once the relation is broken; snapshots are empty from then on.
    broken: bool,
}

impl RelationModel {
    /// Create a new, unjoined relation.
    pub fn new(endpoint: EndpointName) -> Arc<Self> {
        Arc::new(Self {
            endpoint,
            inner: RwLock::new(ModelInner::default()),
        })
    }

    /// Attach a participant unit and get its store handle.
    pub async fn attach(
        self: &Arc<Self>,
        unit: UnitId,
        role: RelationRole,
    ) -> MemoryRelation {
        let mut inner = self.inner.write().await;
        inner
            .slots
            .entry(unit.clone())
            .or_insert_with(|| (role, RelationData::new()));

        MemoryRelation {
            unit,
            role,
            model: Arc::clone(self),
        }
    }

    /// Remove one unit and its slot from the relation.
    pub async fn depart(&self, unit: &UnitId) {
        let mut inner = self.inner.write().await;
        inner.slots.remove(unit);
        tracing::debug!(endpoint = %self.endpoint, %unit, "unit departed relation");
    }

    /// Break the relation: all slots are dropped and later snapshots are
    /// empty. Publishing through an attached handle fails afterwards.
    pub async fn break_relation(&self) {
        let mut inner = self.inner.write().await;
        inner.slots.clear();
        inner.broken = true;
        tracing::debug!(endpoint = %self.endpoint, "relation broken");
    }

    /// How many publishes a unit has performed.
    pub async fn publish_count(&self, unit: &UnitId) -> u64 {
        let inner = self.inner.read().await;
        inner.publish_counts.get(unit).copied().unwrap_or(0)
    }

    /// Read one unit's slot directly (test inspection).
    pub async fn slot(&self, unit: &UnitId) -> Option<RelationData> {
        let inner = self.inner.read().await;
        inner.slots.get(unit).map(|(_, data)| data.clone())
    }
}

/// One participant's handle onto a [`RelationModel`].
pub struct MemoryRelation {
    unit: UnitId,
    role: RelationRole,
    model: Arc<RelationModel>,
}

#[async_trait]
impl RelationStore for MemoryRelation {
    fn endpoint(&self) -> &EndpointName {
        &self.model.endpoint
    }

    fn local_unit(&self) -> &UnitId {
        &self.unit
    }

    async fn publish(&self, data: RelationData) -> Result<()> {
        let mut inner = self.model.inner.write().await;
        if inner.broken {
            return Err(RelationError::Disconnected(format!(
                "relation {} is broken",
                self.model.endpoint
            )));
        }
        inner.slots.insert(self.unit.clone(), (self.role, data));
        *inner.publish_counts.entry(self.unit.clone()).or_insert(0) += 1;
        Ok(())
    }

    async fn read_local(&self) -> Result<RelationData> {
        let inner = self.model.inner.read().await;
        Ok(inner
            .slots
            .get(&self.unit)
            .map(|(_, data)| data.clone())
            .unwrap_or_default())
    }

    async fn snapshot(&self) -> Result<RelationSnapshot> {
        let inner = self.model.inner.read().await;
        if inner.broken {
            return Ok(RelationSnapshot::empty());
        }
        let counterpart = self.role.counterpart();
        let counterparts: BTreeMap<UnitId, RelationData> = inner
            .slots
            .iter()
            .filter(|(_, (role, _))| *role == counterpart)
            .map(|(unit, (_, data))| (unit.clone(), data.clone()))
            .collect();
        Ok(RelationSnapshot::new(counterparts))
    }
}
