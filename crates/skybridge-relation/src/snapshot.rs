//! Snapshots of the counterpart side of a relation.
//!
//! A snapshot is one coherent read of every counterpart slot. All flag
//! recomputation works from a snapshot, never from incremental deltas, so a
//! missed event can never leave flags drifted from the data.

use std::collections::BTreeMap;

use skybridge_core::{CoreError, RelationData, ResultRecord, UnitId};

/// One observed instant of the counterpart side's slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSnapshot {
    counterparts: BTreeMap<UnitId, RelationData>,
}

impl RelationSnapshot {
    /// A snapshot with no counterpart units (unjoined or broken relation).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from counterpart slots.
    pub fn new(counterparts: BTreeMap<UnitId, RelationData>) -> Self {
        Self { counterparts }
    }

    /// Whether any counterpart unit is present.
    pub fn has_counterparts(&self) -> bool {
        !self.counterparts.is_empty()
    }

    /// The counterpart units in this snapshot.
    pub fn counterpart_units(&self) -> impl Iterator<Item = &UnitId> {
        self.counterparts.keys()
    }

    /// Raw slot data for one counterpart unit.
    pub fn data_for(&self, unit: &UnitId) -> Option<&RelationData> {
        self.counterparts.get(unit)
    }

    /// The result record addressed to `unit`, if any counterpart published
    /// one.
    ///
    /// Providers scope per-unit result fields with the requesting unit's id
    /// (see [`scope_fields`]). The providing side is typically a singleton;
    /// if several counterparts answer, the first complete record wins.
    pub fn result_for(&self, unit: &UnitId) -> Result<Option<ResultRecord>, CoreError> {
        for data in self.counterparts.values() {
            let scoped = extract_scoped(unit, data);
            if let Some(record) = ResultRecord::from_fields(&scoped)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Prefix result fields with the requesting unit's id.
///
/// `credentials` for `worker/0` travels as `worker/0.credentials` in the
/// provider's flat slot, so one provider slot can answer many units.
pub fn scope_fields(unit: &UnitId, fields: RelationData) -> RelationData {
    fields
        .into_iter()
        .map(|(key, value)| (format!("{unit}.{key}"), value))
        .collect()
}

/// Recover the unscoped fields addressed to `unit` from a provider slot.
pub fn extract_scoped(unit: &UnitId, data: &RelationData) -> RelationData {
    let prefix = format!("{unit}.");
    data.iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(&prefix)
                .map(|stripped| (stripped.to_string(), value.clone()))
        })
        .collect()
}
