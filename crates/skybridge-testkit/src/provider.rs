//! The simulated provider.
//!
//! Implements the provides-side contract the requirer is designed against:
//! observe every unit's request on each change, union capabilities into a
//! monotonic aggregate policy, provision once per distinct policy, and
//! republish per-unit results with the completion marker set to the hash of
//! the request actually acted on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::json;

use skybridge_core::{
    Capability, RelationData, RelationRole, RequestRecord, ResultRecord, UnitId,
};
use skybridge_relation::{
    scope_fields, MemoryRelation, RelationError, RelationModel, RelationStore,
};

/// The provides side of a relation, simulated over the in-memory model.
pub struct SimulatedProvider {
    relation: MemoryRelation,

    /// The aggregate policy: the union of all capabilities ever requested by
    /// any unit. Monotonically non-decreasing; a unit narrowing its own ask
    /// never shrinks it, because other units may depend on earlier grants.
    policy: BTreeSet<Capability>,

    /// The policy the cloud was last provisioned for.
    provisioned: Option<BTreeSet<Capability>>,

    /// How many times provisioning ran (once per distinct policy).
    provision_count: u64,

    /// Per-unit errors to inject on the next reconcile.
    injected_errors: BTreeMap<UnitId, String>,

    /// When set, results are published without completion markers,
    /// simulating a provider mid-reprovision.
    withhold_completion: bool,
}

impl SimulatedProvider {
    /// Attach a provider unit to a relation model.
    pub async fn attach(model: &Arc<RelationModel>, unit: UnitId) -> Self {
        let relation = model.attach(unit, RelationRole::Provider).await;
        Self {
            relation,
            policy: BTreeSet::new(),
            provisioned: None,
            provision_count: 0,
            injected_errors: BTreeMap::new(),
            withhold_completion: false,
        }
    }

    /// The current aggregate policy.
    pub fn policy(&self) -> &BTreeSet<Capability> {
        &self.policy
    }

    /// How many distinct policies have been provisioned.
    pub fn provision_count(&self) -> u64 {
        self.provision_count
    }

    /// Mark a unit's next result as failed.
    pub fn inject_error(&mut self, unit: UnitId, message: impl Into<String>) {
        self.injected_errors.insert(unit, message.into());
    }

    /// Publish results without completion markers until the next
    /// [`complete_reprovisioning`](Self::complete_reprovisioning).
    pub fn begin_reprovisioning(&mut self) {
        self.withhold_completion = true;
    }

    /// Resume publishing completion markers.
    pub fn complete_reprovisioning(&mut self) {
        self.withhold_completion = false;
    }

    /// Observe all requests and republish results.
    ///
    /// This is the provider's reaction to a relation-changed wake-up. It is
    /// safe to call on a partially updated snapshot: re-running on the next
    /// change resolves eventual consistency.
    pub async fn reconcile(&mut self) -> Result<(), RelationError> {
        let snapshot = self.relation.snapshot().await?;

        // Collect each requiring unit's current request.
        let mut requests: BTreeMap<UnitId, RequestRecord> = BTreeMap::new();
        for unit in snapshot.counterpart_units() {
            let data = snapshot.data_for(unit).expect("unit is in snapshot");
            match RequestRecord::from_fields(data) {
                Ok(Some(record)) => {
                    requests.insert(unit.clone(), record);
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(RelationError::CorruptData {
                        unit: unit.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Union into the aggregate policy; it only ever grows.
        for record in requests.values() {
            self.policy.extend(record.capabilities.iter().copied());
        }

        // Provision once per distinct policy, not once per unit.
        if !requests.is_empty() && self.provisioned.as_ref() != Some(&self.policy) {
            self.provisioned = Some(self.policy.clone());
            self.provision_count += 1;
        }

        // Republish every unit's result, scoped into our single slot.
        let mut slot = RelationData::new();
        for (unit, record) in &requests {
            let result = self.result_for(unit, record);
            slot.extend(scope_fields(unit, result.to_fields()));
        }
        self.relation.publish(slot).await
    }

    fn result_for(&self, unit: &UnitId, record: &RequestRecord) -> ResultRecord {
        if let Some(message) = self.injected_errors.get(unit) {
            return ResultRecord {
                error: Some(message.clone()),
                ..Default::default()
            };
        }

        let credentials = record.want_credentials.then(|| {
            json!({
                "auth-url": "https://cloud.test:5000/v3",
                "username": format!("svc-{}", unit.application()),
                "secret": format!("token-{}", record.content_hash()),
            })
        });

        let identifiers = BTreeMap::from([(
            "security-group".to_string(),
            format!("sg-{:04}", self.provision_count),
        )]);

        ResultRecord {
            credentials,
            identifiers,
            completed: (!self.withhold_completion).then(|| record.content_hash()),
            error: None,
        }
    }
}
