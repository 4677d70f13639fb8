//! The requirer: the requires side of one integration endpoint.
//!
//! Converts imperative "give me X" calls into a published request record,
//! derives the endpoint flags from observed relation state, and exposes
//! read accessors over the provider's results.

use std::collections::BTreeMap;

use skybridge_core::{
    Capability, EndpointName, FeatureRequest, RequestRecord, UnitId,
};
use skybridge_relation::{RelationError, RelationEvent, RelationSnapshot, RelationStore};
use skybridge_state::{EndpointState, StateStore};

use crate::error::{RequirerError, Result};
use crate::flags::FlagState;

/// The requires side of one integration endpoint.
///
/// Generic over the relation transport and the local state store; both are
/// injected so tests and host harnesses choose their own backends.
///
/// All mutation funnels through two entry points: [`request`] (and the named
/// convenience calls built on it) and [`on_relation_event`]. Flag state is
/// recomputed in full from a fresh snapshot at every such point; it is never
/// patched incrementally, so a missed event cannot leave flags drifted from
/// the data they were derived from.
///
/// [`request`]: IntegrationRequirer::request
/// [`on_relation_event`]: IntegrationRequirer::on_relation_event
pub struct IntegrationRequirer<R: RelationStore, S: StateStore> {
    relation: R,
    store: S,
    state: EndpointState,
    /// The request being assembled this invocation. Seeded from the last
    /// published record so repeated wake-ups converge instead of resetting.
    pending: RequestRecord,
}

impl<R: RelationStore, S: StateStore> IntegrationRequirer<R, S> {
    /// Create a requirer for one endpoint, restoring any persisted state.
    pub async fn new(relation: R, store: S) -> Result<Self> {
        let state = store.load(relation.endpoint()).await?.unwrap_or_default();
        let pending = state.published.clone().unwrap_or_default();
        Ok(Self {
            relation,
            store,
            state,
            pending,
        })
    }

    /// The endpoint this requirer is bound to.
    pub fn endpoint(&self) -> &EndpointName {
        self.relation.endpoint()
    }

    /// The local unit whose slot this requirer writes.
    pub fn unit(&self) -> &UnitId {
        self.relation.local_unit()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request API
    // ─────────────────────────────────────────────────────────────────────────

    /// Merge a partial request into the pending record and publish it.
    ///
    /// Publishing is idempotent: if the merged record's content hash equals
    /// the last published hash, no write happens, so the provider sees no
    /// spurious change event. A genuinely new record is published and
    /// readiness is revoked until the provider answers the new content.
    pub async fn request(&mut self, request: FeatureRequest) -> Result<()> {
        let mut merged = self.pending.clone();
        request.apply_to(&mut merged);
        self.submit(merged).await
    }

    /// Request capabilities by wire name.
    ///
    /// A name outside the vocabulary fails the whole call before anything is
    /// published; the previously published request is unaffected.
    pub async fn request_named(&mut self, names: &[&str]) -> Result<()> {
        let capabilities = Capability::parse_set(names.iter().copied()).map_err(|e| {
            tracing::warn!(endpoint = %self.endpoint(), error = %e, "dropping malformed request");
            e
        })?;
        self.request(FeatureRequest::new().capabilities(capabilities))
            .await
    }

    /// Ask the provider to issue credentials for this unit.
    pub async fn request_credentials(&mut self) -> Result<()> {
        self.request(FeatureRequest::new().credentials(true)).await
    }

    /// Set this unit's instance label. Labels are per-unit; the provider
    /// never aggregates them across the application.
    pub async fn set_instance_label(&mut self, label: impl Into<String> + Send) -> Result<()> {
        self.request(FeatureRequest::new().label(label)).await
    }

    /// Add one capability to the requested set.
    pub async fn enable(&mut self, capability: Capability) -> Result<()> {
        let mut capabilities = self.pending.capabilities.clone();
        capabilities.insert(capability);
        self.request(FeatureRequest::new().capabilities(capabilities))
            .await
    }

    /// Enable network management for the instance.
    pub async fn enable_network_management(&mut self) -> Result<()> {
        self.enable(Capability::NetworkManagement).await
    }

    /// Enable security group management for the instance.
    pub async fn enable_security_management(&mut self) -> Result<()> {
        self.enable(Capability::SecurityManagement).await
    }

    /// Enable block storage management for the instance.
    pub async fn enable_block_storage_management(&mut self) -> Result<()> {
        self.enable(Capability::BlockStorageManagement).await
    }

    /// Enable read access to object storage.
    pub async fn enable_object_storage_access(&mut self) -> Result<()> {
        self.enable(Capability::ObjectStorageAccess).await
    }

    /// Enable object storage management.
    pub async fn enable_object_storage_management(&mut self) -> Result<()> {
        self.enable(Capability::ObjectStorageManagement).await
    }

    /// Enable DNS management.
    pub async fn enable_dns_management(&mut self) -> Result<()> {
        self.enable(Capability::DnsManagement).await
    }

    /// Enable instance metadata inspection.
    pub async fn enable_instance_inspection(&mut self) -> Result<()> {
        self.enable(Capability::InstanceInspection).await
    }

    /// Publish `merged` if it differs from the last published record.
    async fn submit(&mut self, merged: RequestRecord) -> Result<()> {
        let hash = merged.content_hash();
        if self.state.published_hash == Some(hash) {
            tracing::debug!(
                endpoint = %self.endpoint(),
                hash = %hash,
                "request content unchanged; skipping publish"
            );
            self.pending = merged;
            return Ok(());
        }

        self.relation.publish(merged.to_fields()).await?;
        tracing::debug!(
            endpoint = %self.endpoint(),
            unit = %self.unit(),
            hash = %hash,
            "published integration request"
        );

        self.pending = merged.clone();
        self.state.record_publish(merged);

        // The ask changed, so readiness must be re-derived against it now;
        // the provider's completion marker still names the old content.
        let snapshot = self.relation.snapshot().await?;
        self.recompute(&snapshot)?;
        self.persist().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event handling
    // ─────────────────────────────────────────────────────────────────────────

    /// React to a relation lifecycle event.
    ///
    /// This is the single entry point the host harness wires its wake-ups
    /// to. `Broken` is the only path that clears `joined`.
    pub async fn on_relation_event(&mut self, event: RelationEvent) -> Result<()> {
        match event {
            RelationEvent::Broken => {
                self.apply_flags(false, false);
                self.state.last_result = None;
                self.persist().await
            }
            RelationEvent::Joined | RelationEvent::Changed => {
                let snapshot = self.relation.snapshot().await?;
                self.recompute(&snapshot)?;
                self.persist().await
            }
        }
    }

    /// Recompute the full flag state from one snapshot.
    fn recompute(&mut self, snapshot: &RelationSnapshot) -> Result<()> {
        let joined = snapshot.has_counterparts();

        let result = snapshot
            .result_for(self.relation.local_unit())
            .map_err(|e| {
                RelationError::CorruptData {
                    unit: self.relation.local_unit().to_string(),
                    reason: e.to_string(),
                }
            })?;

        let ready = joined
            && match (&self.state.published, &self.state.published_hash, &result) {
                (Some(published), Some(hash), Some(result)) => {
                    result.satisfies(hash, published.want_credentials)
                }
                _ => false,
            };

        self.state.last_result = result;
        self.apply_flags(joined, ready);
        Ok(())
    }

    /// Apply new flag values, logging transitions.
    fn apply_flags(&mut self, joined: bool, ready: bool) {
        let next = FlagState::new(joined, ready);
        let prev = self.flags();
        if next != prev {
            tracing::debug!(
                endpoint = %self.endpoint(),
                joined = next.joined(),
                ready = next.ready(),
                "flag state changed"
            );
        }
        self.state.joined = next.joined();
        self.state.ready = next.ready();
    }

    async fn persist(&mut self) -> Result<()> {
        self.store.save(self.relation.endpoint(), &self.state).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// The current flag values.
    pub fn flags(&self) -> FlagState {
        FlagState::new(self.state.joined, self.state.ready)
    }

    /// Whether the relation has a connected counterpart.
    pub fn is_joined(&self) -> bool {
        self.state.joined
    }

    /// Whether the current request has been fulfilled.
    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    /// The last request record published to the relation, if any.
    pub fn published_request(&self) -> Option<&RequestRecord> {
        self.state.published.as_ref()
    }

    /// The issued credentials.
    ///
    /// Fails with [`RequirerError::NotReady`] until the provider has
    /// fulfilled the current request; never returns credentials from a
    /// superseded one.
    pub fn credentials(&self) -> Result<&serde_json::Value> {
        self.ready_result()?
            .credentials
            .as_ref()
            .ok_or(RequirerError::NotReady("credentials"))
    }

    /// All provisioned identifiers.
    pub fn identifiers(&self) -> Result<&BTreeMap<String, String>> {
        Ok(&self.ready_result()?.identifiers)
    }

    /// One provisioned identifier by name, if the provider published it.
    pub fn identifier(&self, name: &str) -> Result<Option<&str>> {
        Ok(self.ready_result()?.identifiers.get(name).map(String::as_str))
    }

    fn ready_result(&self) -> Result<&skybridge_core::ResultRecord> {
        if !self.state.ready {
            return Err(RequirerError::NotReady("result"));
        }
        self.state
            .last_result
            .as_ref()
            .ok_or(RequirerError::NotReady("result"))
    }
}
