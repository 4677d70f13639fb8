//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use skybridge::IntegrationRequirer;
use skybridge_core::{EndpointName, RelationRole, UnitId};
use skybridge_relation::{MemoryRelation, RelationModel};
use skybridge_state::MemoryStateStore;

use crate::provider::SimulatedProvider;

/// Parse a unit id, panicking on bad test input.
pub fn unit(id: &str) -> UnitId {
    UnitId::new(id).expect("valid unit id")
}

/// A relation model with an attached simulated provider.
pub struct TestHarness {
    pub endpoint: EndpointName,
    pub model: Arc<RelationModel>,
    pub provider: SimulatedProvider,
}

impl TestHarness {
    /// Create a harness for the `cloud` endpoint with a singleton provider.
    pub async fn new() -> Self {
        Self::for_endpoint("cloud").await
    }

    /// Create a harness for a named endpoint.
    pub async fn for_endpoint(name: &str) -> Self {
        let endpoint = EndpointName::new(name).expect("valid endpoint name");
        let model = RelationModel::new(endpoint.clone());
        let provider = SimulatedProvider::attach(&model, unit("integrator/0")).await;
        Self {
            endpoint,
            model,
            provider,
        }
    }

    /// Attach a requiring unit and build a requirer over in-memory state.
    pub async fn requirer(
        &self,
        unit_id: &str,
    ) -> IntegrationRequirer<MemoryRelation, MemoryStateStore> {
        let relation = self.model.attach(unit(unit_id), RelationRole::Requirer).await;
        IntegrationRequirer::new(relation, MemoryStateStore::new())
            .await
            .expect("requirer construction over memory stores")
    }

    /// Attach a requiring unit reusing a shared state store, simulating a
    /// process restart between wake-ups.
    pub async fn requirer_with_state(
        &self,
        unit_id: &str,
        store: Arc<MemoryStateStore>,
    ) -> IntegrationRequirer<MemoryRelation, Arc<MemoryStateStore>> {
        let relation = self.model.attach(unit(unit_id), RelationRole::Requirer).await;
        IntegrationRequirer::new(relation, store)
            .await
            .expect("requirer construction over memory stores")
    }
}

/// Install a test subscriber printing to stderr.
///
/// Repeated calls are harmless; later installs are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
