//! StateStore trait: the abstract interface for endpoint-state persistence.

use async_trait::async_trait;
use skybridge_core::EndpointName;

use crate::error::Result;
use crate::state::EndpointState;

/// Async interface for persisting [`EndpointState`] between wake-ups.
///
/// Saves are whole-state overwrites keyed by endpoint name; there is no
/// partial update, so a crashed wake-up leaves either the old state or the
/// new one, never a mix.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state for an endpoint, if any.
    async fn load(&self, endpoint: &EndpointName) -> Result<Option<EndpointState>>;

    /// Persist the state for an endpoint, replacing any previous value.
    async fn save(&self, endpoint: &EndpointName, state: &EndpointState) -> Result<()>;

    /// Drop the persisted state for an endpoint.
    async fn clear(&self, endpoint: &EndpointName) -> Result<()>;
}

#[async_trait]
impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    async fn load(&self, endpoint: &EndpointName) -> Result<Option<EndpointState>> {
        (**self).load(endpoint).await
    }

    async fn save(&self, endpoint: &EndpointName, state: &EndpointState) -> Result<()> {
        (**self).save(endpoint, state).await
    }

    async fn clear(&self, endpoint: &EndpointName) -> Result<()> {
        (**self).clear(endpoint).await
    }
}
