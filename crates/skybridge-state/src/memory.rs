//! In-memory implementation of the StateStore trait.
//!
//! This is primarily for testing. Same semantics as SQLite, no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use skybridge_core::EndpointName;

use crate::error::Result;
use crate::state::EndpointState;
use crate::traits::StateStore;

/// In-memory state store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<EndpointName, EndpointState>>,
}

impl MemoryStateStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, endpoint: &EndpointName) -> Result<Option<EndpointState>> {
        let states = self.states.read().unwrap();
        Ok(states.get(endpoint).cloned())
    }

    async fn save(&self, endpoint: &EndpointName, state: &EndpointState) -> Result<()> {
        let mut states = self.states.write().unwrap();
        states.insert(endpoint.clone(), state.clone());
        Ok(())
    }

    async fn clear(&self, endpoint: &EndpointName) -> Result<()> {
        let mut states = self.states.write().unwrap();
        states.remove(endpoint);
        Ok(())
    }
}
