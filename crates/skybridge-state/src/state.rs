//! The persisted endpoint state.

use serde::{Deserialize, Serialize};

use skybridge_core::{ContentHash, RequestRecord, ResultRecord};

/// Everything one endpoint must remember between wake-ups.
///
/// Mutated only by the requirer; the host application never edits this
/// directly (in particular, flags must never be cleared by hand).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointState {
    /// The last request record published to this unit's slot, if any.
    pub published: Option<RequestRecord>,

    /// Content hash of `published`, cached so idempotence checks need no
    /// re-canonicalization on every call.
    pub published_hash: Option<ContentHash>,

    /// The most recently observed result record addressed to this unit.
    pub last_result: Option<ResultRecord>,

    /// `endpoint.<name>.joined` flag value.
    pub joined: bool,

    /// `endpoint.<name>.ready` flag value.
    pub ready: bool,
}

impl EndpointState {
    /// Record a successful publish.
    pub fn record_publish(&mut self, record: RequestRecord) {
        self.published_hash = Some(record.content_hash());
        self.published = Some(record);
    }

    /// Serialize to CBOR bytes for the blob column.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybridge_core::Capability;

    #[test]
    fn test_bytes_roundtrip() {
        let mut state = EndpointState::default();
        state.record_publish(RequestRecord {
            want_credentials: true,
            capabilities: [Capability::NetworkManagement].into_iter().collect(),
            label: Some("worker-0".into()),
        });
        state.joined = true;

        let recovered = EndpointState::from_bytes(&state.to_bytes()).unwrap();
        assert_eq!(recovered, state);
    }

    #[test]
    fn test_record_publish_caches_hash() {
        let record = RequestRecord::default();
        let mut state = EndpointState::default();
        state.record_publish(record.clone());
        assert_eq!(state.published_hash, Some(record.content_hash()));
    }
}
