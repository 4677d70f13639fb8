//! The request record: what a unit asks the provider for.
//!
//! Each unit publishes exactly one record into its own relation slot. A new
//! publish overwrites the previous record wholesale; aggregation across
//! units is the provider's job, never the requirer's.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::canonical::canonical_request_bytes;
use crate::capability::Capability;
use crate::error::CoreError;
use crate::hash::ContentHash;
use crate::types::RelationData;

/// Relation field keys written by the requirer.
pub mod fields {
    pub const REQUESTED_CREDENTIALS: &str = "requested-credentials";
    pub const REQUESTED_CAPABILITIES: &str = "requested-capabilities";
    pub const INSTANCE_LABEL: &str = "instance-label";
}

/// The full set of features a unit has requested.
///
/// This is the unit of publication: serialized into the unit's relation slot
/// and hashed for idempotence and completion matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Whether the unit needs issued credentials.
    pub want_credentials: bool,

    /// Requested permission grants. Unioned across units by the provider.
    pub capabilities: BTreeSet<Capability>,

    /// Instance label, strictly per-unit; never aggregated.
    pub label: Option<String>,
}

impl RequestRecord {
    /// Whether nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        !self.want_credentials && self.capabilities.is_empty() && self.label.is_none()
    }

    /// The content hash of this record's canonical encoding.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::hash(&canonical_request_bytes(self))
    }

    /// Serialize into relation fields (JSON-encoded values).
    pub fn to_fields(&self) -> RelationData {
        let mut data = RelationData::new();
        data.insert(
            fields::REQUESTED_CREDENTIALS.to_string(),
            self.want_credentials.to_string(),
        );
        let names: Vec<&str> = self.capabilities.iter().map(|c| c.wire_name()).collect();
        data.insert(
            fields::REQUESTED_CAPABILITIES.to_string(),
            serde_json::to_string(&names).expect("capability list serializes"),
        );
        if let Some(ref label) = self.label {
            data.insert(
                fields::INSTANCE_LABEL.to_string(),
                serde_json::to_string(label).expect("label serializes"),
            );
        }
        data
    }

    /// Parse a record back out of relation fields.
    ///
    /// Returns `Ok(None)` when no request fields are present (an empty or
    /// not-yet-written slot). A present-but-malformed field is an error, as
    /// is any capability name outside the vocabulary.
    pub fn from_fields(data: &RelationData) -> Result<Option<Self>, CoreError> {
        let has_any = [
            fields::REQUESTED_CREDENTIALS,
            fields::REQUESTED_CAPABILITIES,
            fields::INSTANCE_LABEL,
        ]
        .iter()
        .any(|k| data.contains_key(*k));
        if !has_any {
            return Ok(None);
        }

        let want_credentials = match data.get(fields::REQUESTED_CREDENTIALS) {
            Some(raw) => raw.parse::<bool>().map_err(|_| CoreError::MalformedField {
                key: fields::REQUESTED_CREDENTIALS.to_string(),
                reason: format!("expected bool, got {raw:?}"),
            })?,
            None => false,
        };

        let capabilities = match data.get(fields::REQUESTED_CAPABILITIES) {
            Some(raw) => {
                let names: Vec<String> =
                    serde_json::from_str(raw).map_err(|e| CoreError::MalformedField {
                        key: fields::REQUESTED_CAPABILITIES.to_string(),
                        reason: e.to_string(),
                    })?;
                Capability::parse_set(names.iter().map(String::as_str))?
            }
            None => BTreeSet::new(),
        };

        let label = match data.get(fields::INSTANCE_LABEL) {
            Some(raw) => {
                Some(serde_json::from_str(raw).map_err(|e| CoreError::MalformedField {
                    key: fields::INSTANCE_LABEL.to_string(),
                    reason: e.to_string(),
                })?)
            }
            None => None,
        };

        Ok(Some(Self {
            want_credentials,
            capabilities,
            label,
        }))
    }
}

/// A partial request, merged into the pending [`RequestRecord`].
///
/// Fields left as `None` keep whatever an earlier call in the same process
/// invocation set; present fields overwrite. Capability sets overwrite as a
/// whole, matching the last-write-wins slot semantics.
#[derive(Debug, Clone, Default)]
pub struct FeatureRequest {
    pub want_credentials: Option<bool>,
    pub capabilities: Option<BTreeSet<Capability>>,
    pub label: Option<String>,
}

impl FeatureRequest {
    /// An empty request that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for (or drop the ask for) issued credentials.
    pub fn credentials(mut self, want: bool) -> Self {
        self.want_credentials = Some(want);
        self
    }

    /// Replace the requested capability set.
    pub fn capabilities<I>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = Capability>,
    {
        self.capabilities = Some(caps.into_iter().collect());
        self
    }

    /// Set the instance label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Merge into a record, overwriting the fields present here.
    pub fn apply_to(&self, record: &mut RequestRecord) {
        if let Some(want) = self.want_credentials {
            record.want_credentials = want;
        }
        if let Some(ref caps) = self.capabilities {
            record.capabilities = caps.clone();
        }
        if let Some(ref label) = self.label {
            record.label = Some(label.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RequestRecord {
        RequestRecord {
            want_credentials: true,
            capabilities: [Capability::NetworkManagement, Capability::DnsManagement]
                .into_iter()
                .collect(),
            label: Some("worker-0".to_string()),
        }
    }

    #[test]
    fn test_fields_roundtrip() {
        let record = sample_record();
        let parsed = RequestRecord::from_fields(&record.to_fields()).unwrap().unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_empty_slot_is_none() {
        let data = RelationData::new();
        assert!(RequestRecord::from_fields(&data).unwrap().is_none());
    }

    #[test]
    fn test_unknown_capability_on_wire_rejected() {
        let mut data = sample_record().to_fields();
        data.insert(
            fields::REQUESTED_CAPABILITIES.to_string(),
            "[\"quantum-teleport\"]".to_string(),
        );
        let err = RequestRecord::from_fields(&data).unwrap_err();
        assert!(matches!(err, CoreError::UnknownCapability(_)));
    }

    #[test]
    fn test_malformed_bool_rejected() {
        let mut data = sample_record().to_fields();
        data.insert(fields::REQUESTED_CREDENTIALS.to_string(), "yes".to_string());
        let err = RequestRecord::from_fields(&data).unwrap_err();
        assert!(matches!(err, CoreError::MalformedField { .. }));
    }

    #[test]
    fn test_feature_request_overwrites_only_present_fields() {
        let mut record = sample_record();
        FeatureRequest::new()
            .capabilities([Capability::ObjectStorageAccess])
            .apply_to(&mut record);

        assert!(record.want_credentials); // untouched
        assert_eq!(record.label.as_deref(), Some("worker-0")); // untouched
        assert_eq!(
            record.capabilities,
            [Capability::ObjectStorageAccess].into_iter().collect()
        );
    }

    #[test]
    fn test_hash_changes_with_content() {
        let base = sample_record();
        let mut widened = base.clone();
        widened.capabilities.insert(Capability::BlockStorageManagement);
        assert_ne!(base.content_hash(), widened.content_hash());
    }

    #[test]
    fn test_hash_stable_for_equal_content() {
        assert_eq!(sample_record().content_hash(), sample_record().content_hash());
    }
}
