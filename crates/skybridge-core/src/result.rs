//! The result record: the provider's per-unit answer.
//!
//! The requirer never writes these fields; it only reads them out of the
//! provider's slot and decides readiness from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::hash::ContentHash;
use crate::types::RelationData;

/// Relation field keys written by the provider.
pub mod fields {
    pub const CREDENTIALS: &str = "credentials";
    pub const IDENTIFIERS: &str = "identifiers";
    pub const COMPLETED: &str = "completed";
    pub const ERROR: &str = "error";
}

/// What the provider has published for one requesting unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Issued credentials, opaque to this side. Present once provisioned,
    /// and only when credentials were requested.
    pub credentials: Option<serde_json::Value>,

    /// Derived identifiers (security group ids, service account names, ...).
    pub identifiers: BTreeMap<String, String>,

    /// Completion marker: the content hash of the request record this
    /// result fulfills. Absent while provisioning is still in flight.
    pub completed: Option<ContentHash>,

    /// Error marker set by the provider when provisioning failed.
    pub error: Option<String>,
}

impl ResultRecord {
    /// Whether this result fulfills a request with the given hash.
    ///
    /// A result only satisfies the request it was provisioned for: the
    /// completion marker must match the current request's content hash, the
    /// provider must not have flagged an error, and credentials must be
    /// present if they were asked for.
    pub fn satisfies(&self, request_hash: &ContentHash, want_credentials: bool) -> bool {
        self.error.is_none()
            && self.completed.as_ref() == Some(request_hash)
            && (!want_credentials || self.credentials.is_some())
    }

    /// Serialize into relation fields (JSON-encoded values).
    pub fn to_fields(&self) -> RelationData {
        let mut data = RelationData::new();
        if let Some(ref creds) = self.credentials {
            data.insert(
                fields::CREDENTIALS.to_string(),
                serde_json::to_string(creds).expect("credentials serialize"),
            );
        }
        if !self.identifiers.is_empty() {
            data.insert(
                fields::IDENTIFIERS.to_string(),
                serde_json::to_string(&self.identifiers).expect("identifiers serialize"),
            );
        }
        if let Some(ref completed) = self.completed {
            data.insert(fields::COMPLETED.to_string(), completed.to_hex());
        }
        if let Some(ref error) = self.error {
            data.insert(
                fields::ERROR.to_string(),
                serde_json::to_string(error).expect("error serializes"),
            );
        }
        data
    }

    /// Parse a result back out of relation fields.
    ///
    /// Returns `Ok(None)` when no result fields are present.
    pub fn from_fields(data: &RelationData) -> Result<Option<Self>, CoreError> {
        let has_any = [
            fields::CREDENTIALS,
            fields::IDENTIFIERS,
            fields::COMPLETED,
            fields::ERROR,
        ]
        .iter()
        .any(|k| data.contains_key(*k));
        if !has_any {
            return Ok(None);
        }

        let credentials = match data.get(fields::CREDENTIALS) {
            Some(raw) => {
                Some(serde_json::from_str(raw).map_err(|e| CoreError::MalformedField {
                    key: fields::CREDENTIALS.to_string(),
                    reason: e.to_string(),
                })?)
            }
            None => None,
        };

        let identifiers = match data.get(fields::IDENTIFIERS) {
            Some(raw) => serde_json::from_str(raw).map_err(|e| CoreError::MalformedField {
                key: fields::IDENTIFIERS.to_string(),
                reason: e.to_string(),
            })?,
            None => BTreeMap::new(),
        };

        let completed = match data.get(fields::COMPLETED) {
            Some(raw) => {
                Some(
                    ContentHash::from_hex(raw).map_err(|e| CoreError::MalformedField {
                        key: fields::COMPLETED.to_string(),
                        reason: e.to_string(),
                    })?,
                )
            }
            None => None,
        };

        let error = match data.get(fields::ERROR) {
            Some(raw) => {
                Some(serde_json::from_str(raw).map_err(|e| CoreError::MalformedField {
                    key: fields::ERROR.to_string(),
                    reason: e.to_string(),
                })?)
            }
            None => None,
        };

        Ok(Some(Self {
            credentials,
            identifiers,
            completed,
            error,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fulfilled(hash: ContentHash) -> ResultRecord {
        ResultRecord {
            credentials: Some(json!({"auth-url": "https://cloud.local:5000/v3"})),
            identifiers: BTreeMap::from([("security-group".to_string(), "sg-01".to_string())]),
            completed: Some(hash),
            error: None,
        }
    }

    #[test]
    fn test_fields_roundtrip() {
        let record = fulfilled(ContentHash::from_bytes([7; 32]));
        let parsed = ResultRecord::from_fields(&record.to_fields()).unwrap().unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_empty_slot_is_none() {
        assert!(ResultRecord::from_fields(&RelationData::new()).unwrap().is_none());
    }

    #[test]
    fn test_satisfies_requires_matching_hash() {
        let hash = ContentHash::from_bytes([7; 32]);
        let other = ContentHash::from_bytes([8; 32]);
        let record = fulfilled(hash);
        assert!(record.satisfies(&hash, true));
        assert!(!record.satisfies(&other, true));
    }

    #[test]
    fn test_satisfies_rejects_error_marker() {
        let hash = ContentHash::from_bytes([7; 32]);
        let mut record = fulfilled(hash);
        record.error = Some("quota exceeded".to_string());
        assert!(!record.satisfies(&hash, true));
    }

    #[test]
    fn test_satisfies_requires_credentials_when_requested() {
        let hash = ContentHash::from_bytes([7; 32]);
        let mut record = fulfilled(hash);
        record.credentials = None;
        assert!(!record.satisfies(&hash, true));
        assert!(record.satisfies(&hash, false));
    }

    #[test]
    fn test_malformed_completed_marker_rejected() {
        let mut data = fulfilled(ContentHash::ZERO).to_fields();
        data.insert(fields::COMPLETED.to_string(), "not-hex".to_string());
        let err = ResultRecord::from_fields(&data).unwrap_err();
        assert!(matches!(err, CoreError::MalformedField { .. }));
    }
}
