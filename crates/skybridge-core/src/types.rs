//! Strong type definitions for the skybridge protocol.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

/// A unit's slot in the shared relation data: flat string keys mapped to
/// JSON-encoded values.
///
/// This is the databag form both sides read and write. Values are kept as
/// encoded strings so the transport never has to understand their structure.
pub type RelationData = BTreeMap<String, String>;

/// Name of an integration endpoint (one configured relation instance).
///
/// Endpoint names qualify the process-wide flags: an endpoint named
/// `cloud` owns `endpoint.cloud.joined` and `endpoint.cloud.ready`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointName(String);

impl EndpointName {
    /// Create a validated endpoint name.
    ///
    /// Names must be non-empty lowercase alphanumerics and dashes, and may
    /// not start or end with a dash.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !name.starts_with('-')
            && !name.ends_with('-');
        if !valid {
            return Err(CoreError::InvalidEndpointName(name));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointName({})", self.0)
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of one participant unit, in `<application>/<index>` form.
///
/// Multiple units of the same application may participate in a relation at
/// once; each writes only its own slot.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
    /// Create a validated unit id.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        let valid = match id.split_once('/') {
            Some((app, index)) => {
                !app.is_empty()
                    && app
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                    && !index.is_empty()
                    && index.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        };
        if !valid {
            return Err(CoreError::InvalidUnitId(id));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The application portion of the id.
    pub fn application(&self) -> &str {
        self.0.split_once('/').map(|(app, _)| app).unwrap_or(&self.0)
    }

    /// The numeric unit index.
    pub fn index(&self) -> u32 {
        self.0
            .split_once('/')
            .and_then(|(_, idx)| idx.parse().ok())
            .unwrap_or(0)
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the relation a participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationRole {
    /// Requests features and consumes results.
    Requirer,
    /// Provisions features and publishes results.
    Provider,
}

impl RelationRole {
    /// The counterpart role on the other side of the relation.
    pub fn counterpart(&self) -> Self {
        match self {
            RelationRole::Requirer => RelationRole::Provider,
            RelationRole::Provider => RelationRole::Requirer,
        }
    }
}
