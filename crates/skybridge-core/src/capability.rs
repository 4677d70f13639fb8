//! The capability vocabulary.
//!
//! Capabilities are the named permission grants a requiring unit may ask
//! for. The vocabulary is closed and known to both sides of the relation;
//! a name outside it is a configuration error, never a silent no-op.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A named permission grant from the fixed, shared vocabulary.
///
/// Grants are applied at the application level by the provider: what is
/// granted is the union of capabilities ever requested by any unit of the
/// application. See the provider aggregation contract in `skybridge-testkit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Manage networks, subnets, and ports.
    NetworkManagement,
    /// Manage security groups and rules.
    SecurityManagement,
    /// Create and attach block storage volumes.
    BlockStorageManagement,
    /// Read access to object storage.
    ObjectStorageAccess,
    /// Create and delete object storage containers.
    ObjectStorageManagement,
    /// Manage DNS zones and records.
    DnsManagement,
    /// Introspect instance metadata for this unit's own instance.
    InstanceInspection,
}

impl Capability {
    /// Every capability in the vocabulary.
    pub const ALL: [Capability; 7] = [
        Capability::NetworkManagement,
        Capability::SecurityManagement,
        Capability::BlockStorageManagement,
        Capability::ObjectStorageAccess,
        Capability::ObjectStorageManagement,
        Capability::DnsManagement,
        Capability::InstanceInspection,
    ];

    /// The name used on the wire and in host configuration.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Capability::NetworkManagement => "network-management",
            Capability::SecurityManagement => "security-management",
            Capability::BlockStorageManagement => "block-storage-management",
            Capability::ObjectStorageAccess => "object-storage-access",
            Capability::ObjectStorageManagement => "object-storage-management",
            Capability::DnsManagement => "dns-management",
            Capability::InstanceInspection => "instance-inspection",
        }
    }

    /// Parse a set of capability names.
    ///
    /// Fails on the first unknown name; no partial set is returned.
    pub fn parse_set<'a, I>(names: I) -> Result<BTreeSet<Capability>, CoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().map(str::parse).collect()
    }
}

impl FromStr for Capability {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .find(|c| c.wire_name() == s)
            .copied()
            .ok_or_else(|| CoreError::UnknownCapability(s.to_string()))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}
