//! Relation lifecycle events.
//!
//! The host process is woken synchronously on each of these; the event names
//! the occasion, never the data. Handlers recompute from a fresh snapshot.

use serde::{Deserialize, Serialize};

/// A discrete wake-up delivered by the relation transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationEvent {
    /// At least one counterpart unit has connected.
    Joined,

    /// Some participant's slot data changed.
    Changed,

    /// The relation is fully broken; no counterpart units remain.
    Broken,
}

impl RelationEvent {
    /// Whether counterpart data may still be present after this event.
    pub fn counterpart_reachable(&self) -> bool {
        !matches!(self, RelationEvent::Broken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_broken_loses_the_counterpart() {
        assert!(RelationEvent::Joined.counterpart_reachable());
        assert!(RelationEvent::Changed.counterpart_reachable());
        assert!(!RelationEvent::Broken.counterpart_reachable());
    }
}
