//! Phantom links: synthesized edges that keep a collapsed subtree connected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::{ArtifactId, TraceId};

/// Which way a hidden link crossed the collapse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhantomDirection {
    /// An outside artifact pointed into the hidden subtree: `external -> root`.
    Incoming,
    /// The hidden subtree pointed out: `root -> external`.
    ///
    /// Subtree collapse never produces this: a subtree is closed under
    /// outgoing links.
    Outgoing,
}

impl fmt::Display for PhantomDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "in"),
            Self::Outgoing => write!(f, "out"),
        }
    }
}

/// Dedup key of a phantom link.
///
/// Several hidden links crossing the same boundary between the same two
/// logical endpoints collapse into one phantom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhantomKey {
    /// Collapsed root the phantom belongs to.
    pub root_id: ArtifactId,
    /// Visible endpoint outside the collapsed subtree.
    pub external_id: ArtifactId,
    /// Original direction.
    pub direction: PhantomDirection,
}

impl fmt::Display for PhantomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phantom:{}:{}:{}", self.root_id, self.external_id, self.direction)
    }
}

/// A synthesized edge standing in for hidden boundary-crossing links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhantomLink {
    /// Stable composite key.
    pub key: PhantomKey,
    /// Rendered source.
    pub source: ArtifactId,
    /// Rendered target.
    pub target: ArtifactId,
    /// Real links this phantom stands for.
    pub trace_ids: BTreeSet<TraceId>,
}

impl PhantomLink {
    /// Create a phantom for one boundary crossing, oriented by `direction`.
    pub fn new(root_id: ArtifactId, external_id: ArtifactId, direction: PhantomDirection) -> Self {
        let (source, target) = match direction {
            PhantomDirection::Incoming => (external_id.clone(), root_id.clone()),
            PhantomDirection::Outgoing => (root_id.clone(), external_id.clone()),
        };
        Self {
            key: PhantomKey {
                root_id,
                external_id,
                direction,
            },
            source,
            target,
            trace_ids: BTreeSet::new(),
        }
    }

    /// Root this phantom was created for.
    pub fn root_id(&self) -> &ArtifactId {
        &self.key.root_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_follows_direction() {
        let incoming = PhantomLink::new("A".into(), "D".into(), PhantomDirection::Incoming);
        assert_eq!(incoming.source, ArtifactId::from("D"));
        assert_eq!(incoming.target, ArtifactId::from("A"));

        let outgoing = PhantomLink::new("A".into(), "D".into(), PhantomDirection::Outgoing);
        assert_eq!(outgoing.source, ArtifactId::from("A"));
        assert_eq!(outgoing.target, ArtifactId::from("D"));
    }

    #[test]
    fn test_key_is_stable() {
        let link = PhantomLink::new("A".into(), "D".into(), PhantomDirection::Incoming);
        assert_eq!(link.key.to_string(), "phantom:A:D:in");
    }
}
