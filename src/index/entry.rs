//! Per-artifact closure entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::ArtifactId;

/// Immediate and transitive relations of one artifact.
///
/// `subtree` and `supertree` never contain the artifact itself, even when
/// it lies on a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeEntry {
    /// Immediate incoming neighbors (sources of links into this artifact).
    pub parents: BTreeSet<ArtifactId>,
    /// Immediate outgoing neighbors (targets of links out of this artifact).
    pub children: BTreeSet<ArtifactId>,
    /// All transitive descendants.
    pub subtree: BTreeSet<ArtifactId>,
    /// All transitive ancestors.
    pub supertree: BTreeSet<ArtifactId>,
}

impl SubtreeEntry {
    /// The entry every unknown id resolves to.
    pub const EMPTY: SubtreeEntry = SubtreeEntry {
        parents: BTreeSet::new(),
        children: BTreeSet::new(),
        subtree: BTreeSet::new(),
        supertree: BTreeSet::new(),
    };

    /// Parents and children combined.
    pub fn neighbors(&self) -> BTreeSet<ArtifactId> {
        self.parents.union(&self.children).cloned().collect()
    }

    /// Whether the artifact has no immediate links.
    pub fn is_isolated(&self) -> bool {
        self.parents.is_empty() && self.children.is_empty()
    }
}
