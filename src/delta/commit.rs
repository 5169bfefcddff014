//! Commits: one user edit in delta shape, and its reversal.
//!
//! A commit carries the values to write, not the values it replaced. Its
//! revert therefore reads the live snapshot for modified entities:
//!
//! - computed **before** the commit is applied, the live values are the
//!   pre-edit values and the revert is an exact inverse
//! - computed **after** other edits landed, the revert restores whatever is
//!   live at that time, which is only an approximation
//!
//! [`GraphState::commit`](crate::state::GraphState::commit) always takes the
//! first path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::engine::ProjectDelta;
use crate::snapshot::ProjectSnapshot;
use crate::types::{Artifact, ArtifactId, TraceId, TraceLink};

/// Added/removed/modified values of one entity type within a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Ord + Serialize, T: Serialize",
    deserialize = "K: Ord + Deserialize<'de>, T: Deserialize<'de>"
))]
pub struct CommitSet<K, T> {
    /// Entities created by the commit.
    pub added: BTreeMap<K, T>,
    /// Entities deleted by the commit.
    pub removed: BTreeMap<K, T>,
    /// New values of entities changed by the commit.
    pub modified: BTreeMap<K, T>,
}

impl<K: Ord, T> Default for CommitSet<K, T> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            modified: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, T: Clone> CommitSet<K, T> {
    /// Whether the set changes nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Reverse of this set against live values.
    ///
    /// `added` and `removed` swap wholesale; `modified` is read from `live`
    /// and skips keys the live store no longer holds.
    fn revert_against(&self, live: &BTreeMap<K, T>) -> Self {
        Self {
            added: self.removed.clone(),
            removed: self.added.clone(),
            modified: self
                .modified
                .keys()
                .filter_map(|k| live.get(k).map(|v| (k.clone(), v.clone())))
                .collect(),
        }
    }
}

/// One user edit over artifacts and trace links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Unique commit id.
    pub id: uuid::Uuid,
    /// When the commit was created.
    pub created_at: DateTime<Utc>,
    /// Artifact changes.
    pub artifacts: CommitSet<ArtifactId, Artifact>,
    /// Trace link changes.
    pub traces: CommitSet<TraceId, TraceLink>,
}

impl Commit {
    /// Create an empty commit.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            created_at: Utc::now(),
            artifacts: CommitSet::default(),
            traces: CommitSet::default(),
        }
    }

    /// Commit that turns the delta's baseline into its current side.
    pub fn from_delta(delta: &ProjectDelta) -> Self {
        let mut commit = Self::new();
        commit.artifacts = CommitSet {
            added: delta.artifacts.added.clone(),
            removed: delta.artifacts.removed.clone(),
            modified: delta
                .artifacts
                .modified
                .iter()
                .map(|(k, m)| (k.clone(), m.current.clone()))
                .collect(),
        };
        commit.traces = CommitSet {
            added: delta.traces.added.clone(),
            removed: delta.traces.removed.clone(),
            modified: delta
                .traces
                .modified
                .iter()
                .map(|(k, m)| (k.clone(), m.current.clone()))
                .collect(),
        };
        commit
    }

    /// Add a new artifact.
    pub fn add_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.added.insert(artifact.id.clone(), artifact);
        self
    }

    /// Delete an artifact.
    pub fn remove_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.removed.insert(artifact.id.clone(), artifact);
        self
    }

    /// Overwrite an artifact.
    pub fn modify_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.modified.insert(artifact.id.clone(), artifact);
        self
    }

    /// Add a new trace link.
    pub fn add_trace(mut self, link: TraceLink) -> Self {
        self.traces.added.insert(link.id.clone(), link);
        self
    }

    /// Delete a trace link.
    pub fn remove_trace(mut self, link: TraceLink) -> Self {
        self.traces.removed.insert(link.id.clone(), link);
        self
    }

    /// Overwrite a trace link.
    pub fn modify_trace(mut self, link: TraceLink) -> Self {
        self.traces.modified.insert(link.id.clone(), link);
        self
    }

    /// Whether the commit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty() && self.traces.is_empty()
    }
}

impl Default for Commit {
    fn default() -> Self {
        Self::new()
    }
}

/// Inverse of `commit`, reading modified values from `live`.
///
/// Exact only when `live` is the state the commit was made against (see the
/// module docs).
pub fn get_revert(commit: &Commit, live: &ProjectSnapshot) -> Commit {
    Commit {
        id: uuid::Uuid::new_v4(),
        created_at: Utc::now(),
        artifacts: commit.artifacts.revert_against(&live.artifacts),
        traces: commit.traces.revert_against(&live.traces),
    }
}
