//! Project snapshots: one version's artifacts and traces keyed by id.
//!
//! A snapshot is the unit the delta engine compares and the unit a version
//! load replaces. Its fingerprint lets audit records name the exact graph
//! state a delta was computed against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use crate::delta::Commit;
use crate::types::{Artifact, ArtifactId, TraceId, TraceLink};
use crate::TRACE_KERNEL_SCHEMA_VERSION;

/// Identifier of a stored project version.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Create a new VersionId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Artifacts and trace links of one project version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Version this snapshot was loaded from.
    pub version: VersionId,
    /// Artifacts by id.
    pub artifacts: BTreeMap<ArtifactId, Artifact>,
    /// Trace links by id.
    pub traces: BTreeMap<TraceId, TraceLink>,
}

impl ProjectSnapshot {
    /// Create an empty snapshot for a version.
    pub fn new(version: impl Into<VersionId>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Build a snapshot from collections. Later entries win on duplicate ids.
    pub fn from_parts(
        version: impl Into<VersionId>,
        artifacts: impl IntoIterator<Item = Artifact>,
        traces: impl IntoIterator<Item = TraceLink>,
    ) -> Self {
        Self {
            version: version.into(),
            artifacts: artifacts.into_iter().map(|a| (a.id.clone(), a)).collect(),
            traces: traces.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Insert or replace an artifact.
    pub fn upsert_artifact(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact.id.clone(), artifact);
    }

    /// Insert or replace a trace link.
    pub fn upsert_trace(&mut self, link: TraceLink) {
        self.traces.insert(link.id.clone(), link);
    }

    /// Number of artifacts.
    pub fn num_artifacts(&self) -> usize {
        self.artifacts.len()
    }

    /// Number of trace links.
    pub fn num_traces(&self) -> usize {
        self.traces.len()
    }

    /// Apply a commit: removals first, then additions and modifications.
    pub fn apply_commit(&mut self, commit: &Commit) {
        for id in commit.artifacts.removed.keys() {
            self.artifacts.remove(id);
        }
        for id in commit.traces.removed.keys() {
            self.traces.remove(id);
        }
        for artifact in commit
            .artifacts
            .added
            .values()
            .chain(commit.artifacts.modified.values())
        {
            self.upsert_artifact(artifact.clone());
        }
        for link in commit.traces.added.values().chain(commit.traces.modified.values()) {
            self.upsert_trace(link.clone());
        }
    }

    /// Deterministic fingerprint of the snapshot contents.
    ///
    /// Independent of the version label, so two versions with identical
    /// contents share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let input = FingerprintInput {
            schema_version: TRACE_KERNEL_SCHEMA_VERSION,
            artifacts: &self.artifacts,
            traces: &self.traces,
        };
        canonical_hash_hex(&input)
    }
}

/// Internal struct for computing the fingerprint hash.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    schema_version: &'a str,
    artifacts: &'a BTreeMap<ArtifactId, Artifact>,
    traces: &'a BTreeMap<TraceId, TraceLink>,
}
