//! Trace link types for the trace graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::artifact::ArtifactId;

/// Unique identifier for a trace link.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Create a new TraceId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TraceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TraceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a trace link came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    /// Created by a user.
    #[default]
    Manual,
    /// Suggested by a trace generation model.
    Generated,
}

impl TraceKind {
    /// Parse trace kind from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manual" | "" => Some(Self::Manual),
            "generated" => Some(Self::Generated),
            _ => None,
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// Review state of a trace link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Not reviewed yet.
    #[default]
    Unreviewed,
    /// Accepted by a reviewer.
    Approved,
    /// Rejected by a reviewer.
    Declined,
}

/// Directed trace link `source -> target` between two artifacts.
///
/// Ordered by (source, target, id) so link lists sort canonically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceLink {
    /// Unique link identifier.
    pub id: TraceId,
    /// Source artifact.
    pub source: ArtifactId,
    /// Target artifact.
    pub target: ArtifactId,
    /// Link kind.
    #[serde(default)]
    pub kind: TraceKind,
    /// Review state.
    #[serde(default)]
    pub approval: ApprovalStatus,
}

impl TraceLink {
    /// Create a new manual, unreviewed link.
    pub fn new(
        id: impl Into<TraceId>,
        source: impl Into<ArtifactId>,
        target: impl Into<ArtifactId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: TraceKind::Manual,
            approval: ApprovalStatus::Unreviewed,
        }
    }

    /// Set the link kind.
    pub fn with_kind(mut self, kind: TraceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the approval status.
    pub fn with_approval(mut self, approval: ApprovalStatus) -> Self {
        self.approval = approval;
        self
    }

    /// A link is well formed when both endpoints are named.
    pub fn is_well_formed(&self) -> bool {
        !self.source.is_empty() && !self.target.is_empty()
    }

    /// Whether the link points from an artifact to itself.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Whether both links join the same ordered pair.
    pub fn same_pair(&self, other: &TraceLink) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl PartialOrd for TraceLink {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TraceLink {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.target.cmp(&other.target))
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.approval.cmp(&other.approval))
    }
}
