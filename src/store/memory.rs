//! In-memory project source for testing and embedding.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::ProjectSource;
use crate::snapshot::{ProjectSnapshot, VersionId};

/// Error type for the in-memory source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// No snapshot stored under this version.
    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),
}

/// Project versions held in memory.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectSource {
    versions: BTreeMap<VersionId, ProjectSnapshot>,
}

impl InMemoryProjectSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot under its own version id, replacing any previous one.
    pub fn insert(&mut self, snapshot: ProjectSnapshot) {
        self.versions.insert(snapshot.version.clone(), snapshot);
    }

    /// Stored version ids in order.
    pub fn versions(&self) -> impl Iterator<Item = &VersionId> {
        self.versions.keys()
    }

    /// Number of stored versions.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[async_trait]
impl ProjectSource for InMemoryProjectSource {
    type Error = SourceError;

    async fn load_version(&self, version: &VersionId) -> Result<ProjectSnapshot, Self::Error> {
        self.versions
            .get(version)
            .cloned()
            .ok_or_else(|| SourceError::VersionNotFound(version.clone()))
    }
}
