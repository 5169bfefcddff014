//! Project version sources.
//!
//! Loading a version is the only asynchronous step. The fetched snapshot is
//! turned into a [`PreparedRebuild`] that the caller hands back to
//! [`GraphState::apply_rebuild`](crate::state::GraphState::apply_rebuild).

pub mod memory;

use async_trait::async_trait;
use tracing::info;

use crate::snapshot::{ProjectSnapshot, VersionId};
use crate::state::{PreparedRebuild, RebuildTicket};

/// Backend that serves project versions.
///
/// Implementations must return artifacts and traces keyed by id; ordering is
/// provided by the snapshot maps.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Error type for source operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch one version.
    async fn load_version(&self, version: &VersionId) -> Result<ProjectSnapshot, Self::Error>;
}

/// Fetch `version` from `source` and prepare the rebuild for `ticket`.
///
/// The state is not touched here, so a newer ticket may be issued while this
/// is pending; the older result is then discarded on apply.
pub async fn load_version<S: ProjectSource + ?Sized>(
    source: &S,
    ticket: RebuildTicket,
    version: &VersionId,
) -> Result<PreparedRebuild, S::Error> {
    let snapshot = source.load_version(version).await?;
    info!(
        version = %version,
        generation = ticket.generation(),
        artifacts = snapshot.num_artifacts(),
        traces = snapshot.num_traces(),
        "loaded project version"
    );
    Ok(ticket.prepare(snapshot))
}

pub use memory::{InMemoryProjectSource, SourceError};
