//! # trace-graph-kernel
//!
//! Graph core of a requirements-traceability tool.
//!
//! Artifacts (requirements, hazards, tests, ...) are linked by directed trace
//! links. The kernel answers three questions about that graph:
//!
//! > Which artifacts lie upstream and downstream of this one?
//! > What stays visible when a subtree is collapsed?
//! > What changed between two versions, and how is an edit undone?
//!
//! ## Architecture
//!
//! ```text
//! ProjectSource ─► ProjectSnapshot ─► SubtreeIndex ─► VisibilityController ─► VisibleGraph
//!                        │
//!                        └─► DeltaEngine (ProjectDelta, Commit, get_revert)
//!
//! GraphState owns all of the above and notifies GraphObservers.
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Every set and map is ordered by id, so iteration and serialization are
//!   stable across runs
//! - Closures terminate on cyclic graphs; an artifact never belongs to its
//!   own subtree or supertree
//! - Delta change indices follow modified, then added, then removed, each in
//!   ascending id order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod config;
pub mod delta;
pub mod index;
pub mod logging;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
pub mod visibility;

// Re-exports
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use config::{ConfigError, KernelConfig, LogConfig, LogFormat, DEFAULT_HISTORY_LIMIT};
pub use delta::{
    compute_delta, compute_delta_with, get_revert, ChangeCounter, ChangeKind, Commit,
    CommitHistory, CommitSet, DeltaSet, HistoryEntry, Modification, ProjectDelta,
};
pub use index::{Relationship, SubtreeEntry, SubtreeIndex};
pub use logging::{init_tracing, LoggingError};
pub use snapshot::{ProjectSnapshot, VersionId};
pub use state::{
    GraphEvent, GraphObserver, GraphState, NoOpObserver, PreparedRebuild, RebuildOutcome,
    RebuildTicket, RecordingObserver, SubscriptionId,
};
pub use store::{load_version, InMemoryProjectSource, ProjectSource, SourceError};
pub use types::{ApprovalStatus, Artifact, ArtifactId, TraceId, TraceKind, TraceLink};
pub use visibility::{
    PhantomDirection, PhantomKey, PhantomLink, VisibilityController, VisibleEdge,
    VisibleEdgeKind, VisibleGraph,
};

/// Schema version for all serialized kernel types.
/// Increment on breaking changes to any schema type.
pub const TRACE_KERNEL_SCHEMA_VERSION: &str = "1.0.0";
