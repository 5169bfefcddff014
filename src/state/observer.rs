//! Change notification for views layered over [`GraphState`](super::GraphState).
//!
//! Observers replace a global reactive store: the state object pushes a
//! [`GraphEvent`] after every mutation and subscribers decide what to redraw.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::snapshot::VersionId;
use crate::types::{ArtifactId, TraceId};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Something that changed in the graph state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A version load replaced the whole state.
    Rebuilt {
        /// Loaded version.
        version: VersionId,
        /// Generation that won.
        generation: u64,
    },
    /// A rebuild finished after a newer one was requested.
    RebuildDiscarded {
        /// Generation of the stale result.
        generation: u64,
        /// Latest generation issued.
        latest: u64,
    },
    /// A trace link was added.
    TraceAdded {
        /// Link id.
        trace: TraceId,
    },
    /// A trace link was removed.
    TraceRemoved {
        /// Link id.
        trace: TraceId,
    },
    /// A subtree was collapsed.
    SubtreeHidden {
        /// Collapsed root.
        root: ArtifactId,
    },
    /// A subtree was expanded.
    SubtreeShown {
        /// Expanded root.
        root: ArtifactId,
    },
    /// All collapses were cleared.
    VisibilityReset,
    /// A delta against a baseline was computed.
    DeltaComputed {
        /// Number of changed entities.
        changes: usize,
    },
    /// The delta overlay was cleared.
    DeltaCleared,
    /// A commit was applied.
    Committed {
        /// Commit id.
        commit: uuid::Uuid,
    },
    /// The last commit was undone.
    Undone {
        /// Commit id.
        commit: uuid::Uuid,
    },
    /// An undone commit was applied again.
    Redone {
        /// Commit id.
        commit: uuid::Uuid,
    },
}

/// Receives graph events.
///
/// Called synchronously on the mutating thread, after the state is
/// consistent. Implementations should be cheap.
pub trait GraphObserver: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &GraphEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl GraphObserver for NoOpObserver {
    fn on_event(&self, _event: &GraphEvent) {
        // No-op
    }
}

/// Observer that keeps every event, for testing.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<GraphEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events.
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl GraphObserver for RecordingObserver {
    fn on_event(&self, event: &GraphEvent) {
        self.events.lock().push(event.clone());
    }
}

impl<T: GraphObserver + ?Sized> GraphObserver for std::sync::Arc<T> {
    fn on_event(&self, event: &GraphEvent) {
        (**self).on_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&GraphEvent::VisibilityReset);
        observer.on_event(&GraphEvent::DeltaCleared);

        assert_eq!(
            observer.take(),
            vec![GraphEvent::VisibilityReset, GraphEvent::DeltaCleared]
        );
        assert!(observer.is_empty());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(GraphEvent::DeltaComputed { changes: 3 }).unwrap();
        assert_eq!(json["event"], "delta_computed");
        assert_eq!(json["changes"], 3);
    }
}
