//! Explicit graph state for one loaded project version.
//!
//! [`GraphState`] owns the snapshot, its subtree index, the visibility
//! controller, the current delta overlay and the undo history. Views
//! subscribe with a [`GraphObserver`] instead of reading a global store.
//!
//! ## Version loads
//!
//! ```text
//! begin_rebuild ─► RebuildTicket ─ (await source) ─► prepare ─► PreparedRebuild
//!                                                                    │
//!                         apply_rebuild: generation == latest? ◄─────┘
//!                              yes → Applied      no → Discarded
//! ```
//!
//! A ticket carries the generation it was issued for. Only the newest issued
//! generation may replace the state, so a slow load that finishes after a
//! newer one was requested is thrown away.

pub mod observer;

pub use observer::{GraphEvent, GraphObserver, NoOpObserver, RecordingObserver, SubscriptionId};

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::KernelConfig;
use crate::delta::{get_revert, Commit, CommitHistory, ProjectDelta};
use crate::index::SubtreeIndex;
use crate::snapshot::{ProjectSnapshot, VersionId};
use crate::types::{ArtifactId, TraceId, TraceLink};
use crate::visibility::{VisibilityController, VisibleGraph};

/// Permission to rebuild the state for one generation.
#[derive(Debug)]
#[must_use = "a ticket does nothing until prepared and applied"]
pub struct RebuildTicket {
    generation: u64,
}

impl RebuildTicket {
    /// Generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build the index for `snapshot`. Pure; may run on any task.
    pub fn prepare(self, snapshot: ProjectSnapshot) -> PreparedRebuild {
        let index = SubtreeIndex::from_snapshot(&snapshot);
        PreparedRebuild {
            generation: self.generation,
            snapshot,
            index,
        }
    }
}

/// A loaded snapshot and its index, waiting to be applied.
#[derive(Debug)]
pub struct PreparedRebuild {
    generation: u64,
    snapshot: ProjectSnapshot,
    index: SubtreeIndex,
}

impl PreparedRebuild {
    /// Generation this rebuild belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Snapshot that would be installed.
    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }
}

/// Result of [`GraphState::apply_rebuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The rebuild replaced the state.
    Applied {
        /// Generation installed.
        generation: u64,
    },
    /// A newer rebuild was requested; this one was dropped.
    Discarded {
        /// Generation of the stale rebuild.
        generation: u64,
        /// Newest generation issued.
        latest: u64,
    },
}

impl RebuildOutcome {
    /// Whether the rebuild was installed.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// All mutable graph state for one loaded project version.
pub struct GraphState {
    config: KernelConfig,
    snapshot: ProjectSnapshot,
    index: SubtreeIndex,
    visibility: VisibilityController,
    delta: Option<ProjectDelta>,
    history: CommitHistory,
    observers: Vec<(SubscriptionId, Box<dyn GraphObserver>)>,
    next_subscription: u64,
    issued_generation: u64,
    applied_generation: u64,
}

impl std::fmt::Debug for GraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphState")
            .field("version", &self.snapshot.version)
            .field("artifacts", &self.snapshot.num_artifacts())
            .field("traces", &self.snapshot.num_traces())
            .field("collapsed", &self.visibility.collapsed_roots().len())
            .field("has_delta", &self.delta.is_some())
            .field("undo_depth", &self.history.len())
            .field("observers", &self.observers.len())
            .field("generation", &self.applied_generation)
            .finish()
    }
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphState {
    /// Create an empty state with default configuration.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Create an empty state.
    pub fn with_config(config: KernelConfig) -> Self {
        let history = CommitHistory::new(config.history_limit);
        Self {
            config,
            snapshot: ProjectSnapshot::default(),
            index: SubtreeIndex::new(),
            visibility: VisibilityController::new(),
            delta: None,
            history,
            observers: Vec::new(),
            next_subscription: 0,
            issued_generation: 0,
            applied_generation: 0,
        }
    }

    /// Create a state with `snapshot` already loaded.
    pub fn from_snapshot(snapshot: ProjectSnapshot, config: KernelConfig) -> Self {
        let mut state = Self::with_config(config);
        let ticket = state.begin_rebuild();
        state.apply_rebuild(ticket.prepare(snapshot));
        state
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Version loads
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a rebuild. Any ticket issued earlier becomes stale.
    pub fn begin_rebuild(&mut self) -> RebuildTicket {
        self.issued_generation += 1;
        debug!(generation = self.issued_generation, "issued rebuild ticket");
        RebuildTicket {
            generation: self.issued_generation,
        }
    }

    /// Install a prepared rebuild if it is still the newest one.
    ///
    /// On success the snapshot and index are replaced and the collapses,
    /// delta overlay and history of the previous version are dropped.
    pub fn apply_rebuild(&mut self, prepared: PreparedRebuild) -> RebuildOutcome {
        if prepared.generation != self.issued_generation {
            warn!(
                generation = prepared.generation,
                latest = self.issued_generation,
                version = %prepared.snapshot.version,
                "discarding stale rebuild"
            );
            self.emit(GraphEvent::RebuildDiscarded {
                generation: prepared.generation,
                latest: self.issued_generation,
            });
            return RebuildOutcome::Discarded {
                generation: prepared.generation,
                latest: self.issued_generation,
            };
        }

        let PreparedRebuild {
            generation,
            snapshot,
            index,
        } = prepared;

        self.snapshot = snapshot;
        self.index = index;
        self.visibility.reset_hidden_nodes();
        self.delta = None;
        self.history.clear();
        self.applied_generation = generation;

        info!(
            generation,
            version = %self.snapshot.version,
            artifacts = self.snapshot.num_artifacts(),
            traces = self.snapshot.num_traces(),
            "rebuilt graph state"
        );
        self.emit(GraphEvent::Rebuilt {
            version: self.snapshot.version.clone(),
            generation,
        });
        RebuildOutcome::Applied { generation }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Trace edits
    // ─────────────────────────────────────────────────────────────────────────

    /// Add or replace a trace link. Not recorded in the undo history; use
    /// [`Self::commit`] for undoable edits.
    pub fn add_trace(&mut self, link: TraceLink) {
        self.index.add_trace(&link);
        let id = link.id.clone();
        self.snapshot.upsert_trace(link);
        self.visibility.refresh(&self.index);
        self.emit(GraphEvent::TraceAdded { trace: id });
    }

    /// Remove a trace link by id. Returns whether it existed.
    pub fn remove_trace(&mut self, id: &TraceId) -> bool {
        let in_snapshot = self.snapshot.traces.remove(id).is_some();
        let in_index = self.index.remove_trace_by_id(id);
        if !(in_snapshot || in_index) {
            return false;
        }
        self.visibility.refresh(&self.index);
        self.emit(GraphEvent::TraceRemoved { trace: id.clone() });
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Visibility
    // ─────────────────────────────────────────────────────────────────────────

    /// Collapse the subtree under `root`.
    pub fn hide_subtree(&mut self, root: &ArtifactId) -> bool {
        let changed = self.visibility.hide_subtree(&self.index, root);
        if changed {
            self.emit(GraphEvent::SubtreeHidden { root: root.clone() });
        }
        changed
    }

    /// Expand the subtree under `root`.
    pub fn show_subtree(&mut self, root: &ArtifactId) -> bool {
        let changed = self.visibility.show_subtree(&self.index, root);
        if changed {
            self.emit(GraphEvent::SubtreeShown { root: root.clone() });
        }
        changed
    }

    /// Collapse or expand `root`.
    pub fn toggle_subtree(&mut self, root: &ArtifactId) -> bool {
        if self.visibility.is_collapsed(root) {
            self.show_subtree(root)
        } else {
            self.hide_subtree(root)
        }
    }

    /// Expand everything.
    pub fn reset_hidden_nodes(&mut self) {
        self.visibility.reset_hidden_nodes();
        self.emit(GraphEvent::VisibilityReset);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delta and history
    // ─────────────────────────────────────────────────────────────────────────

    /// Compare the loaded snapshot against `baseline` and keep the result as
    /// the delta overlay.
    pub fn compare_with(&mut self, baseline: &ProjectSnapshot) -> &ProjectDelta {
        let delta = ProjectDelta::compute(baseline, &self.snapshot);
        self.emit(GraphEvent::DeltaComputed {
            changes: delta.change_count(),
        });
        self.delta.insert(delta)
    }

    /// Drop the delta overlay.
    pub fn clear_delta(&mut self) {
        if self.delta.take().is_some() {
            self.emit(GraphEvent::DeltaCleared);
        }
    }

    /// Apply `commit` and record it for undo.
    ///
    /// The revert is computed against the state before the commit lands, so
    /// undoing restores modified entities exactly.
    pub fn commit(&mut self, commit: Commit) {
        if commit.is_empty() {
            debug!(commit_id = %commit.id, "ignoring empty commit");
            return;
        }
        let revert = get_revert(&commit, &self.snapshot);
        self.apply(&commit);
        let id = commit.id;
        self.history.record(commit, revert);
        self.emit(GraphEvent::Committed { commit: id });
    }

    /// Revert the most recent commit. Returns its id.
    pub fn undo(&mut self) -> Option<uuid::Uuid> {
        let (id, revert) = {
            let entry = self.history.undo()?;
            (entry.commit.id, entry.revert.clone())
        };
        self.apply(&revert);
        self.emit(GraphEvent::Undone { commit: id });
        Some(id)
    }

    /// Re-apply the most recently undone commit. Returns its id.
    pub fn redo(&mut self) -> Option<uuid::Uuid> {
        let commit = self.history.redo()?.commit.clone();
        let revert = get_revert(&commit, &self.snapshot);
        self.apply(&commit);
        self.history.replace_revert(revert);
        self.emit(GraphEvent::Redone { commit: commit.id });
        Some(commit.id)
    }

    /// Whether [`Self::undo`] would do anything.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`Self::redo`] would do anything.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn apply(&mut self, commit: &Commit) {
        self.snapshot.apply_commit(commit);

        for id in commit.traces.removed.keys() {
            self.index.remove_trace_by_id(id);
        }
        for id in commit.artifacts.removed.keys() {
            self.index.remove_artifact(id);
        }
        for id in commit.artifacts.added.keys() {
            self.index.add_artifact(id);
        }
        for link in commit
            .traces
            .added
            .values()
            .chain(commit.traces.modified.values())
        {
            self.index.add_trace(link);
        }

        self.visibility.refresh(&self.index);
        debug!(
            commit_id = %commit.id,
            artifacts = self.snapshot.num_artifacts(),
            traces = self.snapshot.num_traces(),
            "applied commit"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────────

    /// Register an observer.
    pub fn subscribe(&mut self, observer: impl GraphObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn emit(&self, event: GraphEvent) {
        for (_, observer) in &self.observers {
            observer.on_event(&event);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Loaded snapshot.
    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    /// Version of the loaded snapshot.
    pub fn version(&self) -> &VersionId {
        &self.snapshot.version
    }

    /// Subtree index of the loaded snapshot.
    pub fn index(&self) -> &SubtreeIndex {
        &self.index
    }

    /// Collapse state.
    pub fn visibility(&self) -> &VisibilityController {
        &self.visibility
    }

    /// Current delta overlay.
    pub fn delta(&self) -> Option<&ProjectDelta> {
        self.delta.as_ref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Generation of the installed rebuild (0 before the first load).
    pub fn generation(&self) -> u64 {
        self.applied_generation
    }

    /// Project the graph to draw.
    ///
    /// `filter` is the document layer's set of artifacts in view; `None`
    /// means every artifact the index knows.
    pub fn visible_graph(&self, filter: Option<&BTreeSet<ArtifactId>>) -> VisibleGraph {
        match filter {
            Some(ids) => VisibleGraph::project(ids, &self.index, &self.visibility),
            None => VisibleGraph::project(self.index.ids(), &self.index, &self.visibility),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Artifact;
    use std::sync::Arc;

    fn id(s: &str) -> ArtifactId {
        ArtifactId::from(s)
    }

    fn chain() -> ProjectSnapshot {
        ProjectSnapshot::from_parts(
            "v1",
            ["A", "B", "C", "D"].map(|n| Artifact::new(n, "requirement", n.to_lowercase())),
            vec![
                TraceLink::new("t1", "A", "B"),
                TraceLink::new("t2", "B", "C"),
                TraceLink::new("t3", "D", "B"),
            ],
        )
    }

    fn loaded() -> GraphState {
        GraphState::from_snapshot(chain(), KernelConfig::minimal())
    }

    #[test]
    fn test_from_snapshot_builds_index() {
        let state = loaded();
        assert_eq!(state.generation(), 1);
        assert_eq!(state.index().get_subtree(&id("A")), &[id("B"), id("C")].into());
        assert_eq!(state.version(), &VersionId::from("v1"));
    }

    #[test]
    fn test_stale_rebuild_is_discarded() {
        let mut state = loaded();
        let slow = state.begin_rebuild();
        let fast = state.begin_rebuild();

        let fast_outcome = state.apply_rebuild(fast.prepare(ProjectSnapshot::new("v3")));
        let slow_outcome = state.apply_rebuild(slow.prepare(ProjectSnapshot::new("v2")));

        assert!(fast_outcome.is_applied());
        assert_eq!(
            slow_outcome,
            RebuildOutcome::Discarded {
                generation: 2,
                latest: 3
            }
        );
        assert_eq!(state.version(), &VersionId::from("v3"));
    }

    #[test]
    fn test_rebuild_resets_visibility_and_delta() {
        let mut state = loaded();
        state.hide_subtree(&id("A"));
        state.compare_with(&ProjectSnapshot::new("v0"));

        let ticket = state.begin_rebuild();
        state.apply_rebuild(ticket.prepare(chain()));

        assert!(state.visibility().hidden_nodes().is_empty());
        assert!(state.delta().is_none());
    }

    #[test]
    fn test_add_trace_refreshes_collapse() {
        let mut state = loaded();
        state.hide_subtree(&id("A"));
        state.add_trace(TraceLink::new("t4", "C", "E"));

        assert!(state.visibility().is_hidden(&id("E")));
        assert!(state.snapshot().traces.contains_key(&TraceId::from("t4")));
    }

    #[test]
    fn test_remove_trace() {
        let mut state = loaded();
        assert!(state.remove_trace(&TraceId::from("t2")));
        assert!(state.index().get_subtree(&id("A")).len() == 1);
        assert!(!state.remove_trace(&TraceId::from("t2")));
    }

    #[test]
    fn test_commit_undo_redo() {
        let mut state = loaded();
        let before = state.snapshot().clone();

        let commit = Commit::new()
            .modify_artifact(Artifact::new("A", "requirement", "renamed"))
            .add_trace(TraceLink::new("t4", "C", "A"))
            .remove_trace(TraceLink::new("t3", "D", "B"));
        state.commit(commit);

        assert_eq!(state.snapshot().artifacts[&id("A")].name, "renamed");
        assert!(state.index().get_subtree(&id("C")).contains(&id("A")));
        assert!(state.index().get_children(&id("D")).is_empty());

        state.undo();
        assert_eq!(state.snapshot(), &before);
        assert_eq!(
            state.index().get_subtree(&id("D")),
            &[id("B"), id("C")].into()
        );

        state.redo();
        assert_eq!(state.snapshot().artifacts[&id("A")].name, "renamed");
        state.undo();
        assert_eq!(state.snapshot(), &before);
    }

    #[test]
    fn test_empty_commit_is_not_recorded() {
        let mut state = loaded();
        state.commit(Commit::new());
        assert!(!state.can_undo());
    }

    #[test]
    fn test_observers_receive_events() {
        let mut state = loaded();
        let recorder = Arc::new(RecordingObserver::new());
        let sub = state.subscribe(Arc::clone(&recorder));

        state.hide_subtree(&id("A"));
        state.hide_subtree(&id("A"));
        state.show_subtree(&id("A"));
        assert_eq!(
            recorder.take(),
            vec![
                GraphEvent::SubtreeHidden { root: id("A") },
                GraphEvent::SubtreeShown { root: id("A") },
            ]
        );

        assert!(state.unsubscribe(sub));
        state.reset_hidden_nodes();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_visible_graph_with_filter() {
        let mut state = loaded();
        state.hide_subtree(&id("A"));

        let all = state.visible_graph(None);
        assert!(all.has_edge(&id("D"), &id("A")));

        let only_a: BTreeSet<ArtifactId> = [id("A")].into();
        let filtered = state.visible_graph(Some(&only_a));
        assert_eq!(filtered.nodes, only_a);
        assert!(filtered.edges.is_empty());
    }
}
