//! Subtree index: ancestor/descendant closure for every artifact.
//!
//! The index is rebuilt wholesale when a project version is loaded and
//! patched in place on single trace edits:
//!
//! - **add**: every ancestor of the source (and the source) gains the target
//!   and its descendants; every descendant of the target (and the target)
//!   gains the source and its ancestors
//! - **remove**: the weakly connected component that held the link is
//!   recomputed from scratch, since another path may still justify a
//!   membership that naive subtraction would drop
//!
//! Lookups never fail. Unknown ids resolve to [`SubtreeEntry::EMPTY`].

mod closure;
mod entry;

pub use entry::SubtreeEntry;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use crate::snapshot::ProjectSnapshot;
use crate::types::{Artifact, ArtifactId, TraceId, TraceLink};

static EMPTY_ENTRY: SubtreeEntry = SubtreeEntry::EMPTY;

/// Immediate relationship of one artifact to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// The other artifact links into this one.
    Parent,
    /// This artifact links into the other one.
    Child,
}

/// Closure maps for one loaded project version.
#[derive(Debug, Clone, Default)]
pub struct SubtreeIndex {
    /// Entries by artifact id, including dangling link endpoints.
    entries: BTreeMap<ArtifactId, SubtreeEntry>,
    /// Well-formed links by id. Deduplicated by id, last one wins.
    links: BTreeMap<TraceId, TraceLink>,
}

impl SubtreeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the complete index for one version.
    ///
    /// Every artifact and every endpoint of a well-formed link gets an entry.
    /// Empty ids never do.
    /// Malformed links only vivify whichever endpoint they name.
    pub fn build<'a>(
        artifacts: impl IntoIterator<Item = &'a Artifact>,
        traces: impl IntoIterator<Item = &'a TraceLink>,
    ) -> Self {
        let mut index = Self::new();

        for artifact in artifacts {
            index.add_artifact(&artifact.id);
        }

        let mut malformed = 0usize;
        for link in traces {
            if !link.is_well_formed() {
                malformed += 1;
                index.vivify_endpoints(link);
                continue;
            }
            if let Some(previous) = index.links.insert(link.id.clone(), link.clone()) {
                if !previous.same_pair(link) {
                    debug!(trace_id = %link.id, "duplicate trace id, keeping the later link");
                }
            }
        }

        let links: Vec<TraceLink> = index.links.values().cloned().collect();
        for link in &links {
            index.attach(link);
        }

        let scope: BTreeSet<ArtifactId> = index.entries.keys().cloned().collect();
        index.recompute_closure(&scope);

        debug!(
            entries = index.entries.len(),
            links = index.links.len(),
            malformed,
            "built subtree index"
        );
        index
    }

    /// Build the index for a snapshot.
    pub fn from_snapshot(snapshot: &ProjectSnapshot) -> Self {
        Self::build(snapshot.artifacts.values(), snapshot.traces.values())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Entry for an id, or the empty entry when unknown.
    pub fn entry(&self, id: &ArtifactId) -> &SubtreeEntry {
        self.entries.get(id).unwrap_or(&EMPTY_ENTRY)
    }

    /// All transitive descendants of `id`.
    pub fn get_subtree(&self, id: &ArtifactId) -> &BTreeSet<ArtifactId> {
        &self.entry(id).subtree
    }

    /// All transitive ancestors of `id`.
    pub fn get_supertree(&self, id: &ArtifactId) -> &BTreeSet<ArtifactId> {
        &self.entry(id).supertree
    }

    /// Immediate parents of `id`.
    pub fn get_parents(&self, id: &ArtifactId) -> &BTreeSet<ArtifactId> {
        &self.entry(id).parents
    }

    /// Immediate children of `id`.
    pub fn get_children(&self, id: &ArtifactId) -> &BTreeSet<ArtifactId> {
        &self.entry(id).children
    }

    /// Immediate parents and children of `id`.
    pub fn get_neighbors(&self, id: &ArtifactId) -> BTreeSet<ArtifactId> {
        self.entry(id).neighbors()
    }

    /// Immediate relationship of `a` to `b`. Parent wins when both hold.
    pub fn get_relationship(&self, a: &ArtifactId, b: &ArtifactId) -> Option<Relationship> {
        let entry = self.entry(a);
        if entry.parents.contains(b) {
            Some(Relationship::Parent)
        } else if entry.children.contains(b) {
            Some(Relationship::Child)
        } else {
            None
        }
    }

    /// Whether the index has an entry for `id`.
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All ids with an entry, in order.
    pub fn ids(&self) -> impl Iterator<Item = &ArtifactId> {
        self.entries.keys()
    }

    /// All indexed links, ordered by id.
    pub fn links(&self) -> impl Iterator<Item = &TraceLink> {
        self.links.values()
    }

    /// Look up a link by id.
    pub fn link(&self, id: &TraceId) -> Option<&TraceLink> {
        self.links.get(id)
    }

    /// Number of indexed links.
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Incremental edits
    // ─────────────────────────────────────────────────────────────────────────

    /// Ensure an entry exists for `id`.
    pub fn add_artifact(&mut self, id: &ArtifactId) {
        if !id.is_empty() {
            self.entries.entry(id.clone()).or_default();
        }
    }

    /// Drop the entry for `id` unless a link still references it.
    ///
    /// Returns whether the entry was removed.
    pub fn remove_artifact(&mut self, id: &ArtifactId) -> bool {
        match self.entries.get(id) {
            Some(entry) if entry.is_isolated() => {
                self.entries.remove(id);
                true
            }
            Some(_) => {
                debug!(artifact_id = %id, "artifact still linked, keeping entry as endpoint");
                false
            }
            None => false,
        }
    }

    /// Add one link and propagate its transitive effect.
    pub fn add_trace(&mut self, link: &TraceLink) {
        if !link.is_well_formed() {
            debug!(trace_id = %link.id, "ignoring malformed trace link");
            self.vivify_endpoints(link);
            return;
        }

        match self.links.get(&link.id) {
            Some(existing) if existing == link => return,
            Some(existing) if existing.same_pair(link) => {
                // Only metadata changed; closure is unaffected.
                self.links.insert(link.id.clone(), link.clone());
                return;
            }
            Some(existing) => {
                let stale = existing.clone();
                self.remove_trace(&stale);
            }
            None => {}
        }

        self.links.insert(link.id.clone(), link.clone());
        self.attach(link);

        if link.is_self_loop() {
            return;
        }

        let mut upstream = self.get_supertree(&link.source).clone();
        upstream.insert(link.source.clone());
        let mut downstream = self.get_subtree(&link.target).clone();
        downstream.insert(link.target.clone());

        for ancestor in &upstream {
            let entry = self.entries.entry(ancestor.clone()).or_default();
            entry
                .subtree
                .extend(downstream.iter().filter(|d| *d != ancestor).cloned());
        }
        for descendant in &downstream {
            let entry = self.entries.entry(descendant.clone()).or_default();
            entry
                .supertree
                .extend(upstream.iter().filter(|u| *u != descendant).cloned());
        }

        debug!(
            trace_id = %link.id,
            source = %link.source,
            target = %link.target,
            ancestors = upstream.len(),
            descendants = downstream.len(),
            "added trace to subtree index"
        );
    }

    /// Remove a link (matched by id). Returns whether anything was removed.
    pub fn remove_trace(&mut self, link: &TraceLink) -> bool {
        self.remove_trace_by_id(&link.id)
    }

    /// Remove a link by id and recompute the affected component.
    pub fn remove_trace_by_id(&mut self, id: &TraceId) -> bool {
        let Some(removed) = self.links.remove(id) else {
            debug!(trace_id = %id, "remove of unknown trace id ignored");
            return false;
        };

        let still_joined = self.links.values().any(|l| l.same_pair(&removed));
        if !still_joined {
            if let Some(entry) = self.entries.get_mut(&removed.source) {
                entry.children.remove(&removed.target);
            }
            if let Some(entry) = self.entries.get_mut(&removed.target) {
                entry.parents.remove(&removed.source);
            }
        }

        let scope = self.weak_component([&removed.source, &removed.target]);
        self.recompute_closure(&scope);

        debug!(
            trace_id = %id,
            recomputed = scope.len(),
            "removed trace from subtree index"
        );
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn vivify_endpoints(&mut self, link: &TraceLink) {
        self.add_artifact(&link.source);
        self.add_artifact(&link.target);
    }

    fn attach(&mut self, link: &TraceLink) {
        self.entries
            .entry(link.source.clone())
            .or_default()
            .children
            .insert(link.target.clone());
        self.entries
            .entry(link.target.clone())
            .or_default()
            .parents
            .insert(link.source.clone());
    }

    /// Every node reachable from `seeds` ignoring link direction.
    fn weak_component<'a>(&self, seeds: impl IntoIterator<Item = &'a ArtifactId>) -> BTreeSet<ArtifactId> {
        let mut component = BTreeSet::new();
        let mut queue: VecDeque<ArtifactId> = VecDeque::new();

        for seed in seeds {
            if component.insert(seed.clone()) {
                queue.push_back(seed.clone());
            }
        }

        while let Some(node) = queue.pop_front() {
            let entry = self.entry(&node);
            for next in entry.parents.iter().chain(entry.children.iter()) {
                if component.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }

        component
    }

    /// Re-derive subtree/supertree for every node in `scope`.
    ///
    /// `scope` must be closed under adjacency (a union of weak components).
    fn recompute_closure(&mut self, scope: &BTreeSet<ArtifactId>) {
        let successors: BTreeMap<ArtifactId, BTreeSet<ArtifactId>> = scope
            .iter()
            .map(|id| (id.clone(), self.entry(id).children.clone()))
            .collect();

        let descendants = closure::reachable_closure(scope, &successors);
        let ancestors = closure::invert(&descendants);

        for id in scope {
            let entry = self.entries.entry(id.clone()).or_default();
            entry.subtree = descendants.get(id).cloned().unwrap_or_default();
            entry.supertree = ancestors.get(id).cloned().unwrap_or_default();
        }
    }
}
