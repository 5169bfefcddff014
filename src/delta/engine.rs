//! Baseline-vs-current classification with stable change ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use crate::snapshot::ProjectSnapshot;
use crate::types::{Artifact, ArtifactId, TraceId, TraceLink};

/// How an entity differs between baseline and current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present in both, field-wise unequal.
    Modified,
    /// Only in current.
    Added,
    /// Only in baseline.
    Removed,
}

/// Both sides of a modified entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification<T> {
    /// Baseline value.
    pub previous: T,
    /// Current value.
    pub current: T,
}

/// Monotonic, 1-based change counter shared across delta sets.
#[derive(Debug, Clone, Default)]
pub struct ChangeCounter {
    next: usize,
}

impl ChangeCounter {
    /// Create a counter whose first index is 1.
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(&mut self) -> usize {
        self.next += 1;
        self.next
    }

    /// Number of indices handed out so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}

/// Classification of one entity type into added/removed/modified.
///
/// Each classified key also carries its `change_index`. Indices are assigned
/// modified first, then added, then removed, ascending key within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Ord + Serialize, T: Serialize",
    deserialize = "K: Ord + Deserialize<'de>, T: Deserialize<'de>"
))]
pub struct DeltaSet<K, T> {
    /// Entities only in current.
    pub added: BTreeMap<K, T>,
    /// Entities only in baseline.
    pub removed: BTreeMap<K, T>,
    /// Entities present in both with different values.
    pub modified: BTreeMap<K, Modification<T>>,
    /// Stable position of every classified key.
    pub change_index: BTreeMap<K, usize>,
}

impl<K: Ord, T> Default for DeltaSet<K, T> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            modified: BTreeMap::new(),
            change_index: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, T> DeltaSet<K, T> {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of classified entities.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Classification of a key, if it changed.
    pub fn change_of(&self, key: &K) -> Option<ChangeKind> {
        if self.modified.contains_key(key) {
            Some(ChangeKind::Modified)
        } else if self.added.contains_key(key) {
            Some(ChangeKind::Added)
        } else if self.removed.contains_key(key) {
            Some(ChangeKind::Removed)
        } else {
            None
        }
    }

    /// Keys in change-index order.
    pub fn ordered(&self) -> Vec<(usize, &K, ChangeKind)> {
        let mut out: Vec<(usize, &K, ChangeKind)> = self
            .change_index
            .iter()
            .filter_map(|(k, &i)| self.change_of(k).map(|kind| (i, k, kind)))
            .collect();
        out.sort_by_key(|(i, _, _)| *i);
        out
    }
}

/// Classify `current` against `baseline`, numbering changes from 1.
pub fn compute_delta<K, T>(baseline: &BTreeMap<K, T>, current: &BTreeMap<K, T>) -> DeltaSet<K, T>
where
    K: Ord + Clone,
    T: Clone + PartialEq,
{
    compute_delta_with(baseline, current, &mut ChangeCounter::new())
}

/// Classify `current` against `baseline`, continuing an existing counter.
pub fn compute_delta_with<K, T>(
    baseline: &BTreeMap<K, T>,
    current: &BTreeMap<K, T>,
    counter: &mut ChangeCounter,
) -> DeltaSet<K, T>
where
    K: Ord + Clone,
    T: Clone + PartialEq,
{
    let mut delta = DeltaSet::default();

    for (id, previous) in baseline {
        match current.get(id) {
            Some(now) if now != previous => {
                delta.modified.insert(
                    id.clone(),
                    Modification {
                        previous: previous.clone(),
                        current: now.clone(),
                    },
                );
            }
            Some(_) => {}
            None => {
                delta.removed.insert(id.clone(), previous.clone());
            }
        }
    }
    for (id, value) in current {
        if !baseline.contains_key(id) {
            delta.added.insert(id.clone(), value.clone());
        }
    }

    let order = delta
        .modified
        .keys()
        .chain(delta.added.keys())
        .chain(delta.removed.keys());
    for id in order {
        delta.change_index.insert(id.clone(), counter.advance());
    }

    delta
}

/// Artifact and trace deltas between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDelta {
    /// Fingerprint of the baseline snapshot.
    pub baseline_fingerprint: String,
    /// Fingerprint of the current snapshot.
    pub current_fingerprint: String,
    /// Artifact changes.
    pub artifacts: DeltaSet<ArtifactId, Artifact>,
    /// Trace link changes. Indices continue after the artifacts.
    pub traces: DeltaSet<TraceId, TraceLink>,
}

impl ProjectDelta {
    /// Compare two snapshots.
    pub fn compute(baseline: &ProjectSnapshot, current: &ProjectSnapshot) -> Self {
        let mut counter = ChangeCounter::new();
        let artifacts = compute_delta_with(&baseline.artifacts, &current.artifacts, &mut counter);
        let traces = compute_delta_with(&baseline.traces, &current.traces, &mut counter);

        tracing::info!(
            baseline_version = %baseline.version,
            current_version = %current.version,
            artifact_changes = artifacts.len(),
            trace_changes = traces.len(),
            "computed project delta"
        );

        Self {
            baseline_fingerprint: baseline.fingerprint(),
            current_fingerprint: current.fingerprint(),
            artifacts,
            traces,
        }
    }

    /// Whether the two snapshots had identical contents.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty() && self.traces.is_empty()
    }

    /// Total classified entities.
    pub fn change_count(&self) -> usize {
        self.artifacts.len() + self.traces.len()
    }

    /// Classification of an artifact, if it changed.
    pub fn artifact_change(&self, id: &ArtifactId) -> Option<ChangeKind> {
        self.artifacts.change_of(id)
    }

    /// Classification of a trace link, if it changed.
    pub fn trace_change(&self, id: &TraceId) -> Option<ChangeKind> {
        self.traces.change_of(id)
    }

    /// Deterministic fingerprint of the whole delta, for audit records.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(artifacts: Vec<Artifact>, traces: Vec<TraceLink>) -> ProjectSnapshot {
        ProjectSnapshot::from_parts("v", artifacts, traces)
    }

    #[test]
    fn test_identical_is_empty() {
        let a = snapshot(
            vec![Artifact::new("A", "requirement", "a")],
            vec![TraceLink::new("t1", "A", "B")],
        );
        let delta = ProjectDelta::compute(&a, &a);

        assert!(delta.is_empty());
        assert_eq!(delta.baseline_fingerprint, delta.current_fingerprint);
    }

    #[test]
    fn test_classification_and_order() {
        let a = Artifact::new("A", "requirement", "a");
        let b = Artifact::new("B", "requirement", "b");
        let c = Artifact::new("C", "requirement", "c");

        let baseline: BTreeMap<_, _> = [(a.id.clone(), a.clone()), (b.id.clone(), b.clone())].into();
        let current: BTreeMap<_, _> = [(a.id.clone(), a.renamed("a2")), (c.id.clone(), c)].into();

        let delta = compute_delta(&baseline, &current);

        assert_eq!(delta.change_of(&ArtifactId::from("A")), Some(ChangeKind::Modified));
        assert_eq!(delta.change_of(&ArtifactId::from("C")), Some(ChangeKind::Added));
        assert_eq!(delta.change_of(&ArtifactId::from("B")), Some(ChangeKind::Removed));
        assert_eq!(delta.modified[&ArtifactId::from("A")].previous, a);

        let order: Vec<(usize, &str)> = delta
            .ordered()
            .into_iter()
            .map(|(i, k, _)| (i, k.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "A"), (2, "C"), (3, "B")]);
    }

    #[test]
    fn test_counter_spans_artifacts_then_traces() {
        let baseline = snapshot(vec![], vec![]);
        let current = snapshot(
            vec![Artifact::new("A", "requirement", "a")],
            vec![TraceLink::new("t1", "A", "B")],
        );
        let delta = ProjectDelta::compute(&baseline, &current);

        assert_eq!(delta.artifacts.change_index[&ArtifactId::from("A")], 1);
        assert_eq!(delta.traces.change_index[&TraceId::from("t1")], 2);
        assert_eq!(delta.change_count(), 2);
    }

    #[test]
    fn test_generic_over_plain_values() {
        let baseline: BTreeMap<u32, &str> = [(1, "x"), (2, "y")].into();
        let current: BTreeMap<u32, &str> = [(1, "x"), (2, "z"), (3, "w")].into();

        let delta = compute_delta(&baseline, &current);
        assert_eq!(delta.modified.len(), 1);
        assert_eq!(delta.added.len(), 1);
        assert!(delta.removed.is_empty());
        assert_eq!(delta.change_of(&1), None);
    }

    #[test]
    fn test_fingerprint_stable() {
        let baseline = snapshot(vec![Artifact::new("A", "requirement", "a")], vec![]);
        let current = snapshot(vec![Artifact::new("B", "requirement", "b")], vec![]);

        let d1 = ProjectDelta::compute(&baseline, &current);
        let d2 = ProjectDelta::compute(&baseline, &current);
        assert_eq!(d1.fingerprint(), d2.fingerprint());
    }
}
