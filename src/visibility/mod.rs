//! Collapse/expand of subtrees in the visual graph.
//!
//! The controller stores the collapsed roots and the phantom links they
//! created. The hidden set is always re-derived as the union of every
//! collapsed root's subtree, so a node stays hidden until the last root
//! covering it is expanded.

pub mod phantom;
pub mod view;

pub use phantom::{PhantomDirection, PhantomKey, PhantomLink};
pub use view::{VisibleEdge, VisibleEdgeKind, VisibleGraph};

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::index::SubtreeIndex;
use crate::types::ArtifactId;

/// Hidden nodes, collapsed roots and phantom links for one loaded version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityController {
    collapsed_roots: BTreeSet<ArtifactId>,
    phantom_links: BTreeMap<PhantomKey, PhantomLink>,
    /// Derived from `collapsed_roots`; never patched directly.
    hidden_nodes: BTreeSet<ArtifactId>,
}

impl VisibilityController {
    /// Create a controller with nothing collapsed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapse the subtree under `root`.
    ///
    /// Returns whether anything changed. A root with no descendants, or one
    /// already collapsed, is left alone.
    pub fn hide_subtree(&mut self, index: &SubtreeIndex, root: &ArtifactId) -> bool {
        let descendants = index.get_subtree(root);
        if descendants.is_empty() {
            debug!(root = %root, "nothing to collapse under root");
            return false;
        }
        if self.collapsed_roots.contains(root) {
            return false;
        }

        let newly_hidden = descendants.difference(&self.hidden_nodes).count();
        let phantoms = boundary_phantoms(index, root);
        let phantom_count = phantoms.len();
        self.phantom_links.extend(phantoms);
        self.collapsed_roots.insert(root.clone());
        self.derive_hidden(index);

        debug!(
            root = %root,
            newly_hidden,
            phantoms = phantom_count,
            "collapsed subtree"
        );
        true
    }

    /// Expand the subtree under `root`. No-op unless `root` is collapsed.
    pub fn show_subtree(&mut self, index: &SubtreeIndex, root: &ArtifactId) -> bool {
        if !self.collapsed_roots.remove(root) {
            debug!(root = %root, "show ignored, root is not collapsed");
            return false;
        }

        self.phantom_links.retain(|key, _| &key.root_id != root);
        self.derive_hidden(index);

        debug!(root = %root, still_hidden = self.hidden_nodes.len(), "expanded subtree");
        true
    }

    /// Collapse `root` if expanded, expand it if collapsed.
    pub fn toggle_subtree(&mut self, index: &SubtreeIndex, root: &ArtifactId) -> bool {
        if self.collapsed_roots.contains(root) {
            self.show_subtree(index, root)
        } else {
            self.hide_subtree(index, root)
        }
    }

    /// Forget every collapse. Used on project/version switch.
    pub fn reset_hidden_nodes(&mut self) {
        self.collapsed_roots.clear();
        self.phantom_links.clear();
        self.hidden_nodes.clear();
    }

    /// Re-derive hidden nodes and phantoms after the index changed.
    pub fn refresh(&mut self, index: &SubtreeIndex) {
        self.phantom_links = self
            .collapsed_roots
            .iter()
            .flat_map(|root| boundary_phantoms(index, root))
            .collect();
        self.derive_hidden(index);
    }

    /// Nodes currently invisible.
    pub fn hidden_nodes(&self) -> &BTreeSet<ArtifactId> {
        &self.hidden_nodes
    }

    /// Roots whose subtree is collapsed.
    pub fn collapsed_roots(&self) -> &BTreeSet<ArtifactId> {
        &self.collapsed_roots
    }

    /// Phantom links by key.
    pub fn phantom_links(&self) -> &BTreeMap<PhantomKey, PhantomLink> {
        &self.phantom_links
    }

    /// Whether `id` is hidden.
    pub fn is_hidden(&self, id: &ArtifactId) -> bool {
        self.hidden_nodes.contains(id)
    }

    /// Whether `id` is a collapsed root.
    pub fn is_collapsed(&self, id: &ArtifactId) -> bool {
        self.collapsed_roots.contains(id)
    }

    fn derive_hidden(&mut self, index: &SubtreeIndex) {
        self.hidden_nodes = self
            .collapsed_roots
            .iter()
            .flat_map(|root| index.get_subtree(root).iter().cloned())
            .collect();
    }
}

/// Phantoms for every link crossing the boundary of `root`'s subtree.
///
/// A link crosses when its target is a descendant of `root` and its source is
/// neither a descendant nor `root` itself. The subtree is closed under
/// outgoing links, so a descendant never links out of it and every crossing
/// is incoming.
fn boundary_phantoms(index: &SubtreeIndex, root: &ArtifactId) -> BTreeMap<PhantomKey, PhantomLink> {
    let descendants = index.get_subtree(root);
    let inside = |id: &ArtifactId| id == root || descendants.contains(id);

    let mut phantoms: BTreeMap<PhantomKey, PhantomLink> = BTreeMap::new();
    for link in index.links() {
        if !descendants.contains(&link.target) || inside(&link.source) {
            continue;
        }
        let phantom = PhantomLink::new(root.clone(), link.source.clone(), PhantomDirection::Incoming);
        phantoms
            .entry(phantom.key.clone())
            .or_insert(phantom)
            .trace_ids
            .insert(link.id.clone());
    }
    phantoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TraceLink;

    fn id(s: &str) -> ArtifactId {
        ArtifactId::from(s)
    }

    fn set(ids: &[&str]) -> BTreeSet<ArtifactId> {
        ids.iter().map(|s| id(s)).collect()
    }

    fn index(edges: &[(&str, &str, &str)]) -> SubtreeIndex {
        let traces: Vec<TraceLink> = edges
            .iter()
            .map(|(t, s, d)| TraceLink::new(*t, *s, *d))
            .collect();
        SubtreeIndex::build(std::iter::empty(), &traces)
    }

    #[test]
    fn test_hide_chain_without_boundary() {
        let index = index(&[("t1", "A", "B"), ("t2", "B", "C")]);
        let mut vis = VisibilityController::new();

        assert!(vis.hide_subtree(&index, &id("A")));
        assert_eq!(vis.hidden_nodes(), &set(&["B", "C"]));
        assert_eq!(vis.collapsed_roots(), &set(&["A"]));
        assert!(vis.phantom_links().is_empty());
    }

    #[test]
    fn test_incoming_crossing_reroutes_to_root() {
        let index = index(&[("t1", "A", "B"), ("t2", "B", "C"), ("t3", "D", "B")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("A"));

        let phantom = vis.phantom_links().values().next().unwrap();
        assert_eq!(vis.phantom_links().len(), 1);
        assert_eq!(phantom.source, id("D"));
        assert_eq!(phantom.target, id("A"));
        assert_eq!(phantom.key.direction, PhantomDirection::Incoming);
    }

    #[test]
    fn test_parallel_crossings_share_one_phantom() {
        let index = index(&[
            ("t1", "R", "B"),
            ("t2", "R", "C"),
            ("t3", "Y", "B"),
            ("t4", "Y", "C"),
        ]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("R"));

        assert_eq!(vis.phantom_links().len(), 1);
        let phantom = &vis.phantom_links()[&PhantomKey {
            root_id: id("R"),
            external_id: id("Y"),
            direction: PhantomDirection::Incoming,
        }];
        assert_eq!(phantom.trace_ids.len(), 2);
    }

    #[test]
    fn test_links_inside_collapse_make_no_phantom() {
        let index = index(&[("t1", "A", "B"), ("t2", "A", "C"), ("t3", "B", "C"), ("t4", "A", "Z")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("A"));

        // Root's own links stay real; descendant-to-descendant links vanish.
        assert!(vis.phantom_links().is_empty());
    }

    #[test]
    fn test_descendant_out_links_stay_inside() {
        // E is reached from C, so it is hidden with the rest of A's subtree.
        let index = index(&[("t1", "A", "B"), ("t2", "B", "C"), ("t3", "C", "E")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("A"));

        assert!(vis.is_hidden(&id("E")));
        assert!(vis.phantom_links().is_empty());
    }

    #[test]
    fn test_crossings_into_cycle_are_incoming() {
        let index = index(&[
            ("t1", "A", "B"),
            ("t2", "B", "C"),
            ("t3", "C", "A"),
            ("t4", "C", "E"),
            ("t5", "X", "C"),
            ("t6", "Y", "E"),
        ]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("B"));

        let externals: BTreeSet<ArtifactId> = vis
            .phantom_links()
            .values()
            .map(|phantom| {
                assert_eq!(phantom.key.direction, PhantomDirection::Incoming);
                assert_eq!(phantom.target, id("B"));
                phantom.source.clone()
            })
            .collect();
        assert_eq!(externals, set(&["X", "Y"]));
    }

    #[test]
    fn test_hide_then_show_round_trip() {
        let index = index(&[("t1", "A", "B"), ("t2", "B", "C"), ("t3", "D", "B"), ("t4", "C", "E")]);
        let mut vis = VisibilityController::new();
        let before = vis.clone();

        vis.hide_subtree(&index, &id("B"));
        assert_ne!(vis, before);
        vis.show_subtree(&index, &id("B"));
        assert_eq!(vis, before);
    }

    #[test]
    fn test_hide_is_idempotent() {
        let index = index(&[("t1", "A", "B"), ("t2", "D", "B")]);
        let mut vis = VisibilityController::new();

        assert!(vis.hide_subtree(&index, &id("A")));
        let once = vis.clone();
        assert!(!vis.hide_subtree(&index, &id("A")));
        assert_eq!(vis, once);
    }

    #[test]
    fn test_nested_collapse_keeps_inner_hidden() {
        let index = index(&[("t1", "A", "B"), ("t2", "B", "C"), ("t3", "C", "D")]);
        let mut vis = VisibilityController::new();

        vis.hide_subtree(&index, &id("A"));
        assert!(vis.hide_subtree(&index, &id("B")));
        vis.show_subtree(&index, &id("A"));

        assert_eq!(vis.hidden_nodes(), &set(&["C", "D"]));
        assert!(!vis.is_hidden(&id("B")));
        assert!(vis.is_collapsed(&id("B")));
    }

    #[test]
    fn test_show_unknown_root_is_noop() {
        let index = index(&[("t1", "A", "B")]);
        let mut vis = VisibilityController::new();
        assert!(!vis.show_subtree(&index, &id("A")));
        assert!(vis.collapsed_roots().is_empty());
    }

    #[test]
    fn test_leaf_cannot_collapse() {
        let index = index(&[("t1", "A", "B")]);
        let mut vis = VisibilityController::new();
        assert!(!vis.hide_subtree(&index, &id("B")));
        assert!(!vis.is_collapsed(&id("B")));
    }

    #[test]
    fn test_toggle() {
        let index = index(&[("t1", "A", "B")]);
        let mut vis = VisibilityController::new();

        vis.toggle_subtree(&index, &id("A"));
        assert!(vis.is_hidden(&id("B")));
        vis.toggle_subtree(&index, &id("A"));
        assert!(!vis.is_hidden(&id("B")));
    }

    #[test]
    fn test_reset_clears_everything() {
        let index = index(&[("t1", "A", "B"), ("t2", "D", "B")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("A"));

        vis.reset_hidden_nodes();
        assert_eq!(vis, VisibilityController::new());
    }

    #[test]
    fn test_refresh_after_index_change() {
        let mut index = index(&[("t1", "A", "B")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("A"));

        index.add_trace(&TraceLink::new("t2", "B", "C"));
        index.add_trace(&TraceLink::new("t3", "E", "C"));
        vis.refresh(&index);

        assert_eq!(vis.hidden_nodes(), &set(&["B", "C"]));
        assert_eq!(vis.phantom_links().len(), 1);
    }
}
