//! Projection of the graph the renderer should draw.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{PhantomKey, VisibilityController};
use crate::index::SubtreeIndex;
use crate::types::{ArtifactId, TraceId};

/// Where a visible edge came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum VisibleEdgeKind {
    /// A real trace link.
    Trace(TraceId),
    /// A phantom standing in for hidden links.
    Phantom(PhantomKey),
}

/// One edge to render.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VisibleEdge {
    /// Rendered source.
    pub source: ArtifactId,
    /// Rendered target.
    pub target: ArtifactId,
    /// Origin of the edge.
    pub kind: VisibleEdgeKind,
}

/// Nodes and edges visible after collapses and the document filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleGraph {
    /// Visible artifact ids.
    pub nodes: BTreeSet<ArtifactId>,
    /// Visible edges, sorted.
    pub edges: Vec<VisibleEdge>,
}

impl VisibleGraph {
    /// Project the visible graph.
    ///
    /// `artifact_ids` is the document layer's set of artifacts in view. Real
    /// links show when both endpoints are visible. A phantom endpoint that is
    /// hidden is rerouted to the smallest visible collapsed root covering it,
    /// and dropped when no such root exists.
    pub fn project<'a>(
        artifact_ids: impl IntoIterator<Item = &'a ArtifactId>,
        index: &SubtreeIndex,
        visibility: &VisibilityController,
    ) -> Self {
        let nodes: BTreeSet<ArtifactId> = artifact_ids
            .into_iter()
            .filter(|id| !visibility.is_hidden(id))
            .cloned()
            .collect();

        let mut edges: Vec<VisibleEdge> = index
            .links()
            .filter(|link| nodes.contains(&link.source) && nodes.contains(&link.target))
            .map(|link| VisibleEdge {
                source: link.source.clone(),
                target: link.target.clone(),
                kind: VisibleEdgeKind::Trace(link.id.clone()),
            })
            .collect();

        let resolve = |id: &ArtifactId| -> Option<ArtifactId> {
            if nodes.contains(id) {
                return Some(id.clone());
            }
            visibility
                .collapsed_roots()
                .iter()
                .find(|root| nodes.contains(*root) && index.get_subtree(root).contains(id))
                .cloned()
        };

        // First phantom (in key order) wins for each rendered pair.
        let mut phantom_edges: BTreeMap<(ArtifactId, ArtifactId), PhantomKey> = BTreeMap::new();
        for phantom in visibility.phantom_links().values() {
            let (Some(source), Some(target)) = (resolve(&phantom.source), resolve(&phantom.target)) else {
                continue;
            };
            if source == target {
                continue;
            }
            phantom_edges
                .entry((source, target))
                .or_insert_with(|| phantom.key.clone());
        }

        edges.extend(phantom_edges.into_iter().map(|((source, target), key)| VisibleEdge {
            source,
            target,
            kind: VisibleEdgeKind::Phantom(key),
        }));
        edges.sort();

        Self { nodes, edges }
    }

    /// Whether a real link is drawn.
    pub fn shows_trace(&self, id: &TraceId) -> bool {
        self.edges
            .iter()
            .any(|e| matches!(&e.kind, VisibleEdgeKind::Trace(t) if t == id))
    }

    /// Whether any edge `source -> target` is drawn.
    pub fn has_edge(&self, source: &ArtifactId, target: &ArtifactId) -> bool {
        self.edges
            .iter()
            .any(|e| &e.source == source && &e.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TraceLink;

    fn id(s: &str) -> ArtifactId {
        ArtifactId::from(s)
    }

    fn build(edges: &[(&str, &str, &str)]) -> SubtreeIndex {
        let traces: Vec<TraceLink> = edges
            .iter()
            .map(|(t, s, d)| TraceLink::new(*t, *s, *d))
            .collect();
        SubtreeIndex::build(std::iter::empty(), &traces)
    }

    #[test]
    fn test_everything_visible_without_collapse() {
        let index = build(&[("t1", "A", "B"), ("t2", "B", "C")]);
        let vis = VisibilityController::new();
        let ids: Vec<ArtifactId> = index.ids().cloned().collect();

        let graph = VisibleGraph::project(&ids, &index, &vis);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_hidden_link_replaced_by_phantom() {
        let index = build(&[("t1", "A", "B"), ("t2", "B", "C"), ("t3", "D", "B")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("A"));
        let ids: Vec<ArtifactId> = index.ids().cloned().collect();

        let graph = VisibleGraph::project(&ids, &index, &vis);

        assert!(!graph.shows_trace(&TraceId::from("t3")));
        assert!(graph.has_edge(&id("D"), &id("A")));
        assert_eq!(graph.nodes, [id("A"), id("D")].into());
    }

    #[test]
    fn test_phantom_rerouted_to_outer_root() {
        // X -> C crosses B's boundary; with A collapsed too, B is hidden and
        // the phantom X -> B lands on A.
        let index = build(&[("t1", "A", "B"), ("t2", "B", "C"), ("t3", "X", "C")]);
        let mut vis = VisibilityController::new();
        vis.hide_subtree(&index, &id("B"));
        vis.hide_subtree(&index, &id("A"));
        let ids: Vec<ArtifactId> = index.ids().cloned().collect();

        let graph = VisibleGraph::project(&ids, &index, &vis);

        assert!(graph.has_edge(&id("X"), &id("A")));
        assert!(!graph.has_edge(&id("X"), &id("B")));
        assert_eq!(
            graph.edges.iter().filter(|e| e.source == id("X")).count(),
            1
        );
    }

    #[test]
    fn test_document_filter_limits_nodes() {
        let index = build(&[("t1", "A", "B"), ("t2", "B", "C")]);
        let vis = VisibilityController::new();
        let ids = [id("A"), id("B")];

        let graph = VisibleGraph::project(&ids, &index, &vis);
        assert_eq!(graph.edges.len(), 1);
        assert!(!graph.nodes.contains(&id("C")));
    }
}
