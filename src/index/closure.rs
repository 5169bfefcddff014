//! Transitive closure over a possibly cyclic trace graph.
//!
//! ## Algorithm
//!
//! 1. Number nodes in id order and load them into a petgraph `DiGraph`
//! 2. Condense cycles with `tarjan_scc`. Components come back in postorder,
//!    so every component appears after all components it links to
//! 3. Walk the condensation with a per-component [`Mark`]: `Unvisited`,
//!    `InProgress` while its successors are being resolved, `Done(reach)`
//!    once its reach set is memoized. A successor that is `InProgress` is
//!    never expanded again, which bounds the walk even on malformed input
//! 4. `closure(n) = (members(C(n)) ∪ reach(C(n))) \ {n}`

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::ArtifactId;

/// Reach-pass state of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mark {
    /// Not reached yet.
    Unvisited,
    /// Successors still being resolved.
    InProgress,
    /// Members of every component reachable through at least one edge.
    Done(BTreeSet<usize>),
}

/// Compute `node -> all nodes reachable from it, excluding itself`.
///
/// `nodes` lists every node that needs an entry. Successors missing from
/// `nodes` are still traversed and reported, so dangling adjacency never
/// breaks the walk.
pub(crate) fn reachable_closure(
    nodes: &BTreeSet<ArtifactId>,
    successors: &BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
) -> BTreeMap<ArtifactId, BTreeSet<ArtifactId>> {
    // Collect every id that appears anywhere, in canonical order.
    let mut all: BTreeSet<&ArtifactId> = nodes.iter().collect();
    for (from, tos) in successors {
        all.insert(from);
        all.extend(tos.iter());
    }

    let ids: Vec<&ArtifactId> = all.into_iter().collect();
    let position: BTreeMap<&ArtifactId, usize> =
        ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(ids.len(), 0);
    for _ in &ids {
        graph.add_node(());
    }
    for (from, tos) in successors {
        let v = position[from];
        for to in tos {
            graph.add_edge(NodeIndex::new(v), NodeIndex::new(position[to]), ());
        }
    }

    let components: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .map(|scc| {
            let mut members: Vec<usize> = scc.into_iter().map(|n| n.index()).collect();
            members.sort_unstable();
            members
        })
        .collect();

    let mut component_of = vec![0usize; ids.len()];
    for (c, members) in components.iter().enumerate() {
        for &v in members {
            component_of[v] = c;
        }
    }

    let reach = component_reach(&graph, &component_of, &components);

    let mut result = BTreeMap::new();
    for id in nodes {
        let Some(&v) = position.get(id) else { continue };
        let c = component_of[v];
        let closure: BTreeSet<ArtifactId> = components[c]
            .iter()
            .chain(reach[c].iter())
            .filter(|&&w| w != v)
            .map(|&w| ids[w].clone())
            .collect();
        result.insert(id.clone(), closure);
    }
    result
}

/// Memoized reach per component over the condensation.
///
/// Iterative so deep chains never grow the call stack.
fn component_reach(
    graph: &DiGraph<(), ()>,
    component_of: &[usize],
    components: &[Vec<usize>],
) -> Vec<BTreeSet<usize>> {
    let successors: Vec<Vec<usize>> = components
        .iter()
        .enumerate()
        .map(|(c, members)| {
            let next: BTreeSet<usize> = members
                .iter()
                .flat_map(|&v| graph.neighbors(NodeIndex::new(v)))
                .map(|w| component_of[w.index()])
                .filter(|&d| d != c)
                .collect();
            next.into_iter().collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; components.len()];

    for root in 0..components.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        // (component, position of next successor to resolve)
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        marks[root] = Mark::InProgress;

        while let Some(frame) = frames.last_mut() {
            let c = frame.0;
            if frame.1 < successors[c].len() {
                let d = successors[c][frame.1];
                frame.1 += 1;
                if marks[d] == Mark::Unvisited {
                    marks[d] = Mark::InProgress;
                    frames.push((d, 0));
                }
                continue;
            }

            frames.pop();
            let mut acc = BTreeSet::new();
            for &d in &successors[c] {
                if let Mark::Done(below) = &marks[d] {
                    acc.extend(components[d].iter().copied());
                    acc.extend(below.iter().copied());
                }
            }
            marks[c] = Mark::Done(acc);
        }
    }

    marks
        .into_iter()
        .map(|m| match m {
            Mark::Done(reach) => reach,
            // Every component is closed once its root frame unwinds.
            Mark::Unvisited | Mark::InProgress => BTreeSet::new(),
        })
        .collect()
}

/// Invert a closure map: `m ∈ closure(n)` becomes `n ∈ inverse(m)`.
pub(crate) fn invert(
    closure: &BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
) -> BTreeMap<ArtifactId, BTreeSet<ArtifactId>> {
    let mut inverse: BTreeMap<ArtifactId, BTreeSet<ArtifactId>> = BTreeMap::new();
    for (n, members) in closure {
        inverse.entry(n.clone()).or_default();
        for m in members {
            inverse.entry(m.clone()).or_default().insert(n.clone());
        }
    }
    inverse
}
