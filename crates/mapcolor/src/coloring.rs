//! Smallest-last greedy coloring.
//!
//! The elimination order repeatedly removes the remaining vertex of minimum
//! degree (ties: lowest node id) and is then reversed, so the vertices that
//! were hardest to eliminate get colored first. Each vertex takes the smallest
//! color not used by an already colored neighbour.
//!
//! For a planar graph this uses at most 6 colors; it does not guarantee 4.

use std::collections::BTreeSet;

use log::debug;

use crate::adjacency::AdjacencyGraph;

const UNCOLORED: usize = usize::MAX;

/// Color class per node; index is the node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorAssignment {
    colors: Vec<usize>,
}

impl ColorAssignment {
    pub fn color(&self, node: usize) -> usize {
        self.colors[node]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Number of distinct classes used (classes are dense from 0).
    pub fn color_count(&self) -> usize {
        self.colors.iter().max().map_or(0, |&c| c + 1)
    }

    /// True when no edge of `graph` joins two nodes of the same class.
    pub fn is_proper(&self, graph: &AdjacencyGraph) -> bool {
        self.colors.len() == graph.node_count()
            && graph
                .edges()
                .into_iter()
                .all(|(a, b)| self.colors[a] != self.colors[b])
    }
}

/// Coloring order: the reverse of the minimum-degree elimination order.
pub fn smallest_last_order(graph: &AdjacencyGraph) -> Vec<usize> {
    let n = graph.node_count();
    let neighbors: Vec<Vec<usize>> = (0..n).map(|v| graph.neighbors(v)).collect();
    let mut degree: Vec<usize> = neighbors.iter().map(Vec::len).collect();
    let mut removed = vec![false; n];

    // Ordered by (remaining degree, node id): the first entry is the next to go.
    let mut queue: BTreeSet<(usize, usize)> = (0..n).map(|v| (degree[v], v)).collect();
    let mut order = Vec::with_capacity(n);

    while let Some((_, v)) = queue.pop_first() {
        removed[v] = true;
        order.push(v);

        for &u in &neighbors[v] {
            if removed[u] {
                continue;
            }
            queue.remove(&(degree[u], u));
            degree[u] -= 1;
            queue.insert((degree[u], u));
        }
    }

    order.reverse();
    order
}

/// Color `graph` so that adjacent nodes never share a class.
pub fn greedy_color(graph: &AdjacencyGraph) -> ColorAssignment {
    let mut colors = vec![UNCOLORED; graph.node_count()];
    let mut taken: Vec<bool> = Vec::new();

    for v in smallest_last_order(graph) {
        let neighbors = graph.neighbors(v);

        // A vertex with d neighbours always finds a free class in 0..=d.
        taken.clear();
        taken.resize(neighbors.len() + 1, false);
        for u in neighbors {
            let c = colors[u];
            if c < taken.len() {
                taken[c] = true;
            }
        }

        colors[v] = taken.iter().position(|&t| !t).unwrap_or(taken.len());
    }

    let assignment = ColorAssignment { colors };
    debug!(
        "Greedy coloring: {} nodes, {} colors",
        assignment.len(),
        assignment.color_count()
    );
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(n: usize) -> AdjacencyGraph {
        AdjacencyGraph::from_edges(n, (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))))
    }

    #[test]
    fn empty_graph() {
        let graph = AdjacencyGraph::with_nodes(0);
        let colors = greedy_color(&graph);
        assert!(colors.is_empty());
        assert_eq!(colors.color_count(), 0);
    }

    #[test]
    fn no_edges_is_all_zero() {
        let graph = AdjacencyGraph::with_nodes(5);
        let colors = greedy_color(&graph);
        assert_eq!(colors.as_slice(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn single_edge_uses_two_colors() {
        let graph = AdjacencyGraph::from_edges(2, [(0, 1)]);
        let colors = greedy_color(&graph);
        let mut used = colors.as_slice().to_vec();
        used.sort_unstable();
        assert_eq!(used, vec![0, 1]);
    }

    #[test]
    fn triangle_needs_three() {
        let colors = greedy_color(&complete(3));
        assert_eq!(colors.color_count(), 3);
        assert!(colors.is_proper(&complete(3)));
    }

    #[test]
    fn path_is_two_colored() {
        // A - B - C
        let graph = AdjacencyGraph::from_edges(3, [(0, 1), (1, 2)]);
        let colors = greedy_color(&graph);
        assert_eq!(colors.as_slice(), &[0, 1, 0]);
        assert_eq!(colors.color_count(), 2);
    }

    #[test]
    fn k4_needs_four() {
        let graph = complete(4);
        let colors = greedy_color(&graph);
        assert_eq!(colors.color_count(), 4);
        assert!(colors.is_proper(&graph));
    }

    #[test]
    fn elimination_order_breaks_ties_by_id() {
        // Star centred on 2: after leaves 0 and 1 go, the centre ties with leaf 3 and wins on id.
        let graph = AdjacencyGraph::from_edges(4, [(2, 0), (2, 1), (2, 3)]);
        assert_eq!(smallest_last_order(&graph), vec![3, 2, 1, 0]);
    }

    #[test]
    fn wheel_is_proper_and_deterministic() {
        // Hub 0 with rim 1..=6 and a chord across the rim; degeneracy 3.
        let mut edges: Vec<(usize, usize)> = (1..=6).map(|i| (0, i)).collect();
        edges.extend((1..=6).map(|i| (i, i % 6 + 1)));
        edges.push((1, 4));
        let graph = AdjacencyGraph::from_edges(7, edges);

        let first = greedy_color(&graph);
        let second = greedy_color(&graph);
        assert!(first.is_proper(&graph));
        assert_eq!(first, second);
        assert!(first.color_count() <= 4);
    }
}
