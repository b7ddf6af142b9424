//! "Shares a border with" graph over regions.
//!
//! Two regions are adjacent when their geometries *touch*: boundaries
//! intersect and interiors do not (DE-9IM `FT*******`, `F**T*****` or
//! `F***T****`). Node `i` of the graph is the region at position `i` of the
//! input slice.

use geo::{MultiPolygon, Relate};
use log::{debug, info};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::{RTree, RTreeObject, AABB};

use crate::error::GeometryError;
use crate::region::{Region, RegionId};

/// How candidate pairs are chosen before the exact touches test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdjacencyStrategy {
    /// Test every unordered pair.
    Naive,
    /// Only test pairs whose bounding boxes intersect (R-tree prefilter).
    #[default]
    Indexed,
}

/// Undirected simple graph; nodes are region indices.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    graph: UnGraph<RegionId, ()>,
}

impl AdjacencyGraph {
    /// A graph with `node_count` isolated nodes.
    pub fn with_nodes(node_count: usize) -> Self {
        let mut graph = UnGraph::with_capacity(node_count, node_count * 3);
        for i in 0..node_count {
            graph.add_node(RegionId(i));
        }
        Self { graph }
    }

    /// Build an abstract graph from an edge list.
    ///
    /// Self loops are dropped and duplicate edges collapse. An endpoint outside
    /// `0..node_count` is a caller bug and panics.
    pub fn from_edges(node_count: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut graph = Self::with_nodes(node_count);
        for (a, b) in edges {
            assert!(
                a < node_count && b < node_count,
                "edge ({a}, {b}) out of range for {node_count} nodes"
            );
            graph.add_edge(a, b);
        }
        graph
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.graph
            .update_edge(NodeIndex::new(a), NodeIndex::new(b), ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn region(&self, node: usize) -> RegionId {
        self.graph[NodeIndex::new(node)]
    }

    /// Neighbours of `node`, ascending.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(node))
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn degree(&self, node: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(node)).count()
    }

    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        a < self.node_count()
            && b < self.node_count()
            && self
                .graph
                .find_edge(NodeIndex::new(a), NodeIndex::new(b))
                .is_some()
    }

    /// Every edge once as `(low, high)`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = self
            .graph
            .edge_references()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b))
            })
            .collect();
        out.sort_unstable();
        out
    }
}

#[derive(Clone)]
struct RegionBox {
    idx: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for RegionBox {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// All unordered pairs `(i, j)` with `i < j`.
fn naive_candidates(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect()
}

/// Pairs whose envelopes intersect, boundary contact included.
fn indexed_candidates(regions: &[Region]) -> Vec<(usize, usize)> {
    let boxes: Vec<RegionBox> = regions
        .iter()
        .enumerate()
        .filter_map(|(idx, region)| {
            let rect = region.geometry().bounding_rect()?;
            Some(RegionBox {
                idx,
                env: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            })
        })
        .collect();

    let tree = RTree::bulk_load(boxes.clone());

    let mut pairs = Vec::new();
    for b in &boxes {
        for other in tree.locate_in_envelope_intersecting(&b.env) {
            if other.idx > b.idx {
                pairs.push((b.idx, other.idx));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

#[inline]
fn touches(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.relate(b).is_touches()
}

/// Build the adjacency graph for `regions`.
///
/// Every geometry is validated first, so a degenerate shape fails the whole
/// build instead of quietly losing its edges.
pub fn build_adjacency(
    regions: &[Region],
    strategy: AdjacencyStrategy,
) -> Result<AdjacencyGraph, GeometryError> {
    for region in regions {
        region.geometry().validate(region.id(), region.name())?;
    }

    let shapes: Vec<MultiPolygon<f64>> = regions
        .iter()
        .map(|r| r.geometry().to_multi_polygon())
        .collect();

    let candidates = match strategy {
        AdjacencyStrategy::Naive => naive_candidates(regions.len()),
        AdjacencyStrategy::Indexed => indexed_candidates(regions),
    };
    debug!(
        "{:?} adjacency: {} candidate pairs for {} regions",
        strategy,
        candidates.len(),
        regions.len()
    );

    let mut graph = AdjacencyGraph::with_nodes(regions.len());
    for (idx, region) in regions.iter().enumerate() {
        graph.graph[NodeIndex::new(idx)] = region.id();
    }

    for (i, j) in candidates {
        if touches(&shapes[i], &shapes[j]) {
            graph.add_edge(i, j);
        }
    }

    info!(
        "Adjacency graph: {} regions, {} shared borders",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Continent, RegionGeometry};
    use geo::{polygon, LineString, Polygon};

    fn square(x: f64, y: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
        ]
    }

    fn region(idx: usize, geometry: impl Into<RegionGeometry>) -> Region {
        Region::new(RegionId(idx), format!("r{idx}"), Continent::Europe, geometry)
    }

    /// 3x3 grid of unit squares plus one overlapping and one far-away square.
    fn sample_regions() -> Vec<Region> {
        let mut out = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                out.push(region(out.len(), square(col as f64, row as f64)));
            }
        }
        // Overlaps the centre square: shares interior, so it does not touch it.
        out.push(region(out.len(), square(1.5, 1.5)));
        out.push(region(out.len(), square(10.0, 10.0)));
        out
    }

    fn assert_simple_undirected(graph: &AdjacencyGraph) {
        for (a, b) in graph.edges() {
            assert_ne!(a, b, "self loop");
            assert!(graph.contains_edge(a, b));
            assert!(graph.contains_edge(b, a));
        }
        let edges = graph.edges();
        let mut dedup = edges.clone();
        dedup.dedup();
        assert_eq!(edges, dedup, "parallel edge");
    }

    #[test]
    fn side_and_corner_contacts_are_edges() {
        let regions = vec![region(0, square(0.0, 0.0)), region(1, square(1.0, 0.0)), region(2, square(2.0, 1.0))];
        let graph = build_adjacency(&regions, AdjacencyStrategy::Indexed).unwrap();

        assert!(graph.contains_edge(0, 1), "shared side");
        assert!(graph.contains_edge(1, 2), "shared corner");
        assert!(!graph.contains_edge(0, 2));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn overlapping_regions_do_not_touch() {
        let regions = vec![region(0, square(0.0, 0.0)), region(1, square(0.5, 0.5))];
        let graph = build_adjacency(&regions, AdjacencyStrategy::Naive).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn strategies_agree() {
        let regions = sample_regions();
        let naive = build_adjacency(&regions, AdjacencyStrategy::Naive).unwrap();
        let indexed = build_adjacency(&regions, AdjacencyStrategy::Indexed).unwrap();

        assert_eq!(naive.edges(), indexed.edges());
        assert_simple_undirected(&naive);
        assert_simple_undirected(&indexed);

        // The far square is isolated.
        assert_eq!(indexed.degree(10), 0);
        // Centre square (index 4) touches its 8 grid neighbours but not the overlapping one.
        assert_eq!(indexed.neighbors(4), vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn multipolygon_parts_contribute_edges() {
        let split = RegionGeometry::from_parts(vec![square(0.0, 0.0), square(5.0, 0.0)]);
        let regions = vec![region(0, split), region(1, square(6.0, 0.0)), region(2, square(-1.0, 0.0))];
        let graph = build_adjacency(&regions, AdjacencyStrategy::Indexed).unwrap();

        assert_eq!(graph.edges(), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn degenerate_geometry_fails_the_build() {
        let regions = vec![
            region(0, square(0.0, 0.0)),
            region(1, Polygon::new(LineString::from(vec![(1.0, 0.0), (1.0, 1.0)]), vec![])),
        ];
        let err = build_adjacency(&regions, AdjacencyStrategy::Indexed).unwrap_err();
        assert!(matches!(err, GeometryError::RingTooShort { region: RegionId(1), .. }));
    }

    #[test]
    fn from_edges_collapses_duplicates_and_loops() {
        let graph = AdjacencyGraph::from_edges(3, [(0, 1), (1, 0), (2, 2), (1, 2)]);
        assert_eq!(graph.edges(), vec![(0, 1), (1, 2)]);
        assert_eq!(graph.degree(1), 2);
        assert_eq!(graph.region(2), RegionId(2));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn from_edges_rejects_unknown_nodes() {
        AdjacencyGraph::from_edges(2, [(0, 5)]);
    }
}
