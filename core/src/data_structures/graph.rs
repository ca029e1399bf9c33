//! Weighted undirected graph used as input to the matching engine
//!
//! The matching core only needs to enumerate vertices and weighted edges, so
//! the boundary is the [`WeightedGraph`] trait. [`Graph`] is the edge-list
//! implementation shipped with the crate; external graph types can implement
//! the trait directly.
//!
//! Edges are addressed by their insertion index, which is also the handle
//! reported back in a matching result. Parallel edges are allowed.

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AlgorithmError, NodeId};

/// Edge weight
pub type Weight = f64;

/// Read-only view of an edge-weighted undirected graph
pub trait WeightedGraph {
    /// Number of vertices; vertices are `0..vertex_count()`
    fn vertex_count(&self) -> usize;

    /// Number of edges; edges are `0..edge_count()`
    fn edge_count(&self) -> usize;

    /// Endpoints of edge `edge`
    fn edge_endpoints(&self, edge: usize) -> (NodeId, NodeId);

    /// Weight of edge `edge`
    fn edge_weight(&self, edge: usize) -> Weight;
}

/// Undirected weighted edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Weight,
}

impl Edge {
    #[inline]
    pub fn new(source: NodeId, target: NodeId, weight: Weight) -> Self {
        Self { source, target, weight }
    }

    /// Endpoint opposite to `node`
    #[inline]
    pub fn opposite(&self, node: NodeId) -> NodeId {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Edge-list graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    node_count: usize,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with `node_count` isolated vertices
    pub fn with_nodes(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
        }
    }

    /// Adds a vertex and returns its identifier
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.node_count);
        self.node_count += 1;
        id
    }

    /// Adds an undirected edge and returns its index.
    ///
    /// Only the endpoints are checked here; weight and self-loop rules belong
    /// to the algorithm consuming the graph.
    pub fn add_edge(&mut self, source: usize, target: usize, weight: Weight) -> Result<usize, AlgorithmError> {
        for endpoint in [source, target] {
            if endpoint >= self.node_count {
                return Err(AlgorithmError::InvalidNode(NodeId(endpoint)));
            }
        }
        self.edges.push(Edge::new(NodeId(source), NodeId(target), weight));
        Ok(self.edges.len() - 1)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn get_edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    /// Indices of the edges touching `node`
    pub fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, edge)| edge.source == node || edge.target == node)
            .map(|(index, _)| index)
    }
}

impl WeightedGraph for Graph {
    fn vertex_count(&self) -> usize {
        self.node_count
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge_endpoints(&self, edge: usize) -> (NodeId, NodeId) {
        let edge = &self.edges[edge];
        (edge.source, edge.target)
    }

    fn edge_weight(&self, edge: usize) -> Weight {
        self.edges[edge].weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_construction() {
        let mut graph = Graph::with_nodes(3);
        let fourth = graph.add_node();
        assert_eq!(fourth, NodeId(3));

        let index = graph.add_edge(0, 3, 2.5).unwrap();
        assert_eq!(index, 0);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get_edge(0).unwrap().opposite(NodeId(0)), NodeId(3));
        assert_eq!(graph.incident_edges(NodeId(3)).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_edge_endpoint_validation() {
        let mut graph = Graph::with_nodes(2);
        assert!(matches!(graph.add_edge(0, 2, 1.0), Err(AlgorithmError::InvalidNode(NodeId(2)))));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_weighted_graph_view() {
        let mut graph = Graph::with_nodes(2);
        graph.add_edge(1, 0, 4.0).unwrap();

        let view: &dyn WeightedGraph = &graph;
        assert_eq!(view.vertex_count(), 2);
        assert_eq!(view.edge_endpoints(0), (NodeId(1), NodeId(0)));
        assert_eq!(view.edge_weight(0), 4.0);
    }
}
