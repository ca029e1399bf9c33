//! Edges of the contracted graph
//!
//! Side `i` of an edge is the endpoint `head[i]`; the edge sits in that
//! node's incidence list through `prev[i]`/`next[i]`. Sides never swap, so
//! `head_original[i]` is always the original vertex lying inside `head[i]`.

use super::node::NodeIndex;
use super::tree::HeapSlot;

pub(crate) type EdgeIndex = usize;

#[derive(Debug, Clone)]
pub(crate) struct Edge {
    /// Stored slack; see `State::true_slack`
    pub slack: f64,
    /// Cost the solver minimises (already transformed for maximisation)
    pub cost: f64,
    /// Current endpoints
    pub head: [NodeIndex; 2],
    /// Original vertices, fixed for the edge's lifetime
    pub head_original: [NodeIndex; 2],
    pub prev: [Option<EdgeIndex>; 2],
    pub next: [Option<EdgeIndex>; 2],
    /// Heap currently holding the edge
    pub heap: Option<HeapSlot>,
    pub epoch: u64,
}

impl Edge {
    pub fn new(source: NodeIndex, target: NodeIndex, cost: f64) -> Self {
        Self {
            slack: cost,
            cost,
            head: [source, target],
            head_original: [source, target],
            prev: [None, None],
            next: [None, None],
            heap: None,
            epoch: 0,
        }
    }

    /// Side on which `node` is attached
    #[inline]
    pub fn side_of(&self, node: NodeIndex) -> usize {
        if self.head[0] == node {
            0
        } else {
            debug_assert_eq!(self.head[1], node, "node is not an endpoint of this edge");
            1
        }
    }

    #[inline]
    pub fn opposite(&self, node: NodeIndex) -> NodeIndex {
        self.head[1 - self.side_of(node)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sides() {
        let edge = Edge::new(4, 9, 2.0);
        assert_eq!(edge.side_of(4), 0);
        assert_eq!(edge.side_of(9), 1);
        assert_eq!(edge.opposite(4), 9);
        assert_eq!(edge.opposite(9), 4);
        assert_eq!(edge.slack, edge.cost);
    }
}
