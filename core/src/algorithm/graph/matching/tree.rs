//! Alternating trees and the edges between them
//!
//! Heap contents by owner (keys are stored values, never true values):
//!
//! | heap                         | members                                  | key          |
//! |------------------------------|------------------------------------------|--------------|
//! | `Tree::plus_infinity_edges`  | `+` node of the tree to a free node      | stored slack |
//! | `Tree::plus_plus_edges`      | both endpoints `+` in the tree           | stored slack |
//! | `Tree::minus_blossoms`       | `-` blossoms of the tree                 | stored dual  |
//! | `TreeEdge::plus_plus_edges`  | `+` in one tree, `+` in the other        | stored slack |
//! | `TreeEdge::plus_minus_edges[i]` | `+` in `trees[i]`, `-` in the other   | stored slack |

use std::collections::BTreeMap;

use crate::data_structures::priority_queue::IndexedPriorityQueue;

use super::node::NodeIndex;

pub(crate) type TreeIndex = usize;
pub(crate) type TreeEdgeIndex = usize;

/// Which heap an edge currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeapSlot {
    PlusInfinity(TreeIndex),
    PlusPlus(TreeIndex),
    CrossPlusPlus(TreeEdgeIndex),
    CrossPlusMinus(TreeEdgeIndex, usize),
}

#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub root: NodeIndex,
    /// Dual offset of every node in the tree, never decreases
    pub eps: f64,
    /// Increment staged by a dual update before commit
    pub accumulated_eps: f64,
    pub plus_infinity_edges: IndexedPriorityQueue,
    pub plus_plus_edges: IndexedPriorityQueue,
    pub minus_blossoms: IndexedPriorityQueue,
    /// Adjacent trees
    pub neighbours: BTreeMap<TreeIndex, TreeEdgeIndex>,
    /// Links of the forest list
    pub prev: Option<TreeIndex>,
    pub next: Option<TreeIndex>,
    pub alive: bool,
}

impl Tree {
    pub fn new(root: NodeIndex) -> Self {
        Self {
            root,
            eps: 0.0,
            accumulated_eps: 0.0,
            plus_infinity_edges: IndexedPriorityQueue::new(),
            plus_plus_edges: IndexedPriorityQueue::new(),
            minus_blossoms: IndexedPriorityQueue::new(),
            neighbours: BTreeMap::new(),
            prev: None,
            next: None,
            alive: true,
        }
    }

    pub fn heaps_are_empty(&self) -> bool {
        self.plus_infinity_edges.is_empty() && self.plus_plus_edges.is_empty() && self.minus_blossoms.is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TreeEdge {
    pub trees: [TreeIndex; 2],
    pub plus_plus_edges: IndexedPriorityQueue,
    pub plus_minus_edges: [IndexedPriorityQueue; 2],
}

impl TreeEdge {
    pub fn new(first: TreeIndex, second: TreeIndex) -> Self {
        Self {
            trees: [first, second],
            plus_plus_edges: IndexedPriorityQueue::new(),
            plus_minus_edges: [IndexedPriorityQueue::new(), IndexedPriorityQueue::new()],
        }
    }

    #[inline]
    pub fn side_of(&self, tree: TreeIndex) -> usize {
        if self.trees[0] == tree {
            0
        } else {
            debug_assert_eq!(self.trees[1], tree, "tree is not an end of this tree edge");
            1
        }
    }

    pub fn heaps_are_empty(&self) -> bool {
        self.plus_plus_edges.is_empty() && self.plus_minus_edges.iter().all(|heap| heap.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_edge_sides() {
        let tree_edge = TreeEdge::new(2, 5);
        assert_eq!(tree_edge.side_of(2), 0);
        assert_eq!(tree_edge.side_of(5), 1);
        assert!(tree_edge.heaps_are_empty());
    }

    #[test]
    fn test_new_tree() {
        let tree = Tree::new(11);
        assert_eq!(tree.root, 11);
        assert_eq!(tree.eps, 0.0);
        assert!(tree.alive);
        assert!(tree.heaps_are_empty());
    }
}
