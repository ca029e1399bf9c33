//! Nodes of the contracted graph
//!
//! A node is either an original vertex or a blossom pseudonode. All links are
//! arena handles: tree parent through the parent edge, incidence list through
//! `first` plus the per-edge `prev`/`next` links, blossom structure through
//! `blossom_parent`, `blossom_sibling` and `blossom_children`.

use serde::{Deserialize, Serialize};

use super::edge::EdgeIndex;
use super::tree::TreeIndex;

pub(crate) type NodeIndex = usize;

/// Alternating-tree label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Even distance from the tree root
    Plus,
    /// Odd distance from the tree root
    Minus,
    /// Not in any tree
    Infinity,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Stored dual; the true value adds the owning tree's lazy offset
    pub dual: f64,
    pub label: Label,
    pub tree: Option<TreeIndex>,

    /// False while contracted inside a blossom
    pub is_outer: bool,
    pub is_blossom: bool,
    pub is_tree_root: bool,

    /// Head of the incidence list
    pub first: Option<EdgeIndex>,
    pub matched: Option<EdgeIndex>,

    /// Edge towards the tree parent
    pub parent_edge: Option<EdgeIndex>,
    pub tree_children: Vec<NodeIndex>,

    pub blossom_parent: Option<NodeIndex>,
    /// Cycle edge to the next child of the enclosing blossom
    pub blossom_sibling: Option<EdgeIndex>,
    /// Cycle order, base first
    pub blossom_children: Vec<NodeIndex>,

    /// Visit marker compared against the solver's epoch counter
    pub epoch: u64,
    /// Slot in use (expanded blossoms are recycled)
    pub alive: bool,
}

impl Node {
    /// Fresh free vertex
    pub fn vertex() -> Self {
        Self {
            dual: 0.0,
            label: Label::Infinity,
            tree: None,
            is_outer: true,
            is_blossom: false,
            is_tree_root: false,
            first: None,
            matched: None,
            parent_edge: None,
            tree_children: Vec::new(),
            blossom_parent: None,
            blossom_sibling: None,
            blossom_children: Vec::new(),
            epoch: 0,
            alive: true,
        }
    }

    /// Empty pseudonode, filled in by shrink
    pub fn blossom() -> Self {
        Self {
            is_blossom: true,
            ..Self::vertex()
        }
    }

    #[inline]
    pub fn is_plus(&self) -> bool {
        self.label == Label::Plus
    }

    #[inline]
    pub fn is_minus(&self) -> bool {
        self.label == Label::Minus
    }

    /// Outer node outside every tree
    #[inline]
    pub fn is_free(&self) -> bool {
        self.is_outer && self.tree.is_none()
    }

    /// Forgets tree membership and tree links
    pub fn leave_tree(&mut self) {
        self.label = Label::Infinity;
        self.tree = None;
        self.is_tree_root = false;
        self.parent_edge = None;
        self.tree_children.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vertex_is_free() {
        let node = Node::vertex();
        assert!(node.is_free());
        assert!(!node.is_blossom);
        assert_eq!(node.label, Label::Infinity);
    }

    #[test]
    fn test_leave_tree_resets_links() {
        let mut node = Node::blossom();
        node.label = Label::Minus;
        node.tree = Some(3);
        node.parent_edge = Some(7);
        node.tree_children.push(4);
        node.is_tree_root = true;

        node.leave_tree();
        assert!(node.is_free());
        assert!(node.is_blossom);
        assert!(node.tree_children.is_empty());
        assert_eq!(node.parent_edge, None);
    }
}
