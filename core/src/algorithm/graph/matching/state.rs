//! Solver state and control loop
//!
//! `State` owns every arena of one solve: nodes (original vertices first,
//! pseudonodes after), edges, trees and tree edges. Handles are plain indices
//! and stay valid across shrink/expand cycles; expanded pseudonodes and
//! destroyed tree edges go to free lists.
//!
//! # Lazy duals
//! A node in tree `T` labelled `+` has true dual `dual + T.eps`, a `-` node
//! `dual - T.eps`; free and inner nodes store their true dual. The true slack
//! of an edge is its stored slack minus the same offsets of both endpoints.
//! Raising `T.eps` therefore updates every dual and slack of `T` in O(1).
//! Whenever labels change, `begin_relabel` captures true values and
//! `finish_relabel` stores them back relative to the new labels.

use std::time::Instant;

use log::{debug, trace};

use super::dual::DualOutcome;
use super::edge::{Edge, EdgeIndex};
use super::error::MatchingError;
use super::node::{Label, Node, NodeIndex};
use super::options::{BlossomOptions, InitializationType};
use super::statistics::MatchingStatistics;
use super::tree::{HeapSlot, Tree, TreeEdge, TreeEdgeIndex, TreeIndex};
use crate::data_structures::priority_queue::IndexedPriorityQueue;

/// True values captured before a group of nodes changes label
#[derive(Debug, Default)]
pub(crate) struct Relabel {
    pub edges: Vec<(EdgeIndex, f64)>,
    pub duals: Vec<(NodeIndex, f64)>,
}

#[derive(Debug)]
pub(crate) struct State {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub trees: Vec<Tree>,
    pub tree_edges: Vec<Option<TreeEdge>>,
    pub vertex_count: usize,
    pub tree_count: usize,
    pub first_tree: Option<TreeIndex>,
    pub options: BlossomOptions,
    pub statistics: MatchingStatistics,
    /// Largest tree offset a solvable instance can reach
    pub eps_bound: f64,
    free_nodes: Vec<NodeIndex>,
    free_tree_edges: Vec<TreeEdgeIndex>,
    epoch: u64,
}

impl State {
    /// Builds the arenas; `edges` are `(u, v, cost)` over `0..vertex_count`
    pub fn new(vertex_count: usize, edges: &[(usize, usize, f64)], options: BlossomOptions) -> Self {
        // each tree adds its offset to the dual objective, which never
        // exceeds the cost of a perfect matching
        let total_cost: f64 = edges.iter().map(|&(_, _, cost)| cost.abs()).sum();
        let eps_bound = options.infeasibility_threshold.max(2.0 * total_cost);

        let mut state = Self {
            nodes: (0..vertex_count).map(|_| Node::vertex()).collect(),
            edges: Vec::with_capacity(edges.len()),
            trees: Vec::new(),
            tree_edges: Vec::new(),
            vertex_count,
            tree_count: 0,
            first_tree: None,
            options,
            statistics: MatchingStatistics::default(),
            eps_bound,
            free_nodes: Vec::new(),
            free_tree_edges: Vec::new(),
            epoch: 0,
        };

        for &(source, target, cost) in edges {
            let index = state.edges.len();
            state.edges.push(Edge::new(source, target, cost));
            state.link_edge(index, 0);
            state.link_edge(index, 1);
        }

        state
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INCIDENCE LISTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn link_edge(&mut self, edge: EdgeIndex, side: usize) {
        let node = self.edges[edge].head[side];
        let first = self.nodes[node].first;
        self.edges[edge].prev[side] = None;
        self.edges[edge].next[side] = first;
        if let Some(next) = first {
            let next_side = self.edges[next].side_of(node);
            self.edges[next].prev[next_side] = Some(edge);
        }
        self.nodes[node].first = Some(edge);
    }

    fn unlink_edge(&mut self, edge: EdgeIndex, side: usize) {
        let node = self.edges[edge].head[side];
        let prev = self.edges[edge].prev[side];
        let next = self.edges[edge].next[side];

        match prev {
            Some(prev) => {
                let prev_side = self.edges[prev].side_of(node);
                self.edges[prev].next[prev_side] = next;
            }
            None => self.nodes[node].first = next,
        }
        if let Some(next) = next {
            let next_side = self.edges[next].side_of(node);
            self.edges[next].prev[next_side] = prev;
        }

        self.edges[edge].prev[side] = None;
        self.edges[edge].next[side] = None;
    }

    /// Re-homes the `from` end of `edge` onto `to`
    pub fn move_edge(&mut self, edge: EdgeIndex, from: NodeIndex, to: NodeIndex) {
        let side = self.edges[edge].side_of(from);
        self.unlink_edge(edge, side);
        self.edges[edge].head[side] = to;
        self.link_edge(edge, side);
    }

    pub fn incident_edges(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut incident = Vec::new();
        let mut cursor = self.nodes[node].first;
        while let Some(edge) = cursor {
            incident.push(edge);
            let side = self.edges[edge].side_of(node);
            cursor = self.edges[edge].next[side];
        }
        incident
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LAZY DUALS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Offset between a node's true dual and its stored dual
    #[inline]
    pub fn lazy_eps(&self, node: NodeIndex) -> f64 {
        let node = &self.nodes[node];
        match (node.label, node.tree) {
            (Label::Plus, Some(tree)) => self.trees[tree].eps,
            (Label::Minus, Some(tree)) => -self.trees[tree].eps,
            _ => 0.0,
        }
    }

    #[inline]
    pub fn true_slack(&self, edge: EdgeIndex) -> f64 {
        let edge = &self.edges[edge];
        edge.slack - self.lazy_eps(edge.head[0]) - self.lazy_eps(edge.head[1])
    }

    #[inline]
    pub fn true_dual(&self, node: NodeIndex) -> f64 {
        self.nodes[node].dual + self.lazy_eps(node)
    }

    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Captures true slacks of every edge incident to `nodes` and true duals
    /// of `nodes`, pulling all of them out of their heaps
    pub fn begin_relabel(&mut self, nodes: &[NodeIndex]) -> Relabel {
        let epoch = self.next_epoch();
        let mut relabel = Relabel::default();

        for &node in nodes {
            for edge in self.incident_edges(node) {
                if self.edges[edge].epoch == epoch {
                    continue;
                }
                self.edges[edge].epoch = epoch;
                let slack = self.true_slack(edge);
                self.remove_from_heap(edge);
                relabel.edges.push((edge, slack));
            }
            relabel.duals.push((node, self.true_dual(node)));
            if let Some(tree) = self.nodes[node].tree {
                self.trees[tree].minus_blossoms.remove(node);
            }
        }

        relabel
    }

    /// Stores captured true values relative to the current labels and
    /// files every edge into the heap its new endpoints call for
    pub fn finish_relabel(&mut self, relabel: Relabel) {
        for (node, dual) in relabel.duals {
            self.nodes[node].dual = dual - self.lazy_eps(node);
            self.insert_minus_blossom(node);
        }
        for (edge, slack) in relabel.edges {
            let [a, b] = self.edges[edge].head;
            self.edges[edge].slack = slack + self.lazy_eps(a) + self.lazy_eps(b);
            self.classify_edge(edge);
        }
    }

    fn insert_minus_blossom(&mut self, node: NodeIndex) {
        let entry = &self.nodes[node];
        if !(entry.is_blossom && entry.is_outer && entry.is_minus()) {
            return;
        }
        if let Some(tree) = entry.tree {
            let key = entry.dual;
            self.trees[tree].minus_blossoms.insert(node, key);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HEAP BOOKKEEPING
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn tree_edge(&self, index: TreeEdgeIndex) -> &TreeEdge {
        match &self.tree_edges[index] {
            Some(tree_edge) => tree_edge,
            None => panic!("tree edge {} used after destruction", index),
        }
    }

    fn tree_edge_mut(&mut self, index: TreeEdgeIndex) -> &mut TreeEdge {
        match &mut self.tree_edges[index] {
            Some(tree_edge) => tree_edge,
            None => panic!("tree edge {} used after destruction", index),
        }
    }

    /// Tree edge linking `a` and `b`, created on first use
    pub fn tree_edge_between(&mut self, a: TreeIndex, b: TreeIndex) -> TreeEdgeIndex {
        if let Some(&index) = self.trees[a].neighbours.get(&b) {
            return index;
        }

        let tree_edge = TreeEdge::new(a, b);
        let index = match self.free_tree_edges.pop() {
            Some(index) => {
                self.tree_edges[index] = Some(tree_edge);
                index
            }
            None => {
                self.tree_edges.push(Some(tree_edge));
                self.tree_edges.len() - 1
            }
        };
        self.trees[a].neighbours.insert(b, index);
        self.trees[b].neighbours.insert(a, index);
        index
    }

    fn heap_mut(&mut self, slot: HeapSlot) -> &mut IndexedPriorityQueue {
        match slot {
            HeapSlot::PlusInfinity(tree) => &mut self.trees[tree].plus_infinity_edges,
            HeapSlot::PlusPlus(tree) => &mut self.trees[tree].plus_plus_edges,
            HeapSlot::CrossPlusPlus(tree_edge) => &mut self.tree_edge_mut(tree_edge).plus_plus_edges,
            HeapSlot::CrossPlusMinus(tree_edge, side) => &mut self.tree_edge_mut(tree_edge).plus_minus_edges[side],
        }
    }

    pub fn remove_from_heap(&mut self, edge: EdgeIndex) {
        if let Some(slot) = self.edges[edge].heap.take() {
            let removed = self.heap_mut(slot).remove(edge);
            assert!(removed.is_some(), "edge {} was not in the heap it claimed ({:?})", edge, slot);
        }
    }

    /// Files `edge` into the heap matching its endpoints' labels, if any
    pub fn classify_edge(&mut self, edge: EdgeIndex) {
        debug_assert!(self.edges[edge].heap.is_none());
        let [a, b] = self.edges[edge].head;
        let (outer_a, label_a, tree_a) = (self.nodes[a].is_outer, self.nodes[a].label, self.nodes[a].tree);
        let (outer_b, label_b, tree_b) = (self.nodes[b].is_outer, self.nodes[b].label, self.nodes[b].tree);
        if !(outer_a && outer_b) {
            return;
        }

        let slot = match (label_a, tree_a, label_b, tree_b) {
            (Label::Plus, Some(ta), Label::Plus, Some(tb)) if ta == tb => HeapSlot::PlusPlus(ta),
            (Label::Plus, Some(ta), Label::Plus, Some(tb)) => HeapSlot::CrossPlusPlus(self.tree_edge_between(ta, tb)),
            (Label::Plus, Some(ta), Label::Infinity, None) => HeapSlot::PlusInfinity(ta),
            (Label::Infinity, None, Label::Plus, Some(tb)) => HeapSlot::PlusInfinity(tb),
            (Label::Plus, Some(plus), Label::Minus, Some(minus)) | (Label::Minus, Some(minus), Label::Plus, Some(plus))
                if plus != minus =>
            {
                let tree_edge = self.tree_edge_between(plus, minus);
                HeapSlot::CrossPlusMinus(tree_edge, self.tree_edge(tree_edge).side_of(plus))
            }
            _ => return,
        };

        let key = self.edges[edge].slack;
        self.heap_mut(slot).insert(edge, key);
        self.edges[edge].heap = Some(slot);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FOREST
    // ═══════════════════════════════════════════════════════════════════════════

    fn push_tree(&mut self, root: NodeIndex) -> TreeIndex {
        let index = self.trees.len();
        let mut tree = Tree::new(root);
        tree.next = self.first_tree;
        if let Some(first) = self.first_tree {
            self.trees[first].prev = Some(index);
        }
        self.trees.push(tree);
        self.first_tree = Some(index);
        self.tree_count += 1;
        index
    }

    /// Live trees in forest-list order
    pub fn live_trees(&self) -> Vec<TreeIndex> {
        let mut trees = Vec::with_capacity(self.tree_count);
        let mut cursor = self.first_tree;
        while let Some(tree) = cursor {
            trees.push(tree);
            cursor = self.trees[tree].next;
        }
        trees
    }

    /// Unlinks a tree whose nodes have all left it, with its tree edges
    pub fn destroy_tree(&mut self, tree: TreeIndex) {
        let neighbours = std::mem::take(&mut self.trees[tree].neighbours);
        for (other, tree_edge) in neighbours {
            self.trees[other].neighbours.remove(&tree);
            if let Some(removed) = self.tree_edges[tree_edge].take() {
                assert!(removed.heaps_are_empty(), "tree edge {} destroyed with queued edges", tree_edge);
                self.free_tree_edges.push(tree_edge);
            }
        }
        assert!(self.trees[tree].heaps_are_empty(), "tree {} destroyed with queued edges", tree);

        let (prev, next) = (self.trees[tree].prev, self.trees[tree].next);
        match prev {
            Some(prev) => self.trees[prev].next = next,
            None => self.first_tree = next,
        }
        if let Some(next) = next {
            self.trees[next].prev = prev;
        }

        let entry = &mut self.trees[tree];
        entry.prev = None;
        entry.next = None;
        entry.alive = false;
        self.tree_count -= 1;
    }

    /// Every node of `tree`, root first
    pub fn tree_nodes(&self, tree: TreeIndex) -> Vec<NodeIndex> {
        let mut nodes = vec![self.trees[tree].root];
        let mut cursor = 0;
        while cursor < nodes.len() {
            let node = nodes[cursor];
            nodes.extend(self.nodes[node].tree_children.iter().copied());
            cursor += 1;
        }
        nodes
    }

    pub fn tree_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.nodes[node].parent_edge.map(|edge| self.edges[edge].opposite(node))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BLOSSOM NODES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn alloc_blossom(&mut self) -> NodeIndex {
        match self.free_nodes.pop() {
            Some(index) => {
                self.nodes[index] = Node::blossom();
                index
            }
            None => {
                self.nodes.push(Node::blossom());
                self.nodes.len() - 1
            }
        }
    }

    pub fn release_node(&mut self, node: NodeIndex) {
        assert!(self.nodes[node].first.is_none(), "released node {} still has edges", node);
        self.nodes[node] = Node {
            alive: false,
            ..Node::blossom()
        };
        self.free_nodes.push(node);
    }

    /// Child of `blossom` whose subtree holds the original vertex `vertex`
    pub fn child_containing(&self, blossom: NodeIndex, vertex: NodeIndex) -> NodeIndex {
        let mut node = vertex;
        loop {
            match self.nodes[node].blossom_parent {
                Some(parent) if parent == blossom => return node,
                Some(parent) => node = parent,
                None => panic!("vertex {} does not lie inside blossom {}", vertex, blossom),
            }
        }
    }

    pub fn blossom_contains(&self, blossom: NodeIndex, vertex: NodeIndex) -> bool {
        let mut node = vertex;
        while let Some(parent) = self.nodes[node].blossom_parent {
            if parent == blossom {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Puts `base` first in the cycle of `blossom` and rebuilds the matching
    /// of the cycle around it; returns the new cycle order
    pub fn rotate_blossom(&mut self, blossom: NodeIndex, base: NodeIndex) -> Vec<NodeIndex> {
        let children = &self.nodes[blossom].blossom_children;
        let offset = match children.iter().position(|&child| child == base) {
            Some(offset) => offset,
            None => panic!("node {} is not a child of blossom {}", base, blossom),
        };
        let cycle: Vec<NodeIndex> = children[offset..].iter().chain(children[..offset].iter()).copied().collect();

        self.nodes[cycle[0]].matched = self.nodes[blossom].matched;
        for i in (1..cycle.len()).step_by(2) {
            let sibling = self.blossom_sibling(cycle[i]);
            self.nodes[cycle[i]].matched = Some(sibling);
            self.nodes[cycle[i + 1]].matched = Some(sibling);
        }

        self.nodes[blossom].blossom_children = cycle.clone();
        cycle
    }

    pub fn blossom_sibling(&self, node: NodeIndex) -> EdgeIndex {
        match self.nodes[node].blossom_sibling {
            Some(edge) => edge,
            None => panic!("blossom child {} has no cycle edge", node),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INITIALIZATION AND CONTROL LOOP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Sets up duals, trees and heaps
    pub fn initialize(&mut self) {
        if self.options.initialization == InitializationType::Greedy {
            self.greedy_initialization();
        }

        for node in 0..self.vertex_count {
            if self.nodes[node].matched.is_none() {
                let tree = self.push_tree(node);
                let entry = &mut self.nodes[node];
                entry.label = Label::Plus;
                entry.tree = Some(tree);
                entry.is_tree_root = true;
            }
        }

        // every eps is still zero, so stored values already are true values
        for edge in 0..self.edges.len() {
            self.classify_edge(edge);
        }

        self.statistics.initial_trees = self.tree_count;
        debug!(
            "initialized {} vertices, {} edges: {} trees, {} vertices matched greedily",
            self.vertex_count,
            self.edges.len(),
            self.tree_count,
            self.statistics.greedy_matched
        );
    }

    fn greedy_initialization(&mut self) {
        for node in 0..self.vertex_count {
            let min_cost = self
                .incident_edges(node)
                .into_iter()
                .map(|edge| self.edges[edge].cost)
                .fold(f64::INFINITY, f64::min);
            self.nodes[node].dual = if min_cost.is_finite() { min_cost / 2.0 } else { 0.0 };
        }
        for edge in 0..self.edges.len() {
            let [a, b] = self.edges[edge].head;
            self.edges[edge].slack = self.edges[edge].cost - self.nodes[a].dual - self.nodes[b].dual;
        }

        let tolerance = self.options.epsilon;
        for node in 0..self.vertex_count {
            if self.nodes[node].matched.is_some() {
                continue;
            }
            let incident = self.incident_edges(node);
            let Some(min_slack) = incident.iter().map(|&edge| self.edges[edge].slack).min_by(f64::total_cmp) else {
                continue;
            };

            self.nodes[node].dual += min_slack;
            for &edge in &incident {
                self.edges[edge].slack -= min_slack;
            }

            let tight = incident.iter().copied().find(|&edge| {
                let other = self.edges[edge].opposite(node);
                self.edges[edge].slack <= tolerance && self.nodes[other].matched.is_none()
            });
            if let Some(edge) = tight {
                let other = self.edges[edge].opposite(node);
                self.nodes[node].matched = Some(edge);
                self.nodes[other].matched = Some(edge);
                self.statistics.greedy_matched += 2;
            }
        }
    }

    /// Alternates primal passes and dual updates until every tree is gone
    pub fn run(&mut self) -> Result<(), MatchingError> {
        let mut iteration = 0usize;
        loop {
            let operations = self.statistics.primal_operations();
            let started = Instant::now();
            self.primal_pass()?;
            self.statistics.primal_time += started.elapsed();

            if self.tree_count == 0 {
                debug!("all vertices matched after {} iterations", iteration);
                return Ok(());
            }

            let started = Instant::now();
            let idle = self.statistics.primal_operations() == operations;
            let progressed = self.update_duals_with_fallback(idle)?;
            self.statistics.dual_time += started.elapsed();

            // a late augmentation can leave tight edges on trees the pass
            // already visited; only a pass without operations is conclusive
            if !progressed && idle {
                return Err(MatchingError::NoPerfectMatching {
                    reason: format!("dual updates stalled with {} trees left", self.tree_count),
                });
            }
            iteration += 1;
            trace!("iteration {}: {} trees left", iteration, self.tree_count);
        }
    }

    /// Runs every live tree through its primal operations
    fn primal_pass(&mut self) -> Result<(), MatchingError> {
        for tree in self.live_trees() {
            if !self.trees[tree].alive {
                continue;
            }
            if self.options.update_duals_before && self.update_duals_single(tree)? == DualOutcome::Augmented {
                continue;
            }

            self.process_tree(tree);

            if self.options.update_duals_after {
                while self.trees[tree].alive && self.update_duals_single(tree)? == DualOutcome::Raised {
                    self.process_tree(tree);
                }
            }
        }
        Ok(())
    }

    /// Applies tight-edge operations to `tree` until none is left:
    /// augment, then grow, shrink and expand
    fn process_tree(&mut self, tree: TreeIndex) {
        let tolerance = self.options.epsilon;
        while self.trees[tree].alive {
            if let Some(edge) = self.tight_cross_plus_plus_edge(tree) {
                self.augment(edge);
                return;
            }

            let eps = self.trees[tree].eps;
            if let Some((edge, slack)) = self.trees[tree].plus_infinity_edges.peek() {
                if slack - eps <= tolerance {
                    self.grow(edge);
                    continue;
                }
            }
            if let Some((edge, slack)) = self.trees[tree].plus_plus_edges.peek() {
                if slack - 2.0 * eps <= tolerance {
                    self.shrink(edge);
                    continue;
                }
            }
            if let Some((blossom, dual)) = self.trees[tree].minus_blossoms.peek() {
                if dual - eps <= tolerance {
                    self.expand(blossom);
                    continue;
                }
            }
            return;
        }
    }

    fn tight_cross_plus_plus_edge(&self, tree: TreeIndex) -> Option<EdgeIndex> {
        let tolerance = self.options.epsilon;
        self.trees[tree].neighbours.values().find_map(|&tree_edge| {
            self.tree_edge(tree_edge)
                .plus_plus_edges
                .peek()
                .map(|(edge, _)| edge)
                .filter(|&edge| self.true_slack(edge) <= tolerance)
        })
    }
}
