//! Primal operations: grow, augment, shrink and expand
//!
//! Every operation follows the same pattern: capture true values of the
//! nodes whose labels change (`begin_relabel`), rewire the structure, then
//! store the values back and refile the touched edges (`finish_relabel`).

use log::trace;

use super::edge::EdgeIndex;
use super::node::{Label, NodeIndex};
use super::state::State;

impl State {
    /// Adds the free endpoint of `edge` and its mate to the tree of the
    /// `+` endpoint
    pub fn grow(&mut self, edge: EdgeIndex) {
        let [a, b] = self.edges[edge].head;
        let (parent, child) = if self.nodes[a].is_plus() && self.nodes[b].is_free() { (a, b) } else { (b, a) };
        let tree = self.tree_of(parent);
        let matched = match self.nodes[child].matched {
            Some(matched) => matched,
            None => panic!("free node {} is not matched", child),
        };
        let grandchild = self.edges[matched].opposite(child);

        let relabel = self.begin_relabel(&[child, grandchild]);

        let minus = &mut self.nodes[child];
        minus.label = Label::Minus;
        minus.tree = Some(tree);
        minus.parent_edge = Some(edge);
        minus.tree_children = vec![grandchild];

        let plus = &mut self.nodes[grandchild];
        plus.label = Label::Plus;
        plus.tree = Some(tree);
        plus.parent_edge = Some(matched);
        plus.tree_children.clear();

        self.nodes[parent].tree_children.push(child);
        self.finish_relabel(relabel);

        self.statistics.grow_count += 1;
        trace!("grow: {} -> {} -> {} in tree {}", parent, child, grandchild, tree);
    }

    /// Flips both root paths through the tight `+`/`+` edge `edge` and
    /// dissolves the two trees
    pub fn augment(&mut self, edge: EdgeIndex) {
        let [a, b] = self.edges[edge].head;
        let (tree_a, tree_b) = (self.tree_of(a), self.tree_of(b));
        debug_assert_ne!(tree_a, tree_b);

        let mut members = self.tree_nodes(tree_a);
        members.extend(self.tree_nodes(tree_b));
        let relabel = self.begin_relabel(&members);

        self.augment_branch(a, edge);
        self.augment_branch(b, edge);
        for &node in &members {
            self.nodes[node].leave_tree();
        }
        self.finish_relabel(relabel);

        self.destroy_tree(tree_a);
        self.destroy_tree(tree_b);

        self.statistics.augment_count += 1;
        trace!("augment: trees {} and {} through edge {}, {} trees left", tree_a, tree_b, edge, self.tree_count);
    }

    fn augment_branch(&mut self, start: NodeIndex, edge: EdgeIndex) {
        let mut node = start;
        let mut incoming = edge;
        // a `+` node is matched towards its `-` parent; the root is unmatched
        while let Some(previous) = self.nodes[node].matched.replace(incoming) {
            let minus = self.edges[previous].opposite(node);
            let upward = match self.nodes[minus].parent_edge {
                Some(upward) => upward,
                None => panic!("minus node {} has no tree parent", minus),
            };
            self.nodes[minus].matched = Some(upward);
            node = self.edges[upward].opposite(minus);
            incoming = upward;
        }
    }

    /// Contracts the odd cycle closed by the tight in-tree `+`/`+` edge
    /// `edge` into a new `+` blossom
    pub fn shrink(&mut self, edge: EdgeIndex) {
        let [a, b] = self.edges[edge].head;
        let tree = self.tree_of(a);
        let (base, path_a, path_b) = self.find_lowest_common_ancestor(a, b);

        // base, down to `a`, across `edge`, up from `b`
        let mut cycle = vec![base];
        cycle.extend(path_a.iter().rev().copied());
        let split = cycle.len();
        cycle.extend(path_b);
        let siblings: Vec<EdgeIndex> = (0..cycle.len())
            .map(|i| {
                if i + 1 < split {
                    self.parent_edge(cycle[i + 1])
                } else if i + 1 == split {
                    edge
                } else {
                    self.parent_edge(cycle[i])
                }
            })
            .collect();

        let blossom = self.alloc_blossom();
        let mut relabel = self.begin_relabel(&cycle);

        let member = self.next_epoch();
        for &node in &cycle {
            self.nodes[node].epoch = member;
        }

        let mut children = Vec::new();
        for &node in &cycle {
            for &child in &self.nodes[node].tree_children {
                if self.nodes[child].epoch != member {
                    children.push(child);
                }
            }
        }

        let base_parent_edge = self.nodes[base].parent_edge;
        let base_matched = self.nodes[base].matched;
        let was_root = self.nodes[base].is_tree_root;
        if let Some(parent_edge) = base_parent_edge {
            let parent = self.edges[parent_edge].opposite(base);
            for child in self.nodes[parent].tree_children.iter_mut() {
                if *child == base {
                    *child = blossom;
                }
            }
        }

        for &(edge, _) in &relabel.edges {
            let [h0, h1] = self.edges[edge].head;
            match (self.nodes[h0].epoch == member, self.nodes[h1].epoch == member) {
                (true, false) => self.move_edge(edge, h0, blossom),
                (false, true) => self.move_edge(edge, h1, blossom),
                _ => {}
            }
        }

        let entry = &mut self.nodes[blossom];
        entry.label = Label::Plus;
        entry.tree = Some(tree);
        entry.is_tree_root = was_root;
        entry.parent_edge = base_parent_edge;
        entry.matched = base_matched;
        entry.tree_children = children;
        entry.blossom_children = cycle.clone();
        if was_root {
            self.trees[tree].root = blossom;
        }

        for (&node, &sibling) in cycle.iter().zip(&siblings) {
            let inner = &mut self.nodes[node];
            inner.leave_tree();
            inner.is_outer = false;
            inner.blossom_parent = Some(blossom);
            inner.blossom_sibling = Some(sibling);
        }

        relabel.duals.push((blossom, 0.0));
        self.finish_relabel(relabel);

        self.statistics.shrink_count += 1;
        trace!("shrink: blossom {} of {} nodes, base {} in tree {}", blossom, cycle.len(), base, tree);
    }

    /// Lowest common ancestor of `a` and `b` with the paths leading to it,
    /// each excluding the ancestor itself
    pub fn find_lowest_common_ancestor(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
    ) -> (NodeIndex, Vec<NodeIndex>, Vec<NodeIndex>) {
        let mark = self.next_epoch();
        let mut node = a;
        loop {
            self.nodes[node].epoch = mark;
            match self.tree_parent(node) {
                Some(parent) => node = parent,
                None => break,
            }
        }

        let mut path_b = Vec::new();
        let mut node = b;
        while self.nodes[node].epoch != mark {
            path_b.push(node);
            node = match self.tree_parent(node) {
                Some(parent) => parent,
                None => panic!("nodes {} and {} are not in the same tree", a, b),
            };
        }
        let base = node;

        let mut path_a = Vec::new();
        let mut node = a;
        while node != base {
            path_a.push(node);
            node = self.parent_of_marked(node);
        }

        (base, path_a, path_b)
    }

    fn parent_of_marked(&self, node: NodeIndex) -> NodeIndex {
        match self.tree_parent(node) {
            Some(parent) => parent,
            None => panic!("node {} left its tree during ancestor search", node),
        }
    }

    /// Dissolves the `-` blossom `blossom`, whose dual has dropped to zero,
    /// keeping the even path from its entry child to its base in the tree
    pub fn expand(&mut self, blossom: NodeIndex) {
        let tree = self.tree_of(blossom);
        let parent_edge = self.parent_edge(blossom);
        let matched = match self.nodes[blossom].matched {
            Some(matched) => matched,
            None => panic!("minus blossom {} is not matched", blossom),
        };
        let plus_child = match self.nodes[blossom].tree_children.as_slice() {
            [child] => *child,
            children => panic!("minus blossom {} has {} tree children", blossom, children.len()),
        };
        let tree_parent = self.edges[parent_edge].opposite(blossom);
        let blossom_dual = self.true_dual(blossom);
        let children = self.nodes[blossom].blossom_children.clone();

        let base = self.child_containing(blossom, self.original_end(matched, blossom));
        let entry = self.child_containing(blossom, self.original_end(parent_edge, blossom));

        let mut group = vec![blossom];
        group.extend(children.iter().copied());
        let mut relabel = self.begin_relabel(&group);

        // the blossom's dual no longer counts against edges leaving it
        for (edge, slack) in relabel.edges.iter_mut() {
            if self.edges[*edge].head.contains(&blossom) {
                *slack += blossom_dual;
            }
        }
        relabel.duals.retain(|&(node, _)| node != blossom);

        for edge in self.incident_edges(blossom) {
            let child = self.child_containing(blossom, self.original_end(edge, blossom));
            self.move_edge(edge, blossom, child);
        }

        let cycle = self.rotate_blossom(blossom, base);
        let length = cycle.len();
        let position = match cycle.iter().position(|&child| child == entry) {
            Some(position) => position,
            None => panic!("entry {} is not a child of blossom {}", entry, blossom),
        };

        // even path entry -> base, with the edge into each step
        let mut path = vec![(entry, parent_edge)];
        if position % 2 == 1 {
            for i in position..length {
                path.push((cycle[(i + 1) % length], self.blossom_sibling(cycle[i])));
            }
        } else {
            for i in (1..=position).rev() {
                path.push((cycle[i - 1], self.blossom_sibling(cycle[i - 1])));
            }
        }

        let on_path = self.next_epoch();
        for &(node, _) in &path {
            self.nodes[node].epoch = on_path;
        }

        for &child in &cycle {
            let node = &mut self.nodes[child];
            node.is_outer = true;
            node.blossom_parent = None;
            node.blossom_sibling = None;
            if node.epoch != on_path {
                node.leave_tree();
            }
        }

        for (j, &(node, incoming)) in path.iter().enumerate() {
            let next = path.get(j + 1).map_or(plus_child, |&(next, _)| next);
            let step = &mut self.nodes[node];
            step.label = if j % 2 == 0 { Label::Minus } else { Label::Plus };
            step.tree = Some(tree);
            step.is_tree_root = false;
            step.parent_edge = Some(incoming);
            step.tree_children = vec![next];
        }

        for child in self.nodes[tree_parent].tree_children.iter_mut() {
            if *child == blossom {
                *child = entry;
            }
        }

        self.finish_relabel(relabel);
        self.release_node(blossom);

        self.statistics.expand_count += 1;
        trace!(
            "expand: blossom {} in tree {}, {} of {} children stay in the tree",
            blossom,
            tree,
            path.len(),
            length
        );
    }

    /// Fixes the matching inside every remaining blossom, outermost first
    pub fn resolve_blossom_matchings(&mut self) {
        let mut stack: Vec<NodeIndex> = (self.vertex_count..self.nodes.len())
            .filter(|&node| self.nodes[node].alive && self.nodes[node].is_outer)
            .collect();

        while let Some(blossom) = stack.pop() {
            let matched = match self.nodes[blossom].matched {
                Some(matched) => matched,
                None => panic!("blossom {} is unmatched after the main loop", blossom),
            };
            let [first, second] = self.edges[matched].head_original;
            let inside = if self.blossom_contains(blossom, first) { first } else { second };
            let base = self.child_containing(blossom, inside);

            let cycle = self.rotate_blossom(blossom, base);
            stack.extend(cycle.into_iter().filter(|&child| self.nodes[child].is_blossom));
        }
    }

    fn tree_of(&self, node: NodeIndex) -> usize {
        match self.nodes[node].tree {
            Some(tree) => tree,
            None => panic!("node {} is not in a tree", node),
        }
    }

    fn parent_edge(&self, node: NodeIndex) -> EdgeIndex {
        match self.nodes[node].parent_edge {
            Some(edge) => edge,
            None => panic!("node {} has no tree parent", node),
        }
    }

    /// Original vertex at the end of `edge` that currently sits on `node`
    fn original_end(&self, edge: EdgeIndex, node: NodeIndex) -> NodeIndex {
        let edge = &self.edges[edge];
        edge.head_original[edge.side_of(node)]
    }
}
