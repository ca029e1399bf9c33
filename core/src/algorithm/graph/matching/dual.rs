//! Dual updates
//!
//! All bounds are expressed on absolute tree offsets: raising `T.eps` by
//! `delta` lowers the true slack of a `+`/free edge of `T` by `delta`, of an
//! in-tree `+`/`+` edge by `2 * delta`, and lowers the true dual of each `-`
//! blossom of `T` by `delta`. Cross-tree edges depend on both offsets.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::{debug, trace};

use super::edge::EdgeIndex;
use super::error::MatchingError;
use super::options::DualUpdateStrategy;
use super::state::State;
use super::tree::TreeIndex;

/// Result of a single-tree dual update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DualOutcome {
    /// The tree's offset increased
    Raised,
    /// A cross `+`/`+` edge became tight and was augmented
    Augmented,
    /// No constraint left any room
    Stalled,
}

impl State {
    /// Largest offset `tree` can reach bounded only by its own edges and
    /// blossoms; infinite when nothing bounds it
    pub fn get_eps(&self, tree: TreeIndex) -> f64 {
        let tree = &self.trees[tree];
        let mut eps = f64::INFINITY;
        if let Some((_, slack)) = tree.plus_infinity_edges.peek() {
            eps = eps.min(slack);
        }
        if let Some((_, dual)) = tree.minus_blossoms.peek() {
            eps = eps.min(dual);
        }
        if let Some((_, slack)) = tree.plus_plus_edges.peek() {
            eps = eps.min(slack / 2.0);
        }
        eps
    }

    /// Raises the offset of `tree` as far as it goes with every other tree
    /// held fixed
    pub fn update_duals_single(&mut self, tree: TreeIndex) -> Result<DualOutcome, MatchingError> {
        let current = self.trees[tree].eps;
        let mut eps = self.get_eps(tree);
        let mut candidate: Option<(EdgeIndex, f64)> = None;

        for (&other, &tree_edge) in &self.trees[tree].neighbours {
            let other_eps = self.trees[other].eps;
            let tree_edge = self.tree_edge(tree_edge);

            if let Some((edge, slack)) = tree_edge.plus_plus_edges.peek() {
                let bound = slack - other_eps;
                eps = eps.min(bound);
                if candidate.map_or(true, |(_, best)| bound < best) {
                    candidate = Some((edge, bound));
                }
            }
            if let Some((_, slack)) = tree_edge.plus_minus_edges[tree_edge.side_of(tree)].peek() {
                eps = eps.min(slack + other_eps);
            }
        }

        self.check_bound(tree, eps)?;

        let raised = eps > current;
        if raised {
            self.trees[tree].eps = eps;
            self.statistics.single_tree_updates += 1;
            trace!("tree {}: eps {} -> {}", tree, current, eps);
        }

        if let Some((edge, _)) = candidate {
            if self.true_slack(edge) <= self.options.epsilon {
                self.augment(edge);
                return Ok(DualOutcome::Augmented);
            }
        }

        Ok(if raised { DualOutcome::Raised } else { DualOutcome::Stalled })
    }

    /// Runs the configured strategy, then the remaining strategies in turn
    /// while none makes progress; `false` when all of them stall.
    ///
    /// After a primal pass without operations (`primal_idle`), single-tree
    /// raises are followed by a connected-components update: trees bounding
    /// each other through `+`/`-` edges only creep upward one at a time.
    pub fn update_duals_with_fallback(&mut self, primal_idle: bool) -> Result<bool, MatchingError> {
        let strategy = self.options.dual_update_strategy;
        if self.update_duals(strategy)? {
            if primal_idle && strategy == DualUpdateStrategy::SingleTree {
                self.update_duals(DualUpdateStrategy::ConnectedComponents)?;
            }
            return Ok(true);
        }

        self.statistics.fallback_updates += 1;
        debug!("{} dual update made no progress, trying other strategies", strategy);

        if strategy != DualUpdateStrategy::SingleTree && self.update_duals(DualUpdateStrategy::SingleTree)? {
            return Ok(true);
        }
        if strategy != DualUpdateStrategy::ConnectedComponents {
            return self.update_duals(DualUpdateStrategy::ConnectedComponents);
        }
        Ok(false)
    }

    pub fn update_duals(&mut self, strategy: DualUpdateStrategy) -> Result<bool, MatchingError> {
        match strategy {
            DualUpdateStrategy::FixedDelta => self.update_duals_fixed_delta(),
            DualUpdateStrategy::ConnectedComponents => self.update_duals_connected_components(),
            DualUpdateStrategy::SingleTree => {
                let mut progressed = false;
                for tree in self.live_trees() {
                    if self.trees[tree].alive && self.update_duals_single(tree)? != DualOutcome::Stalled {
                        progressed = true;
                    }
                }
                Ok(progressed)
            }
        }
    }

    /// Raises every tree by the same amount
    pub fn update_duals_fixed_delta(&mut self) -> Result<bool, MatchingError> {
        let trees = self.live_trees();
        let mut delta = f64::INFINITY;

        for &tree in &trees {
            let eps = self.trees[tree].eps;
            delta = delta.min(self.get_eps(tree) - eps);

            // each cross `+`/`+` pair closes from both sides
            for (&other, &tree_edge) in &self.trees[tree].neighbours {
                if other < tree {
                    continue;
                }
                if let Some((_, slack)) = self.tree_edge(tree_edge).plus_plus_edges.peek() {
                    delta = delta.min((slack - eps - self.trees[other].eps) / 2.0);
                }
            }
        }

        for &tree in &trees {
            self.check_bound(tree, self.trees[tree].eps + delta)?;
        }
        if delta <= 0.0 {
            return Ok(false);
        }

        for &tree in &trees {
            self.trees[tree].eps += delta;
        }
        self.statistics.dual_updates += 1;
        debug!("fixed-delta dual update: delta = {} over {} trees", delta, trees.len());

        let queued = self.tight_cross_plus_plus_edges(&trees);
        self.augment_queued(queued);
        Ok(true)
    }

    /// Raises trees linked by tight `+`/`-` edges together, each group by its
    /// own amount
    pub fn update_duals_connected_components(&mut self) -> Result<bool, MatchingError> {
        const UNASSIGNED: usize = usize::MAX;

        let trees = self.live_trees();
        let tolerance = self.options.epsilon;
        let mut component = vec![UNASSIGNED; self.trees.len()];
        let mut committed: Vec<Option<f64>> = vec![None; self.trees.len()];
        let mut component_count = 0;
        let mut progressed = false;

        for &root in &trees {
            if component[root] != UNASSIGNED {
                continue;
            }
            let id = component_count;
            component_count += 1;
            component[root] = id;

            let mut members = vec![root];
            let mut cursor = 0;
            while cursor < members.len() {
                let tree = members[cursor];
                cursor += 1;
                for (&other, &tree_edge) in &self.trees[tree].neighbours {
                    if component[other] != UNASSIGNED {
                        continue;
                    }
                    let linked = self.tree_edge(tree_edge).plus_minus_edges.iter().any(|heap| {
                        heap.peek().map_or(false, |(edge, _)| self.true_slack(edge) <= tolerance)
                    });
                    if linked {
                        component[other] = id;
                        members.push(other);
                    }
                }
            }

            let mut delta = f64::INFINITY;
            for &tree in &members {
                let eps = self.trees[tree].eps;
                delta = delta.min(self.get_eps(tree) - eps);

                for (&other, &tree_edge) in &self.trees[tree].neighbours {
                    let other_eps = self.trees[other].eps;
                    let tree_edge = self.tree_edge(tree_edge);

                    if let Some((_, slack)) = tree_edge.plus_plus_edges.peek() {
                        let slack = slack - eps - other_eps;
                        let bound = if component[other] == id {
                            slack / 2.0
                        } else {
                            committed[other].map_or(slack, |other_delta| slack - other_delta)
                        };
                        delta = delta.min(bound);
                    }
                    if component[other] == id {
                        continue;
                    }
                    if let Some((_, slack)) = tree_edge.plus_minus_edges[tree_edge.side_of(tree)].peek() {
                        let slack = slack - eps + other_eps;
                        delta = delta.min(committed[other].map_or(slack, |other_delta| slack + other_delta));
                    }
                }
            }

            for &tree in &members {
                self.check_bound(tree, self.trees[tree].eps + delta)?;
            }
            let delta = delta.max(0.0);
            if delta > 0.0 {
                progressed = true;
            }
            for &tree in &members {
                committed[tree] = Some(delta);
                self.trees[tree].accumulated_eps = delta;
            }
            trace!("component {} of {} trees: delta = {}", id, members.len(), delta);
        }

        for &tree in &trees {
            let entry = &mut self.trees[tree];
            entry.eps += entry.accumulated_eps;
            entry.accumulated_eps = 0.0;
        }
        if !progressed {
            return Ok(false);
        }

        self.statistics.dual_updates += 1;
        debug!(
            "connected-components dual update over {} trees in {} components",
            trees.len(),
            component_count
        );

        let queued = self.tight_cross_plus_plus_edges(&trees);
        self.augment_queued(queued);
        Ok(true)
    }

    fn check_bound(&self, tree: TreeIndex, eps: f64) -> Result<(), MatchingError> {
        if eps > self.eps_bound {
            debug!("tree {} (root {}) is unbounded: eps = {}", tree, self.trees[tree].root, eps);
            return Err(MatchingError::NoPerfectMatching {
                reason: format!(
                    "dual objective of the tree rooted at node {} grows without bound",
                    self.trees[tree].root
                ),
            });
        }
        Ok(())
    }

    fn tight_cross_plus_plus_edges(&self, trees: &[TreeIndex]) -> Vec<EdgeIndex> {
        let tolerance = self.options.epsilon;
        let mut queued = Vec::new();
        for &tree in trees {
            for (&other, &tree_edge) in &self.trees[tree].neighbours {
                if other < tree {
                    continue;
                }
                if let Some((edge, _)) = self.tree_edge(tree_edge).plus_plus_edges.peek() {
                    if self.true_slack(edge) <= tolerance {
                        queued.push(edge);
                    }
                }
            }
        }
        queued
    }

    /// Augments each queued edge that still joins two distinct trees
    fn augment_queued(&mut self, queued: Vec<EdgeIndex>) {
        for edge in queued {
            let [a, b] = self.edges[edge].head;
            let (a, b) = (&self.nodes[a], &self.nodes[b]);
            let joins_trees = a.is_outer
                && b.is_outer
                && a.is_plus()
                && b.is_plus()
                && a.tree.is_some()
                && b.tree.is_some()
                && a.tree != b.tree;
            if joins_trees && self.true_slack(edge) <= self.options.epsilon {
                self.augment(edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::options::{BlossomOptions, InitializationType};
    use super::*;

    fn fresh(vertex_count: usize, edges: &[(usize, usize, f64)], strategy: DualUpdateStrategy) -> State {
        let options = BlossomOptions::default()
            .with_initialization(InitializationType::None)
            .with_strategy(strategy);
        let mut state = State::new(vertex_count, edges, options);
        state.initialize();
        state
    }

    #[test]
    fn test_get_eps_of_isolated_root_is_infinite() {
        let state = fresh(2, &[], DualUpdateStrategy::FixedDelta);
        let tree = state.nodes[0].tree.unwrap();
        assert!(state.get_eps(tree).is_infinite());
    }

    #[test]
    fn test_single_update_augments_tight_pair() {
        let mut state = fresh(2, &[(0, 1, 4.0)], DualUpdateStrategy::SingleTree);
        let first = state.nodes[0].tree.unwrap();

        // the whole slack goes to the first tree, which closes the edge
        assert_eq!(state.update_duals_single(first).unwrap(), DualOutcome::Augmented);
        assert_eq!(state.trees[first].eps, 4.0);
        assert_eq!(state.tree_count, 0);
        assert_eq!(state.nodes[0].matched, Some(0));
        assert_eq!(state.nodes[0].dual, 4.0);
        assert_eq!(state.nodes[1].dual, 0.0);
    }

    #[test]
    fn test_single_update_bounded_by_plus_minus_edge() {
        // root 0 grows into the pair 1-2; root 3 sees `-` node 1 at cost 5
        let options = BlossomOptions::default()
            .with_initialization(InitializationType::None)
            .with_strategy(DualUpdateStrategy::SingleTree);
        let mut state = State::new(4, &[(1, 2, 0.0), (0, 1, 0.0), (3, 1, 5.0), (2, 3, 9.0)], options);
        state.nodes[1].matched = Some(0);
        state.nodes[2].matched = Some(0);
        state.initialize();
        state.grow(1);

        let tree = state.nodes[3].tree.unwrap();
        let other = state.nodes[0].tree.unwrap();
        state.trees[other].eps = 1.0;
        // `3`+ / `1`- allows slack 5 plus the other tree's offset
        assert_eq!(state.update_duals_single(tree).unwrap(), DualOutcome::Raised);
        assert_eq!(state.trees[tree].eps, 6.0);
        assert!(state.true_slack(2).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_delta_splits_cross_slack() {
        let mut state = fresh(2, &[(0, 1, 4.0)], DualUpdateStrategy::FixedDelta);
        let tree = state.nodes[0].tree.unwrap();

        assert!(state.update_duals_fixed_delta().unwrap());
        assert_eq!(state.tree_count, 0);
        assert_eq!(state.trees[tree].eps, 2.0);
        assert_eq!(state.nodes[0].dual, 2.0);
        assert_eq!(state.nodes[1].dual, 2.0);
    }

    #[test]
    fn test_connected_components_matches_fixed_delta_on_pair() {
        let mut state = fresh(2, &[(0, 1, 6.0)], DualUpdateStrategy::ConnectedComponents);
        assert!(state.update_duals_connected_components().unwrap());
        // first component takes the whole slack, the second has none left
        assert_eq!(state.tree_count, 0);
        assert_eq!(state.nodes[0].dual + state.nodes[1].dual, 6.0);
    }

    #[test]
    fn test_unbounded_tree_is_reported() {
        let mut state = fresh(2, &[], DualUpdateStrategy::FixedDelta);
        let error = state.update_duals_fixed_delta().unwrap_err();
        assert!(matches!(error, MatchingError::NoPerfectMatching { .. }));

        let tree = state.nodes[0].tree.unwrap();
        assert!(state.update_duals_single(tree).is_err());
        assert!(state.update_duals_connected_components().is_err());
    }
}
