//! Run statistics of the matching engine

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counters and timings collected during one solve
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingStatistics {
    pub grow_count: usize,
    pub shrink_count: usize,
    pub expand_count: usize,
    pub augment_count: usize,

    /// Global dual updates (fixed delta or connected components) that made progress
    pub dual_updates: usize,

    /// Single-tree dual updates that raised a tree's dual
    pub single_tree_updates: usize,

    /// Global updates that stalled and handed over to another strategy
    pub fallback_updates: usize,

    /// Vertices matched by the greedy initialisation
    pub greedy_matched: usize,

    /// Trees alive when the main loop started
    pub initial_trees: usize,

    pub primal_time: Duration,
    pub dual_time: Duration,
    pub total_time: Duration,
}

impl MatchingStatistics {
    /// Number of primal operations of any kind
    pub fn primal_operations(&self) -> usize {
        self.grow_count + self.shrink_count + self.expand_count + self.augment_count
    }
}
