//! Data structures shared by the algorithm implementations
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod graph;
pub mod priority_queue;

pub use self::graph::{Edge, Graph, Weight, WeightedGraph};
pub use self::priority_queue::IndexedPriorityQueue;
