//! CHRONOS matching core
//!
//! Exact minimum-weight (or maximum-weight) perfect matching on general
//! graphs using Kolmogorov's Blossom V algorithm.
//!
//! ```no_run
//! use chronos_matching::{Graph, KolmogorovMatching};
//!
//! let mut graph = Graph::with_nodes(4);
//! graph.add_edge(0, 1, 1.0)?;
//! graph.add_edge(1, 2, 10.0)?;
//! graph.add_edge(2, 3, 1.0)?;
//! graph.add_edge(3, 0, 10.0)?;
//!
//! let result = KolmogorovMatching::new().solve(&graph)?;
//! assert_eq!(result.weight, 2.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod data_structures;

pub use algorithm::graph::matching::{
    solve_batch, BlossomOptions, DualSolution, DualUpdateStrategy, InitializationType, KolmogorovMatching,
    MatchingError, MatchingResult, MatchingStatistics, ObjectiveSense, OddSetDual, OptimalityCertificate,
};
pub use algorithm::traits::{Algorithm, AlgorithmError, NodeId};
pub use data_structures::graph::{Graph, WeightedGraph};
