//! Graph algorithms over weighted undirected graphs
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod matching;

pub use self::matching::{
    solve_batch, BlossomOptions, DualSolution, DualUpdateStrategy, InitializationType, KolmogorovMatching,
    MatchingError, MatchingResult, MatchingStatistics, ObjectiveSense, OddSetDual, OptimalityCertificate,
};
