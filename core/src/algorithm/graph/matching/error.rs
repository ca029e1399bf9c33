//! Error types of the matching engine
//!
//! Input validation and infeasibility are ordinary error values. Broken
//! internal invariants are not represented here: they panic, because any
//! attempt to continue would silently produce a wrong matching.

use thiserror::Error;

use crate::algorithm::traits::AlgorithmError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchingError {
    #[error("a perfect matching needs an even number of vertices, graph has {0}")]
    OddVertexCount(usize),

    #[error("edge {edge} is a self-loop on vertex {vertex}")]
    SelfLoop { edge: usize, vertex: usize },

    #[error("edge {edge} has negative weight {weight}")]
    NegativeWeight { edge: usize, weight: f64 },

    #[error("edge {edge} has non-finite weight {weight}")]
    InvalidWeight { edge: usize, weight: f64 },

    #[error("edge {edge} references vertex {vertex}, graph has {vertex_count} vertices")]
    VertexOutOfRange { edge: usize, vertex: usize, vertex_count: usize },

    #[error("no perfect matching exists: {reason}")]
    NoPerfectMatching { reason: String },

    #[error("optimality certificate rejected the matching: {0}")]
    OptimalityViolation(String),
}

impl MatchingError {
    /// True for errors raised by input validation, before any work is done
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MatchingError::OddVertexCount(_)
                | MatchingError::SelfLoop { .. }
                | MatchingError::NegativeWeight { .. }
                | MatchingError::InvalidWeight { .. }
                | MatchingError::VertexOutOfRange { .. }
        )
    }
}

impl From<MatchingError> for AlgorithmError {
    fn from(error: MatchingError) -> Self {
        match error {
            MatchingError::NoPerfectMatching { .. } => AlgorithmError::NotSupported(error.to_string()),
            MatchingError::OptimalityViolation(_) => AlgorithmError::ExecutionError(error.to_string()),
            _ => AlgorithmError::InvalidGraph(error.to_string()),
        }
    }
}
