//! Core algorithm trait definitions for the Chronos matching core
//!
//! This module establishes the trait system shared by graph algorithm
//! implementations: typed identifiers, the string-keyed parameter protocol,
//! the framework-level error type and a small execution profiler.
//!
//! # Key Design Principles
//! - Parameters are exchanged as strings and validated against a typed
//!   description (`ParameterType` plus `ParameterConstraints`)
//! - Algorithm-specific failures convert into `AlgorithmError` at the
//!   framework boundary
//! - Every algorithm owns its configuration; no global state

use std::fmt::{self, Debug};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::data_structures::graph::Graph;

/// Universal algorithm identifier for type-safe dispatch
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmId(String);

impl AlgorithmId {
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Node identifier ensuring type safety and preventing mixing with other numeric types
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Algorithm parameter with strongly typed values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
    pub constraints: Option<ParameterConstraints>,
}

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Float,
    String,
    Boolean,
    Enum(Vec<String>),
}

/// Parameter constraints for validating algorithm parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed_values: Option<Vec<String>>,
}

impl ParameterConstraints {
    /// Lower bound only
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
            allowed_values: None,
        }
    }

    /// Enumerated values only
    pub fn one_of(values: &[&str]) -> Self {
        Self {
            min: None,
            max: None,
            allowed_values: Some(values.iter().map(|v| v.to_string()).collect()),
        }
    }

    /// Validates a raw string against the constraints
    pub fn check(&self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        if let Some(allowed) = &self.allowed_values {
            if !allowed.iter().any(|candidate| candidate == value) {
                return Err(AlgorithmError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("'{}' is not one of: {}", value, allowed.join(", ")),
                });
            }
        }

        if self.min.is_some() || self.max.is_some() {
            let number: f64 = value.parse().map_err(|_| AlgorithmError::InvalidParameter {
                name: name.to_string(),
                reason: format!("'{}' is not a number", value),
            })?;
            if let Some(min) = self.min {
                if number < min {
                    return Err(AlgorithmError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!("{} is below the minimum {}", number, min),
                    });
                }
            }
            if let Some(max) = self.max {
                if number > max {
                    return Err(AlgorithmError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!("{} is above the maximum {}", number, max),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Comprehensive error types for algorithm operations
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid node: {0}")]
    InvalidNode(NodeId),

    #[error("Invalid graph state: {0}")]
    InvalidGraph(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Algorithm not supported on given input: {0}")]
    NotSupported(String),
}

/// Algorithm complexity information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmComplexity {
    pub time_complexity: String,
    pub space_complexity: String,
    pub best_case: String,
    pub average_case: String,
    pub worst_case: String,
}

/// Main algorithm trait
///
/// # Invariants
/// - State isolation between runs: `execute` never reuses data from a
///   previous invocation
/// - Deterministic behavior for given inputs and parameters
pub trait Algorithm: Debug + Send + Sync {
    /// Result produced by a successful run
    type Output;

    /// Returns the algorithm's unique identifier
    fn id(&self) -> AlgorithmId;

    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g., graph_matching)
    fn category(&self) -> &'static str;

    /// Returns the algorithm's description with complexity guarantees
    fn description(&self) -> String;

    /// Returns the algorithm's asymptotic complexity in Big-O notation
    fn complexity(&self) -> AlgorithmComplexity;

    /// Returns supported parameters with type information
    fn parameters(&self) -> Vec<AlgorithmParameter>;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;

    /// Verifies algorithm can operate on given graph
    fn is_compatible_with(&self, graph: &Graph) -> Result<(), AlgorithmError>;

    /// Runs the algorithm on `graph`
    fn execute(&mut self, graph: &Graph) -> Result<Self::Output, AlgorithmError>;
}

/// Wall-clock profiler accumulating over start/stop pairs
#[derive(Debug, Clone, Default)]
pub struct AlgorithmProfiler {
    execution_time: Duration,
    start_time: Option<Instant>,
}

impl AlgorithmProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.execution_time += start.elapsed();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.execution_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_id_uniqueness() {
        let id1 = AlgorithmId::new("blossom_v");
        let id2 = AlgorithmId::new("edmonds");
        let id3 = AlgorithmId::new("blossom_v");

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert_eq!(id1.as_str(), "blossom_v");
    }

    #[test]
    fn test_node_id_type_safety() {
        let node1 = NodeId(42);
        let node2 = NodeId(42);
        let node3 = NodeId(43);

        assert_eq!(node1, node2);
        assert_ne!(node1, node3);
        assert_eq!(node1.as_usize(), 42);
        assert_eq!(node3.to_string(), "43");
    }

    #[test]
    fn test_parameter_constraints() {
        let numeric = ParameterConstraints::at_least(0.0);
        assert!(numeric.check("epsilon", "1e-9").is_ok());
        assert!(numeric.check("epsilon", "-1").is_err());
        assert!(numeric.check("epsilon", "abc").is_err());

        let enumerated = ParameterConstraints::one_of(&["none", "greedy"]);
        assert!(enumerated.check("initialization", "greedy").is_ok());
        assert!(matches!(
            enumerated.check("initialization", "fractional"),
            Err(AlgorithmError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_profiler_accumulates() {
        let mut profiler = AlgorithmProfiler::new();
        profiler.stop();
        assert_eq!(profiler.elapsed(), Duration::ZERO);

        profiler.start();
        std::thread::sleep(Duration::from_millis(2));
        profiler.stop();
        let first = profiler.elapsed();
        assert!(first >= Duration::from_millis(2));

        // a stop without a matching start adds nothing
        profiler.stop();
        assert_eq!(profiler.elapsed(), first);

        profiler.start();
        profiler.stop();
        assert!(profiler.elapsed() >= first);
    }
}
