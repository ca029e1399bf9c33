//! Solver configuration
//!
//! `BlossomOptions` is the typed configuration; it serializes with serde and
//! also backs the string parameter protocol of [`Algorithm`](crate::algorithm::Algorithm)
//! (`parameters`, `set_parameter`, `get_parameter`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AlgorithmError, AlgorithmParameter, ParameterConstraints, ParameterType};

/// How tree duals are raised between primal passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DualUpdateStrategy {
    /// One delta shared by every tree
    FixedDelta,
    /// One delta per group of trees linked by tight `+`/`-` cross edges
    ConnectedComponents,
    /// Each tree raised on its own
    SingleTree,
}

impl Default for DualUpdateStrategy {
    fn default() -> Self {
        DualUpdateStrategy::ConnectedComponents
    }
}

/// Starting point of the primal-dual iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializationType {
    /// All duals zero, every vertex its own tree
    None,
    /// Duals raised vertex by vertex, tight edges matched greedily
    Greedy,
}

impl Default for InitializationType {
    fn default() -> Self {
        InitializationType::Greedy
    }
}

/// Optimisation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveSense {
    Minimize,
    /// Solved as a minimisation over `max_w - w`
    Maximize,
}

impl Default for ObjectiveSense {
    fn default() -> Self {
        ObjectiveSense::Minimize
    }
}

macro_rules! string_enum {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const NAMES: &'static [&'static str] = &[$($text),+];
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $(<$ty>::$variant => $text),+
                };
                f.write_str(text)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(<$ty>::$variant),)+
                    _ => Err(format!("'{}' is not one of: {}", s, Self::NAMES.join(", "))),
                }
            }
        }
    };
}

string_enum!(DualUpdateStrategy {
    FixedDelta => "fixed_delta",
    ConnectedComponents => "connected_components",
    SingleTree => "single_tree",
});

string_enum!(InitializationType {
    None => "none",
    Greedy => "greedy",
});

string_enum!(ObjectiveSense {
    Minimize => "minimize",
    Maximize => "maximize",
});

/// Solver options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlossomOptions {
    pub dual_update_strategy: DualUpdateStrategy,
    pub initialization: InitializationType,
    pub objective: ObjectiveSense,

    /// Single-tree dual update before a tree's primal pass
    pub update_duals_before: bool,

    /// Single-tree dual updates after a tree's primal pass, repeated while
    /// they enable new primal operations
    pub update_duals_after: bool,

    /// Absolute tolerance under which a slack or blossom dual counts as zero
    pub epsilon: f64,

    /// Floor of the tree offset beyond which the dual problem counts as
    /// unbounded; the solver raises it to twice the total edge cost
    pub infeasibility_threshold: f64,

    /// Relative tolerance of the primal/dual objective comparison
    pub duality_tolerance: f64,

    /// Build the optimality certificate and reject results that fail it
    pub verify_optimality: bool,
}

impl Default for BlossomOptions {
    fn default() -> Self {
        Self {
            dual_update_strategy: DualUpdateStrategy::default(),
            initialization: InitializationType::default(),
            objective: ObjectiveSense::default(),
            update_duals_before: false,
            update_duals_after: false,
            epsilon: 1e-9,
            infeasibility_threshold: 1e10,
            duality_tolerance: 1e-6,
            verify_optimality: true,
        }
    }
}

impl BlossomOptions {
    pub fn with_strategy(mut self, strategy: DualUpdateStrategy) -> Self {
        self.dual_update_strategy = strategy;
        self
    }

    pub fn with_initialization(mut self, initialization: InitializationType) -> Self {
        self.initialization = initialization;
        self
    }

    pub fn with_objective(mut self, objective: ObjectiveSense) -> Self {
        self.objective = objective;
        self
    }

    /// Parses options from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, AlgorithmError> {
        let options: BlossomOptions = serde_json::from_str(json).map_err(|e| AlgorithmError::InvalidParameter {
            name: "options".to_string(),
            reason: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String, AlgorithmError> {
        serde_json::to_string_pretty(self).map_err(|e| AlgorithmError::ExecutionError(e.to_string()))
    }

    /// Checks numeric fields
    pub fn validate(&self) -> Result<(), AlgorithmError> {
        let positive = [
            ("epsilon", self.epsilon),
            ("infeasibility_threshold", self.infeasibility_threshold),
            ("duality_tolerance", self.duality_tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AlgorithmError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be a positive finite number, got {}", value),
                });
            }
        }
        Ok(())
    }

    /// Typed description of every parameter, with current values
    pub fn parameters(&self) -> Vec<AlgorithmParameter> {
        let enumerated = |name: &str, value: String, names: &[&str]| AlgorithmParameter {
            name: name.to_string(),
            value,
            value_type: ParameterType::Enum(names.iter().map(|n| n.to_string()).collect()),
            constraints: Some(ParameterConstraints::one_of(names)),
        };
        let boolean = |name: &str, value: bool| AlgorithmParameter {
            name: name.to_string(),
            value: value.to_string(),
            value_type: ParameterType::Boolean,
            constraints: Some(ParameterConstraints::one_of(&["true", "false"])),
        };
        let float = |name: &str, value: f64| AlgorithmParameter {
            name: name.to_string(),
            value: value.to_string(),
            value_type: ParameterType::Float,
            constraints: Some(ParameterConstraints::at_least(f64::MIN_POSITIVE)),
        };

        vec![
            enumerated(
                "dual_update_strategy",
                self.dual_update_strategy.to_string(),
                DualUpdateStrategy::NAMES,
            ),
            enumerated("initialization", self.initialization.to_string(), InitializationType::NAMES),
            enumerated("objective", self.objective.to_string(), ObjectiveSense::NAMES),
            boolean("update_duals_before", self.update_duals_before),
            boolean("update_duals_after", self.update_duals_after),
            float("epsilon", self.epsilon),
            float("infeasibility_threshold", self.infeasibility_threshold),
            float("duality_tolerance", self.duality_tolerance),
            boolean("verify_optimality", self.verify_optimality),
        ]
    }

    /// Sets one parameter from its string form
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        let descriptor = self
            .parameters()
            .into_iter()
            .find(|parameter| parameter.name == name)
            .ok_or_else(|| AlgorithmError::InvalidParameter {
                name: name.to_string(),
                reason: format!(
                    "unknown parameter; valid parameters: {}",
                    self.parameters().iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
                ),
            })?;
        if let Some(constraints) = &descriptor.constraints {
            constraints.check(name, value)?;
        }

        let invalid = |reason: String| AlgorithmError::InvalidParameter {
            name: name.to_string(),
            reason,
        };
        let parse_bool = |value: &str| value.parse::<bool>().map_err(|e| invalid(e.to_string()));
        let parse_float = |value: &str| value.parse::<f64>().map_err(|e| invalid(e.to_string()));

        let mut updated = self.clone();
        match name {
            "dual_update_strategy" => updated.dual_update_strategy = value.parse().map_err(invalid)?,
            "initialization" => updated.initialization = value.parse().map_err(invalid)?,
            "objective" => updated.objective = value.parse().map_err(invalid)?,
            "update_duals_before" => updated.update_duals_before = parse_bool(value)?,
            "update_duals_after" => updated.update_duals_after = parse_bool(value)?,
            "epsilon" => updated.epsilon = parse_float(value)?,
            "infeasibility_threshold" => updated.infeasibility_threshold = parse_float(value)?,
            "duality_tolerance" => updated.duality_tolerance = parse_float(value)?,
            "verify_optimality" => updated.verify_optimality = parse_bool(value)?,
            _ => unreachable!("parameter table and setter disagree on '{}'", name),
        }
        updated.validate()?;

        *self = updated;
        Ok(())
    }

    /// Current value of one parameter in string form
    pub fn get(&self, name: &str) -> Option<String> {
        self.parameters()
            .into_iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| parameter.value)
    }
}
