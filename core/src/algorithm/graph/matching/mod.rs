//! Minimum-weight perfect matching on general graphs
//!
//! Implementation of Kolmogorov's Blossom V primal-dual algorithm. The solver
//! keeps a forest of alternating trees, one per unmatched vertex, and raises
//! a dual offset per tree until edges become tight. Tight edges drive four
//! primal operations:
//!
//! - **grow**: a free matched pair joins a tree as `-`/`+` nodes
//! - **augment**: a tight edge between two `+` nodes of different trees flips
//!   both root paths and dissolves the two trees
//! - **shrink**: a tight edge between two `+` nodes of one tree closes an odd
//!   cycle, contracted into a `+` blossom pseudonode
//! - **expand**: a `-` blossom whose dual reached zero is dissolved again
//!
//! Dual offsets are applied lazily (see `state`), so every dual update costs
//! O(1) per tree plus heap lookups. Three update strategies are available:
//! one fixed delta for all trees, per connected component of trees linked by
//! tight `+`/`-` edges, or one tree at a time.
//!
//! The returned [`MatchingResult`] carries the dual solution and, unless
//! disabled, an [`OptimalityCertificate`] proving optimality through LP
//! duality.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

mod certificate;
mod dual;
mod edge;
mod error;
mod node;
mod options;
mod primal;
mod state;
mod statistics;
mod tree;

pub use certificate::{DualSolution, OddSetDual, OptimalityCertificate};
pub use error::MatchingError;
pub use options::{BlossomOptions, DualUpdateStrategy, InitializationType, ObjectiveSense};
pub use statistics::MatchingStatistics;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{
    Algorithm, AlgorithmComplexity, AlgorithmError, AlgorithmId, AlgorithmParameter, AlgorithmProfiler, NodeId,
};
use crate::data_structures::graph::{Graph, WeightedGraph};

use state::State;

// ═══════════════════════════════════════════════════════════════════════════
// RESULT TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Optimal perfect matching with its proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingResult {
    /// Indices of matched input edges, ascending
    pub edges: Vec<usize>,
    /// Partner of every vertex
    pub mate: Vec<NodeId>,
    /// Sum of input weights over matched edges
    pub weight: f64,
    /// Dual objective expressed in input weights
    pub dual_objective: f64,
    /// Duals over the costs the solver minimised; under `Maximize` these are
    /// `max_weight - weight`
    pub dual_solution: DualSolution,
    /// Present when `verify_optimality` is set
    pub certificate: Option<OptimalityCertificate>,
    pub statistics: MatchingStatistics,
}

impl MatchingResult {
    pub fn is_matched(&self, edge: usize) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SOLVER
// ═══════════════════════════════════════════════════════════════════════════

/// Blossom V minimum (or maximum) weight perfect matching
///
/// Each call to [`solve`](Self::solve) builds fresh state; only the options
/// and the statistics of the last run are kept between calls.
#[derive(Debug, Clone, Default)]
pub struct KolmogorovMatching {
    options: BlossomOptions,
    statistics: MatchingStatistics,
}

impl KolmogorovMatching {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BlossomOptions) -> Result<Self, AlgorithmError> {
        options.validate()?;
        Ok(Self {
            options,
            statistics: MatchingStatistics::default(),
        })
    }

    pub fn options(&self) -> &BlossomOptions {
        &self.options
    }

    /// Statistics of the most recent solve, successful or not
    pub fn statistics(&self) -> &MatchingStatistics {
        &self.statistics
    }

    /// Computes an optimal perfect matching of `graph`
    pub fn solve<G: WeightedGraph + ?Sized>(&mut self, graph: &G) -> Result<MatchingResult, MatchingError> {
        let mut profiler = AlgorithmProfiler::new();
        profiler.start();

        let vertex_count = graph.vertex_count();
        let edges = collect_edges(graph)?;
        info!(
            "perfect matching: {} vertices, {} edges, {} strategy, {} objective",
            vertex_count,
            edges.len(),
            self.options.dual_update_strategy,
            self.options.objective
        );

        // maximisation minimises max_weight - weight over the same edges
        let max_weight = edges.iter().map(|&(_, _, weight)| weight).fold(0.0, f64::max);
        let costs: Vec<(usize, usize, f64)> = match self.options.objective {
            ObjectiveSense::Minimize => edges.clone(),
            ObjectiveSense::Maximize => edges.iter().map(|&(u, v, weight)| (u, v, max_weight - weight)).collect(),
        };

        let mut state = State::new(vertex_count, &costs, self.options.clone());
        state.initialize();
        let outcome = state.run();

        profiler.stop();
        state.statistics.total_time = profiler.elapsed();
        self.statistics = state.statistics.clone();

        if let Err(error) = outcome {
            warn!("perfect matching failed: {}", error);
            return Err(error);
        }

        state.resolve_blossom_matchings();
        let (mut matched, partners) = state.mates();
        matched.sort_unstable();

        let dual_solution = state.dual_solution();
        let weight: f64 = matched.iter().map(|&edge| edges[edge].2).sum();
        let dual_objective = match self.options.objective {
            ObjectiveSense::Minimize => dual_solution.objective(),
            ObjectiveSense::Maximize => (vertex_count / 2) as f64 * max_weight - dual_solution.objective(),
        };

        let certificate = if self.options.verify_optimality {
            let mut certificate = dual_solution.verify(&costs, &matched, self.options.duality_tolerance);
            if !certificate.is_optimal(self.options.duality_tolerance) {
                warn!("optimality certificate rejected: {:?}", certificate);
                return Err(MatchingError::OptimalityViolation(format!(
                    "primal {} vs dual {}, min reduced cost {}, complementary slackness {}",
                    certificate.primal_objective,
                    certificate.dual_objective,
                    certificate.min_reduced_cost,
                    certificate.complementary_slackness
                )));
            }
            certificate.primal_objective = weight;
            certificate.dual_objective = dual_objective;
            Some(certificate)
        } else {
            None
        };

        info!(
            "perfect matching found: weight {}, dual {}, {} primal operations in {:?}",
            weight,
            dual_objective,
            self.statistics.primal_operations(),
            self.statistics.total_time
        );
        debug!("statistics: {:?}", self.statistics);

        Ok(MatchingResult {
            edges: matched,
            mate: partners.into_iter().map(NodeId).collect(),
            weight,
            dual_objective,
            dual_solution,
            certificate,
            statistics: self.statistics.clone(),
        })
    }
}

/// Checks every edge and returns them as `(u, v, weight)`
fn collect_edges<G: WeightedGraph + ?Sized>(graph: &G) -> Result<Vec<(usize, usize, f64)>, MatchingError> {
    let vertex_count = graph.vertex_count();
    if vertex_count % 2 == 1 {
        return Err(MatchingError::OddVertexCount(vertex_count));
    }

    (0..graph.edge_count())
        .map(|edge| {
            let (source, target) = graph.edge_endpoints(edge);
            let weight = graph.edge_weight(edge);
            for vertex in [source.as_usize(), target.as_usize()] {
                if vertex >= vertex_count {
                    return Err(MatchingError::VertexOutOfRange {
                        edge,
                        vertex,
                        vertex_count,
                    });
                }
            }
            if source == target {
                return Err(MatchingError::SelfLoop {
                    edge,
                    vertex: source.as_usize(),
                });
            }
            if !weight.is_finite() {
                return Err(MatchingError::InvalidWeight { edge, weight });
            }
            if weight < 0.0 {
                return Err(MatchingError::NegativeWeight { edge, weight });
            }
            Ok((source.as_usize(), target.as_usize(), weight))
        })
        .collect()
}

/// Solves independent graphs in parallel with shared options
pub fn solve_batch<G: WeightedGraph + Sync>(
    graphs: &[G],
    options: &BlossomOptions,
) -> Result<Vec<Result<MatchingResult, MatchingError>>, AlgorithmError> {
    options.validate()?;
    debug!("solving a batch of {} graphs", graphs.len());
    Ok(graphs
        .par_iter()
        .map(|graph| {
            let mut solver = KolmogorovMatching {
                options: options.clone(),
                statistics: MatchingStatistics::default(),
            };
            solver.solve(graph)
        })
        .collect())
}

impl Algorithm for KolmogorovMatching {
    type Output = MatchingResult;

    fn id(&self) -> AlgorithmId {
        AlgorithmId::new("kolmogorov_blossom_v")
    }

    fn name(&self) -> &'static str {
        "Blossom V Minimum Weight Perfect Matching"
    }

    fn category(&self) -> &'static str {
        "graph_matching"
    }

    fn description(&self) -> String {
        format!(
            "Kolmogorov's Blossom V primal-dual algorithm for {} weight perfect matching on general graphs, \
             with lazy per-tree dual offsets, {} dual updates and an LP-duality optimality certificate",
            match self.options.objective {
                ObjectiveSense::Minimize => "minimum",
                ObjectiveSense::Maximize => "maximum",
            },
            self.options.dual_update_strategy
        )
    }

    fn complexity(&self) -> AlgorithmComplexity {
        AlgorithmComplexity {
            time_complexity: "O(n^2 m log n)".to_string(),
            space_complexity: "O(n + m)".to_string(),
            best_case: "O(m log n)".to_string(),
            average_case: "O(n m log n)".to_string(),
            worst_case: "O(n^2 m log n)".to_string(),
        }
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        self.options.parameters()
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        self.options.set(name, value)
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        self.options.get(name)
    }

    fn is_compatible_with(&self, graph: &Graph) -> Result<(), AlgorithmError> {
        collect_edges(graph).map(|_| ()).map_err(AlgorithmError::from)
    }

    fn execute(&mut self, graph: &Graph) -> Result<MatchingResult, AlgorithmError> {
        self.solve(graph).map_err(AlgorithmError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Edge list that skips the endpoint checks of `Graph`
    struct EdgeList {
        vertex_count: usize,
        edges: Vec<(usize, usize, f64)>,
    }

    impl WeightedGraph for EdgeList {
        fn vertex_count(&self) -> usize {
            self.vertex_count
        }

        fn edge_count(&self) -> usize {
            self.edges.len()
        }

        fn edge_endpoints(&self, edge: usize) -> (NodeId, NodeId) {
            (NodeId(self.edges[edge].0), NodeId(self.edges[edge].1))
        }

        fn edge_weight(&self, edge: usize) -> f64 {
            self.edges[edge].2
        }
    }

    fn graph(vertex_count: usize, edges: &[(usize, usize, f64)]) -> EdgeList {
        EdgeList {
            vertex_count,
            edges: edges.to_vec(),
        }
    }

    fn random_graph(rng: &mut StdRng, vertex_count: usize, density: f64, max_weight: u32) -> EdgeList {
        let mut edges = Vec::new();
        for u in 0..vertex_count {
            for v in (u + 1)..vertex_count {
                if rng.gen_bool(density) {
                    edges.push((u, v, rng.gen_range(0..=max_weight) as f64));
                }
            }
        }
        EdgeList { vertex_count, edges }
    }

    /// Exact optimum by dynamic programming over vertex subsets
    fn brute_force(graph: &EdgeList, objective: ObjectiveSense) -> Option<f64> {
        let n = graph.vertex_count;
        let better = |a: f64, b: f64| match objective {
            ObjectiveSense::Minimize => a < b,
            ObjectiveSense::Maximize => a > b,
        };
        let mut best: Vec<Vec<Option<f64>>> = vec![vec![None; n]; n];
        for &(u, v, weight) in &graph.edges {
            if best[u][v].map_or(true, |current| better(weight, current)) {
                best[u][v] = Some(weight);
                best[v][u] = Some(weight);
            }
        }

        let full = (1usize << n) - 1;
        let mut table: Vec<Option<f64>> = vec![None; 1 << n];
        table[0] = Some(0.0);
        for mask in 1..=full {
            if mask.count_ones() % 2 == 1 {
                continue;
            }
            let first = mask.trailing_zeros() as usize;
            let rest = mask & !(1 << first);
            let mut value: Option<f64> = None;
            for second in (0..n).filter(|&v| rest & (1 << v) != 0) {
                if let (Some(weight), Some(sub)) = (best[first][second], table[rest & !(1 << second)]) {
                    let total = weight + sub;
                    if value.map_or(true, |current| better(total, current)) {
                        value = Some(total);
                    }
                }
            }
            table[mask] = value;
        }
        table[full]
    }

    fn assert_perfect(graph: &EdgeList, result: &MatchingResult) {
        assert_eq!(result.len(), graph.vertex_count / 2);
        let mut covered = vec![false; graph.vertex_count];
        for &edge in &result.edges {
            let (u, v, _) = graph.edges[edge];
            assert!(!covered[u] && !covered[v], "vertex matched twice");
            covered[u] = true;
            covered[v] = true;
            assert_eq!(result.mate[u], NodeId(v));
            assert_eq!(result.mate[v], NodeId(u));
        }
        assert!(covered.iter().all(|&c| c));

        let weight: f64 = result.edges.iter().map(|&edge| graph.edges[edge].2).sum();
        assert!((weight - result.weight).abs() < 1e-9);
        assert!((result.weight - result.dual_objective).abs() <= 1e-6 * result.weight.abs().max(1.0));
    }

    fn all_options() -> Vec<BlossomOptions> {
        let mut variants = Vec::new();
        for strategy in [
            DualUpdateStrategy::FixedDelta,
            DualUpdateStrategy::ConnectedComponents,
            DualUpdateStrategy::SingleTree,
        ] {
            for initialization in [InitializationType::None, InitializationType::Greedy] {
                for (before, after) in [(false, false), (true, true)] {
                    let mut options = BlossomOptions::default()
                        .with_strategy(strategy)
                        .with_initialization(initialization);
                    options.update_duals_before = before;
                    options.update_duals_after = after;
                    variants.push(options);
                }
            }
        }
        variants
    }

    #[test]
    fn test_four_cycle() {
        init_logging();
        let square = graph(4, &[(0, 1, 1.0), (1, 2, 10.0), (2, 3, 1.0), (3, 0, 10.0)]);

        let result = KolmogorovMatching::new().solve(&square).unwrap();
        assert_eq!(result.edges, vec![0, 2]);
        assert_eq!(result.weight, 2.0);
        assert!(result.is_matched(2));
        assert!(!result.is_matched(1));
        assert_perfect(&square, &result);

        let options = BlossomOptions::default().with_objective(ObjectiveSense::Maximize);
        let result = KolmogorovMatching::with_options(options).unwrap().solve(&square).unwrap();
        assert_eq!(result.edges, vec![1, 3]);
        assert_eq!(result.weight, 20.0);
        assert_perfect(&square, &result);
        let certificate = result.certificate.unwrap();
        assert_eq!(certificate.primal_objective, 20.0);
    }

    #[test]
    fn test_triangles_joined_by_bridge() {
        init_logging();
        let bridged = graph(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (2, 0, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (5, 3, 1.0),
                (2, 3, 10.0),
            ],
        );
        for options in all_options() {
            let result = KolmogorovMatching::with_options(options).unwrap().solve(&bridged).unwrap();
            assert_eq!(result.weight, 12.0);
            assert!(result.is_matched(6));
            assert_perfect(&bridged, &result);
        }
    }

    #[test]
    fn test_blossom_with_pendant() {
        // cheap triangle 1-2-3 where the cheap pendant edge forces 0-1
        let pendant = graph(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 2.0),
                (2, 3, 2.0),
                (3, 1, 2.0),
                (3, 4, 1.0),
                (4, 5, 8.0),
                (2, 5, 3.0),
                (0, 4, 9.0),
            ],
        );
        let expected = brute_force(&pendant, ObjectiveSense::Minimize).unwrap();
        for options in all_options() {
            let result = KolmogorovMatching::with_options(options).unwrap().solve(&pendant).unwrap();
            assert!((result.weight - expected).abs() < 1e-9);
            assert_perfect(&pendant, &result);
        }
    }

    #[test]
    fn test_empty_graph() {
        let result = KolmogorovMatching::new().solve(&graph(0, &[])).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.weight, 0.0);
        assert!(result.certificate.unwrap().is_optimal(1e-9));
    }

    #[test]
    fn test_infeasible_inputs() {
        init_logging();
        let mut solver = KolmogorovMatching::new();

        let odd = graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(solver.solve(&odd).unwrap_err(), MatchingError::OddVertexCount(3));

        let triangles = graph(
            6,
            &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0), (3, 4, 1.0), (4, 5, 1.0), (5, 3, 1.0)],
        );
        let isolated = graph(4, &[(0, 1, 1.0)]);
        for options in all_options() {
            let mut solver = KolmogorovMatching::with_options(options).unwrap();
            for infeasible in [&triangles, &isolated] {
                let error = solver.solve(infeasible).unwrap_err();
                assert!(matches!(error, MatchingError::NoPerfectMatching { .. }), "{:?}", error);
                assert!(!error.is_invalid_input());
            }
        }
    }

    #[test]
    fn test_infeasible_when_trees_bound_each_other() {
        init_logging();
        // 4 and 11 are leaves, which leaves 1 and 2 competing for vertex 5
        let blocked = graph(
            12,
            &[
                (0, 4, 2.218),
                (0, 7, 0.709),
                (1, 5, 0.182),
                (1, 7, 1.688),
                (2, 5, 2.216),
                (2, 7, 0.106),
                (3, 7, 2.207),
                (3, 9, 0.867),
                (5, 6, 2.230),
                (5, 8, 0.286),
                (6, 7, 1.132),
                (6, 9, 2.326),
                (6, 10, 1.758),
                (7, 9, 1.863),
                (8, 9, 1.579),
                (8, 10, 2.458),
                (9, 11, 0.689),
            ],
        );
        assert_eq!(brute_force(&blocked, ObjectiveSense::Minimize), None);

        for options in all_options() {
            let strategy = options.dual_update_strategy;
            let initialization = options.initialization;
            let error = KolmogorovMatching::with_options(options).unwrap().solve(&blocked).unwrap_err();
            assert!(
                matches!(error, MatchingError::NoPerfectMatching { .. }),
                "{} / {}: {:?}",
                strategy,
                initialization,
                error
            );
        }
    }

    #[test]
    fn test_weights_above_infeasibility_threshold() {
        init_logging();
        let pair = graph(2, &[(0, 1, 5e10)]);
        let square = graph(4, &[(0, 1, 3e10), (1, 2, 4e11), (2, 3, 2e10), (3, 0, 4e11)]);

        for options in all_options() {
            for objective in [ObjectiveSense::Minimize, ObjectiveSense::Maximize] {
                let options = options.clone().with_objective(objective);
                let mut solver = KolmogorovMatching::with_options(options).unwrap();

                let result = solver.solve(&pair).unwrap();
                assert_eq!(result.weight, 5e10);

                let result = solver.solve(&square).unwrap();
                let expected = match objective {
                    ObjectiveSense::Minimize => 5e10,
                    ObjectiveSense::Maximize => 8e11,
                };
                assert!((result.weight - expected).abs() <= 1e-6 * expected, "{:?}", objective);
                assert_perfect(&square, &result);
            }
        }
    }

    #[test]
    fn test_input_validation() {
        let mut solver = KolmogorovMatching::new();
        let cases = [
            (graph(2, &[(0, 0, 1.0)]), MatchingError::SelfLoop { edge: 0, vertex: 0 }),
            (
                graph(2, &[(0, 1, 1.0), (1, 0, -2.0)]),
                MatchingError::NegativeWeight { edge: 1, weight: -2.0 },
            ),
            (
                graph(2, &[(0, 1, f64::INFINITY)]),
                MatchingError::InvalidWeight {
                    edge: 0,
                    weight: f64::INFINITY,
                },
            ),
            (
                graph(2, &[(0, 5, 1.0)]),
                MatchingError::VertexOutOfRange {
                    edge: 0,
                    vertex: 5,
                    vertex_count: 2,
                },
            ),
        ];
        for (input, expected) in cases {
            let error = solver.solve(&input).unwrap_err();
            assert!(error.is_invalid_input());
            assert_eq!(error, expected);
        }

        let nan = graph(2, &[(0, 1, f64::NAN)]);
        assert!(matches!(solver.solve(&nan), Err(MatchingError::InvalidWeight { edge: 0, .. })));
    }

    #[test]
    fn test_parallel_edges_use_cheapest() {
        let parallel = graph(2, &[(0, 1, 5.0), (1, 0, 3.0), (0, 1, 4.0)]);
        let result = KolmogorovMatching::new().solve(&parallel).unwrap();
        assert_eq!(result.edges, vec![1]);
        assert_eq!(result.weight, 3.0);
    }

    #[test]
    fn test_repeated_solves_are_stable() {
        let mut rng = StdRng::seed_from_u64(7);
        let input = random_graph(&mut rng, 30, 1.0, 1000);
        let mut solver = KolmogorovMatching::new();
        let first = solver.solve(&input).unwrap();
        let second = solver.solve(&input).unwrap();
        assert_eq!(first.weight, second.weight);
        assert_eq!(first.edges, second.edges);
    }

    #[test]
    fn test_all_variants_against_brute_force() {
        init_logging();
        let mut rng = StdRng::seed_from_u64(2025);
        for round in 0..40 {
            let vertex_count = 2 * rng.gen_range(1..=6);
            let density = if round % 2 == 0 { 1.0 } else { 0.5 };
            let input = random_graph(&mut rng, vertex_count, density, 20);

            for objective in [ObjectiveSense::Minimize, ObjectiveSense::Maximize] {
                let expected = brute_force(&input, objective);
                for options in all_options() {
                    let options = options.with_objective(objective);
                    let outcome = KolmogorovMatching::with_options(options.clone()).unwrap().solve(&input);
                    match (expected, outcome) {
                        (Some(expected), Ok(result)) => {
                            assert!(
                                (result.weight - expected).abs() < 1e-9,
                                "round {}: {:?} found {} instead of {}",
                                round,
                                options,
                                result.weight,
                                expected
                            );
                            assert_perfect(&input, &result);
                        }
                        (None, Err(MatchingError::NoPerfectMatching { .. })) => {}
                        (expected, outcome) => {
                            panic!("round {}: expected {:?}, got {:?}", round, expected, outcome)
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_large_random_graphs_agree_across_strategies() {
        init_logging();
        let mut rng = StdRng::seed_from_u64(42);
        for &vertex_count in &[50usize, 100, 200] {
            let input = random_graph(&mut rng, vertex_count, 1.0, 10_000);

            let mut weights = Vec::new();
            for strategy in [
                DualUpdateStrategy::FixedDelta,
                DualUpdateStrategy::ConnectedComponents,
                DualUpdateStrategy::SingleTree,
            ] {
                let options = BlossomOptions::default().with_strategy(strategy);
                let result = KolmogorovMatching::with_options(options).unwrap().solve(&input).unwrap();
                assert_perfect(&input, &result);
                assert!(result.certificate.as_ref().unwrap().is_optimal(1e-6));
                weights.push(result.weight);
            }
            assert!(weights.windows(2).all(|pair| (pair[0] - pair[1]).abs() < 1e-6), "{:?}", weights);
        }
    }

    #[test]
    fn test_sparse_random_graphs_with_fractional_weights() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let vertex_count = 2 * rng.gen_range(5..=40);
            let mut input = random_graph(&mut rng, vertex_count, 0.2, 1);
            for edge in input.edges.iter_mut() {
                edge.2 = rng.gen_range(0.0..100.0);
            }
            // a perfect matching always exists along 0-1, 2-3, ...
            for u in (0..vertex_count).step_by(2) {
                input.edges.push((u, u + 1, rng.gen_range(0.0..100.0)));
            }

            let result = KolmogorovMatching::new().solve(&input).unwrap();
            assert_perfect(&input, &result);
            assert!(result.certificate.unwrap().feasibility_verified);
        }
    }

    #[test]
    fn test_solve_batch() {
        let mut rng = StdRng::seed_from_u64(3);
        let graphs: Vec<EdgeList> = (0..8).map(|_| random_graph(&mut rng, 10, 1.0, 50)).collect();
        let results = solve_batch(&graphs, &BlossomOptions::default()).unwrap();

        assert_eq!(results.len(), graphs.len());
        for (input, result) in graphs.iter().zip(results) {
            let result = result.unwrap();
            assert_eq!(Some(result.weight), brute_force(input, ObjectiveSense::Minimize));
        }

        let mut invalid = BlossomOptions::default();
        invalid.epsilon = -1.0;
        assert!(solve_batch(&graphs, &invalid).is_err());
    }

    #[test]
    fn test_algorithm_interface() {
        let mut solver = KolmogorovMatching::new();
        assert_eq!(solver.category(), "graph_matching");
        assert!(solver.description().contains("minimum"));
        assert_eq!(solver.parameters().len(), 9);

        solver.set_parameter("objective", "maximize").unwrap();
        solver.set_parameter("dual_update_strategy", "fixed_delta").unwrap();
        assert_eq!(solver.get_parameter("objective").as_deref(), Some("maximize"));
        assert!(solver.set_parameter("dual_update_strategy", "newton").is_err());
        assert!(solver.set_parameter("epsilon", "0").is_err());

        let mut input = Graph::with_nodes(4);
        input.add_edge(0, 1, 1.0).unwrap();
        input.add_edge(1, 2, 10.0).unwrap();
        input.add_edge(2, 3, 1.0).unwrap();
        input.add_edge(3, 0, 10.0).unwrap();
        assert!(solver.is_compatible_with(&input).is_ok());

        let result = solver.execute(&input).unwrap();
        assert_eq!(result.weight, 20.0);
        assert_eq!(solver.statistics().augment_count + solver.statistics().greedy_matched / 2, 2);

        let odd = Graph::with_nodes(3);
        assert!(matches!(solver.is_compatible_with(&odd), Err(AlgorithmError::InvalidGraph(_))));
        assert!(matches!(
            solver.execute(&Graph::with_nodes(2)),
            Err(AlgorithmError::NotSupported(_))
        ));
    }

    #[test]
    fn test_statistics_serialize() {
        let mut rng = StdRng::seed_from_u64(11);
        let input = random_graph(&mut rng, 20, 1.0, 100);
        let options = BlossomOptions::default().with_initialization(InitializationType::None);
        let result = KolmogorovMatching::with_options(options).unwrap().solve(&input).unwrap();

        assert_eq!(result.statistics.initial_trees, 20);
        assert_eq!(result.statistics.augment_count, 10);
        let json = serde_json::to_string(&result).unwrap();
        let restored: MatchingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.edges, result.edges);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_complete_graphs_match_brute_force(
            half in 1usize..=4,
            weights in proptest::collection::vec(0u32..50, 28),
            strategy in prop_oneof![
                Just(DualUpdateStrategy::FixedDelta),
                Just(DualUpdateStrategy::ConnectedComponents),
                Just(DualUpdateStrategy::SingleTree),
            ],
        ) {
            let vertex_count = 2 * half;
            let mut edges = Vec::new();
            for u in 0..vertex_count {
                for v in (u + 1)..vertex_count {
                    edges.push((u, v, weights[edges.len()] as f64));
                }
            }
            let input = EdgeList { vertex_count, edges };

            let options = BlossomOptions::default().with_strategy(strategy);
            let result = KolmogorovMatching::with_options(options).unwrap().solve(&input).unwrap();
            let expected = brute_force(&input, ObjectiveSense::Minimize).unwrap();
            prop_assert!((result.weight - expected).abs() < 1e-9);
            prop_assert!(result.certificate.unwrap().is_optimal(1e-6));
        }
    }
}
