//! Dual solution and LP-duality optimality certificate
//!
//! A perfect matching `M` is optimal when there are vertex duals `y_v` and
//! odd-set duals `z_B >= 0` such that every edge has a non-negative reduced
//! cost `c(uv) - y_u - y_v - sum(z_B : B separates u and v)` and the dual
//! objective `sum(y) + sum(z)` equals the weight of `M`.

use serde::{Deserialize, Serialize};

use super::edge::EdgeIndex;
use super::node::NodeIndex;
use super::state::State;
use crate::algorithm::traits::NodeId;

/// Dual value of one odd vertex set (a blossom)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddSetDual {
    pub vertices: Vec<NodeId>,
    pub dual: f64,
}

/// Duals proving optimality of a perfect matching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DualSolution {
    pub vertex_duals: Vec<f64>,
    pub odd_sets: Vec<OddSetDual>,
}

/// Mathematical optimality certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalityCertificate {
    pub primal_objective: f64,
    pub dual_objective: f64,
    pub duality_gap: f64,
    /// Smallest reduced cost over all edges
    pub min_reduced_cost: f64,
    /// Matched edges are tight and positive odd sets are crossed exactly once
    pub complementary_slackness: bool,
    /// Reduced costs and odd-set duals are non-negative
    pub feasibility_verified: bool,
}

impl OptimalityCertificate {
    /// All conditions hold, with the gap measured relative to the objective
    pub fn is_optimal(&self, tolerance: f64) -> bool {
        self.feasibility_verified
            && self.complementary_slackness
            && self.duality_gap <= tolerance * self.primal_objective.abs().max(1.0)
    }
}

impl DualSolution {
    pub fn objective(&self) -> f64 {
        self.vertex_duals.iter().sum::<f64>() + self.odd_sets.iter().map(|set| set.dual).sum::<f64>()
    }

    /// Checks the matching `matching` (edge indices into `edges`) against
    /// these duals. `tolerance` is scaled by the largest edge cost.
    pub fn verify(&self, edges: &[(usize, usize, f64)], matching: &[usize], tolerance: f64) -> OptimalityCertificate {
        let scale = edges.iter().fold(1.0f64, |scale, &(_, _, cost)| scale.max(cost.abs()));
        let tolerance = tolerance * scale;

        let mut membership: Vec<Vec<usize>> = vec![Vec::new(); self.vertex_duals.len()];
        for (set, odd_set) in self.odd_sets.iter().enumerate() {
            for vertex in &odd_set.vertices {
                membership[vertex.as_usize()].push(set);
            }
        }

        let separating = |u: usize, v: usize| -> Vec<usize> {
            let (of_u, of_v) = (&membership[u], &membership[v]);
            of_u.iter()
                .filter(|set| of_v.binary_search(set).is_err())
                .chain(of_v.iter().filter(|set| of_u.binary_search(set).is_err()))
                .copied()
                .collect()
        };
        let reduced_cost = |&(u, v, cost): &(usize, usize, f64)| {
            cost - self.vertex_duals[u]
                - self.vertex_duals[v]
                - separating(u, v).iter().map(|&set| self.odd_sets[set].dual).sum::<f64>()
        };

        let min_reduced_cost = edges.iter().map(&reduced_cost).fold(f64::INFINITY, f64::min);
        let feasibility_verified = min_reduced_cost >= -tolerance && self.odd_sets.iter().all(|set| set.dual >= -tolerance);

        let mut crossings = vec![0usize; self.odd_sets.len()];
        let mut matched_tight = true;
        for &edge in matching {
            let (u, v, _) = edges[edge];
            matched_tight &= reduced_cost(&edges[edge]).abs() <= tolerance;
            for set in separating(u, v) {
                crossings[set] += 1;
            }
        }
        let sets_tight = self
            .odd_sets
            .iter()
            .zip(&crossings)
            .all(|(set, &count)| set.dual <= tolerance || count == 1);

        let primal_objective: f64 = matching.iter().map(|&edge| edges[edge].2).sum();
        let dual_objective = self.objective();

        OptimalityCertificate {
            primal_objective,
            dual_objective,
            duality_gap: (primal_objective - dual_objective).abs(),
            min_reduced_cost: if edges.is_empty() { 0.0 } else { min_reduced_cost },
            complementary_slackness: matched_tight && sets_tight,
            feasibility_verified,
        }
    }
}

impl State {
    /// Duals of the finished solve, keeping odd sets with a positive dual.
    /// Every tree is gone, so stored values are true values.
    pub fn dual_solution(&self) -> DualSolution {
        let vertex_duals = (0..self.vertex_count).map(|vertex| self.true_dual(vertex)).collect();
        let odd_sets = (self.vertex_count..self.nodes.len())
            .filter(|&node| self.nodes[node].alive)
            .map(|blossom| OddSetDual {
                vertices: self.blossom_vertices(blossom).into_iter().map(NodeId).collect(),
                dual: self.true_dual(blossom),
            })
            .filter(|set| set.dual > 0.0)
            .collect();

        DualSolution { vertex_duals, odd_sets }
    }

    /// Original vertices inside `blossom`, ascending
    fn blossom_vertices(&self, blossom: NodeIndex) -> Vec<NodeIndex> {
        let mut vertices = Vec::new();
        let mut stack = vec![blossom];
        while let Some(node) = stack.pop() {
            if self.nodes[node].is_blossom {
                stack.extend(self.nodes[node].blossom_children.iter().copied());
            } else {
                vertices.push(node);
            }
        }
        vertices.sort_unstable();
        vertices
    }

    /// Matched edge and partner of every original vertex
    pub fn mates(&self) -> (Vec<EdgeIndex>, Vec<NodeIndex>) {
        let mut matching = Vec::with_capacity(self.vertex_count / 2);
        let mut mate = Vec::with_capacity(self.vertex_count);
        for vertex in 0..self.vertex_count {
            let edge = match self.nodes[vertex].matched {
                Some(edge) => edge,
                None => panic!("vertex {} is unmatched after the main loop", vertex),
            };
            let [first, second] = self.edges[edge].head_original;
            let partner = if first == vertex { second } else { first };
            if vertex < partner {
                matching.push(edge);
            }
            mate.push(partner);
        }
        (matching, mate)
    }
}
