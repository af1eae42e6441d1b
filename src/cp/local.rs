//! Tabu min-conflicts local search.
//!
//! # Algorithm
//!
//! 1. Propagate at the root (a conflict here proves infeasibility)
//! 2. Draw every variable uniformly from its pruned domain
//! 3. At each iteration:
//!    a. Collect the variables of all violated constraints
//!    b. Evaluate every value change of those variables by its change in
//!       total violation
//!    c. Apply the best non-tabu change (or a tabu change that yields a
//!       new best total, the aspiration criterion); ties break at random
//!    d. Forbid moving the variable back to its old value for `tabu_tenure`
//!       iterations
//! 4. Succeed when the total violation reaches zero
//!
//! The search is incomplete: running out of iterations yields
//! [`SolverStatus::Unknown`], never `Infeasible`.
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search—Part I", *ORSA Journal on Computing* 1(3), 190-206.
//! Minton, S. et al. (1992). "Minimizing conflicts: a heuristic repair method
//! for constraint satisfaction and scheduling problems", *Artificial Intelligence* 58, 161-205.

use super::model::CpModel;
use super::propagate::Problem;
use super::solver::{CpSolution, CpSolver, SolverConfig, SolverStatus, StopCondition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Iterations between deadline checks.
const STOP_CHECK_INTERVAL: usize = 64;

/// Tabu-guided min-conflicts solver.
///
/// Runs `config.num_workers` independent restarts seeded from
/// `config.seed` (consecutive seeds). With the `parallel` feature the
/// restarts run on the rayon pool and the first success stops the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabuSolver;

impl TabuSolver {
    pub fn new() -> Self {
        Self
    }
}

enum WalkResult {
    Found(Vec<i64>, u64),
    GaveUp(u64),
    Stopped(u64),
}

impl WalkResult {
    fn moves(&self) -> u64 {
        match self {
            WalkResult::Found(_, m) | WalkResult::GaveUp(m) | WalkResult::Stopped(m) => *m,
        }
    }
}

struct Walk<'a> {
    problem: &'a Problem,
    /// Values left in each domain after root propagation.
    candidates: Vec<Vec<i64>>,
    config: &'a SolverConfig,
    stop: &'a StopCondition,
    /// Raised by the first restart that succeeds.
    done: &'a AtomicBool,
}

impl Walk<'_> {
    fn run(&self, seed: u64) -> WalkResult {
        let mut rng = StdRng::seed_from_u64(seed);
        let problem = self.problem;
        let n = problem.var_count();

        let mut values: Vec<i64> = self
            .candidates
            .iter()
            .map(|c| c[rng.random_range(0..c.len())])
            .collect();
        let mut violations: Vec<i64> = problem.props.iter().map(|p| p.violation(&values)).collect();
        let mut cost: i64 = violations.iter().sum();
        let mut best_cost = cost;

        // (var, value) -> first iteration at which the move is allowed again
        let mut tabu: HashMap<(usize, i64), usize> = HashMap::new();
        let mut in_conflict = vec![false; n];
        let mut conflicted = Vec::new();
        let mut scratch = Vec::new();

        for iteration in 0..self.config.max_iterations {
            if cost == 0 {
                self.done.store(true, Ordering::Relaxed);
                return WalkResult::Found(values, iteration as u64);
            }
            if iteration % STOP_CHECK_INTERVAL == 0
                && (self.stop.should_stop() || self.done.load(Ordering::Relaxed))
            {
                return WalkResult::Stopped(iteration as u64);
            }

            conflicted.clear();
            in_conflict.fill(false);
            for (ci, &v) in violations.iter().enumerate() {
                if v > 0 {
                    scratch.clear();
                    problem.props[ci].collect_vars(&mut scratch);
                    for &var in &scratch {
                        if !in_conflict[var] && self.candidates[var].len() > 1 {
                            in_conflict[var] = true;
                            conflicted.push(var);
                        }
                    }
                }
            }
            if conflicted.is_empty() {
                // Only fixed variables are involved: no move can help.
                return WalkResult::GaveUp(iteration as u64);
            }

            let mut best_move: Option<(usize, i64)> = None;
            let mut best_delta = i64::MAX;
            let mut ties = 0u32;
            for &var in &conflicted {
                let old = values[var];
                for &candidate in &self.candidates[var] {
                    if candidate == old {
                        continue;
                    }
                    let delta = self.delta(var, candidate, &mut values, &violations);
                    let is_tabu = tabu
                        .get(&(var, candidate))
                        .is_some_and(|&until| until > iteration);
                    if is_tabu && cost + delta >= best_cost {
                        continue;
                    }
                    if delta < best_delta {
                        best_delta = delta;
                        best_move = Some((var, candidate));
                        ties = 1;
                    } else if delta == best_delta {
                        ties += 1;
                        if rng.random_range(0..ties) == 0 {
                            best_move = Some((var, candidate));
                        }
                    }
                }
            }

            let (var, value) = match best_move {
                Some(m) => m,
                None => {
                    // Everything is tabu: random walk step.
                    let var = conflicted[rng.random_range(0..conflicted.len())];
                    let c = &self.candidates[var];
                    (var, c[rng.random_range(0..c.len())])
                }
            };

            let old = values[var];
            values[var] = value;
            for &ci in &problem.watches[var] {
                let v = problem.props[ci].violation(&values);
                cost += v - violations[ci];
                violations[ci] = v;
            }
            tabu.insert((var, old), iteration + self.config.tabu_tenure);
            best_cost = best_cost.min(cost);
        }

        if cost == 0 {
            self.done.store(true, Ordering::Relaxed);
            WalkResult::Found(values, self.config.max_iterations as u64)
        } else {
            WalkResult::GaveUp(self.config.max_iterations as u64)
        }
    }

    /// Change in total violation if `var` took `candidate`.
    fn delta(&self, var: usize, candidate: i64, values: &mut [i64], violations: &[i64]) -> i64 {
        let old = values[var];
        values[var] = candidate;
        let view: &[i64] = values;
        let delta = self.problem.watches[var]
            .iter()
            .map(|&ci| self.problem.props[ci].violation(view) - violations[ci])
            .sum();
        values[var] = old;
        delta
    }
}

#[cfg(feature = "parallel")]
fn run_restarts(walk: &Walk<'_>, seeds: &[u64]) -> Vec<WalkResult> {
    seeds.par_iter().map(|&seed| walk.run(seed)).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_restarts(walk: &Walk<'_>, seeds: &[u64]) -> Vec<WalkResult> {
    let mut results = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        let result = walk.run(seed);
        let found = matches!(result, WalkResult::Found(..));
        results.push(result);
        if found {
            break;
        }
    }
    results
}

impl CpSolver for TabuSolver {
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> CpSolution {
        let stop = StopCondition::new(config, cancel);

        if let Err(reason) = config.validate() {
            return CpSolution::empty(SolverStatus::ModelInvalid)
                .with_message(format!("invalid solver configuration: {reason}"));
        }
        let problem = match Problem::compile(model) {
            Ok(p) => p,
            Err(reason) => return CpSolution::empty(SolverStatus::ModelInvalid).with_message(reason),
        };

        let mut root = problem.domains.clone();
        if !problem.propagate_all(&mut root) {
            debug!(event = "tabu_root_conflict", model = %model.name);
            let mut solution = CpSolution::empty(SolverStatus::Infeasible)
                .with_message("conflict during root propagation");
            solution.solve_time_ms = stop.elapsed_ms();
            return solution;
        }

        let done = AtomicBool::new(false);
        let walk = Walk {
            problem: &problem,
            candidates: root.iter().map(|d| d.values().collect()).collect(),
            config,
            stop: &stop,
            done: &done,
        };
        let base_seed = config.seed.unwrap_or_else(rand::random);
        let seeds: Vec<u64> = (0..config.num_workers as u64)
            .map(|i| base_seed.wrapping_add(i))
            .collect();

        let results = run_restarts(&walk, &seeds);
        let moves: u64 = results.iter().map(WalkResult::moves).sum();
        let stopped = results.iter().any(|r| matches!(r, WalkResult::Stopped(_)));
        let found = results.into_iter().find_map(|r| match r {
            WalkResult::Found(values, _) => Some(values),
            _ => None,
        });

        debug!(
            event = "tabu_end",
            model = %model.name,
            restarts = seeds.len(),
            moves = moves,
            found = found.is_some(),
            elapsed_ms = stop.elapsed_ms(),
        );

        let mut solution = match found {
            Some(values) => {
                let mut solution = CpSolution::empty(SolverStatus::Feasible);
                solution.int_vars = problem.names.iter().cloned().zip(values).collect();
                solution
            }
            None if stopped && stop.should_stop() => CpSolution::empty(SolverStatus::Timeout)
                .with_message("time limit reached or cancelled"),
            None => CpSolution::empty(SolverStatus::Unknown).with_message(format!(
                "no model found within {} iterations x {} restarts",
                config.max_iterations, config.num_workers
            )),
        };
        solution.nodes = moves;
        solution.solve_time_ms = stop.elapsed_ms();
        solution
    }
}
