//! Complete backtracking search.
//!
//! # Algorithm
//!
//! 1. Compile the model and propagate every constraint at the root
//! 2. Pick the unfixed variable with the smallest domain (lowest index on ties)
//! 3. Try its values in ascending order: fix, propagate, recurse
//! 4. On conflict, restore the parent's domains and try the next value
//! 5. Stop at the first complete assignment, or report infeasibility
//!    once the tree is exhausted
//!
//! Value and variable orders are fixed, so the result is deterministic.

use super::model::CpModel;
use super::propagate::{Domain, Problem};
use super::solver::{CpSolution, CpSolver, SolverConfig, SolverStatus, StopCondition};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

/// Outcome of exploring a subtree.
enum Outcome {
    Found(Vec<i64>),
    Exhausted,
    Stopped,
}

/// Depth-first search with propagation at every node.
///
/// Complete: returns [`SolverStatus::Infeasible`] only when no
/// assignment exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingSolver;

impl BacktrackingSolver {
    pub fn new() -> Self {
        Self
    }
}

struct Search<'a> {
    problem: &'a Problem,
    stop: &'a StopCondition,
    nodes: u64,
}

impl Search<'_> {
    fn explore(&mut self, domains: Vec<Domain>) -> Outcome {
        self.nodes += 1;
        if self.stop.should_stop() {
            return Outcome::Stopped;
        }

        let branch = domains
            .iter()
            .enumerate()
            .filter(|(_, d)| d.size() > 1)
            .min_by_key(|&(i, d)| (d.size(), i))
            .map(|(i, _)| i);

        let Some(var) = branch else {
            // Every domain is a singleton and propagation left no conflict.
            return Outcome::Found(domains.iter().filter_map(Domain::fixed_value).collect());
        };

        let candidates: Vec<i64> = domains[var].values().collect();
        for value in candidates {
            let mut child = domains.clone();
            child[var].fix(value);
            if !self.problem.propagate_from(&mut child, var) {
                continue;
            }
            match self.explore(child) {
                Outcome::Exhausted => {}
                other => return other,
            }
        }
        Outcome::Exhausted
    }
}

impl CpSolver for BacktrackingSolver {
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> CpSolution {
        let stop = StopCondition::new(config, cancel);

        let problem = match Problem::compile(model) {
            Ok(p) => p,
            Err(reason) => return CpSolution::empty(SolverStatus::ModelInvalid).with_message(reason),
        };

        let mut root = problem.domains.clone();
        let outcome = if problem.propagate_all(&mut root) {
            let mut search = Search {
                problem: &problem,
                stop: &stop,
                nodes: 0,
            };
            let outcome = search.explore(root);
            debug!(
                event = "backtrack_end",
                model = %model.name,
                nodes = search.nodes,
                elapsed_ms = stop.elapsed_ms(),
            );
            (outcome, search.nodes)
        } else {
            debug!(event = "backtrack_root_conflict", model = %model.name);
            (Outcome::Exhausted, 0)
        };

        let mut solution = match outcome.0 {
            Outcome::Found(values) => {
                let mut solution = CpSolution::empty(SolverStatus::Feasible);
                solution.int_vars = problem.names.iter().cloned().zip(values).collect();
                solution
            }
            Outcome::Exhausted => CpSolution::empty(SolverStatus::Infeasible)
                .with_message("search space exhausted"),
            Outcome::Stopped => CpSolution::empty(SolverStatus::Timeout)
                .with_message("time limit reached or cancelled"),
        };
        solution.nodes = outcome.1;
        solution.solve_time_ms = stop.elapsed_ms();
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{Constraint, IntVar, Literal};
    use std::sync::atomic::Ordering;

    fn permutation(n: i64) -> CpModel {
        let mut model = CpModel::new(format!("permutation-{n}"));
        for i in 0..n {
            model.add_int_var(IntVar::new(format!("x{i}"), 0, n - 1));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                model.add_constraint(Constraint::NotEqual {
                    var1: format!("x{i}"),
                    var2: format!("x{j}"),
                });
            }
            // each value taken exactly once
            let cols: Vec<String> = (0..n).map(|k| format!("x{k}")).collect();
            model.add_constraint(CpModel::count(cols, i).exactly(1));
        }
        model
    }

    #[test]
    fn test_solves_and_satisfies() {
        let model = permutation(6);
        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());

        assert!(solution.is_solution_found());
        assert_eq!(solution.int_vars.len(), 6);
        assert!(model.is_satisfied_by(&solution.int_vars));
        assert!(solution.nodes > 0);
    }

    #[test]
    fn test_pigeonhole_is_infeasible() {
        let mut model = CpModel::new("pigeons");
        for i in 0..4 {
            model.add_int_var(IntVar::new(format!("p{i}"), 0, 2));
        }
        for i in 0..4 {
            for j in (i + 1)..4 {
                model.add_constraint(Constraint::NotEqual {
                    var1: format!("p{i}"),
                    var2: format!("p{j}"),
                });
            }
        }

        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert!(solution.int_vars.is_empty());
    }

    #[test]
    fn test_root_conflict_is_infeasible() {
        let mut model = CpModel::new("root");
        model.add_int_var(IntVar::new("x", 0, 0));
        model.add_int_var(IntVar::new("y", 0, 0));
        model.add_constraint(Constraint::NotEqual {
            var1: "x".into(),
            var2: "y".into(),
        });

        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert_eq!(solution.nodes, 0);
    }

    #[test]
    fn test_invalid_model() {
        let mut model = CpModel::new("bad");
        model.add_constraint(Constraint::Equal {
            var1: "a".into(),
            var2: "b".into(),
        });

        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(solution.status, SolverStatus::ModelInvalid);
        assert!(solution.message.is_some());
    }

    #[test]
    fn test_deterministic_first_solution() {
        let mut model = CpModel::new("split");
        model.add_int_var(IntVar::new("a", 0, 1));
        model.add_int_var(IntVar::new("b", 0, 1));
        model.add_constraint(CpModel::count(["a", "b"], 0).at_most(1));

        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());
        assert_eq!(solution.value("a"), Some(0));
        assert_eq!(solution.value("b"), Some(1));
    }

    #[test]
    fn test_implication_respected() {
        let mut model = CpModel::new("implies");
        for name in ["p", "f1", "f2"] {
            model.add_int_var(IntVar::new(name, 0, 1));
        }
        for t in 0..2 {
            model.add_constraint(Constraint::Implies {
                condition: Literal::new("p", t),
                then: Box::new(CpModel::count(["f1", "f2"], t).at_least(1)),
            });
        }
        model.add_constraint(Constraint::Between {
            var: "f1".into(),
            min: 1,
            max: 1,
        });
        model.add_constraint(Constraint::Between {
            var: "f2".into(),
            min: 1,
            max: 1,
        });

        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());
        assert!(solution.is_solution_found());
        assert_eq!(solution.value("p"), Some(1));
    }

    #[test]
    fn test_cancelled_before_start() {
        let model = permutation(8);
        let cancel = Arc::new(AtomicBool::new(true));
        let solution = BacktrackingSolver::new().solve_with_cancel(
            &model,
            &SolverConfig::default(),
            Some(cancel.clone()),
        );

        assert_eq!(solution.status, SolverStatus::Timeout);
        assert!(cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn test_empty_model_is_trivially_feasible() {
        let model = CpModel::new("empty");
        let solution = BacktrackingSolver::new().solve(&model, &SolverConfig::default());
        assert!(solution.is_solution_found());
        assert!(solution.int_vars.is_empty());
    }
}
