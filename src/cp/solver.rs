//! CP solver interface and configuration.

use super::model::CpModel;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// A model satisfying every constraint was found.
    Feasible,
    /// Proven that no satisfying model exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded its time limit or was cancelled.
    Timeout,
    /// No model found, infeasibility not proven.
    Unknown,
}

/// Solution from a CP solver.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Integer variable assignments. Empty unless `status` is `Feasible`.
    pub int_vars: HashMap<String, i64>,
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
    /// Search nodes (backtracking) or moves (local search) explored.
    pub nodes: u64,
    /// Human-readable reason for a non-feasible status, if any.
    pub message: Option<String>,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            int_vars: HashMap::new(),
            solve_time_ms: 0,
            nodes: 0,
            message: None,
        }
    }

    /// Attaches a reason to the solution.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status == SolverStatus::Feasible
    }

    /// Value assigned to `name`, if any.
    pub fn value(&self, name: &str) -> Option<i64> {
        self.int_vars.get(name).copied()
    }
}

/// Solver configuration.
///
/// # Examples
///
/// ```
/// use u_seating::cp::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit_ms(5_000)
///     .with_seed(7)
///     .with_num_workers(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds. `None` = no limit.
    pub time_limit_ms: Option<u64>,
    /// Random seed for stochastic backends.
    pub seed: Option<u64>,
    /// Local-search moves per restart.
    pub max_iterations: usize,
    /// Iterations a reverted (variable, value) pair stays tabu.
    pub tabu_tenure: usize,
    /// Independent local-search restarts (run in parallel with the
    /// `parallel` feature).
    pub num_workers: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            seed: None,
            max_iterations: 20_000,
            tabu_tenure: 10,
            num_workers: 1,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tabu_tenure(mut self, tenure: usize) -> Self {
        self.tabu_tenure = tenure;
        self
    }

    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1".into());
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be positive".into());
        }
        Ok(())
    }

    /// Time limit as a [`Duration`].
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual constraint solving logic: given a
/// model they return either a complete assignment consistent with every
/// constraint, or a status explaining why none was produced.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        self.solve_with_cancel(model, config, None)
    }

    /// Solves with an optional cancellation flag.
    ///
    /// Setting the flag stops the search with [`SolverStatus::Timeout`].
    fn solve_with_cancel(
        &self,
        model: &CpModel,
        config: &SolverConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> CpSolution;
}

/// Deadline and cancellation state shared by the native backends.
#[derive(Debug, Clone)]
pub(crate) struct StopCondition {
    started: Instant,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl StopCondition {
    pub(crate) fn new(config: &SolverConfig, cancel: Option<Arc<AtomicBool>>) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: config.time_limit().map(|limit| started + limit),
            cancel,
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        if let Some(ref flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub(crate) fn elapsed_ms(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }
}
