//! End-to-end seating: validate, encode, solve.

use super::adapter::SolverAdapter;
use super::assignment::Assignment;
use super::encoder::ConstraintEncoder;
use super::model::{EventData, SeatingModel};
use crate::config::PlannerConfig;
use crate::cp::CpSolver;
use crate::error::Result;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Seats an event's persons at its tables.
///
/// Each call to [`solve`](Self::solve) builds a fresh model and constraint
/// set; the planner itself holds only its configuration, encoder and
/// backends, and can be reused across events.
///
/// # Examples
///
/// ```
/// use u_seating::config::PlannerConfig;
/// use u_seating::seating::{EventData, SeatingPlanner};
///
/// let data = EventData::unnamed(4, vec![2, 2])
///     .with_couple(0, 1)
///     .with_enemy(1, 2);
///
/// let seating = SeatingPlanner::new(PlannerConfig::default())
///     .solve(&data)
///     .unwrap();
/// assert_eq!(seating.table_of(0), seating.table_of(1));
/// assert_ne!(seating.table_of(1), seating.table_of(2));
/// ```
pub struct SeatingPlanner {
    config: PlannerConfig,
    encoder: Box<dyn ConstraintEncoder>,
    adapter: SolverAdapter,
}

impl SeatingPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let encoder = config.model.build();
        let adapter = SolverAdapter::new(config.search.clone());
        Self {
            config,
            encoder,
            adapter,
        }
    }

    /// Replaces the encoder chosen by `config.model`.
    pub fn with_encoder(mut self, encoder: Box<dyn ConstraintEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Registers (or replaces) a backend under `name`.
    pub fn with_solver(mut self, name: impl Into<String>, solver: Box<dyn CpSolver>) -> Self {
        self.adapter.registry_mut().register(name, solver);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }

    /// Computes a seating satisfying every rule.
    ///
    /// # Errors
    ///
    /// - [`InputValidation`](crate::SeatingError::InputValidation) for
    ///   malformed data; no solving is attempted.
    /// - [`Unsatisfiable`](crate::SeatingError::Unsatisfiable) when no
    ///   seating exists.
    /// - [`SolverBackend`](crate::SeatingError::SolverBackend) when the
    ///   backend is unknown, misconfigured, times out or misbehaves.
    pub fn solve(&self, data: &EventData) -> Result<Assignment> {
        self.solve_with_cancel(data, None)
    }

    /// Like [`solve`](Self::solve); setting `cancel` stops the search with
    /// a `SolverBackend` error.
    pub fn solve_with_cancel(
        &self,
        data: &EventData,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Assignment> {
        let started = Instant::now();
        info!(
            event = "solve_start",
            persons = data.persons.len(),
            tables = data.tables.len(),
            groups = data.groups.len(),
            couples = data.couples.len(),
            enemies = data.enemies.len(),
            solver = %self.config.solver,
            encoder = self.encoder.name(),
        );

        let result = self.run(data, cancel);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(assignment) => info!(
                event = "solve_end",
                outcome = "seated",
                persons = assignment.len(),
                elapsed_ms = elapsed_ms,
            ),
            Err(e) => info!(
                event = "solve_end",
                outcome = "failed",
                error = %e,
                elapsed_ms = elapsed_ms,
            ),
        }
        result
    }

    fn run(&self, data: &EventData, cancel: Option<Arc<AtomicBool>>) -> Result<Assignment> {
        let model = SeatingModel::new(data)?;
        let encoded = self.encoder.encode(&model)?;
        debug!(
            event = "encoded",
            encoder = self.encoder.name(),
            variables = encoded.model.var_count(),
            constraints = encoded.model.constraint_count(),
        );
        self.adapter
            .solve_with_cancel(&encoded, &self.config.solver, cancel)
    }
}

impl Default for SeatingPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl fmt::Debug for SeatingPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatingPlanner")
            .field("config", &self.config)
            .field("encoder", &self.encoder.name())
            .field("adapter", &self.adapter)
            .finish()
    }
}
