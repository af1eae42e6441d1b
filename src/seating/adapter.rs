//! Backend selection and assignment extraction.

use super::assignment::Assignment;
use super::encoder::SeatingConstraints;
use crate::cp::{BacktrackingSolver, CpSolver, SolverConfig, SolverStatus, TabuSolver};
use crate::error::{Result, SeatingError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the default backend ([`BacktrackingSolver`]).
pub const DEFAULT_BACKEND: &str = "backtrack";

/// Name of the local-search backend ([`TabuSolver`]).
pub const TABU_BACKEND: &str = "tabu";

/// Named solver backends.
///
/// The default registry holds `"backtrack"` and `"tabu"`; further
/// engines can be registered under any other name.
pub struct SolverRegistry {
    solvers: BTreeMap<String, Box<dyn CpSolver>>,
}

impl SolverRegistry {
    /// A registry with no backends.
    pub fn empty() -> Self {
        Self {
            solvers: BTreeMap::new(),
        }
    }

    /// Adds or replaces the backend called `name`.
    pub fn register(&mut self, name: impl Into<String>, solver: Box<dyn CpSolver>) {
        self.solvers.insert(name.into(), solver);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CpSolver> {
        self.solvers.get(name).map(|s| s.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.solvers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.solvers.keys().map(String::as_str).collect()
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_BACKEND, Box::new(BacktrackingSolver::new()));
        registry.register(TABU_BACKEND, Box::new(TabuSolver::new()));
        registry
    }
}

impl fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverRegistry")
            .field("solvers", &self.names())
            .finish()
    }
}

/// Runs an encoded problem on a named backend and reads back the seating.
#[derive(Debug, Default)]
pub struct SolverAdapter {
    registry: SolverRegistry,
    config: SolverConfig,
}

impl SolverAdapter {
    /// Adapter over the default registry.
    pub fn new(config: SolverConfig) -> Self {
        Self::with_registry(SolverRegistry::default(), config)
    }

    pub fn with_registry(registry: SolverRegistry, config: SolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &SolverRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SolverRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves on `backend`.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::SolverBackend`] for an unknown backend, an invalid
    ///   configuration, a timeout, or an answer that does not satisfy the
    ///   submitted constraints.
    /// - [`SeatingError::Unsatisfiable`] when the backend proves that no
    ///   model exists.
    pub fn solve(&self, constraints: &SeatingConstraints, backend: &str) -> Result<Assignment> {
        self.solve_with_cancel(constraints, backend, None)
    }

    /// Like [`solve`](Self::solve), stopping early once `cancel` is set.
    pub fn solve_with_cancel(
        &self,
        constraints: &SeatingConstraints,
        backend: &str,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Assignment> {
        let solver = self.registry.get(backend).ok_or_else(|| {
            SeatingError::SolverBackend(format!(
                "unknown backend '{backend}' (available: {})",
                self.registry.names().join(", ")
            ))
        })?;
        self.config.validate().map_err(|e| {
            SeatingError::SolverBackend(format!("invalid solver configuration: {e}"))
        })?;

        let solution = solver.solve_with_cancel(&constraints.model, &self.config, cancel);
        debug!(
            event = "backend_result",
            backend = backend,
            status = ?solution.status,
            nodes = solution.nodes,
            solve_time_ms = solution.solve_time_ms,
        );

        let detail = || {
            solution
                .message
                .clone()
                .unwrap_or_else(|| "no detail".to_string())
        };
        match solution.status {
            SolverStatus::Feasible => {}
            SolverStatus::Infeasible => return Err(SeatingError::Unsatisfiable),
            SolverStatus::ModelInvalid => {
                return Err(SeatingError::SolverBackend(format!(
                    "backend '{backend}' rejected the model: {}",
                    detail()
                )))
            }
            SolverStatus::Timeout => {
                return Err(SeatingError::SolverBackend(format!(
                    "backend '{backend}' stopped: {}",
                    detail()
                )))
            }
            SolverStatus::Unknown => {
                return Err(SeatingError::SolverBackend(format!(
                    "backend '{backend}' found no model: {}",
                    detail()
                )))
            }
        }

        let violated = constraints.model.violated(&solution.int_vars).len();
        if violated > 0 {
            warn!(event = "invalid_model", backend = backend, violated = violated);
            return Err(SeatingError::SolverBackend(format!(
                "backend '{backend}' returned a model violating {violated} constraints"
            )));
        }

        let mut tables = Vec::with_capacity(constraints.person_vars.len());
        for name in &constraints.person_vars {
            let value = solution.value(name).ok_or_else(|| {
                SeatingError::SolverBackend(format!("backend '{backend}' returned no value for {name}"))
            })?;
            let table = usize::try_from(value)
                .ok()
                .filter(|&t| t < constraints.table_count)
                .ok_or_else(|| {
                    SeatingError::SolverBackend(format!(
                        "backend '{backend}' put {name} at nonexistent table {value}"
                    ))
                })?;
            tables.push(table);
        }
        Ok(Assignment::new(tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, CpSolution};
    use crate::seating::{ConstraintEncoder, EventData, IntegerEncoder, SeatingModel};
    use std::collections::HashMap;

    fn encode(data: EventData) -> SeatingConstraints {
        IntegerEncoder
            .encode(&SeatingModel::new(&data).unwrap())
            .unwrap()
    }

    /// Returns a fixed answer regardless of the model.
    struct CannedSolver {
        status: SolverStatus,
        values: Vec<(&'static str, i64)>,
    }

    impl CpSolver for CannedSolver {
        fn solve_with_cancel(
            &self,
            _model: &CpModel,
            _config: &SolverConfig,
            _cancel: Option<Arc<AtomicBool>>,
        ) -> CpSolution {
            let mut solution = CpSolution::empty(self.status);
            solution.int_vars = self
                .values
                .iter()
                .map(|&(k, v)| (k.to_string(), v))
                .collect::<HashMap<_, _>>();
            solution
        }
    }

    fn adapter_with(solver: CannedSolver) -> SolverAdapter {
        let mut adapter = SolverAdapter::new(SolverConfig::default());
        adapter.registry_mut().register("canned", Box::new(solver));
        adapter
    }

    #[test]
    fn test_default_registry() {
        let registry = SolverRegistry::default();
        assert_eq!(registry.names(), vec!["backtrack", "tabu"]);
        assert!(registry.contains(DEFAULT_BACKEND));
        assert!(registry.get("z3").is_none());
    }

    #[test]
    fn test_reads_values_in_person_order() {
        let encoded = encode(EventData::unnamed(3, vec![2, 2]).with_enemy(0, 1));
        let assignment = SolverAdapter::default()
            .solve(&encoded, DEFAULT_BACKEND)
            .unwrap();

        assert_eq!(assignment.as_slice(), &[0, 1, 0]);
    }

    #[test]
    fn test_unknown_backend() {
        let encoded = encode(EventData::unnamed(1, vec![1]));
        let err = SolverAdapter::default().solve(&encoded, "yices").unwrap_err();

        match err {
            SeatingError::SolverBackend(msg) => {
                assert!(msg.contains("yices"));
                assert!(msg.contains("backtrack, tabu"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_infeasible_maps_to_unsatisfiable() {
        let encoded = encode(EventData::unnamed(2, vec![1]).with_enemy(0, 1));
        let err = SolverAdapter::default()
            .solve(&encoded, DEFAULT_BACKEND)
            .unwrap_err();
        assert_eq!(err, SeatingError::Unsatisfiable);
    }

    #[test]
    fn test_timeout_is_backend_error() {
        let encoded = encode(EventData::unnamed(2, vec![1, 1]));
        let cancel = Arc::new(AtomicBool::new(true));
        let err = SolverAdapter::default()
            .solve_with_cancel(&encoded, DEFAULT_BACKEND, Some(cancel))
            .unwrap_err();
        assert!(matches!(err, SeatingError::SolverBackend(_)));
    }

    #[test]
    fn test_unknown_status_is_backend_error() {
        let encoded = encode(EventData::unnamed(1, vec![1]));
        let adapter = adapter_with(CannedSolver {
            status: SolverStatus::Unknown,
            values: vec![],
        });
        let err = adapter.solve(&encoded, "canned").unwrap_err();
        assert!(matches!(err, SeatingError::SolverBackend(_)));
        assert!(!err.is_unsatisfiable());
    }

    #[test]
    fn test_rejects_answer_violating_constraints() {
        let encoded = encode(EventData::unnamed(2, vec![2, 2]).with_enemy(0, 1));
        let adapter = adapter_with(CannedSolver {
            status: SolverStatus::Feasible,
            values: vec![("p0", 1), ("p1", 1)],
        });
        let err = adapter.solve(&encoded, "canned").unwrap_err();
        assert!(matches!(err, SeatingError::SolverBackend(msg) if msg.contains("violating")));
    }

    #[test]
    fn test_rejects_incomplete_answer() {
        let encoded = encode(EventData::unnamed(2, vec![2]));
        let adapter = adapter_with(CannedSolver {
            status: SolverStatus::Feasible,
            values: vec![("p0", 0)],
        });
        assert!(matches!(
            adapter.solve(&encoded, "canned"),
            Err(SeatingError::SolverBackend(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_backend_error() {
        let encoded = encode(EventData::unnamed(1, vec![1]));
        let adapter = SolverAdapter::new(SolverConfig::default().with_num_workers(0));
        let err = adapter.solve(&encoded, TABU_BACKEND).unwrap_err();
        assert!(matches!(err, SeatingError::SolverBackend(msg) if msg.contains("num_workers")));
    }

    #[test]
    fn test_tabu_backend_through_adapter() {
        let encoded = encode(
            EventData::unnamed(4, vec![2, 2])
                .with_couple(0, 1)
                .with_enemy(1, 2),
        );
        let adapter = SolverAdapter::new(SolverConfig::default().with_seed(5));
        let assignment = adapter.solve(&encoded, TABU_BACKEND).unwrap();

        assert_eq!(assignment.table_of(0), assignment.table_of(1));
        assert_ne!(assignment.table_of(1), assignment.table_of(2));
    }
}
