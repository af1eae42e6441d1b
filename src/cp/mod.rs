//! Constraint Programming (CP) layer.
//!
//! Provides a domain-agnostic finite-domain model (integer variables and
//! a conjunction of constraints) plus the [`CpSolver`] trait and two
//! native solver implementations.
//!
//! # Key Components
//!
//! - **Variables**: [`IntVar`], [`Literal`]: decision variables and `var == value` atoms
//! - **Constraints**: [`Constraint`]: Between, Count, Equal, NotEqual, Implies
//! - **Model**: [`CpModel`]: ordered variables plus constraints; [`CpModel::count`]
//!   is the shared indicator-sum builder
//! - **Solver**: [`CpSolver`] trait, with [`BacktrackingSolver`] (complete)
//!   and [`TabuSolver`] (incomplete local search)
//!
//! # Design
//!
//! Solvers never return partial assignments: a [`CpSolution`] carries
//! values only when its status is [`SolverStatus::Feasible`].
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod local;
mod model;
mod propagate;
mod search;
mod solver;
mod variables;

pub use local::TabuSolver;
pub use model::{Comparison, Constraint, CountExpr, CpModel};
pub use propagate::MAX_DOMAIN_WIDTH;
pub use search::BacktrackingSolver;
pub use solver::{CpSolution, CpSolver, SolverConfig, SolverStatus};
pub use variables::{IntVar, Literal};
