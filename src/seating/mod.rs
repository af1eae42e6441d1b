//! Event seating.
//!
//! Places every person of an event at a table such that:
//!
//! - no table exceeds its capacity
//! - couples share a table, enemies do not
//! - a person with several friends (co-members of any group) sits with at
//!   least one of them; a person with exactly one friend sits with that friend
//! - for every table with capacity `c`, no group puts more than
//!   `floor(0.7 * c)` of its members there (checked only for groups larger
//!   than that threshold)
//!
//! # Pipeline
//!
//! 1. [`SeatingModel::new`] validates [`EventData`] and derives friends
//! 2. A [`ConstraintEncoder`] (default [`IntegerEncoder`]) emits the
//!    conjunctive constraint set as a [`CpModel`](crate::cp::CpModel)
//! 3. [`SolverAdapter`] runs a named backend and reads back an [`Assignment`]
//!
//! [`SeatingPlanner`] wires the three together.

mod adapter;
mod assignment;
mod encoder;
mod model;
mod planner;

pub use adapter::{SolverAdapter, SolverRegistry, DEFAULT_BACKEND, TABU_BACKEND};
pub use assignment::{Assignment, Violation};
pub use encoder::{ConstraintEncoder, EncoderKind, IntegerEncoder, SeatingConstraints};
pub use model::{
    derive_friends, dominance_threshold, EventData, Pair, SeatingModel, DOMINANCE_DENOMINATOR,
    DOMINANCE_NUMERATOR, MAX_TABLES,
};
pub use planner::SeatingPlanner;
