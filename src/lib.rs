//! Constraint-based seating planner.
//!
//! Assigns every person of an event to a table so that capacities,
//! couples, enemies, friend cohesion and group balance all hold, or
//! reports that no such seating exists.
//!
//! - **CP**: finite-domain constraint layer ([`cp::CpModel`]) with a
//!   complete backtracking solver and a tabu local-search solver behind
//!   the [`cp::CpSolver`] trait.
//! - **Seating**: event data validation, friend derivation, constraint
//!   encoding and assignment extraction ([`seating::SeatingPlanner`]).
//! - **Config**: [`config::PlannerConfig`], optionally loaded from TOML.
//!
//! # Example
//!
//! ```
//! use u_seating::{EventData, PlannerConfig, SeatingError, SeatingPlanner};
//!
//! let planner = SeatingPlanner::new(PlannerConfig::default());
//!
//! let data = EventData::unnamed(2, vec![1, 1]).with_enemy(0, 1);
//! let seating = planner.solve(&data).unwrap();
//! assert_ne!(seating.table_of(0), seating.table_of(1));
//!
//! let crowded = EventData::unnamed(2, vec![1]).with_enemy(0, 1);
//! assert_eq!(planner.solve(&crowded), Err(SeatingError::Unsatisfiable));
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` on data and config types, TOML loading
//! - `parallel`: tabu restarts on the rayon thread pool

pub mod config;
pub mod cp;
pub mod error;
pub mod seating;

pub use config::{ConfigError, PlannerConfig};
pub use error::{Result, SeatingError};
pub use seating::{Assignment, EventData, SeatingPlanner};
