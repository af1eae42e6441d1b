//! Planner configuration.
//!
//! Built in code with `with_*` methods, or loaded from TOML with the
//! `serde` feature:
//!
//! ```
//! # #[cfg(feature = "serde")] {
//! use u_seating::config::PlannerConfig;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     solver = "tabu"
//!
//!     [search]
//!     time_limit_ms = 2000
//!     seed = 42
//!     num_workers = 4
//! "#).unwrap();
//!
//! assert_eq!(config.solver, "tabu");
//! assert_eq!(config.search.num_workers, 4);
//! # }
//! ```

use crate::cp::SolverConfig;
use crate::seating::{EncoderKind, DEFAULT_BACKEND};
use thiserror::Error;

#[cfg(feature = "serde")]
use std::path::Path;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for a [`SeatingPlanner`](crate::seating::SeatingPlanner).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Registered backend name.
    pub solver: String,
    /// Built-in encoder.
    pub model: EncoderKind,
    /// Limits and tuning handed to the backend.
    pub search: SolverConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            solver: DEFAULT_BACKEND.to_string(),
            model: EncoderKind::default(),
            search: SolverConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, name: impl Into<String>) -> Self {
        self.solver = name.into();
        self
    }

    pub fn with_model(mut self, model: EncoderKind) -> Self {
        self.model = model;
        self
    }

    pub fn with_search(mut self, search: SolverConfig) -> Self {
        self.search = search;
        self
    }

    /// Shorthand for setting `search.time_limit_ms`.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.search.time_limit_ms = Some(ms);
        self
    }

    /// Shorthand for setting `search.seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.search.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// Whether `solver` names a registered backend is only known to the
    /// planner and is checked at solve time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.trim().is_empty() {
            return Err(ConfigError::Invalid("solver name must not be empty".into()));
        }
        self.search.validate().map_err(ConfigError::Invalid)
    }
}

#[cfg(feature = "serde")]
impl PlannerConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
