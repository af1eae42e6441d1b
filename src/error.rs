//! Error types for seating.

use thiserror::Error;

/// Main error type for seating operations.
///
/// All three kinds reach the caller unchanged; none is recovered
/// internally and there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatingError {
    /// Malformed event data, detected before any solving attempt.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// The constraint set has no satisfying assignment.
    #[error("No seating satisfies the constraints")]
    Unsatisfiable,

    /// Unknown backend, or the backend failed operationally
    /// (timeout, cancellation, malformed model, bad answer).
    #[error("Solver backend error: {0}")]
    SolverBackend(String),
}

impl SeatingError {
    /// Whether the error proves that no valid seating exists.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, SeatingError::Unsatisfiable)
    }
}

/// Result type alias for seating operations.
pub type Result<T> = std::result::Result<T, SeatingError>;
