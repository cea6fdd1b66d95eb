//! Error types for the matching engine.
//!
//! Configuration problems are rejected before a run starts; invariant
//! violations after a run are fatal and surface the full violation list.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;

/// The error type for the matching engine.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A pick-strategy name did not match any known strategy.
    #[error("unknown pick strategy '{0}'")]
    UnknownStrategy(String),

    /// An algorithm name did not match any known algorithm.
    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),

    /// The configured safety margin was negative.
    #[error("safety margin must be non-negative, got {0}")]
    NegativeSafetyMargin(i32),

    /// The final partition broke a run invariant.
    ///
    /// Signals a defect in the algorithm or a corrupted snapshot, never a
    /// recoverable condition — the run is aborted, no repair is attempted.
    #[error(
        "matching violated {} invariant(s): {}",
        .0.len(),
        .0.first().map(|v| v.message.as_str()).unwrap_or("")
    )]
    InvariantViolation(Vec<ValidationError>),
}
