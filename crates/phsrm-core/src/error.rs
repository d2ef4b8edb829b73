//! Error types for the CF1 engine.
//!
//! Every routine fails fast with one of three kinds:
//! - `Domain`: an argument is outside its mathematical domain (a rate <= 0,
//!   a probability outside [0, 1], `ufactor <= 1`, ...).
//! - `Numerical`: the inputs were valid but the computation degenerated
//!   (an unreachable phase, a non-finite intermediate, a truncation window
//!   beyond the configured ceiling).
//! - `Config`: configuration could not be loaded or parsed.
//!
//! Variants carry the offending phase or time index so callers can report
//! which part of a fit failed. Nothing is retried here; relaxing `eps` or
//! restarting from new parameters is the caller's decision.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Cf1Error>;

/// Error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid argument (rates, probabilities, tolerances, shapes).
    Domain,
    /// Degenerate or non-finite computation.
    Numerical,
    /// Configuration loading or parsing.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Domain => write!(f, "domain"),
            ErrorKind::Numerical => write!(f, "numerical"),
            ErrorKind::Config => write!(f, "config"),
        }
    }
}

/// Unified error type for the CF1 engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Cf1Error {
    // Domain errors (10-29)
    #[error("rate of phase {phase} must be positive and finite, got {value}")]
    InvalidRate { phase: usize, value: f64 },

    #[error("probability of phase {phase} must lie in [0, 1], got {value}")]
    InvalidProbability { phase: usize, value: f64 },

    #[error("uniformization factor must exceed 1, got {ufactor}")]
    InvalidUniformization { ufactor: f64 },

    #[error("tolerance must lie in (0, 1), got {eps}")]
    InvalidTolerance { eps: f64 },

    #[error("time at index {index} must be finite and non-negative, got {value}")]
    InvalidTime { index: usize, value: f64 },

    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("fault type at index {index} must be 0 or 1, got {value}")]
    InvalidFaultType { index: usize, value: u8 },

    #[error("expected fault total must be positive and finite, got {value}")]
    InvalidOmega { value: f64 },

    #[error("initial probabilities must sum to 1, got {sum}")]
    UnnormalizedAlpha { sum: f64 },

    // Numerical errors (30-49)
    #[error("expected sojourn time in phase {phase} is not positive ({value}); phase is unreachable")]
    DegenerateSojourn { phase: usize, value: f64 },

    #[error("non-finite value in {context} at index {index}")]
    NonFinite { context: &'static str, index: usize },

    #[error("truncation bound for Poisson mean {mean} at eps {eps} exceeds ceiling {ceiling}")]
    TruncationOverflow { mean: f64, eps: f64, ceiling: usize },

    #[error("record {index} has faults but probability {value} under the current parameters")]
    ZeroProbability { index: usize, value: f64 },

    // Configuration errors (50-59)
    #[error("configuration error: {0}")]
    Config(String),
}

impl Cf1Error {
    /// Stable numeric code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            Cf1Error::InvalidRate { .. } => 10,
            Cf1Error::InvalidProbability { .. } => 11,
            Cf1Error::InvalidUniformization { .. } => 12,
            Cf1Error::InvalidTolerance { .. } => 13,
            Cf1Error::InvalidTime { .. } => 14,
            Cf1Error::LengthMismatch { .. } => 15,
            Cf1Error::EmptyInput(_) => 16,
            Cf1Error::InvalidFaultType { .. } => 17,
            Cf1Error::InvalidOmega { .. } => 18,
            Cf1Error::UnnormalizedAlpha { .. } => 19,
            Cf1Error::DegenerateSojourn { .. } => 30,
            Cf1Error::NonFinite { .. } => 31,
            Cf1Error::TruncationOverflow { .. } => 32,
            Cf1Error::ZeroProbability { .. } => 33,
            Cf1Error::Config(_) => 50,
        }
    }

    /// Error classification.
    pub fn kind(&self) -> ErrorKind {
        match self.code() {
            10..=29 => ErrorKind::Domain,
            30..=49 => ErrorKind::Numerical,
            _ => ErrorKind::Config,
        }
    }

    /// Phase index the error refers to, when there is one.
    pub fn phase(&self) -> Option<usize> {
        match self {
            Cf1Error::InvalidRate { phase, .. }
            | Cf1Error::InvalidProbability { phase, .. }
            | Cf1Error::DegenerateSojourn { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Cf1Error {
    fn from(err: serde_json::Error) -> Self {
        Cf1Error::Config(err.to_string())
    }
}

impl From<std::io::Error> for Cf1Error {
    fn from(err: std::io::Error) -> Self {
        Cf1Error::Config(err.to_string())
    }
}

/// Fail with `NonFinite` if any entry of `values` is NaN or infinite.
pub(crate) fn ensure_finite(values: &[f64], context: &'static str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(Cf1Error::NonFinite { context, index }),
        None => Ok(()),
    }
}
