//! Error types for the fxvanilla library.
//!
//! All fallible operations return `Result<T, PricingError>` rather than panicking.
//! Solver non-convergence is *not* an error: it is reported as
//! [`SolverOutcome::NoSolution`](crate::types::SolverOutcome::NoSolution).

use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, PricingError>;

/// Fatal conditions raised by the pricing engine.
///
/// Every variant is raised at the point of detection, before any further
/// computation, and is not retryable.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PricingError {
    /// A hard parameter constraint is violated (negative or non-finite spot,
    /// strike, time to maturity or volatility; non-finite rate or target).
    #[error("invalid {field}: {value}")]
    Validation {
        /// Name of the offending field (e.g. "spot").
        field: &'static str,
        /// Value that was rejected.
        value: f64,
    },

    /// A delta-consuming operation received a delta outside its domain.
    #[error("domain error: {message}")]
    Domain { message: String },

    /// An option side token could not be recognized.
    #[error("invalid option side: {token:?}")]
    InvalidOptionSide { token: String },

    /// The normalized log-moneyness terms would divide by `σ·√T = 0`.
    #[error("degenerate term: {message}")]
    DegenerateTerm { message: String },

    /// Numerical computation failed (e.g. singular solver system, NaN).
    #[error("numerical error: {message}")]
    NumericalError { message: String },
}
