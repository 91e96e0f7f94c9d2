//! Parameter validation.
//!
//! Every public operation runs [`validate_parameters`] on its full parameter
//! set before evaluating any formula. `!is_finite()` rejects NaN, +Inf and
//! -Inf uniformly.

use crate::diagnostics::{Diagnostic, Diagnostics, RateKind};
use crate::error::PricingError;
use crate::types::OptionParameters;

/// Validate that a value is non-negative and finite (rejects NaN, Inf, negatives).
pub(crate) fn validate_non_negative(value: f64, field: &'static str) -> crate::error::Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(PricingError::Validation { field, value });
    }
    Ok(value)
}

/// Validate that a value is finite (rejects NaN and Inf; allows zero and negatives).
pub(crate) fn validate_finite(value: f64, field: &'static str) -> crate::error::Result<f64> {
    if !value.is_finite() {
        return Err(PricingError::Validation { field, value });
    }
    Ok(value)
}

/// Validate a delta used as input: `|delta| ≤ 1`.
pub(crate) fn validate_delta(delta: f64) -> crate::error::Result<f64> {
    if delta.is_nan() || delta.abs() > 1.0 {
        return Err(PricingError::Domain {
            message: format!("|delta| must not exceed 1, got {delta}"),
        });
    }
    Ok(delta)
}

/// Check the sign constraints on a full parameter set.
///
/// # Errors
/// Returns [`PricingError::Validation`] naming the first offending field if
/// spot, strike, time to maturity or volatility is negative or non-finite, or
/// if a rate is non-finite.
///
/// A negative rate is not an error: it is reported as a
/// [`Diagnostic::NegativeRate`] in the returned list.
pub fn validate_parameters(params: &OptionParameters) -> crate::error::Result<Diagnostics> {
    validate_non_negative(params.spot, "spot")?;
    validate_non_negative(params.strike, "strike")?;
    validate_non_negative(params.time_to_maturity, "time_to_maturity")?;
    validate_non_negative(params.volatility, "volatility")?;
    validate_finite(params.domestic_rate, "domestic_rate")?;
    validate_finite(params.foreign_rate, "foreign_rate")?;

    let mut diagnostics = Diagnostics::new();
    for (rate, value) in [
        (RateKind::Domestic, params.domestic_rate),
        (RateKind::Foreign, params.foreign_rate),
    ] {
        if value < 0.0 {
            #[cfg(feature = "logging")]
            tracing::warn!(rate = rate.field(), value, "negative rate");
            diagnostics.push(Diagnostic::NegativeRate { rate, value });
        }
    }
    Ok(diagnostics)
}
