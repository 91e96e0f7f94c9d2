//! FX quotation conventions.
//!
//! FX desks quote volatility by delta rather than by strike. This module
//! converts between the two: the ATM delta-neutral strike, strikes implied by
//! a quoted delta under either the forward or the spot delta convention, and
//! the harmonization of signed put/call deltas onto a single `[0, 1]` axis.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Evaluated;
use crate::error::PricingError;
use crate::normal::norm_inv_cdf;
use crate::types::{OptionParameters, Strike};
use crate::validate::{validate_delta, validate_parameters};

/// How a quoted delta relates to `N(d1)`.
///
/// - **Forward**: the premium is paid at maturity, so the quoted delta is
///   `N(d1)` for calls and `−N(−d1)` for puts.
/// - **Spot**: the quoted delta carries the foreign discount factor,
///   `e^(−rf·T)·N(d1)`. Common for short-dated G10 pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaConvention {
    #[default]
    Forward,
    Spot,
}

impl DeltaConvention {
    /// Factor turning a quoted delta into a forward delta.
    pub fn correction_factor(self, foreign_rate: f64, time_to_maturity: f64) -> f64 {
        match self {
            DeltaConvention::Forward => 1.0,
            DeltaConvention::Spot => (foreign_rate * time_to_maturity).exp(),
        }
    }
}

/// FX forward: `F = S · exp((rd − rf) · T)`.
pub fn forward_price(spot: f64, domestic_rate: f64, foreign_rate: f64, time_to_maturity: f64) -> f64 {
    spot * ((domestic_rate - foreign_rate) * time_to_maturity).exp()
}

/// Drift term `(rd − rf + σ²/2) · T` shared by the strike formulas.
fn drift(params: &OptionParameters) -> f64 {
    (params.domestic_rate - params.foreign_rate + 0.5 * params.volatility * params.volatility)
        * params.time_to_maturity
}

/// ATM delta-neutral strike `K = S · exp((rd − rf + σ²/2) · T)`.
///
/// At this strike `d1 = 0`, so call and put forward deltas are `±0.5`.
/// The `strike` field of `params` is ignored.
///
/// # Examples
/// ```
/// use fxvanilla::conventions::atm_forward_strike;
/// use fxvanilla::types::OptionParameters;
///
/// let params = OptionParameters::new(1.08, 0.0, 0.035, 0.5, 0.1, 0.02);
/// let atm = atm_forward_strike(&params)?.value;
/// assert!(atm.0 > 1.08);
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
///
/// # Errors
/// [`PricingError::Validation`] for invalid parameters.
pub fn atm_forward_strike(params: &OptionParameters) -> crate::error::Result<Evaluated<Strike>> {
    let diagnostics = validate_parameters(&params.with_strike(0.0))?;
    let strike = params.spot * drift(params).exp();
    Ok(Evaluated::new(Strike(strike), diagnostics))
}

/// Strike at which the option has the quoted `delta`.
///
/// A non-negative delta is read as a call delta, a negative one as a put
/// delta. The quoted delta is first multiplied by the convention's correction
/// factor, then inverted through `N⁻¹`:
///
/// ```text
/// call: K = S · exp(−N⁻¹(δ·f)·σ√T + (rd − rf + σ²/2)·T)
/// put:  K = S · exp( N⁻¹(−δ·f)·σ√T + (rd − rf + σ²/2)·T)
/// ```
///
/// Limits are returned exactly: `δ = 0` gives `K = +∞`, and an adjusted
/// delta of magnitude one gives `K = 0` for calls and `K = +∞` for puts.
/// The `strike` field of `params` is ignored.
///
/// # Errors
/// [`PricingError::Validation`] for invalid parameters, checked first.
/// [`PricingError::Domain`] if `|delta| > 1`, or if the spot-adjusted delta
/// exceeds one in magnitude.
pub fn strike_from_quoted_delta(
    params: &OptionParameters,
    delta: f64,
    convention: DeltaConvention,
) -> crate::error::Result<Evaluated<Strike>> {
    let diagnostics = validate_parameters(&params.with_strike(0.0))?;
    validate_delta(delta)?;

    let factor = convention.correction_factor(params.foreign_rate, params.time_to_maturity);
    let adjusted = delta.abs() * factor;
    if adjusted > 1.0 {
        return Err(PricingError::Domain {
            message: format!(
                "{convention:?} delta {delta} adjusts to {adjusted}, outside [-1, 1]"
            ),
        });
    }

    let is_call = delta >= 0.0;
    let quantile = norm_inv_cdf(adjusted);
    let strike = if quantile == f64::NEG_INFINITY {
        f64::INFINITY
    } else if quantile == f64::INFINITY {
        if is_call { 0.0 } else { f64::INFINITY }
    } else {
        let sig_sqrt_t = params.volatility * params.time_to_maturity.sqrt();
        let shift = if is_call { -quantile } else { quantile };
        params.spot * (shift * sig_sqrt_t + drift(params)).exp()
    };

    #[cfg(feature = "logging")]
    tracing::debug!(delta, ?convention, strike, "strike from quoted delta");

    Ok(Evaluated::new(Strike(strike), diagnostics))
}

/// Map signed deltas onto `[0, 1]`.
///
/// Put deltas `δ < 0` become `1 + δ`, an exact zero becomes `0.5`, and call
/// deltas pass through. The whole slice is checked before any output is
/// produced.
///
/// # Errors
/// [`PricingError::Domain`] if any `|δ| > 1` or is NaN.
pub fn harmonize_delta(deltas: &[f64]) -> crate::error::Result<Vec<f64>> {
    for &delta in deltas {
        validate_delta(delta)?;
    }
    Ok(deltas
        .iter()
        .map(|&delta| {
            if delta < 0.0 {
                1.0 + delta
            } else if delta == 0.0 {
                0.5
            } else {
                delta
            }
        })
        .collect())
}
