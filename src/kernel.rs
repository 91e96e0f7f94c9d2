//! Black-Scholes / Garman-Kohlhagen pricing kernel.
//!
//! # Formula
//! ```text
//! d1 = (ln(S/K) + (rd − rf + σ²/2)·T) / (σ√T)
//! d2 = d1 − σ√T
//!
//! C = S·e^(−rf·T)·N(d1) − K·e^(−rd·T)·N(d2)
//! P = K·e^(−rd·T)·N(−d2) − S·e^(−rf·T)·N(−d1)
//! ```
//!
//! With `rf` read as a continuous dividend yield this is Black-Scholes-Merton;
//! with `rf` the foreign interest rate it is Garman-Kohlhagen.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Evaluated;
use crate::error::PricingError;
use crate::normal::norm_cdf;
use crate::types::{OptionParameters, OptionSide, PremiumPair};
use crate::validate::validate_parameters;

/// Normalized log-moneyness terms shared by every closed-form expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogMoneyness {
    pub d1: f64,
    pub d2: f64,
}

/// Compute `(d1, d2)` for already validated parameters.
///
/// # Errors
/// Returns [`PricingError::DegenerateTerm`] when `σ·√T = 0`, i.e. at expiry
/// or with zero volatility, and when spot and strike are both zero.
pub(crate) fn d1_d2(params: &OptionParameters) -> crate::error::Result<LogMoneyness> {
    if params.spot == 0.0 && params.strike == 0.0 {
        return Err(PricingError::DegenerateTerm {
            message: "log-moneyness ln(spot / strike) is undefined for spot = strike = 0".into(),
        });
    }
    let sig_sqrt_t = params.volatility * params.time_to_maturity.sqrt();
    if sig_sqrt_t == 0.0 {
        return Err(PricingError::DegenerateTerm {
            message: format!(
                "volatility * sqrt(time_to_maturity) is zero (volatility = {}, time_to_maturity = {})",
                params.volatility, params.time_to_maturity
            ),
        });
    }
    let d1 = ((params.spot / params.strike).ln()
        + (params.domestic_rate - params.foreign_rate
            + 0.5 * params.volatility * params.volatility)
            * params.time_to_maturity)
        / sig_sqrt_t;
    Ok(LogMoneyness {
        d1,
        d2: d1 - sig_sqrt_t,
    })
}

/// Normalized log-moneyness terms `(d1, d2)`.
///
/// # Errors
/// [`PricingError::Validation`] for invalid parameters,
/// [`PricingError::DegenerateTerm`] when `σ·√T = 0`.
pub fn log_moneyness_terms(params: &OptionParameters) -> crate::error::Result<Evaluated<LogMoneyness>> {
    let diagnostics = validate_parameters(params)?;
    Ok(Evaluated::new(d1_d2(params)?, diagnostics))
}

/// Intrinsic value `(max(0, S − K), max(0, K − S))`.
pub(crate) fn intrinsic(spot: f64, strike: f64) -> PremiumPair {
    PremiumPair::new((spot - strike).max(0.0), (strike - spot).max(0.0))
}

/// Premium pair for already validated parameters.
pub(crate) fn premium_pair(params: &OptionParameters) -> crate::error::Result<PremiumPair> {
    if params.time_to_maturity == 0.0 {
        return Ok(intrinsic(params.spot, params.strike));
    }
    let spot_leg = params.spot * params.foreign_discount();
    let strike_leg = params.strike * params.domestic_discount();
    // With a zero spot or strike one leg vanishes and the other is certain.
    if params.spot == 0.0 || params.strike == 0.0 {
        return Ok(intrinsic(spot_leg, strike_leg));
    }
    let LogMoneyness { d1, d2 } = d1_d2(params)?;
    Ok(PremiumPair::new(
        spot_leg * norm_cdf(d1) - strike_leg * norm_cdf(d2),
        strike_leg * norm_cdf(-d2) - spot_leg * norm_cdf(-d1),
    ))
}

/// Call and put premium.
///
/// At `T = 0` the premium is the intrinsic value, returned exactly without
/// touching `d1`/`d2`. A zero spot or strike likewise returns the exact
/// limit `(max(0, S·Df − K·Dd), max(0, K·Dd − S·Df))`.
///
/// # Examples
/// ```
/// use fxvanilla::kernel::compute_premium;
/// use fxvanilla::types::OptionParameters;
///
/// let params = OptionParameters::new(100.0, 100.0, 0.03, 0.25, 0.2, 0.01);
/// let premium = compute_premium(&params)?.value;
/// assert!((premium.call - 4.22).abs() < 0.05);
/// assert!((premium.put - 3.72).abs() < 0.05);
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
///
/// # Errors
/// [`PricingError::Validation`] for invalid parameters,
/// [`PricingError::DegenerateTerm`] for zero volatility before expiry.
pub fn compute_premium(params: &OptionParameters) -> crate::error::Result<Evaluated<PremiumPair>> {
    let diagnostics = validate_parameters(params)?;
    Ok(Evaluated::new(premium_pair(params)?, diagnostics))
}

/// Premium of a single side.
///
/// # Errors
/// Same as [`compute_premium`].
pub fn premium(side: OptionSide, params: &OptionParameters) -> crate::error::Result<Evaluated<f64>> {
    Ok(compute_premium(params)?.map(|pair| pair.get(side)))
}
