//! Closed-form Garman-Kohlhagen Greeks.
//!
//! Every Greek is returned for both sides at once as a [`SidePair`]. With
//! `Df = e^(−rf·T)` and `Dd = e^(−rd·T)`:
//!
//! ```text
//! delta   C: Df·N(d1)                 P: Df·(N(d1) − 1)
//! gamma      Df·N'(d1) / (S·σ·√T)        (same)
//! theta   C: −S·Df·N'(d1)·σ/(2√T) + rf·S·Df·N(d1)  − rd·K·Dd·N(d2)
//!         P: −S·Df·N'(d1)·σ/(2√T) − rf·S·Df·N(−d1) + rd·K·Dd·N(−d2)
//! vega       S·Df·N'(d1)·√T              (same)
//! rho     C: K·T·Dd·N(d2)             P: −K·T·Dd·N(−d2)
//! qRho    C: −S·T·Df·N(d1)            P: S·T·Df·N(−d1)
//! ```
//!
//! Theta is `∂V/∂t` per year of calendar time (the negative of `∂V/∂T`).
//! Greeks are singular at `T = 0` and at `S = K = 0`; every function fails
//! with [`PricingError::DegenerateTerm`](crate::PricingError::DegenerateTerm)
//! there. A zero spot alone gives the finite limits (gamma and vega `0`).

use serde::{Deserialize, Serialize};

use crate::diagnostics::Evaluated;
use crate::kernel::{LogMoneyness, d1_d2};
use crate::normal::{norm_cdf, norm_pdf};
use crate::types::{
    DeltaPair, GammaPair, OptionParameters, RhoPair, SidePair, ThetaPair, VegaPair,
};
use crate::validate::validate_parameters;

/// The six Greeks for one parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreeksBundle {
    pub delta: DeltaPair,
    pub gamma: GammaPair,
    pub theta: ThetaPair,
    pub vega: VegaPair,
    /// Domestic rate sensitivity.
    pub rho: RhoPair,
    /// Foreign rate (dividend yield) sensitivity.
    pub q_rho: RhoPair,
}

/// Names the fields of a [`GreeksBundle`] for code that iterates over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GreekKind {
    Delta,
    Gamma,
    Theta,
    Vega,
    Rho,
    QRho,
}

impl GreekKind {
    /// All Greeks in bundle order.
    pub const ALL: [GreekKind; 6] = [
        GreekKind::Delta,
        GreekKind::Gamma,
        GreekKind::Theta,
        GreekKind::Vega,
        GreekKind::Rho,
        GreekKind::QRho,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GreekKind::Delta => "delta",
            GreekKind::Gamma => "gamma",
            GreekKind::Theta => "theta",
            GreekKind::Vega => "vega",
            GreekKind::Rho => "rho",
            GreekKind::QRho => "q_rho",
        }
    }
}

impl GreeksBundle {
    /// The pair for `kind`.
    pub fn get(&self, kind: GreekKind) -> SidePair<f64> {
        match kind {
            GreekKind::Delta => self.delta,
            GreekKind::Gamma => self.gamma,
            GreekKind::Theta => self.theta,
            GreekKind::Vega => self.vega,
            GreekKind::Rho => self.rho,
            GreekKind::QRho => self.q_rho,
        }
    }

    /// `(kind, pair)` for every Greek, in bundle order.
    pub fn iter(&self) -> impl Iterator<Item = (GreekKind, SidePair<f64>)> + '_ {
        GreekKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Quantities shared by all Greek formulas, computed once per call.
struct Terms {
    spot: f64,
    strike: f64,
    rd: f64,
    rf: f64,
    vol: f64,
    t: f64,
    sqrt_t: f64,
    df_d: f64,
    df_f: f64,
    d1: f64,
    d2: f64,
}

impl Terms {
    fn new(params: &OptionParameters) -> crate::error::Result<Self> {
        let LogMoneyness { d1, d2 } = d1_d2(params)?;
        Ok(Self {
            spot: params.spot,
            strike: params.strike,
            rd: params.domestic_rate,
            rf: params.foreign_rate,
            vol: params.volatility,
            t: params.time_to_maturity,
            sqrt_t: params.time_to_maturity.sqrt(),
            df_d: params.domestic_discount(),
            df_f: params.foreign_discount(),
            d1,
            d2,
        })
    }

    fn delta(&self) -> DeltaPair {
        let n_d1 = norm_cdf(self.d1);
        SidePair::new(self.df_f * n_d1, self.df_f * (n_d1 - 1.0))
    }

    fn gamma(&self) -> GammaPair {
        // N'(d1) → 0 faster than S as S → 0.
        if self.spot == 0.0 {
            return SidePair::symmetric(0.0);
        }
        SidePair::symmetric(self.df_f * norm_pdf(self.d1) / (self.spot * self.vol * self.sqrt_t))
    }

    fn theta(&self) -> ThetaPair {
        let decay = -self.spot * self.df_f * norm_pdf(self.d1) * self.vol / (2.0 * self.sqrt_t);
        let spot_leg = self.rf * self.spot * self.df_f;
        let strike_leg = self.rd * self.strike * self.df_d;
        SidePair::new(
            decay + spot_leg * norm_cdf(self.d1) - strike_leg * norm_cdf(self.d2),
            decay - spot_leg * norm_cdf(-self.d1) + strike_leg * norm_cdf(-self.d2),
        )
    }

    fn vega(&self) -> VegaPair {
        SidePair::symmetric(self.spot * self.df_f * norm_pdf(self.d1) * self.sqrt_t)
    }

    fn rho(&self) -> RhoPair {
        let k_t_dd = self.strike * self.t * self.df_d;
        SidePair::new(k_t_dd * norm_cdf(self.d2), -k_t_dd * norm_cdf(-self.d2))
    }

    fn q_rho(&self) -> RhoPair {
        let s_t_df = self.spot * self.t * self.df_f;
        SidePair::new(-s_t_df * norm_cdf(self.d1), s_t_df * norm_cdf(-self.d1))
    }
}

fn evaluate<T>(
    params: &OptionParameters,
    f: impl FnOnce(&Terms) -> T,
) -> crate::error::Result<Evaluated<T>> {
    let diagnostics = validate_parameters(params)?;
    let terms = Terms::new(params)?;
    Ok(Evaluated::new(f(&terms), diagnostics))
}

/// Delta `∂V/∂S`. Satisfies `call − put = e^(−rf·T)`.
///
/// # Errors
/// [`PricingError::Validation`](crate::PricingError::Validation) for invalid
/// parameters, [`PricingError::DegenerateTerm`](crate::PricingError::DegenerateTerm)
/// at expiry or zero volatility.
pub fn delta(params: &OptionParameters) -> crate::error::Result<Evaluated<DeltaPair>> {
    evaluate(params, Terms::delta)
}

/// Gamma `∂²V/∂S²`, identical for call and put.
///
/// # Errors
/// Same as [`delta`].
pub fn gamma(params: &OptionParameters) -> crate::error::Result<Evaluated<GammaPair>> {
    evaluate(params, Terms::gamma)
}

/// Theta `∂V/∂t` per year.
///
/// # Errors
/// Same as [`delta`].
pub fn theta(params: &OptionParameters) -> crate::error::Result<Evaluated<ThetaPair>> {
    evaluate(params, Terms::theta)
}

/// Vega `∂V/∂σ`, identical for call and put.
///
/// # Errors
/// Same as [`delta`].
pub fn vega(params: &OptionParameters) -> crate::error::Result<Evaluated<VegaPair>> {
    evaluate(params, Terms::vega)
}

/// Rho `∂V/∂rd`.
///
/// # Errors
/// Same as [`delta`].
pub fn rho(params: &OptionParameters) -> crate::error::Result<Evaluated<RhoPair>> {
    evaluate(params, Terms::rho)
}

/// Foreign rho `∂V/∂rf`.
///
/// # Errors
/// Same as [`delta`].
pub fn q_rho(params: &OptionParameters) -> crate::error::Result<Evaluated<RhoPair>> {
    evaluate(params, Terms::q_rho)
}

/// All six Greeks from a single `(d1, d2)` evaluation.
///
/// # Examples
/// ```
/// use fxvanilla::greeks::compute_greeks;
/// use fxvanilla::types::OptionParameters;
///
/// let params = OptionParameters::new(100.0, 100.0, 0.03, 0.25, 0.2, 0.01);
/// let greeks = compute_greeks(&params)?.value;
/// let df_f = (-0.01_f64 * 0.25).exp();
/// assert!((greeks.delta.call - greeks.delta.put - df_f).abs() < 1e-12);
/// assert_eq!(greeks.gamma.call, greeks.gamma.put);
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
///
/// # Errors
/// Same as [`delta`].
pub fn compute_greeks(params: &OptionParameters) -> crate::error::Result<Evaluated<GreeksBundle>> {
    evaluate(params, |terms| GreeksBundle {
        delta: terms.delta(),
        gamma: terms.gamma(),
        theta: terms.theta(),
        vega: terms.vega(),
        rho: terms.rho(),
        q_rho: terms.q_rho(),
    })
}

/// `∂Δ/∂K`, identical for call and put, for already validated parameters.
pub(crate) fn delta_strike_slope(params: &OptionParameters) -> crate::error::Result<f64> {
    let terms = Terms::new(params)?;
    Ok(-terms.df_f * norm_pdf(terms.d1) / (terms.strike * terms.vol * terms.sqrt_t))
}

/// Delta of one side for already validated parameters.
pub(crate) fn delta_unchecked(params: &OptionParameters) -> crate::error::Result<DeltaPair> {
    Ok(Terms::new(params)?.delta())
}

/// Vega for already validated parameters.
pub(crate) fn vega_unchecked(params: &OptionParameters) -> crate::error::Result<f64> {
    Ok(Terms::new(params)?.vega().call)
}
