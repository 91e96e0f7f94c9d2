//! Core domain types for option pricing.
//!
//! # Newtype Strategy
//!
//! **Outputs use newtypes.** [`Vol`] and [`Strike`] wrap values produced by
//! the solvers and quotation converters so a solved strike cannot be passed
//! where a volatility is expected.
//!
//! **Inputs use bare `f64`.** [`OptionParameters`] carries plain floats; the
//! validator checks them at the start of every operation.
//!
//! # Why no `Eq` or `Ord`?
//! These types wrap `f64`, which does not implement `Eq` or `Ord` because `NaN`
//! breaks total ordering. We derive `PartialEq` and `PartialOrd` only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Strike price `K` of an option contract.
///
/// # Examples
/// ```
/// use fxvanilla::types::Strike;
/// let strike = Strike(100.0);
/// assert_eq!(strike.0, 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Strike(pub f64);

/// Volatility `σ`, measured as annualized standard deviation.
///
/// # Examples
/// ```
/// use fxvanilla::types::Vol;
/// let vol = Vol(0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Option side: call or put.
///
/// Selects the branch of every pricing formula and every solver objective.
/// Parses from text tokens (`"call"`, `"c"`, `"put"`, `"p"`, any case):
///
/// ```
/// use fxvanilla::types::OptionSide;
/// let side: OptionSide = "Put".parse()?;
/// assert_eq!(side, OptionSide::Put);
/// assert!("straddle".parse::<OptionSide>().is_err());
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionSide {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionSide {
    /// Both sides, call first.
    pub const BOTH: [OptionSide; 2] = [OptionSide::Call, OptionSide::Put];

    /// Lower-case name of the side.
    pub fn as_str(self) -> &'static str {
        match self {
            OptionSide::Call => "call",
            OptionSide::Put => "put",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OptionSide {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionSide::Call),
            "put" | "p" => Ok(OptionSide::Put),
            _ => Err(PricingError::InvalidOptionSide {
                token: s.to_string(),
            }),
        }
    }
}

impl TryFrom<&str> for OptionSide {
    type Error = PricingError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One fully specified contract and market state.
///
/// Constructed per call and never mutated; the `with_*` methods return
/// modified copies. Deserialization rejects negative or non-finite spot,
/// strike, time to maturity and volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionParametersRaw", into = "OptionParametersRaw")]
pub struct OptionParameters {
    /// Spot price `S ≥ 0` (units of domestic currency per foreign unit in FX).
    pub spot: f64,
    /// Strike `K ≥ 0`.
    pub strike: f64,
    /// Continuously compounded domestic rate `rd`; may be negative.
    pub domestic_rate: f64,
    /// Time to maturity `T ≥ 0` in years.
    pub time_to_maturity: f64,
    /// Volatility `σ ≥ 0`.
    pub volatility: f64,
    /// Continuously compounded foreign rate (or dividend yield) `rf`; may be negative.
    pub foreign_rate: f64,
}

#[derive(Serialize, Deserialize)]
struct OptionParametersRaw {
    spot: f64,
    strike: f64,
    domestic_rate: f64,
    time_to_maturity: f64,
    volatility: f64,
    foreign_rate: f64,
}

impl TryFrom<OptionParametersRaw> for OptionParameters {
    type Error = PricingError;
    fn try_from(raw: OptionParametersRaw) -> Result<Self, Self::Error> {
        let params = Self::new(
            raw.spot,
            raw.strike,
            raw.domestic_rate,
            raw.time_to_maturity,
            raw.volatility,
            raw.foreign_rate,
        );
        crate::validate::validate_parameters(&params)?;
        Ok(params)
    }
}

impl From<OptionParameters> for OptionParametersRaw {
    fn from(p: OptionParameters) -> Self {
        Self {
            spot: p.spot,
            strike: p.strike,
            domestic_rate: p.domestic_rate,
            time_to_maturity: p.time_to_maturity,
            volatility: p.volatility,
            foreign_rate: p.foreign_rate,
        }
    }
}

impl OptionParameters {
    /// Assemble parameters in the conventional `(S, K, rd, T, σ, rf)` order.
    ///
    /// No validation happens here; every operation validates on entry.
    pub fn new(
        spot: f64,
        strike: f64,
        domestic_rate: f64,
        time_to_maturity: f64,
        volatility: f64,
        foreign_rate: f64,
    ) -> Self {
        Self {
            spot,
            strike,
            domestic_rate,
            time_to_maturity,
            volatility,
            foreign_rate,
        }
    }

    /// Copy with a different spot.
    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    /// Copy with a different strike.
    pub fn with_strike(self, strike: f64) -> Self {
        Self { strike, ..self }
    }

    /// Copy with a different time to maturity.
    pub fn with_time_to_maturity(self, time_to_maturity: f64) -> Self {
        Self {
            time_to_maturity,
            ..self
        }
    }

    /// Copy with a different volatility.
    pub fn with_volatility(self, volatility: f64) -> Self {
        Self { volatility, ..self }
    }

    /// Foreign discount factor `exp(−rf·T)` applied to the spot leg.
    pub fn foreign_discount(&self) -> f64 {
        (-self.foreign_rate * self.time_to_maturity).exp()
    }

    /// Domestic discount factor `exp(−rd·T)` applied to the strike leg.
    pub fn domestic_discount(&self) -> f64 {
        (-self.domestic_rate * self.time_to_maturity).exp()
    }
}

/// A value computed for both option sides at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub call: T,
    pub put: T,
}

impl<T: Copy> SidePair<T> {
    pub fn new(call: T, put: T) -> Self {
        Self { call, put }
    }

    /// The same value on both sides (gamma, vega).
    pub fn symmetric(value: T) -> Self {
        Self {
            call: value,
            put: value,
        }
    }

    /// Value for the requested side.
    pub fn get(&self, side: OptionSide) -> T {
        match side {
            OptionSide::Call => self.call,
            OptionSide::Put => self.put,
        }
    }
}

/// Call and put premium.
pub type PremiumPair = SidePair<f64>;
/// Call and put delta `∂V/∂S`.
pub type DeltaPair = SidePair<f64>;
/// Call and put gamma `∂²V/∂S²` (identical values).
pub type GammaPair = SidePair<f64>;
/// Call and put theta `∂V/∂t`, per year.
pub type ThetaPair = SidePair<f64>;
/// Call and put vega `∂V/∂σ` (identical values).
pub type VegaPair = SidePair<f64>;
/// Call and put rate sensitivity (`∂V/∂rd` for rho, `∂V/∂rf` for qRho).
pub type RhoPair = SidePair<f64>;

/// Result of an inverse problem: a converged value or no solution.
///
/// A solved value is only reachable through this type, so callers must branch
/// on convergence before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolverOutcome<T> {
    /// The solver converged to a value reproducing the target.
    Converged(T),
    /// The target could not be reproduced inside the search interval.
    NoSolution,
}

impl<T> SolverOutcome<T> {
    /// `true` for [`SolverOutcome::Converged`].
    pub fn is_converged(&self) -> bool {
        matches!(self, SolverOutcome::Converged(_))
    }

    /// The converged value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            SolverOutcome::Converged(v) => Some(v),
            SolverOutcome::NoSolution => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SolverOutcome<U> {
        match self {
            SolverOutcome::Converged(v) => SolverOutcome::Converged(f(v)),
            SolverOutcome::NoSolution => SolverOutcome::NoSolution,
        }
    }
}
