//! Strike from a target delta.
//!
//! Inverts the Greeks engine: finds `K ∈ [0, 5·S]` such that
//! `delta(side, K) = target` with the bounded least-squares solver, seeded at
//! `K₀ = S`, restarting from a bisection bracket when the delta curve is
//! flat at the seed. Call deltas are attainable in `(0, e^(−rf·T))`, put
//! deltas in `(−e^(−rf·T), 0)`; other targets, and deltas too close to those
//! limits to fix the strike to the relative strike tolerance, report
//! [`SolverOutcome::NoSolution`].

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Evaluated;
use crate::error::PricingError;
use crate::greeks::{delta_strike_slope, delta_unchecked};
use crate::kernel::d1_d2;
use crate::optim::{LeastSquaresProblem, LeastSquaresReport, SolverConfig, solve_monotone_scalar};
use crate::types::{OptionParameters, OptionSide, SolverOutcome, Strike};
use crate::validate::{validate_delta, validate_non_negative, validate_parameters};

/// Objective `f(K) = target − delta(side, K)` over fixed market parameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrikeByDeltaObjective {
    side: OptionSide,
    target: f64,
    params: OptionParameters,
}

impl StrikeByDeltaObjective {
    pub(crate) fn new(side: OptionSide, target: f64, params: OptionParameters) -> Self {
        Self {
            side,
            target,
            params,
        }
    }

    pub(crate) fn evaluate(&self, strike: f64) -> crate::error::Result<f64> {
        let delta = delta_unchecked(&self.params.with_strike(strike))?;
        Ok(self.target - delta.get(self.side))
    }
}

impl LeastSquaresProblem for StrikeByDeltaObjective {
    fn residuals(&self, x: &DVector<f64>) -> crate::error::Result<DVector<f64>> {
        Ok(DVector::from_element(1, self.evaluate(x[0])?))
    }

    fn jacobian(&self, x: &DVector<f64>) -> crate::error::Result<Option<DMatrix<f64>>> {
        let slope = delta_strike_slope(&self.params.with_strike(x[0]))?;
        Ok(Some(DMatrix::from_element(1, 1, -slope)))
    }
}

/// Configurable strike-by-delta solver.
///
/// # Examples
///
/// ```
/// use fxvanilla::strike::StrikeByDeltaSolver;
/// use fxvanilla::types::{OptionParameters, OptionSide};
///
/// let params = OptionParameters::new(1.08, 0.0, 0.035, 0.5, 0.1, 0.02);
/// let strike = StrikeByDeltaSolver::default()
///     .solve(OptionSide::Put, -0.25, &params)?
///     .value
///     .value()
///     .expect("a 25-delta put strike exists");
/// assert!(strike.0 < 1.08);
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeByDeltaSolver {
    spot_multiple: f64,
    strike_tolerance: f64,
    config: SolverConfig,
}

impl Default for StrikeByDeltaSolver {
    fn default() -> Self {
        Self {
            spot_multiple: 5.0,
            strike_tolerance: 1e-6,
            config: SolverConfig::default(),
        }
    }
}

impl StrikeByDeltaSolver {
    /// Solver with the default interval `[0, 5·S]`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upper end of the strike interval as a multiple of spot.
    pub fn spot_multiple(mut self, multiple: f64) -> Self {
        self.spot_multiple = multiple;
        self
    }

    /// Set the largest relative strike error a reported solution may carry.
    pub fn strike_tolerance(mut self, tolerance: f64) -> Self {
        self.strike_tolerance = tolerance;
        self
    }

    /// Set solver tolerances and the evaluation budget.
    pub fn config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Strike at which `side` has delta `target_delta`.
    ///
    /// The `strike` field of `params` is ignored.
    ///
    /// # Errors
    /// [`PricingError::Validation`] for invalid parameters (checked first),
    /// spot multiple or strike tolerance,
    /// [`PricingError::Domain`] if `|target_delta| > 1`,
    /// [`PricingError::DegenerateTerm`] at expiry or zero volatility.
    /// Non-convergence is [`SolverOutcome::NoSolution`].
    pub fn solve(
        &self,
        side: OptionSide,
        target_delta: f64,
        params: &OptionParameters,
    ) -> crate::error::Result<Evaluated<SolverOutcome<Strike>>> {
        let placeholder = params.with_strike(0.0);
        let diagnostics = validate_parameters(&placeholder)?;
        validate_delta(target_delta)?;
        if !self.spot_multiple.is_finite() || self.spot_multiple <= 0.0 {
            return Err(PricingError::Validation {
                field: "spot_multiple",
                value: self.spot_multiple,
            });
        }
        validate_non_negative(self.strike_tolerance, "strike_tolerance")?;

        let upper = self.spot_multiple * params.spot;
        if upper <= 0.0 {
            return Ok(Evaluated::new(SolverOutcome::NoSolution, diagnostics));
        }
        // Delta is singular at expiry; fail before spending solver iterations.
        d1_d2(&params.with_strike(params.spot))?;

        #[cfg(feature = "logging")]
        tracing::debug!(%side, target_delta, upper, "strike-by-delta solve started");

        let objective = StrikeByDeltaObjective::new(side, target_delta, placeholder);
        let accept = |report: &LeastSquaresReport| -> crate::error::Result<bool> {
            if !report.solved(self.config.residual_tol) {
                return Ok(false);
            }
            let strike = report.x[0];
            let slope = delta_strike_slope(&placeholder.with_strike(strike))?;
            let resolution = report.max_abs_residual() + f64::EPSILON * target_delta.abs();
            Ok(resolution < self.strike_tolerance * strike * slope.abs())
        };
        let (report, accepted) = solve_monotone_scalar(
            &objective,
            params.spot,
            0.0,
            upper,
            &self.config,
            accept,
        )?;

        let outcome = if accepted {
            SolverOutcome::Converged(Strike(report.x[0]))
        } else {
            SolverOutcome::NoSolution
        };

        #[cfg(feature = "logging")]
        tracing::debug!(
            termination = ?report.termination,
            residual = report.max_abs_residual(),
            converged = outcome.is_converged(),
            "strike-by-delta solve finished"
        );

        Ok(Evaluated::new(outcome, diagnostics))
    }
}

/// Strike by delta with the default solver (`K ∈ [0, 5·S]`, seed `S`).
///
/// # Errors
/// See [`StrikeByDeltaSolver::solve`].
pub fn strike_by_delta(
    side: OptionSide,
    target_delta: f64,
    params: &OptionParameters,
) -> crate::error::Result<Evaluated<SolverOutcome<Strike>>> {
    StrikeByDeltaSolver::default().solve(side, target_delta, params)
}
