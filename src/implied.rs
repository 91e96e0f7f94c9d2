//! Implied volatility extraction.
//!
//! Inverts the pricing kernel: finds `σ ∈ [0, 2]` such that
//! `premium(side, σ) = target` with the bounded least-squares solver, seeded
//! at `σ₀ = 0.2`. Far from the money the premium is flat at the seed; the
//! solve then restarts from a bisection bracket of the root, since the
//! premium is increasing in `σ`.
//!
//! A volatility is reported only when the premium pins it down: the residual
//! plus the target's rounding error, divided by vega, must stay below the
//! volatility tolerance. Targets outside the attainable premium range (below
//! the `σ → 0` value, above the no-arbitrage bound `S·e^(−rf·T)` for calls)
//! and deep in-the-money premiums with no time value left report
//! [`SolverOutcome::NoSolution`].

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Evaluated;
use crate::greeks::vega_unchecked;
use crate::kernel::premium_pair;
use crate::optim::{LeastSquaresProblem, LeastSquaresReport, SolverConfig, solve_monotone_scalar};
use crate::types::{OptionParameters, OptionSide, SolverOutcome, Vol};
use crate::validate::{validate_finite, validate_non_negative, validate_parameters};

/// Objective `f(σ) = premium(side, σ) − target` over fixed market parameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImpliedVolObjective {
    side: OptionSide,
    target: f64,
    params: OptionParameters,
}

impl ImpliedVolObjective {
    pub(crate) fn new(side: OptionSide, target: f64, params: OptionParameters) -> Self {
        Self {
            side,
            target,
            params,
        }
    }

    pub(crate) fn evaluate(&self, sigma: f64) -> crate::error::Result<f64> {
        let premium = premium_pair(&self.params.with_volatility(sigma))?;
        Ok(premium.get(self.side) - self.target)
    }
}

impl LeastSquaresProblem for ImpliedVolObjective {
    fn residuals(&self, x: &DVector<f64>) -> crate::error::Result<DVector<f64>> {
        Ok(DVector::from_element(1, self.evaluate(x[0])?))
    }

    fn jacobian(&self, x: &DVector<f64>) -> crate::error::Result<Option<DMatrix<f64>>> {
        let vega = vega_unchecked(&self.params.with_volatility(x[0]))?;
        Ok(Some(DMatrix::from_element(1, 1, vega)))
    }
}

/// Configurable implied volatility solver.
///
/// # Examples
///
/// ```
/// use fxvanilla::implied::ImpliedVolSolver;
/// use fxvanilla::kernel::premium;
/// use fxvanilla::types::{OptionParameters, OptionSide};
///
/// let params = OptionParameters::new(1.10, 1.12, 0.04, 0.5, 0.135, 0.02);
/// let target = premium(OptionSide::Call, &params)?.value;
///
/// let solved = ImpliedVolSolver::default()
///     .solve(OptionSide::Call, target, &params.with_volatility(0.0))?
///     .value;
/// let vol = solved.value().expect("target is attainable");
/// assert!((vol.0 - 0.135).abs() < 1e-6);
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolSolver {
    lower: f64,
    upper: f64,
    seed: f64,
    vol_tolerance: f64,
    config: SolverConfig,
}

impl Default for ImpliedVolSolver {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 2.0,
            seed: 0.2,
            vol_tolerance: 1e-6,
            config: SolverConfig::default(),
        }
    }
}

impl ImpliedVolSolver {
    /// Solver with the default interval `[0, 2]` and seed `0.2`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the volatility search interval.
    pub fn bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Set the initial volatility guess.
    pub fn seed(mut self, seed: f64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the largest volatility error a reported solution may carry.
    pub fn vol_tolerance(mut self, tolerance: f64) -> Self {
        self.vol_tolerance = tolerance;
        self
    }

    /// Set solver tolerances and the evaluation budget.
    pub fn config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Volatility reproducing `target_premium` on `side`.
    ///
    /// The `volatility` field of `params` is ignored.
    ///
    /// # Errors
    /// [`PricingError::Validation`](crate::PricingError::Validation) for
    /// invalid parameters, a non-finite target, an invalid search interval or
    /// a negative volatility tolerance.
    /// Non-convergence is not an error; it is
    /// [`SolverOutcome::NoSolution`].
    pub fn solve(
        &self,
        side: OptionSide,
        target_premium: f64,
        params: &OptionParameters,
    ) -> crate::error::Result<Evaluated<SolverOutcome<Vol>>> {
        let seeded = params.with_volatility(self.seed);
        let diagnostics = validate_parameters(&seeded)?;
        validate_finite(target_premium, "target_premium")?;
        validate_bounds(self.lower, self.upper)?;
        validate_non_negative(self.vol_tolerance, "vol_tolerance")?;

        // At expiry, or with a zero spot or strike, the premium does not
        // depend on volatility.
        if seeded.time_to_maturity == 0.0 || seeded.spot == 0.0 || seeded.strike == 0.0 {
            return Ok(Evaluated::new(SolverOutcome::NoSolution, diagnostics));
        }

        #[cfg(feature = "logging")]
        tracing::debug!(%side, target_premium, "implied volatility solve started");

        let objective = ImpliedVolObjective::new(side, target_premium, seeded);
        let accept = |report: &LeastSquaresReport| -> crate::error::Result<bool> {
            if !report.solved(self.config.residual_tol) {
                return Ok(false);
            }
            let vega = vega_unchecked(&seeded.with_volatility(report.x[0]))?;
            let resolution = report.max_abs_residual() + f64::EPSILON * target_premium.abs();
            Ok(resolution < self.vol_tolerance * vega)
        };
        let (report, accepted) = solve_monotone_scalar(
            &objective,
            self.seed,
            self.lower,
            self.upper,
            &self.config,
            accept,
        )?;

        let outcome = if accepted {
            SolverOutcome::Converged(Vol(report.x[0]))
        } else {
            SolverOutcome::NoSolution
        };

        #[cfg(feature = "logging")]
        tracing::debug!(
            termination = ?report.termination,
            residual = report.max_abs_residual(),
            converged = outcome.is_converged(),
            "implied volatility solve finished"
        );

        Ok(Evaluated::new(outcome, diagnostics))
    }
}

/// Reject NaN, negative or empty search intervals.
pub(crate) fn validate_bounds(lower: f64, upper: f64) -> crate::error::Result<()> {
    validate_non_negative(lower, "lower_bound")?;
    validate_non_negative(upper, "upper_bound")?;
    if upper <= lower {
        return Err(crate::error::PricingError::Validation {
            field: "upper_bound",
            value: upper,
        });
    }
    Ok(())
}

/// Implied volatility with the default solver (`σ ∈ [0, 2]`, seed `0.2`).
///
/// # Errors
/// See [`ImpliedVolSolver::solve`].
pub fn implied_volatility(
    side: OptionSide,
    target_premium: f64,
    params: &OptionParameters,
) -> crate::error::Result<Evaluated<SolverOutcome<Vol>>> {
    ImpliedVolSolver::default().solve(side, target_premium, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RateKind;
    use crate::error::PricingError;
    use crate::kernel::compute_premium;
    use approx::assert_abs_diff_eq;

    fn base() -> OptionParameters {
        OptionParameters::new(100.0, 100.0, 0.03, 0.25, 0.2, 0.01)
    }

    fn solve(side: OptionSide, target: f64, params: &OptionParameters) -> SolverOutcome<Vol> {
        implied_volatility(side, target, params).unwrap().value
    }

    #[test]
    fn recovers_volatility_for_both_sides() {
        for sigma in [0.1, 0.2, 0.65, 1.4] {
            for strike in [90.0, 100.0, 112.0] {
                let p = base().with_strike(strike).with_volatility(sigma);
                let premium = compute_premium(&p).unwrap().value;
                for side in OptionSide::BOTH {
                    let vol = solve(side, premium.get(side), &p.with_volatility(0.0))
                        .value()
                        .unwrap_or_else(|| panic!("no solution for {side} K={strike} σ={sigma}"));
                    assert_abs_diff_eq!(vol.0, sigma, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn ignores_input_volatility() {
        let p = base().with_volatility(0.3);
        let target = compute_premium(&p).unwrap().value.call;
        let a = solve(OptionSide::Call, target, &p.with_volatility(0.0));
        let b = solve(OptionSide::Call, target, &p.with_volatility(1.7));
        assert_abs_diff_eq!(a.value().unwrap().0, b.value().unwrap().0, epsilon = 1e-9);
    }

    #[test]
    fn premium_below_intrinsic_has_no_solution() {
        let p = base().with_strike(80.0);
        // Deep in-the-money call is worth at least S·Df − K·Dd ≈ 20.35.
        assert_eq!(solve(OptionSide::Call, 5.0, &p), SolverOutcome::NoSolution);
    }

    #[test]
    fn premium_above_upper_bound_has_no_solution() {
        let p = base();
        // A call can never be worth more than the discounted spot.
        assert_eq!(solve(OptionSide::Call, 150.0, &p), SolverOutcome::NoSolution);
    }

    #[test]
    fn vol_above_search_interval_has_no_solution() {
        let p = base().with_volatility(3.0);
        let target = compute_premium(&p).unwrap().value.put;
        assert_eq!(solve(OptionSide::Put, target, &p), SolverOutcome::NoSolution);
    }

    #[test]
    fn expiry_has_no_solution() {
        let p = base().with_time_to_maturity(0.0);
        assert_eq!(solve(OptionSide::Call, 1.0, &p), SolverOutcome::NoSolution);
    }

    #[test]
    fn validation_precedes_solve() {
        let p = base().with_spot(-1.0);
        assert!(matches!(
            implied_volatility(OptionSide::Call, 4.0, &p),
            Err(PricingError::Validation { field: "spot", .. })
        ));
        assert!(matches!(
            implied_volatility(OptionSide::Call, f64::NAN, &base()),
            Err(PricingError::Validation {
                field: "target_premium",
                ..
            })
        ));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let solver = ImpliedVolSolver::new().bounds(1.0, 0.5);
        assert!(matches!(
            solver.solve(OptionSide::Call, 4.0, &base()),
            Err(PricingError::Validation { .. })
        ));
    }

    #[test]
    fn negative_rate_is_reported() {
        let mut p = base().with_volatility(0.25);
        p.foreign_rate = -0.02;
        let target = compute_premium(&p).unwrap().value.call;
        let evaluated = implied_volatility(OptionSide::Call, target, &p).unwrap();
        assert!(evaluated.value.is_converged());
        assert!(evaluated.diagnostics.has_negative_rate(RateKind::Foreign));
    }

    #[test]
    fn custom_seed_and_bounds() {
        let p = base().with_volatility(2.5);
        let target = compute_premium(&p).unwrap().value.call;
        let solved = ImpliedVolSolver::new()
            .bounds(0.0, 4.0)
            .seed(1.0)
            .solve(OptionSide::Call, target, &p)
            .unwrap()
            .value;
        assert_abs_diff_eq!(solved.value().unwrap().0, 2.5, epsilon = 1e-6);
    }

    #[test]
    fn recovers_volatility_when_seed_premium_is_flat() {
        // Vega at the 0.2 seed is below 1e-17 in all three cases.
        for (side, strike, ttm, sigma) in [
            (OptionSide::Put, 50.0, 0.1, 1.6),
            (OptionSide::Call, 130.0, 0.02, 1.0),
            (OptionSide::Call, 180.0, 0.05, 1.9),
        ] {
            let p = base()
                .with_strike(strike)
                .with_time_to_maturity(ttm)
                .with_volatility(sigma);
            let target = compute_premium(&p).unwrap().value.get(side);
            let vol = solve(side, target, &p)
                .value()
                .unwrap_or_else(|| panic!("no solution for {side} K={strike} T={ttm}"));
            assert_abs_diff_eq!(vol.0, sigma, epsilon = 1e-6);
        }
    }

    #[test]
    fn in_the_money_premium_without_time_value_has_no_solution() {
        // Any σ up to about 0.1 reprices this call to rounding precision.
        let p = base()
            .with_strike(85.0)
            .with_time_to_maturity(0.1)
            .with_volatility(0.03);
        let target = compute_premium(&p).unwrap().value.call;
        assert_eq!(solve(OptionSide::Call, target, &p), SolverOutcome::NoSolution);
    }

    #[test]
    fn small_time_value_is_resolved_not_rounded_to_seed() {
        let p = base()
            .with_strike(150.0)
            .with_time_to_maturity(0.02)
            .with_volatility(0.5);
        let target = compute_premium(&p).unwrap().value.put;
        let vol = solve(OptionSide::Put, target, &p).value().unwrap();
        assert_abs_diff_eq!(vol.0, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn zero_premium_has_no_solution() {
        let p = base().with_strike(50.0).with_time_to_maturity(0.01);
        assert_eq!(solve(OptionSide::Put, 0.0, &p), SolverOutcome::NoSolution);
    }

    #[test]
    fn zero_spot_or_strike_has_no_solution() {
        assert_eq!(solve(OptionSide::Put, 99.0, &base().with_spot(0.0)), SolverOutcome::NoSolution);
        assert_eq!(solve(OptionSide::Call, 99.0, &base().with_strike(0.0)), SolverOutcome::NoSolution);
    }

    #[test]
    fn negative_vol_tolerance_is_rejected() {
        let solver = ImpliedVolSolver::new().vol_tolerance(-1.0);
        assert!(matches!(
            solver.solve(OptionSide::Call, 4.0, &base()),
            Err(PricingError::Validation {
                field: "vol_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn objective_owns_its_inputs() {
        let p = base();
        let target = compute_premium(&p).unwrap().value.call;
        let objective = ImpliedVolObjective::new(OptionSide::Call, target, p);
        assert_abs_diff_eq!(objective.evaluate(0.2).unwrap(), 0.0, epsilon = 1e-12);
        assert!(objective.evaluate(0.3).unwrap() > 0.0);
        assert!(objective.evaluate(0.1).unwrap() < 0.0);
    }
}
