//! Internal bounded nonlinear least-squares solver.
//!
//! Minimizes `½‖r(x)‖²` subject to `lower ≤ x ≤ upper` with a
//! Levenberg-Marquardt iteration. Iterates are kept strictly inside the box:
//! a step that would leave it is cut back to 99.5% of the distance to the
//! boundary, so residual functions are never evaluated on the bounds
//! themselves (where `σ = 0` or `K = 0` make the pricing terms degenerate).

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Fraction of the distance to the boundary a truncated step may cover.
const BOUNDARY_STEP_BACK: f64 = 0.995;
/// Marquardt damping applied to the scaled diagonal on the first iteration.
const INITIAL_DAMPING: f64 = 1e-3;
/// Damping ceiling; beyond this no descent step exists at working precision.
const MAX_DAMPING: f64 = 1e16;
/// Bisection steps spent narrowing a sign change before a restart.
const BRACKET_STEPS: usize = 20;

/// A least-squares problem with a fixed number of parameters.
///
/// Implementors own all fixed data (market parameters, targets), so the
/// solver never captures ambient state.
pub(crate) trait LeastSquaresProblem {
    /// Residual vector `r(x)`.
    fn residuals(&self, x: &DVector<f64>) -> crate::error::Result<DVector<f64>>;

    /// Analytic Jacobian `∂r/∂x`, or `None` to use finite differences.
    fn jacobian(&self, _x: &DVector<f64>) -> crate::error::Result<Option<DMatrix<f64>>> {
        Ok(None)
    }
}

/// Tolerances and limits for the bounded least-squares solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum number of residual evaluations.
    pub max_evaluations: usize,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Relative step-size tolerance.
    pub xtol: f64,
    /// Tolerance on the column-scaled gradient `|Jⱼᵀr| / (‖Jⱼ‖·‖r‖)`.
    pub gtol: f64,
    /// Largest absolute residual accepted as a solution.
    pub residual_tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 200,
            ftol: 1e-14,
            xtol: 1e-12,
            gtol: 1e-12,
            residual_tol: 1e-8,
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// Gradient or relative cost reduction fell below tolerance.
    Converged,
    /// The step size fell below tolerance.
    SmallStep,
    /// The evaluation budget was exhausted.
    MaxEvaluations,
    /// No damped step reduces the cost.
    Stalled,
}

impl Termination {
    /// `true` for the two convergence classes.
    pub(crate) fn is_convergence(self) -> bool {
        matches!(self, Termination::Converged | Termination::SmallStep)
    }
}

/// Outcome of a bounded least-squares solve.
#[derive(Debug, Clone)]
pub(crate) struct LeastSquaresReport {
    pub x: DVector<f64>,
    pub residuals: DVector<f64>,
    pub termination: Termination,
    #[allow(dead_code)]
    pub evaluations: usize,
}

impl LeastSquaresReport {
    /// Largest absolute residual at the final point.
    pub(crate) fn max_abs_residual(&self) -> f64 {
        self.residuals.amax()
    }

    /// `true` if the solver converged and the residual is within `tol`.
    pub(crate) fn solved(&self, tol: f64) -> bool {
        self.termination.is_convergence() && self.max_abs_residual() <= tol
    }
}

/// Move `x0` strictly inside `[lower, upper]`.
fn strictly_feasible(
    x0: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> DVector<f64> {
    DVector::from_fn(x0.len(), |i, _| {
        let (lo, hi) = (lower[i], upper[i]);
        let margin = 1e-10 * (hi - lo);
        x0[i].clamp(lo + margin, hi - margin)
    })
}

/// Largest `α ∈ (0, 1]` keeping `x + α·p` inside the box.
fn max_feasible_fraction(
    x: &DVector<f64>,
    p: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> f64 {
    let mut alpha: f64 = 1.0;
    for i in 0..x.len() {
        if p[i] > 0.0 {
            alpha = alpha.min((upper[i] - x[i]) / p[i]);
        } else if p[i] < 0.0 {
            alpha = alpha.min((lower[i] - x[i]) / p[i]);
        }
    }
    alpha.max(0.0)
}

/// Forward-difference Jacobian, stepping away from the nearer bound.
fn finite_difference_jacobian<P: LeastSquaresProblem>(
    problem: &P,
    x: &DVector<f64>,
    r: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> crate::error::Result<DMatrix<f64>> {
    let mut jac = DMatrix::zeros(r.len(), x.len());
    for j in 0..x.len() {
        let mut h = f64::EPSILON.sqrt() * x[j].abs().max(1.0);
        if x[j] + h > upper[j] {
            h = -h;
        }
        if x[j] + h < lower[j] {
            h = 0.5 * (upper[j] - x[j]);
        }
        let mut xh = x.clone();
        xh[j] += h;
        let rh = problem.residuals(&xh)?;
        jac.set_column(j, &((rh - r) / h));
    }
    Ok(jac)
}

/// Largest column-scaled gradient component `|Jⱼᵀr| / (‖Jⱼ‖·‖r‖)`.
///
/// Independent of the residual's scale, so a flat residual far from the root
/// does not read as a stationary point. Zero columns contribute nothing.
fn scaled_gradient_norm(jac: &DMatrix<f64>, r: &DVector<f64>, gradient: &DVector<f64>) -> f64 {
    let r_norm = r.norm();
    if r_norm == 0.0 {
        return 0.0;
    }
    jac.column_iter()
        .zip(gradient.iter())
        .map(|(column, g)| {
            let n = column.norm();
            if n == 0.0 { 0.0 } else { (g.abs() / n) / r_norm }
        })
        .fold(0.0, f64::max)
}

fn check_finite(r: &DVector<f64>) -> crate::error::Result<()> {
    if r.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PricingError::NumericalError {
            message: format!("non-finite residual: {r:?}"),
        })
    }
}

/// Minimize `½‖r(x)‖²` over the box `[lower, upper]`, starting from `x0`.
///
/// # Errors
/// Propagates errors from the residual or Jacobian evaluation, and returns
/// [`PricingError::NumericalError`] for non-finite residuals or an empty box.
pub(crate) fn least_squares_bounded<P: LeastSquaresProblem>(
    problem: &P,
    x0: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    config: &SolverConfig,
) -> crate::error::Result<LeastSquaresReport> {
    if lower.iter().zip(upper.iter()).any(|(lo, hi)| !(lo < hi)) {
        return Err(PricingError::NumericalError {
            message: "search interval is empty".into(),
        });
    }

    let mut x = strictly_feasible(x0, lower, upper);
    let mut r = problem.residuals(&x)?;
    check_finite(&r)?;
    let mut cost = 0.5 * r.norm_squared();
    let mut evaluations = 1;
    let mut damping: Option<f64> = None;

    let termination = loop {
        if cost == 0.0 {
            break Termination::Converged;
        }
        if evaluations >= config.max_evaluations {
            break Termination::MaxEvaluations;
        }

        let jac = match problem.jacobian(&x)? {
            Some(jac) => jac,
            None => {
                evaluations += x.len();
                finite_difference_jacobian(problem, &x, &r, lower, upper)?
            }
        };
        let gradient = jac.transpose() * &r;
        if scaled_gradient_norm(&jac, &r, &gradient) < config.gtol {
            break Termination::Converged;
        }
        let descent = -gradient;

        let jtj = jac.transpose() * &jac;
        let mut lambda = damping.unwrap_or(INITIAL_DAMPING);

        // Inner loop: raise damping until a step reduces the cost.
        let accepted = loop {
            if lambda > MAX_DAMPING {
                break None;
            }
            let mut system = jtj.clone();
            for i in 0..x.len() {
                system[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
            }
            let Some(step) = system.lu().solve(&descent) else {
                lambda *= 10.0;
                continue;
            };

            let alpha = max_feasible_fraction(&x, &step, lower, upper);
            let step = if alpha < 1.0 {
                step * (alpha * BOUNDARY_STEP_BACK)
            } else {
                step
            };

            if step.norm() <= config.xtol * (config.xtol + x.norm()) {
                break Some((step, None));
            }

            let x_new = &x + &step;
            let r_new = problem.residuals(&x_new)?;
            evaluations += 1;
            check_finite(&r_new)?;
            let cost_new = 0.5 * r_new.norm_squared();

            if cost_new < cost {
                lambda = (lambda / 3.0).max(f64::MIN_POSITIVE);
                break Some((step, Some((x_new, r_new, cost_new))));
            }
            if evaluations >= config.max_evaluations {
                break None;
            }
            lambda *= 10.0;
        };
        damping = Some(lambda);

        match accepted {
            None if evaluations >= config.max_evaluations => break Termination::MaxEvaluations,
            None => break Termination::Stalled,
            Some((_, None)) => break Termination::SmallStep,
            Some((step, Some((x_new, r_new, cost_new)))) => {
                let reduction = cost - cost_new;
                let step_norm = step.norm();
                x = x_new;
                r = r_new;
                cost = cost_new;
                if reduction <= config.ftol * (cost + reduction) {
                    break Termination::Converged;
                }
                if step_norm <= config.xtol * (config.xtol + x.norm()) {
                    break Termination::SmallStep;
                }
            }
        }
    };

    #[cfg(feature = "logging")]
    tracing::debug!(
        ?termination,
        evaluations,
        cost,
        "bounded least squares finished"
    );

    Ok(LeastSquaresReport {
        x,
        residuals: r,
        termination,
        evaluations,
    })
}

fn same_sign(a: f64, b: f64) -> bool {
    (a > 0.0 && b > 0.0) || (a < 0.0 && b < 0.0)
}

/// Narrow a sign change of a one-parameter residual on `[lower, upper]`.
///
/// Both ends are taken strictly inside the interval, as for the
/// least-squares iterates. Returns the midpoint of the bracket after `steps`
/// bisections, or `None` when the residual has the same sign at both ends.
pub(crate) fn bracket_sign_change<P: LeastSquaresProblem>(
    problem: &P,
    lower: f64,
    upper: f64,
    steps: usize,
) -> crate::error::Result<Option<f64>> {
    let eval = |x: f64| -> crate::error::Result<f64> {
        let r = problem.residuals(&DVector::from_element(1, x))?;
        check_finite(&r)?;
        Ok(r[0])
    };

    let margin = 1e-10 * (upper - lower);
    let (mut a, mut b) = (lower + margin, upper - margin);
    let mut fa = eval(a)?;
    if same_sign(fa, eval(b)?) {
        return Ok(None);
    }
    for _ in 0..steps {
        let mid = 0.5 * (a + b);
        let fm = eval(mid)?;
        if same_sign(fa, fm) {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }
    Ok(Some(0.5 * (a + b)))
}

/// Solve a one-parameter problem whose residual is monotone in `x`.
///
/// Starts from `seed`. If that solve ends on a point `accept` rejects (with
/// evaluation budget left), the residual's sign change is bracketed by
/// bisection and the solve restarts from inside the bracket. Returns the
/// last report and whether `accept` took it.
pub(crate) fn solve_monotone_scalar<P, A>(
    problem: &P,
    seed: f64,
    lower: f64,
    upper: f64,
    config: &SolverConfig,
    accept: A,
) -> crate::error::Result<(LeastSquaresReport, bool)>
where
    P: LeastSquaresProblem,
    A: Fn(&LeastSquaresReport) -> crate::error::Result<bool>,
{
    let lower_v = DVector::from_element(1, lower);
    let upper_v = DVector::from_element(1, upper);

    let first = least_squares_bounded(
        problem,
        &DVector::from_element(1, seed),
        &lower_v,
        &upper_v,
        config,
    )?;
    if accept(&first)? {
        return Ok((first, true));
    }
    if first.termination == Termination::MaxEvaluations {
        return Ok((first, false));
    }
    let Some(reseed) = bracket_sign_change(problem, lower, upper, BRACKET_STEPS)? else {
        return Ok((first, false));
    };

    #[cfg(feature = "logging")]
    tracing::debug!(seed, reseed, "restarting from bracketed sign change");

    let second = least_squares_bounded(
        problem,
        &DVector::from_element(1, reseed),
        &lower_v,
        &upper_v,
        config,
    )?;
    let accepted = accept(&second)?;
    Ok((second, accepted))
}
