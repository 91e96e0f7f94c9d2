//! Standard normal distribution functions.
//!
//! Thin wrappers over `statrs`' error functions. Going through `erfc` keeps
//! full relative precision in both tails, which matters for deep
//! out-of-the-money deltas.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use statrs::function::erf::{erfc, erfc_inv};

/// 1 / √(2π)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal CDF `N(x)`.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal density `N'(x)`.
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Inverse standard normal CDF `N⁻¹(p)`.
///
/// Returns `-∞` at `p = 0`, `+∞` at `p = 1` and NaN outside `[0, 1]`.
pub fn norm_inv_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cdf_reference_values() {
        assert_abs_diff_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(norm_cdf(1.0), 0.841_344_746_068_542_9, epsilon = 1e-12);
        assert_abs_diff_eq!(norm_cdf(-1.959_963_984_540_054), 0.025, epsilon = 1e-12);
    }

    #[test]
    fn cdf_symmetry() {
        for x in [-3.0, -1.2, 0.1, 0.7, 2.5] {
            assert_abs_diff_eq!(norm_cdf(x) + norm_cdf(-x), 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn pdf_peak() {
        assert_abs_diff_eq!(norm_pdf(0.0), FRAC_1_SQRT_2PI, epsilon = 1e-15);
        assert_abs_diff_eq!(norm_pdf(1.0), norm_pdf(-1.0), epsilon = 1e-15);
    }

    #[test]
    fn inverse_round_trip() {
        for p in [1e-8, 0.01, 0.25, 0.5, 0.75, 0.99, 1.0 - 1e-8] {
            assert_abs_diff_eq!(norm_cdf(norm_inv_cdf(p)), p, epsilon = 1e-12);
        }
    }

    #[test]
    fn inverse_edges() {
        assert_eq!(norm_inv_cdf(0.0), f64::NEG_INFINITY);
        assert_eq!(norm_inv_cdf(1.0), f64::INFINITY);
        assert!(norm_inv_cdf(1.5).is_nan());
        assert!(norm_inv_cdf(-0.1).is_nan());
    }
}
