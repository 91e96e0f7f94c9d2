//! Premium and Greeks over a (spot, time-to-maturity) grid.
//!
//! [`evaluate_grid`] holds every field of a base parameter set fixed except
//! spot and time to maturity, and evaluates each cell of the cartesian
//! product. The result is plain data for downstream rendering or risk
//! reports. With the `parallel` feature cells are evaluated on the rayon pool.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::PricingError;
use crate::greeks::{GreekKind, GreeksBundle, compute_greeks};
use crate::kernel::compute_premium;
use crate::types::{OptionParameters, OptionSide, PremiumPair};
use crate::validate::{validate_non_negative, validate_parameters};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One evaluated grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub spot: f64,
    pub time_to_maturity: f64,
    pub premium: PremiumPair,
    /// `None` at expiry, where the Greeks are undefined.
    pub greeks: Option<GreeksBundle>,
}

/// Evaluated grid, stored row-major with one row per spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSurface {
    spots: Vec<f64>,
    times_to_maturity: Vec<f64>,
    cells: Vec<GridCell>,
    diagnostics: Diagnostics,
}

impl GridSurface {
    /// Spot axis (rows).
    pub fn spots(&self) -> &[f64] {
        &self.spots
    }

    /// Time-to-maturity axis (columns).
    pub fn times_to_maturity(&self) -> &[f64] {
        &self.times_to_maturity
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Cell at spot index `i` and time-to-maturity index `j`.
    pub fn cell(&self, i: usize, j: usize) -> Option<&GridCell> {
        if i >= self.spots.len() || j >= self.times_to_maturity.len() {
            return None;
        }
        self.cells.get(i * self.times_to_maturity.len() + j)
    }

    /// Non-fatal conditions raised by the base parameters.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Premium of `side` as a `spots × times_to_maturity` matrix.
    pub fn premium_surface(&self, side: OptionSide) -> DMatrix<f64> {
        self.matrix(|cell| cell.premium.get(side))
    }

    /// Greek of `side` as a `spots × times_to_maturity` matrix.
    ///
    /// Cells at expiry have no Greeks and read as NaN.
    pub fn greek_surface(&self, kind: GreekKind, side: OptionSide) -> DMatrix<f64> {
        self.matrix(|cell| {
            cell.greeks
                .map_or(f64::NAN, |greeks| greeks.get(kind).get(side))
        })
    }

    fn matrix(&self, f: impl Fn(&GridCell) -> f64) -> DMatrix<f64> {
        let cols = self.times_to_maturity.len();
        DMatrix::from_fn(self.spots.len(), cols, |i, j| f(&self.cells[i * cols + j]))
    }
}

/// Evaluate premium and Greeks on every `(spot, time_to_maturity)` pair.
///
/// # Examples
/// ```
/// use fxvanilla::grid::evaluate_grid;
/// use fxvanilla::types::{OptionParameters, OptionSide};
///
/// let base = OptionParameters::new(100.0, 100.0, 0.03, 0.25, 0.2, 0.01);
/// let grid = evaluate_grid(&base, &[90.0, 100.0, 110.0], &[0.0, 0.5, 1.0])?;
/// let calls = grid.premium_surface(OptionSide::Call);
/// assert_eq!(calls.shape(), (3, 3));
/// assert_eq!(calls[(2, 0)], 10.0);
/// # Ok::<(), fxvanilla::PricingError>(())
/// ```
///
/// # Errors
/// [`PricingError::Domain`] if either axis is empty,
/// [`PricingError::Validation`] for invalid base parameters or axis values,
/// [`PricingError::DegenerateTerm`] for zero volatility before expiry.
pub fn evaluate_grid(
    base: &OptionParameters,
    spots: &[f64],
    times_to_maturity: &[f64],
) -> crate::error::Result<GridSurface> {
    let diagnostics = validate_parameters(base)?;
    if spots.is_empty() || times_to_maturity.is_empty() {
        return Err(PricingError::Domain {
            message: format!(
                "grid axes must not be empty ({} spots, {} maturities)",
                spots.len(),
                times_to_maturity.len()
            ),
        });
    }
    for &spot in spots {
        validate_non_negative(spot, "spot")?;
    }
    for &ttm in times_to_maturity {
        validate_non_negative(ttm, "time_to_maturity")?;
    }

    let cols = times_to_maturity.len();
    let evaluate_cell = |index: usize| -> crate::error::Result<GridCell> {
        let spot = spots[index / cols];
        let time_to_maturity = times_to_maturity[index % cols];
        let params = base.with_spot(spot).with_time_to_maturity(time_to_maturity);
        let premium = compute_premium(&params)?.into_value();
        let greeks = if time_to_maturity > 0.0 {
            Some(compute_greeks(&params)?.into_value())
        } else {
            None
        };
        Ok(GridCell {
            spot,
            time_to_maturity,
            premium,
            greeks,
        })
    };

    let n = spots.len() * cols;

    #[cfg(feature = "parallel")]
    let cells = (0..n)
        .into_par_iter()
        .map(evaluate_cell)
        .collect::<crate::error::Result<Vec<_>>>()?;
    #[cfg(not(feature = "parallel"))]
    let cells = (0..n)
        .map(evaluate_cell)
        .collect::<crate::error::Result<Vec<_>>>()?;

    #[cfg(feature = "logging")]
    tracing::debug!(
        n_spots = spots.len(),
        n_maturities = cols,
        "grid evaluation complete"
    );

    Ok(GridSurface {
        spots: spots.to_vec(),
        times_to_maturity: times_to_maturity.to_vec(),
        cells,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RateKind;
    use approx::assert_abs_diff_eq;

    fn base() -> OptionParameters {
        OptionParameters::new(100.0, 100.0, 0.03, 0.25, 0.2, 0.01)
    }

    const SPOTS: [f64; 4] = [80.0, 95.0, 105.0, 120.0];
    const TTMS: [f64; 3] = [0.0, 0.25, 1.0];

    #[test]
    fn shape_and_axes() {
        let grid = evaluate_grid(&base(), &SPOTS, &TTMS).unwrap();
        assert_eq!(grid.cells().len(), 12);
        assert_eq!(grid.spots(), &SPOTS);
        assert_eq!(grid.times_to_maturity(), &TTMS);
        assert_eq!(grid.premium_surface(OptionSide::Put).shape(), (4, 3));
        assert!(grid.cell(4, 0).is_none());
        assert!(grid.cell(0, 3).is_none());
    }

    #[test]
    fn cells_match_direct_evaluation() {
        let grid = evaluate_grid(&base(), &SPOTS, &TTMS).unwrap();
        let cell = grid.cell(2, 2).unwrap();
        assert_eq!(cell.spot, 105.0);
        assert_eq!(cell.time_to_maturity, 1.0);

        let params = base().with_spot(105.0).with_time_to_maturity(1.0);
        let premium = compute_premium(&params).unwrap().value;
        let greeks = compute_greeks(&params).unwrap().value;
        assert_abs_diff_eq!(cell.premium.call, premium.call, epsilon = 1e-14);
        assert_eq!(cell.greeks, Some(greeks));

        let surface = grid.greek_surface(GreekKind::Vega, OptionSide::Call);
        assert_abs_diff_eq!(surface[(2, 2)], greeks.vega.call, epsilon = 1e-14);
    }

    #[test]
    fn expiry_column_is_intrinsic_without_greeks() {
        let grid = evaluate_grid(&base(), &SPOTS, &TTMS).unwrap();
        let calls = grid.premium_surface(OptionSide::Call);
        let puts = grid.premium_surface(OptionSide::Put);
        for (i, &spot) in SPOTS.iter().enumerate() {
            assert_eq!(calls[(i, 0)], (spot - 100.0).max(0.0));
            assert_eq!(puts[(i, 0)], (100.0 - spot).max(0.0));
            assert!(grid.cell(i, 0).unwrap().greeks.is_none());
        }
        let gamma = grid.greek_surface(GreekKind::Gamma, OptionSide::Call);
        assert!(gamma[(1, 0)].is_nan());
        assert!(gamma[(1, 1)] > 0.0);
    }

    #[test]
    fn call_premium_increases_with_spot() {
        let grid = evaluate_grid(&base(), &SPOTS, &TTMS).unwrap();
        let calls = grid.premium_surface(OptionSide::Call);
        for j in 1..TTMS.len() {
            for i in 1..SPOTS.len() {
                assert!(calls[(i, j)] > calls[(i - 1, j)]);
            }
        }
    }

    #[test]
    fn empty_axis_is_rejected() {
        assert!(matches!(
            evaluate_grid(&base(), &[], &TTMS),
            Err(PricingError::Domain { .. })
        ));
        assert!(matches!(
            evaluate_grid(&base(), &SPOTS, &[]),
            Err(PricingError::Domain { .. })
        ));
    }

    #[test]
    fn invalid_axis_value_is_rejected() {
        assert!(matches!(
            evaluate_grid(&base(), &[100.0, -5.0], &TTMS),
            Err(PricingError::Validation { field: "spot", .. })
        ));
        assert!(matches!(
            evaluate_grid(&base(), &SPOTS, &[0.5, f64::NAN]),
            Err(PricingError::Validation {
                field: "time_to_maturity",
                ..
            })
        ));
    }

    #[test]
    fn zero_volatility_fails_before_expiry() {
        let p = base().with_volatility(0.0);
        assert!(matches!(
            evaluate_grid(&p, &SPOTS, &TTMS),
            Err(PricingError::DegenerateTerm { .. })
        ));
        assert!(evaluate_grid(&p, &SPOTS, &[0.0]).is_ok());
    }

    #[test]
    fn base_diagnostics_are_kept() {
        let mut p = base();
        p.domestic_rate = -0.004;
        let grid = evaluate_grid(&p, &SPOTS, &TTMS).unwrap();
        assert!(grid.diagnostics().has_negative_rate(RateKind::Domestic));
        assert!(!grid.diagnostics().has_negative_rate(RateKind::Foreign));
    }
}
