//! # fxvanilla
//!
//! Closed-form pricing and quotation toolkit for European vanilla options
//! on FX pairs and dividend-paying assets.
//!
//! Covers premium and Greeks under Black-Scholes / Garman-Kohlhagen, implied
//! volatility and strike-by-delta inversion, and the FX delta quotation
//! conventions used on dealer screens.
//!
//! ## Architecture
//!
//! - **`kernel`**: `d1`/`d2` and call/put premium
//! - **`greeks`**: Delta, gamma, theta, vega, rho and foreign rho
//! - **`implied`**: Implied volatility via bounded least squares
//! - **`strike`**: Strike for a target delta via bounded least squares
//! - **`conventions`**: ATM forward strike, quoted-delta strikes, delta harmonization
//! - **`grid`**: Premium and Greeks over a (spot, maturity) grid
//!
//! ## Design
//!
//! - **Newtypes for outputs, bare `f64` for inputs.** [`Vol`] and [`Strike`]
//!   wrap solver and converter results. Inputs are plain `f64` fields of
//!   [`OptionParameters`], checked by the validator on every call.
//! - **No panics.** Every fallible operation returns [`Result`]. Library code
//!   never calls `unwrap()` or `expect()`.
//! - **Warnings are data.** Negative rates are legal but unusual; they come
//!   back as [`Diagnostics`] inside [`Evaluated`] next to the value.
//! - **Non-convergence is not an error.** Solvers return
//!   [`SolverOutcome::NoSolution`] when the target is unattainable.
//! - **Pure functions.** No global state, so everything is `Send + Sync` and
//!   callable from any thread.
//! - **Serializable.** Parameter and result types implement Serde
//!   `Serialize` / `Deserialize`; parameters are validated on deserialization.

pub mod conventions;
pub mod diagnostics;
pub mod error;
pub mod greeks;
pub mod grid;
pub mod implied;
pub mod kernel;
pub mod normal;
mod optim;
pub mod strike;
pub mod types;
pub mod validate;

#[doc(inline)]
pub use conventions::{DeltaConvention, atm_forward_strike, harmonize_delta, strike_from_quoted_delta};
#[doc(inline)]
pub use diagnostics::{Diagnostic, Diagnostics, Evaluated, RateKind};
#[doc(inline)]
pub use error::{PricingError, Result};
#[doc(inline)]
pub use greeks::{GreekKind, GreeksBundle, compute_greeks};
#[doc(inline)]
pub use grid::{GridCell, GridSurface, evaluate_grid};
#[doc(inline)]
pub use implied::{ImpliedVolSolver, implied_volatility};
#[doc(inline)]
pub use kernel::compute_premium;
#[doc(inline)]
pub use optim::SolverConfig;
#[doc(inline)]
pub use strike::{StrikeByDeltaSolver, strike_by_delta};
#[doc(inline)]
pub use types::{OptionParameters, OptionSide, PremiumPair, SidePair, SolverOutcome, Strike, Vol};
