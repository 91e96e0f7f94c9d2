//! Property-based tests using proptest.
//!
//! These tests check pricing identities and solver round trips across random
//! market states rather than fixed examples.

use fxvanilla::conventions::{DeltaConvention, forward_price};
use fxvanilla::greeks::{delta, gamma, vega};
use fxvanilla::{
    OptionParameters, OptionSide, compute_premium, harmonize_delta, implied_volatility,
    strike_by_delta, strike_from_quoted_delta,
};
use proptest::prelude::*;

/// Market state around spot 100 with moderate rates, maturities and vols.
fn market() -> impl Strategy<Value = OptionParameters> {
    (
        50.0_f64..150.0,
        -0.01_f64..0.06,
        0.1_f64..2.0,
        0.1_f64..0.8,
        -0.01_f64..0.05,
    )
        .prop_map(|(strike, rd, ttm, vol, rf)| {
            OptionParameters::new(100.0, strike, rd, ttm, vol, rf)
        })
}

// --- Property Test 1: put-call parity ---

proptest! {
    /// `C − P = S·e^(−rf·T) − K·e^(−rd·T)` for every valid market state.
    #[test]
    fn put_call_parity(p in market()) {
        let premium = compute_premium(&p).unwrap().value;
        let forward_value = p.spot * p.foreign_discount() - p.strike * p.domestic_discount();
        prop_assert!(
            (premium.call - premium.put - forward_value).abs() < 1e-9,
            "parity broken: C − P = {}, expected {}",
            premium.call - premium.put,
            forward_value
        );
    }
}

// --- Property Test 2: premium bounds ---

proptest! {
    /// Premiums are non-negative and below the discounted legs.
    #[test]
    fn premium_is_bounded(p in market()) {
        let premium = compute_premium(&p).unwrap().value;
        prop_assert!(premium.call >= 0.0 && premium.put >= 0.0);
        prop_assert!(premium.call <= p.spot * p.foreign_discount() + 1e-12);
        prop_assert!(premium.put <= p.strike * p.domestic_discount() + 1e-12);
    }
}

// --- Property Test 3: delta relationship ---

proptest! {
    /// `delta.call − delta.put = e^(−rf·T)` and both are bounded by it.
    #[test]
    fn delta_relationship(p in market()) {
        let d = delta(&p).unwrap().value;
        let df = p.foreign_discount();
        prop_assert!((d.call - d.put - df).abs() < 1e-12);
        prop_assert!(d.call >= 0.0 && d.call <= df);
        prop_assert!(d.put <= 0.0 && d.put >= -df);
    }
}

// --- Property Test 4: implied volatility round trip ---

proptest! {
    /// Pricing then inverting recovers the input volatility for both sides,
    /// from deep in- to deep out-of-the-money and a few days to three years.
    ///
    /// States whose vega is below 1e-3 at the true volatility are skipped:
    /// there the premium does not pin the volatility down to 1e-4.
    #[test]
    fn implied_vol_round_trip(
        moneyness in 0.5_f64..1.5,
        ttm in 0.01_f64..3.0,
        vol in 0.01_f64..2.0,
        rd in -0.01_f64..0.06,
        rf in -0.01_f64..0.05,
    ) {
        let p = OptionParameters::new(100.0, 100.0 * moneyness, rd, ttm, vol, rf);
        prop_assume!(vega(&p).unwrap().value.call > 1e-3);

        let premium = compute_premium(&p).unwrap().value;
        for side in OptionSide::BOTH {
            let solved = implied_volatility(side, premium.get(side), &p.with_volatility(0.0))
                .unwrap()
                .value
                .value();
            prop_assert!(solved.is_some(), "no implied vol for {side}");
            let solved = solved.unwrap().0;
            prop_assert!(
                (solved - vol).abs() < 1e-4,
                "{side}: recovered {solved}, expected {vol}"
            );
        }
    }
}

// --- Property Test 5: strike-by-delta round trip ---

proptest! {
    /// Delta at a strike, solved back for the strike, returns that strike.
    ///
    /// `S·Γ` equals `K·|∂Δ/∂K|`; below 1e-4 the delta curve is too flat for
    /// the strike to be recovered to 1e-4 relative.
    #[test]
    fn strike_by_delta_round_trip(
        moneyness in 0.3_f64..3.0,
        ttm in 0.01_f64..3.0,
        vol in 0.05_f64..1.0,
        rd in -0.01_f64..0.06,
        rf in -0.01_f64..0.05,
    ) {
        let strike = 100.0 * moneyness;
        let p = OptionParameters::new(100.0, strike, rd, ttm, vol, rf);
        prop_assume!(p.spot * gamma(&p).unwrap().value.call > 1e-4);

        let d = delta(&p).unwrap().value;
        for side in OptionSide::BOTH {
            let target = d.get(side);
            let solved = strike_by_delta(side, target, &p).unwrap().value.value();
            prop_assert!(solved.is_some(), "no strike for {side} delta {target}");
            let solved = solved.unwrap().0;
            prop_assert!(
                (solved - strike).abs() < 1e-4 * strike,
                "{side}: recovered {solved}, expected {strike}"
            );
        }
    }
}

// --- Property Test 6: quoted delta inversion ---

proptest! {
    /// The closed-form strike reproduces the quoted forward delta.
    #[test]
    fn quoted_forward_delta_round_trip(
        quoted in 0.02_f64..0.98,
        is_call in any::<bool>(),
        ttm in 0.1_f64..2.0,
        vol in 0.05_f64..0.5,
        rd in -0.01_f64..0.06,
        rf in -0.01_f64..0.05,
    ) {
        let signed = if is_call { quoted } else { -quoted };
        let p = OptionParameters::new(1.25, 0.0, rd, ttm, vol, rf);
        let strike = strike_from_quoted_delta(&p, signed, DeltaConvention::Forward)
            .unwrap()
            .value;
        let d = delta(&p.with_strike(strike.0)).unwrap().value;
        let side = if is_call { OptionSide::Call } else { OptionSide::Put };
        let forward_delta = d.get(side) / p.foreign_discount();
        prop_assert!(
            (forward_delta - signed).abs() < 1e-9,
            "quoted {signed}, strike {} gives {forward_delta}",
            strike.0
        );
    }
}

// --- Property Test 7: forward price consistency ---

proptest! {
    /// At the forward, call and put are worth the same.
    #[test]
    fn at_the_forward_call_equals_put(
        ttm in 0.1_f64..2.0,
        vol in 0.1_f64..0.8,
        rd in -0.01_f64..0.06,
        rf in -0.01_f64..0.05,
    ) {
        let f = forward_price(100.0, rd, rf, ttm);
        let p = OptionParameters::new(100.0, f, rd, ttm, vol, rf);
        let premium = compute_premium(&p).unwrap().value;
        prop_assert!((premium.call - premium.put).abs() < 1e-9);
    }
}

// --- Property Test 8: delta harmonization ---

proptest! {
    /// Harmonized deltas lie in `[0, 1]`; a call delta and its put
    /// counterpart `δ − 1` land on the same point.
    #[test]
    fn harmonized_deltas_in_unit_interval(deltas in prop::collection::vec(-1.0_f64..=1.0, 0..32)) {
        let out = harmonize_delta(&deltas).unwrap();
        prop_assert_eq!(out.len(), deltas.len());
        for (&h, &d) in out.iter().zip(&deltas) {
            prop_assert!((0.0..=1.0).contains(&h), "harmonized {d} to {h}");
        }
    }

    #[test]
    fn call_and_put_harmonize_together(call in 0.001_f64..1.0) {
        let out = harmonize_delta(&[call, call - 1.0]).unwrap();
        prop_assert!((out[0] - out[1]).abs() < 1e-15);
    }

    #[test]
    fn out_of_range_delta_rejected(bad in 1.000_001_f64..10.0, negate in any::<bool>()) {
        let bad = if negate { -bad } else { bad };
        prop_assert!(harmonize_delta(&[0.5, bad]).is_err());
    }
}
