//! Turn an FX delta quote into strikes, premiums and implied vols.
//!
//! Shows how to:
//!   - Compute the ATM delta-neutral strike
//!   - Convert 25- and 10-delta quotes to strikes under both delta conventions
//!   - Price the resulting options and recover the quoted vol
//!   - Solve for a strike numerically and compare with the closed form
//!
//! Run with: `cargo run --example fx_quotes`

use fxvanilla::conventions::{DeltaConvention, forward_price};
use fxvanilla::{
    OptionParameters, OptionSide, atm_forward_strike, compute_premium, harmonize_delta,
    implied_volatility, strike_by_delta, strike_from_quoted_delta,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // EUR/USD, 6 months, USD rate 3.5%, EUR rate 2.0%, ATM vol 10%
    let market = OptionParameters::new(1.08, 0.0, 0.035, 0.5, 0.10, 0.02);

    // ---------------------------------------------------------------
    // 1. Forward and ATM strike
    // ---------------------------------------------------------------

    let forward = forward_price(
        market.spot,
        market.domestic_rate,
        market.foreign_rate,
        market.time_to_maturity,
    );
    let atm = atm_forward_strike(&market)?.value;

    println!("EUR/USD 6M");
    println!("  Spot:     {:.5}", market.spot);
    println!("  Forward:  {forward:.5}");
    println!("  ATM DNS:  {:.5}", atm.0);

    // ---------------------------------------------------------------
    // 2. Delta quotes to strikes
    // ---------------------------------------------------------------

    println!("\n--- Strikes by quoted delta ---\n");
    println!("{:>8} {:>12} {:>12}", "Delta", "Forward", "Spot");
    println!("{}", "-".repeat(34));
    let quotes = [-0.10, -0.25, 0.25, 0.10];
    for &delta in &quotes {
        let fwd = strike_from_quoted_delta(&market, delta, DeltaConvention::Forward)?.value;
        let spot = strike_from_quoted_delta(&market, delta, DeltaConvention::Spot)?.value;
        println!("{delta:>8.2} {:>12.5} {:>12.5}", fwd.0, spot.0);
    }

    let axis = harmonize_delta(&quotes)?;
    println!("\nHarmonized delta axis: {axis:?}");

    // ---------------------------------------------------------------
    // 3. Price each strike and recover the vol
    // ---------------------------------------------------------------

    println!("\n--- Premium and implied vol ---\n");
    println!(
        "{:>8} {:>10} {:>12} {:>12} {:>10}",
        "Delta", "Strike", "Call", "Put", "IV"
    );
    println!("{}", "-".repeat(56));
    for &delta in &quotes {
        let strike = strike_from_quoted_delta(&market, delta, DeltaConvention::Forward)?.value;
        let priced = market.with_strike(strike.0);
        let premium = compute_premium(&priced)?.value;
        let side = if delta < 0.0 { OptionSide::Put } else { OptionSide::Call };
        let vol = implied_volatility(side, premium.get(side), &priced)?.value;
        let vol = vol.value().map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v.0));
        println!(
            "{delta:>8.2} {:>10.5} {:>12.6} {:>12.6} {vol:>10}",
            strike.0, premium.call, premium.put
        );
    }

    // ---------------------------------------------------------------
    // 4. Numerical strike-by-delta vs closed form (spot delta)
    // ---------------------------------------------------------------

    println!("\n--- Solver vs closed form (spot delta) ---\n");
    for (side, delta) in [(OptionSide::Call, 0.25), (OptionSide::Put, -0.25)] {
        let closed = strike_from_quoted_delta(&market, delta, DeltaConvention::Spot)?.value;
        match strike_by_delta(side, delta, &market)?.value.value() {
            Some(solved) => println!(
                "  {side:<4} {delta:>5.2}: solver {:.8}, closed form {:.8}, diff {:.2e}",
                solved.0,
                closed.0,
                (solved.0 - closed.0).abs()
            ),
            None => println!("  {side:<4} {delta:>5.2}: no solution"),
        }
    }

    Ok(())
}
