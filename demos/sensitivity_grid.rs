//! Evaluate premium and Greeks over a spot × maturity grid.
//!
//! Shows how to:
//!   - Build a grid from a base parameter set
//!   - Read premium and Greek surfaces as matrices
//!   - Handle the expiry column, which carries no Greeks
//!
//! Run with: `cargo run --example sensitivity_grid`
//! (add `--features parallel` to evaluate cells on the rayon pool)

use fxvanilla::{GreekKind, OptionParameters, OptionSide, evaluate_grid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base = OptionParameters::new(100.0, 100.0, 0.03, 1.0, 0.2, 0.01);
    let spots: Vec<f64> = (0..9).map(|i| 80.0 + 5.0 * i as f64).collect();
    let ttms = [0.0, 0.1, 0.25, 0.5, 1.0];

    let grid = evaluate_grid(&base, &spots, &ttms)?;
    for d in grid.diagnostics() {
        println!("warning: {d}");
    }

    let print_surface = |title: &str, m: &nalgebra::DMatrix<f64>| {
        println!("\n{title}\n");
        print!("{:>8}", "S \\ T");
        for t in &ttms {
            print!("{t:>10.2}");
        }
        println!();
        println!("{}", "-".repeat(8 + 10 * ttms.len()));
        for (i, s) in spots.iter().enumerate() {
            print!("{s:>8.1}");
            for j in 0..ttms.len() {
                let v = m[(i, j)];
                if v.is_nan() {
                    print!("{:>10}", "-");
                } else {
                    print!("{v:>10.4}");
                }
            }
            println!();
        }
    };

    print_surface("Call premium", &grid.premium_surface(OptionSide::Call));
    print_surface("Put premium", &grid.premium_surface(OptionSide::Put));
    for kind in [GreekKind::Delta, GreekKind::Gamma, GreekKind::Vega] {
        let title = format!("Call {}", kind.name());
        print_surface(&title, &grid.greek_surface(kind, OptionSide::Call));
    }
    print_surface("Call theta", &grid.greek_surface(GreekKind::Theta, OptionSide::Call));

    Ok(())
}
