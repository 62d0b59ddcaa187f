//! Prices the reference contract on lattices of increasing size and compares
//! with the closed form.
//!
//! ```text
//! RUST_LOG=debug cargo run --example compare_black_scholes
//! ```

use trilattice::core::Result;
use trilattice::instruments::{
    MarketConditions, OptionContract, OptionType, PricingEngine,
};
use trilattice::pricingengines::{AnalyticEuropeanEngine, FiniteDifferenceGreeks, TrinomialEngine};
use trilattice::time::ymd;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pricing_date = ymd(2023, 9, 20)?;
    let maturity = ymd(2024, 9, 19)?;
    let market = MarketConditions::new(0.04, 0.25, 100.0, 3.0, ymd(2024, 3, 20)?);
    let no_dividend = MarketConditions::without_dividend(0.04, 0.25, 100.0);

    let call = OptionContract::european(OptionType::Call, 102.0, maturity);
    let reference = AnalyticEuropeanEngine::new(no_dividend, pricing_date).calculate(&call)?;
    info!("closed form: {:.6}", reference.npv);

    println!("{:>6} {:>12} {:>12} {:>12}", "steps", "lattice", "error", "nodes");
    for steps in [10, 50, 100, 500, 1000] {
        let results = TrinomialEngine::new(no_dividend, pricing_date, steps).calculate(&call)?;
        println!(
            "{steps:>6} {:>12.6} {:>12.2e} {:>12}",
            results.npv,
            results.npv - reference.npv,
            results.result("nodes").unwrap_or_default()
        );
    }

    println!();
    for contract in [
        call,
        OptionContract::american(OptionType::Call, 102.0, maturity),
        OptionContract::european(OptionType::Put, 102.0, maturity),
        OptionContract::american(OptionType::Put, 102.0, maturity),
    ] {
        let npv = TrinomialEngine::new(market, pricing_date, 500).npv(&contract)?;
        let greeks = FiniteDifferenceGreeks::new(200).all(&market, &contract, pricing_date)?;
        println!(
            "{:<45} npv {npv:>9.4}  delta {:>7.4}  gamma {:>7.4}  vega {:>8.4}",
            contract.to_string(),
            greeks.delta,
            greeks.gamma,
            greeks.vega
        );
    }
    Ok(())
}
