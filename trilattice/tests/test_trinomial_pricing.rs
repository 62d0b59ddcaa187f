//! End-to-end pricing tests: convergence to the closed form, exercise-style
//! ordering, parity, degenerate volatility and the single-period case.

use approx::assert_relative_eq;
use proptest::prelude::*;
use trilattice::core::{Error, Real};
use trilattice::instruments::{MarketConditions, OptionContract, OptionType};
use trilattice::pricingengines::{black_scholes, price, TrinomialEngine};
use trilattice::time::{ymd, Date};

fn pricing_date() -> Date {
    ymd(2023, 9, 20).unwrap()
}

fn maturity() -> Date {
    ymd(2024, 9, 19).unwrap()
}

fn market() -> MarketConditions {
    MarketConditions::without_dividend(0.04, 0.25, 100.0)
}

fn relative_gap(value: Real, reference: Real) -> Real {
    ((value - reference) / reference).abs()
}

#[test]
fn european_call_converges_to_black_scholes() {
    let call = OptionContract::european(OptionType::Call, 102.0, maturity());
    let reference = black_scholes(OptionType::Call, 100.0, 102.0, 0.04, 0.25, 1.0).price;

    let coarse = price(&market(), &call, pricing_date(), 100).unwrap();
    assert!(
        relative_gap(coarse, reference) < 0.01,
        "n=100: {coarse} vs {reference}"
    );

    let fine = price(&market(), &call, pricing_date(), 1000).unwrap();
    assert!(
        relative_gap(fine, reference) < 0.001,
        "n=1000: {fine} vs {reference}"
    );
}

#[test]
fn european_put_converges_to_black_scholes() {
    let put = OptionContract::european(OptionType::Put, 102.0, maturity());
    let reference = black_scholes(OptionType::Put, 100.0, 102.0, 0.04, 0.25, 1.0).price;
    let value = price(&market(), &put, pricing_date(), 400).unwrap();
    assert!(relative_gap(value, reference) < 0.005, "{value} vs {reference}");
}

#[test]
fn american_is_worth_at_least_european() {
    for kind in [OptionType::Call, OptionType::Put] {
        for strike in [80.0, 102.0, 130.0] {
            let eu = OptionContract::european(kind, strike, maturity());
            let am = OptionContract::american(kind, strike, maturity());
            let eu_value = price(&market(), &eu, pricing_date(), 150).unwrap();
            let am_value = price(&market(), &am, pricing_date(), 150).unwrap();
            assert!(am_value >= eu_value - 1e-12, "{kind} K={strike}");
        }
    }
}

#[test]
fn american_put_carries_early_exercise_premium() {
    let eu = OptionContract::european(OptionType::Put, 102.0, maturity());
    let am = OptionContract::american(OptionType::Put, 102.0, maturity());
    let eu_value = price(&market(), &eu, pricing_date(), 300).unwrap();
    let am_value = price(&market(), &am, pricing_date(), 300).unwrap();
    assert!(am_value > eu_value + 0.05, "american {am_value}, european {eu_value}");
}

#[test]
fn american_call_without_dividend_is_european() {
    let eu = OptionContract::european(OptionType::Call, 102.0, maturity());
    let am = OptionContract::american(OptionType::Call, 102.0, maturity());
    let eu_value = price(&market(), &eu, pricing_date(), 200).unwrap();
    let am_value = price(&market(), &am, pricing_date(), 200).unwrap();
    assert_relative_eq!(am_value, eu_value, max_relative = 1e-12);
}

#[test]
fn zero_volatility_prices_the_deterministic_forward() {
    let flat = market().with_volatility(0.0);
    let call = OptionContract::european(OptionType::Call, 102.0, maturity());
    let put = OptionContract::european(OptionType::Put, 102.0, maturity());
    let forward = 100.0 * 0.04f64.exp();
    let discount = (-0.04f64).exp();
    assert_relative_eq!(
        price(&flat, &call, pricing_date(), 50).unwrap(),
        (forward - 102.0) * discount,
        max_relative = 1e-12
    );
    assert_eq!(price(&flat, &put, pricing_date(), 50).unwrap(), 0.0);
}

/// Solve the single-period moment equations by Cramer's rule.
fn single_period_probabilities(d: Real, m: Real, u: Real, mean: Real, second: Real) -> [Real; 3] {
    let det3 = |a: [[Real; 3]; 3]| {
        a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
            - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
            + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
    };
    let system = [[1.0, 1.0, 1.0], [d, m, u], [d * d, m * m, u * u]];
    let rhs = [1.0, mean, second];
    let det = det3(system);
    let mut solution = [0.0; 3];
    for (col, p) in solution.iter_mut().enumerate() {
        let mut replaced = system;
        for row in 0..3 {
            replaced[row][col] = rhs[row];
        }
        *p = det3(replaced) / det;
    }
    solution
}

#[test]
fn single_step_matches_hand_valuation() {
    let (s, k, r, vol) = (100.0, 100.0, 0.05, 0.2);
    let market = MarketConditions::without_dividend(r, vol, s);
    let start = ymd(2023, 1, 1).unwrap();
    let call = OptionContract::european(OptionType::Call, k, ymd(2024, 1, 1).unwrap());

    let alpha = (vol * 3.0f64.sqrt()).exp();
    let forward = s * r.exp();
    let variance = s * s * (2.0 * r).exp() * ((vol * vol).exp() - 1.0);
    let (d, m, u) = (forward / alpha, forward, forward * alpha);
    let [pd, pm, pu] = single_period_probabilities(d, m, u, forward, variance + forward * forward);
    let payoff = |x: Real| (x - k).max(0.0);
    let expected = (-r).exp() * (pd * payoff(d) + pm * payoff(m) + pu * payoff(u));

    let value = price(&market, &call, start, 1).unwrap();
    assert_relative_eq!(value, expected, max_relative = 1e-9);
    assert_relative_eq!(value, 9.69, epsilon = 0.01);
}

#[test]
fn pricing_inputs_are_validated() {
    let call = OptionContract::european(OptionType::Call, 102.0, maturity());
    assert!(matches!(
        price(&market(), &call, maturity(), 10),
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        price(&market(), &call, ymd(2025, 1, 1).unwrap(), 10),
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        price(&market(), &call, pricing_date(), 0),
        Err(Error::Precondition(_))
    ));
    assert!(price(&market().with_volatility(-0.2), &call, pricing_date(), 10).is_err());
    let mut negative_dividend = market();
    negative_dividend.dividend_amount = -1.0;
    negative_dividend.dividend_ex_date = ymd(2024, 3, 1).unwrap();
    assert!(price(&negative_dividend, &call, pricing_date(), 10).is_err());
}

#[test]
fn excessive_volatility_for_the_step_is_reported_not_clamped() {
    let call = OptionContract::european(OptionType::Call, 102.0, maturity());
    let wild = market().with_volatility(2.0);
    let err = price(&wild, &call, pricing_date(), 1).unwrap_err();
    assert!(
        matches!(
            err,
            Error::InvalidProbability {
                generation: 0,
                level: 0,
                branch: "down",
                value,
            } if value > 1.0
        ),
        "{err}"
    );
    // finer steps bring the same market back into range
    assert!(price(&wild, &call, pricing_date(), 50).is_ok());
}

#[test]
fn a_lattice_is_rolled_back_once() {
    let put = OptionContract::american(OptionType::Put, 102.0, maturity());
    let engine = TrinomialEngine::new(market(), pricing_date(), 25);
    let mut lattice = engine.build_lattice(&put).unwrap();
    let first = lattice.roll_back(&put).unwrap();
    assert_relative_eq!(first, engine.npv(&put).unwrap(), max_relative = 1e-14);
    assert!(matches!(lattice.roll_back(&put), Err(Error::Precondition(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn put_call_parity_holds_on_the_lattice(
        spot in 50.0f64..150.0,
        strike in 60.0f64..140.0,
        rate in -0.01f64..0.08,
        vol in 0.05f64..0.6,
        steps in 1usize..80,
    ) {
        let market = MarketConditions::without_dividend(rate, vol, spot);
        let call = OptionContract::european(OptionType::Call, strike, maturity());
        let put = OptionContract::european(OptionType::Put, strike, maturity());
        let c = price(&market, &call, pricing_date(), steps).unwrap();
        let p = price(&market, &put, pricing_date(), steps).unwrap();
        let parity = spot - strike * (-rate).exp();
        prop_assert!((c - p - parity).abs() < 1e-9 * spot.max(strike), "{} vs {}", c - p, parity);
    }
}
