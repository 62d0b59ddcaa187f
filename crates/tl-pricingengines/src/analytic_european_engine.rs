//! Analytic European option engine (Black-Scholes).
//!
//! Closed-form reference for the lattice. A discrete cash dividend is
//! handled with the escrowed-dividend model: the spot is reduced by the
//! present value of the dividend and the formula is applied unchanged.

use tl_core::{ensure, errors::Result, Error, Price, Rate, Real, Time, Volatility};
use tl_instruments::{
    MarketConditions, OptionContract, OptionType, PricingEngine, PricingResults,
};
use tl_math::distributions::{normal_cdf, normal_pdf};
use tl_time::{Actual365Fixed, Date, DayCounter};

/// Black-Scholes price and sensitivities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesResults {
    /// Option price.
    pub price: Price,
    /// ∂price/∂spot.
    pub delta: Real,
    /// ∂²price/∂spot².
    pub gamma: Real,
    /// ∂price/∂volatility, per unit of volatility.
    pub vega: Real,
}

/// Black-Scholes price, delta, gamma and vega of a European option on a
/// non-dividend-paying underlying.
///
/// With zero time or zero volatility the result is the discounted
/// intrinsic value of the forward.
pub fn black_scholes(
    kind: OptionType,
    spot: Price,
    strike: Price,
    rate: Rate,
    volatility: Volatility,
    t: Time,
) -> BlackScholesResults {
    let phi = kind.sign();
    let df = (-rate * t).exp();
    let std_dev = volatility * t.sqrt();

    if t <= 0.0 || std_dev <= 1e-15 {
        let intrinsic = (phi * (spot - strike * df)).max(0.0);
        let delta = if intrinsic > 0.0 { phi } else { 0.0 };
        return BlackScholesResults {
            price: intrinsic,
            delta,
            gamma: 0.0,
            vega: 0.0,
        };
    }

    let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * t) / std_dev;
    let d2 = d1 - std_dev;
    let npd1 = normal_pdf(d1);

    BlackScholesResults {
        price: phi * (spot * normal_cdf(phi * d1) - strike * df * normal_cdf(phi * d2)),
        delta: phi * normal_cdf(phi * d1),
        gamma: npd1 / (spot * std_dev),
        vega: spot * npd1 * t.sqrt(),
    }
}

/// Analytic pricing engine for European vanilla options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticEuropeanEngine {
    market: MarketConditions,
    pricing_date: Date,
}

impl AnalyticEuropeanEngine {
    /// Create an engine for the given market and pricing date.
    pub fn new(market: MarketConditions, pricing_date: Date) -> Self {
        Self {
            market,
            pricing_date,
        }
    }

    /// Black-Scholes results for `contract`, escrowing a dividend that goes
    /// ex in `(pricing_date, maturity]`.
    pub fn results(&self, contract: &OptionContract) -> Result<BlackScholesResults> {
        if contract.exercise_style.allows_early_exercise() {
            return Err(Error::InvalidArgument(format!(
                "closed-form engine cannot value {contract}"
            )));
        }
        contract.validate()?;
        self.market.validate()?;
        let maturity = contract.maturity_date;
        ensure!(
            self.pricing_date < maturity,
            "pricing date {} must be before maturity {maturity}",
            self.pricing_date
        );

        let dc = Actual365Fixed;
        let t = dc.year_fraction(self.pricing_date, maturity);
        let rate = self.market.interest_rate;
        let mut spot = self.market.spot_price;
        if self.market.pays_dividend_between(self.pricing_date, maturity) {
            let t_ex = dc.year_fraction(self.pricing_date, self.market.dividend_ex_date);
            spot -= self.market.dividend_amount * (-rate * t_ex).exp();
            ensure!(
                spot > 0.0,
                "dividend {} exceeds the spot {}",
                self.market.dividend_amount,
                self.market.spot_price
            );
        }

        Ok(black_scholes(
            contract.kind,
            spot,
            contract.strike_price,
            rate,
            self.market.volatility,
            t,
        ))
    }
}

impl PricingEngine<OptionContract> for AnalyticEuropeanEngine {
    fn calculate(&self, contract: &OptionContract) -> Result<PricingResults> {
        let r = self.results(contract)?;
        Ok(PricingResults::from_npv(r.price)
            .with_result("delta", r.delta)
            .with_result("gamma", r.gamma)
            .with_result("vega", r.vega))
    }
}
