//! Bump-and-reprice sensitivities on the trinomial lattice.
//!
//! Every sensitivity reprices the contract on fresh lattices built from
//! bumped copies of the market; the input market is never modified.

use crate::trinomial_engine::price;
use tl_core::{ensure, errors::Result, Error, Real, Size};
use tl_instruments::{MarketConditions, OptionContract};
use tl_time::Date;

/// Default relative bump.
pub const DEFAULT_BUMP: Real = 0.01;

/// Delta, gamma and vega of one contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Greeks {
    /// ∂price/∂spot.
    pub delta: Real,
    /// ∂²price/∂spot².
    pub gamma: Real,
    /// ∂price/∂volatility, per unit of volatility.
    pub vega: Real,
}

/// Central finite differences with relative bumps `spot·(1 ± h)` and
/// `volatility·(1 ± h)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifferenceGreeks {
    /// Lattice steps used for each repricing.
    pub steps: Size,
    /// Relative bump `h`.
    pub bump: Real,
}

impl FiniteDifferenceGreeks {
    /// Greeks on an `steps`-step lattice with the default 1% bump.
    pub fn new(steps: Size) -> Self {
        Self {
            steps,
            bump: DEFAULT_BUMP,
        }
    }

    /// Use a different relative bump.
    pub fn with_bump(mut self, bump: Real) -> Self {
        self.bump = bump;
        self
    }

    fn check_bump(&self) -> Result<()> {
        ensure!(
            self.bump > 0.0 && self.bump < 1.0,
            "relative bump must lie in (0, 1), got {}",
            self.bump
        );
        Ok(())
    }

    fn reprice(
        &self,
        market: MarketConditions,
        contract: &OptionContract,
        pricing_date: Date,
    ) -> Result<Real> {
        price(&market, contract, pricing_date, self.steps)
    }

    /// `(P(S·(1+h)) − P(S·(1−h))) / (2·S·h)`.
    pub fn delta(
        &self,
        market: &MarketConditions,
        contract: &OptionContract,
        pricing_date: Date,
    ) -> Result<Real> {
        self.check_bump()?;
        let (s, h) = (market.spot_price, self.bump);
        let up = self.reprice(market.with_spot(s * (1.0 + h)), contract, pricing_date)?;
        let down = self.reprice(market.with_spot(s * (1.0 - h)), contract, pricing_date)?;
        Ok((up - down) / (2.0 * s * h))
    }

    /// `(P(S·(1+h)) − 2·P(S) + P(S·(1−h))) / (S·h)²`.
    pub fn gamma(
        &self,
        market: &MarketConditions,
        contract: &OptionContract,
        pricing_date: Date,
    ) -> Result<Real> {
        self.check_bump()?;
        let (s, h) = (market.spot_price, self.bump);
        let up = self.reprice(market.with_spot(s * (1.0 + h)), contract, pricing_date)?;
        let mid = self.reprice(*market, contract, pricing_date)?;
        let down = self.reprice(market.with_spot(s * (1.0 - h)), contract, pricing_date)?;
        Ok((up - 2.0 * mid + down) / (s * h).powi(2))
    }

    /// `(P(σ·(1+h)) − P(σ·(1−h))) / (2·σ·h)`.
    ///
    /// Undefined at zero volatility, where a relative bump does not move
    /// the input.
    pub fn vega(
        &self,
        market: &MarketConditions,
        contract: &OptionContract,
        pricing_date: Date,
    ) -> Result<Real> {
        self.check_bump()?;
        let (vol, h) = (market.volatility, self.bump);
        if vol <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "vega needs a positive volatility, got {vol}"
            )));
        }
        let up = self.reprice(market.with_volatility(vol * (1.0 + h)), contract, pricing_date)?;
        let down =
            self.reprice(market.with_volatility(vol * (1.0 - h)), contract, pricing_date)?;
        Ok((up - down) / (2.0 * vol * h))
    }

    /// Delta, gamma and vega together, sharing the spot-bumped prices.
    pub fn all(
        &self,
        market: &MarketConditions,
        contract: &OptionContract,
        pricing_date: Date,
    ) -> Result<Greeks> {
        self.check_bump()?;
        let (s, h) = (market.spot_price, self.bump);
        let up = self.reprice(market.with_spot(s * (1.0 + h)), contract, pricing_date)?;
        let mid = self.reprice(*market, contract, pricing_date)?;
        let down = self.reprice(market.with_spot(s * (1.0 - h)), contract, pricing_date)?;
        Ok(Greeks {
            delta: (up - down) / (2.0 * s * h),
            gamma: (up - 2.0 * mid + down) / (s * h).powi(2),
            vega: self.vega(market, contract, pricing_date)?,
        })
    }
}
