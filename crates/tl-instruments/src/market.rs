//! Market inputs for a single pricing call.

use tl_core::{ensure, errors::Result, Price, Rate, Real, Volatility};
use tl_time::Date;

/// Flat market snapshot: continuously-compounded rate, lognormal
/// volatility, spot, and one discrete cash dividend.
///
/// A zero `dividend_amount` means no dividend; the ex-date is then ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketConditions {
    /// Risk-free rate (continuous compounding).
    pub interest_rate: Rate,
    /// Annualised volatility of the underlying.
    pub volatility: Volatility,
    /// Current price of the underlying.
    pub spot_price: Price,
    /// Cash amount of the discrete dividend.
    pub dividend_amount: Real,
    /// Ex-dividend date.
    pub dividend_ex_date: Date,
}

impl MarketConditions {
    /// Create a new market snapshot.
    pub fn new(
        interest_rate: Rate,
        volatility: Volatility,
        spot_price: Price,
        dividend_amount: Real,
        dividend_ex_date: Date,
    ) -> Self {
        Self {
            interest_rate,
            volatility,
            spot_price,
            dividend_amount,
            dividend_ex_date,
        }
    }

    /// A market without dividends.
    pub fn without_dividend(
        interest_rate: Rate,
        volatility: Volatility,
        spot_price: Price,
    ) -> Self {
        Self::new(interest_rate, volatility, spot_price, 0.0, Date::MIN)
    }

    /// The same market with a different spot.
    pub fn with_spot(self, spot_price: Price) -> Self {
        Self { spot_price, ..self }
    }

    /// The same market with a different volatility.
    pub fn with_volatility(self, volatility: Volatility) -> Self {
        Self { volatility, ..self }
    }

    /// Whether a dividend goes ex strictly after `from` and on or before `to`.
    pub fn pays_dividend_between(&self, from: Date, to: Date) -> bool {
        self.dividend_amount > 0.0 && from < self.dividend_ex_date && self.dividend_ex_date <= to
    }

    /// Reject non-finite inputs, a non-positive spot, a negative volatility
    /// or a negative dividend.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.interest_rate.is_finite(),
            "interest rate must be finite, got {}",
            self.interest_rate
        );
        ensure!(
            self.volatility.is_finite() && self.volatility >= 0.0,
            "volatility must be finite and non-negative, got {}",
            self.volatility
        );
        ensure!(
            self.spot_price.is_finite() && self.spot_price > 0.0,
            "spot price must be finite and positive, got {}",
            self.spot_price
        );
        ensure!(
            self.dividend_amount.is_finite() && self.dividend_amount >= 0.0,
            "dividend amount must be finite and non-negative, got {}",
            self.dividend_amount
        );
        Ok(())
    }
}
