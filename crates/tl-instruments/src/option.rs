//! Vanilla option contract.

use crate::exercise::ExerciseType;
use crate::payoff::{OptionType, PlainVanillaPayoff};
use std::fmt;
use tl_core::{ensure, errors::Result, Real};
use tl_time::Date;

/// A vanilla call or put on a single underlying.
///
/// The contract is an immutable value record; engines read it and never
/// modify it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionContract {
    /// Call or put.
    pub kind: OptionType,
    /// European or American.
    pub exercise_style: ExerciseType,
    /// Strike price.
    pub strike_price: Real,
    /// Last exercise date.
    pub maturity_date: Date,
}

impl OptionContract {
    /// Create a new contract.
    pub fn new(
        kind: OptionType,
        exercise_style: ExerciseType,
        strike_price: Real,
        maturity_date: Date,
    ) -> Self {
        Self {
            kind,
            exercise_style,
            strike_price,
            maturity_date,
        }
    }

    /// Convenience: a European call/put.
    pub fn european(kind: OptionType, strike_price: Real, maturity_date: Date) -> Self {
        Self::new(kind, ExerciseType::European, strike_price, maturity_date)
    }

    /// Convenience: an American call/put.
    pub fn american(kind: OptionType, strike_price: Real, maturity_date: Date) -> Self {
        Self::new(kind, ExerciseType::American, strike_price, maturity_date)
    }

    /// The same contract with a different exercise style.
    pub fn with_exercise(self, exercise_style: ExerciseType) -> Self {
        Self {
            exercise_style,
            ..self
        }
    }

    /// The payoff function of this contract.
    pub fn payoff(&self) -> PlainVanillaPayoff {
        PlainVanillaPayoff::new(self.kind, self.strike_price)
    }

    /// Intrinsic value at the given underlying price.
    #[inline]
    pub fn payoff_value(&self, spot: Real) -> Real {
        self.payoff().value(spot)
    }

    /// Check the strike is a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.strike_price.is_finite() && self.strike_price >= 0.0,
            "strike must be finite and non-negative, got {}",
            self.strike_price
        );
        Ok(())
    }
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} K={} expiring {}",
            self.exercise_style, self.kind, self.strike_price, self.maturity_date
        )
    }
}
