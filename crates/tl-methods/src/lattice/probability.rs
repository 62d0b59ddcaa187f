//! Node-probability model.
//!
//! Pure functions of the market inputs and the lattice spacing. Each node
//! branches to `mid·alpha`, `mid` and `mid/alpha`; the three probabilities
//! are chosen so that the branch distribution has a prescribed mean and
//! variance:
//!
//! ```text
//! p_d + p_m + p_u                         = 1
//! p_d·mid/α  + p_m·mid  + p_u·mid·α       = mean
//! p_d·mid²/α² + p_m·mid² + p_u·mid²·α²    = variance + mean²
//! ```
//!
//! Without a dividend the mid branch sits on the forward (`mid == mean`)
//! and the up probability reduces to `p_d / α`.

use tl_core::{errors::Result, DiscountFactor, Error, Probability, Rate, Real, Time, Volatility};

/// Spacings with `alpha - 1` at or below this value are treated as
/// degenerate (no diffusion over a step).
pub const MIN_SPACING: Real = 1e-8;

/// Roundoff allowed outside `[0, 1]` before a probability is rejected.
pub const PROBABILITY_SLACK: Real = 1e-12;

/// `spot · exp(rate · dt)`.
#[inline]
pub fn forward_price(spot: Real, rate: Rate, dt: Time) -> Real {
    spot * (rate * dt).exp()
}

/// `exp(−rate · dt)`.
#[inline]
pub fn discount_factor(rate: Rate, dt: Time) -> DiscountFactor {
    (-rate * dt).exp()
}

/// Multiplicative spacing `exp(volatility · sqrt(3·dt))`.
#[inline]
pub fn alpha(volatility: Volatility, dt: Time) -> Real {
    debug_assert!(dt > 0.0, "time step must be positive, got {dt}");
    (volatility * (3.0 * dt).sqrt()).exp()
}

/// Whether the spacing has collapsed to (numerically) one.
#[inline]
pub fn is_degenerate(alpha: Real) -> bool {
    alpha - 1.0 <= MIN_SPACING
}

/// Variance of the next-step price:
/// `spot² · exp(2·rate·dt) · (exp(volatility²·dt) − 1)`.
#[inline]
pub fn variance(spot: Real, rate: Rate, volatility: Volatility, dt: Time) -> Real {
    spot * spot * (2.0 * rate * dt).exp() * (volatility * volatility * dt).exp_m1()
}

/// Down-branch probability matching `mean` and `variance` around `mid`.
///
/// Division is by `(1 − α)·(α⁻² − 1)`, non-zero whenever `α ≠ 1`. The
/// second-moment equation is rearranged so that no `x² − 1`-style
/// cancellation occurs for small spacings.
#[inline]
pub fn down_probability(mid: Real, mean: Real, variance: Real, alpha: Real) -> Probability {
    let offset = (mean - mid) / mid;
    let numerator = variance / (mid * mid) + offset * (offset - (alpha - 1.0));
    numerator / ((1.0 - alpha) * (alpha.powi(-2) - 1.0))
}

/// Up-branch probability when the mid branch sits on the mean.
#[inline]
pub fn up_probability(down: Probability, alpha: Real) -> Probability {
    down / alpha
}

/// Up-branch probability when the mid branch is offset from the mean
/// (a dividend step, where the mid child is the nearest grid node rather
/// than the forward itself).
#[inline]
pub fn shifted_up_probability(down: Probability, mid: Real, mean: Real, alpha: Real) -> Probability {
    let offset = (mean - mid) / mid;
    (offset - (alpha.recip() - 1.0) * down) / (alpha - 1.0)
}

/// `1 − up − down`.
#[inline]
pub fn mid_probability(up: Probability, down: Probability) -> Probability {
    1.0 - up - down
}

/// The three branch probabilities of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchProbabilities {
    /// Probability of moving to the down child.
    pub down: Probability,
    /// Probability of moving to the mid child.
    pub mid: Probability,
    /// Probability of moving to the up child.
    pub up: Probability,
}

impl BranchProbabilities {
    /// Solve the moment-matching system.
    ///
    /// `mid == mean` selects the plain formula; otherwise the shifted
    /// up-probability keeps the mean exact.
    pub fn solve(mid: Real, mean: Real, variance: Real, alpha: Real) -> Self {
        let down = down_probability(mid, mean, variance, alpha);
        let up = if mid == mean {
            up_probability(down, alpha)
        } else {
            shifted_up_probability(down, mid, mean, alpha)
        };
        Self {
            down,
            mid: mid_probability(up, down),
            up,
        }
    }

    /// Reject any probability outside `[0, 1]`.
    ///
    /// `generation` and `level` locate the node in the error report.
    pub fn checked(self, generation: usize, level: i64) -> Result<Self> {
        for (branch, value) in [("down", self.down), ("mid", self.mid), ("up", self.up)] {
            if !(-PROBABILITY_SLACK..=1.0 + PROBABILITY_SLACK).contains(&value) {
                return Err(Error::InvalidProbability {
                    generation,
                    level,
                    branch,
                    value,
                });
            }
        }
        Ok(self)
    }

    /// `down + mid + up`.
    pub fn sum(&self) -> Real {
        self.down + self.mid + self.up
    }
}
