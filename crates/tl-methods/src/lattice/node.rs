//! Lattice nodes.
//!
//! Every field of a node except its option value is fixed when the node is
//! constructed. The option value is written once during backward induction.

use super::probability::{self, BranchProbabilities};
use super::LatticeParameters;
use std::fmt;
use tl_core::{
    errors::Result, Error, MomentCheck, Price, Probability, Real, Time,
};
use tl_math::relative_error;
use tl_time::Date;

// ── Node identity ─────────────────────────────────────────────────────────────

/// Position of a node in the lattice arena.
///
/// Generation `k` holds `2k + 1` nodes; `index` runs from the lowest price
/// (`0`) to the highest (`2k`), the trunk sitting at `index == k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    generation: u32,
    index: u32,
}

impl NodeId {
    /// Node `index` of `generation`.
    pub fn new(generation: usize, index: usize) -> Self {
        debug_assert!(index <= 2 * generation, "index {index} outside generation {generation}");
        Self {
            generation: generation as u32,
            index: index as u32,
        }
    }

    /// Node of `generation` at signed `level` (`0` is the trunk).
    pub fn at_level(generation: usize, level: i64) -> Self {
        Self::new(generation, (level + generation as i64) as usize)
    }

    /// The root node.
    pub const ROOT: NodeId = NodeId {
        generation: 0,
        index: 0,
    };

    /// Time-step index.
    pub fn generation(self) -> usize {
        self.generation as usize
    }

    /// Position within the generation, lowest price first.
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Signed distance from the trunk, in grid spacings.
    pub fn level(self) -> i64 {
        self.index as i64 - self.generation as i64
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:+})", self.generation, self.level())
    }
}

// ── Next-generation price grid ────────────────────────────────────────────────

/// Prices of the generation below: `base · alpha^level` for
/// `level ∈ [−half_width, half_width]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PriceGrid {
    pub(crate) base: Price,
    pub(crate) alpha: Real,
    pub(crate) half_width: i64,
}

impl PriceGrid {
    pub(crate) fn spot(&self, level: i64) -> Price {
        self.base * self.alpha.powi(level as i32)
    }

    /// Level whose price is nearest to `price` in log terms, restricted to
    /// levels that still have a neighbour on either side.
    pub(crate) fn nearest_level(&self, price: Price) -> i64 {
        let level = ((price / self.base).ln() / self.alpha.ln()).round() as i64;
        level.clamp(-(self.half_width - 1), self.half_width - 1)
    }

    /// Range of prices a mid child may take.
    pub(crate) fn band(&self) -> (Price, Price) {
        (
            self.spot(-(self.half_width - 1)),
            self.spot(self.half_width - 1),
        )
    }
}

/// Everything a node needs from its generation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepContext<'a> {
    pub(crate) params: &'a LatticeParameters,
    pub(crate) generation: usize,
    pub(crate) time: Time,
    pub(crate) date: Date,
    /// Cash dividend going ex over the step that follows this generation.
    pub(crate) dividend: Option<Real>,
    /// Grid of the following generation; `None` for the leaves.
    pub(crate) next: Option<PriceGrid>,
}

// ── Branching ─────────────────────────────────────────────────────────────────

/// Children, their prices, and the transition probabilities of an interior
/// node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branching {
    /// Child nodes, `[down, mid, up]`.
    pub children: [NodeId; 3],
    /// Child prices, `[down, mid, up]`.
    pub prices: [Price; 3],
    /// Transition probabilities.
    pub probabilities: BranchProbabilities,
}

impl Branching {
    /// Probability-weighted sum of `f(child)`.
    #[inline]
    pub fn expectation<F>(&self, mut f: F) -> Real
    where
        F: FnMut(NodeId) -> Real,
    {
        let [down, mid, up] = self.children;
        let p = &self.probabilities;
        p.down * f(down) + p.mid * f(mid) + p.up * f(up)
    }

    /// First and second raw moments of the child prices.
    pub fn moments(&self) -> (Real, Real) {
        let [d, m, u] = self.prices;
        let p = &self.probabilities;
        (
            p.down * d + p.mid * m + p.up * u,
            p.down * d * d + p.mid * m * m + p.up * u * u,
        )
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// A lattice node: a possible underlying price at one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeNode {
    id: NodeId,
    spot_price: Price,
    time: Time,
    date: Date,
    expectation: Price,
    forward_price: Price,
    variance: Real,
    sibling_down: Option<NodeId>,
    sibling_up: Option<NodeId>,
    branching: Option<Branching>,
    value: Option<Real>,
}

impl LatticeNode {
    /// Build the node at `id` with the given spot.
    ///
    /// In a dividend step the forward is net of the dividend, confined to the
    /// price range the next generation can represent, and the mid child is
    /// the grid node nearest to it. Otherwise the children sit at
    /// `forward · alpha^{−1, 0, 1}`.
    pub(crate) fn new(id: NodeId, spot_price: Price, ctx: &StepContext<'_>) -> Result<Self> {
        let params = ctx.params;
        let (rate, volatility, dt, alpha) = (
            params.market.interest_rate,
            params.market.volatility,
            params.delta_t,
            params.alpha,
        );
        let expectation = probability::forward_price(spot_price, rate, dt);

        let (forward_price, variance, branching) = match (ctx.next, ctx.dividend) {
            (None, _) => (
                expectation,
                probability::variance(spot_price, rate, volatility, dt),
                None,
            ),
            (Some(grid), Some(dividend)) => {
                let (low, high) = grid.band();
                let forward = (expectation - dividend).clamp(low, high);
                let variance = probability::variance(
                    forward * params.discount_factor,
                    rate,
                    volatility,
                    dt,
                );
                let level = grid.nearest_level(forward);
                let prices = [grid.spot(level - 1), grid.spot(level), grid.spot(level + 1)];
                let probabilities = BranchProbabilities::solve(prices[1], forward, variance, alpha)
                    .checked(ctx.generation, id.level())?;
                let next = ctx.generation + 1;
                let branching = Branching {
                    children: [
                        NodeId::at_level(next, level - 1),
                        NodeId::at_level(next, level),
                        NodeId::at_level(next, level + 1),
                    ],
                    prices,
                    probabilities,
                };
                (forward, variance, Some(branching))
            }
            (Some(_), None) => {
                let variance = probability::variance(spot_price, rate, volatility, dt);
                let probabilities =
                    BranchProbabilities::solve(expectation, expectation, variance, alpha)
                        .checked(ctx.generation, id.level())?;
                let next = ctx.generation + 1;
                let level = id.level();
                let branching = Branching {
                    children: [
                        NodeId::at_level(next, level - 1),
                        NodeId::at_level(next, level),
                        NodeId::at_level(next, level + 1),
                    ],
                    prices: [expectation / alpha, expectation, expectation * alpha],
                    probabilities,
                };
                (expectation, variance, Some(branching))
            }
        };

        let width = 2 * ctx.generation + 1;
        Ok(Self {
            id,
            spot_price,
            time: ctx.time,
            date: ctx.date,
            expectation,
            forward_price,
            variance,
            sibling_down: (id.index() > 0).then(|| NodeId::new(ctx.generation, id.index() - 1)),
            sibling_up: (id.index() + 1 < width)
                .then(|| NodeId::new(ctx.generation, id.index() + 1)),
            branching,
            value: None,
        })
    }

    /// Position in the arena.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Underlying price at this node.
    pub fn spot_price(&self) -> Price {
        self.spot_price
    }

    /// Years since the pricing date.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Calendar date of the time step.
    pub fn date(&self) -> Date {
        self.date
    }

    /// `spot · exp(r·dt)`, before any dividend.
    pub fn expectation(&self) -> Price {
        self.expectation
    }

    /// Expected next-step price the branching matches (net of a dividend
    /// in the dividend step).
    pub fn forward_price(&self) -> Price {
        self.forward_price
    }

    /// Dividend taken out of the forward over the following step.
    pub fn dividend(&self) -> Real {
        self.expectation - self.forward_price
    }

    /// Variance of the next-step price.
    pub fn variance(&self) -> Real {
        self.variance
    }

    /// Branching data; `None` for leaves.
    pub fn branching(&self) -> Option<&Branching> {
        self.branching.as_ref()
    }

    /// Whether the node is at maturity.
    pub fn is_leaf(&self) -> bool {
        self.branching.is_none()
    }

    /// Price of the up child.
    pub fn up_price(&self) -> Option<Price> {
        self.branching.map(|b| b.prices[2])
    }

    /// Price of the mid child.
    pub fn mid_price(&self) -> Option<Price> {
        self.branching.map(|b| b.prices[1])
    }

    /// Price of the down child.
    pub fn down_price(&self) -> Option<Price> {
        self.branching.map(|b| b.prices[0])
    }

    /// Probability of the up branch.
    pub fn p_up(&self) -> Option<Probability> {
        self.branching.map(|b| b.probabilities.up)
    }

    /// Probability of the mid branch.
    pub fn p_mid(&self) -> Option<Probability> {
        self.branching.map(|b| b.probabilities.mid)
    }

    /// Probability of the down branch.
    pub fn p_down(&self) -> Option<Probability> {
        self.branching.map(|b| b.probabilities.down)
    }

    /// Up child.
    pub fn child_up(&self) -> Option<NodeId> {
        self.branching.map(|b| b.children[2])
    }

    /// Mid child.
    pub fn child_mid(&self) -> Option<NodeId> {
        self.branching.map(|b| b.children[1])
    }

    /// Down child.
    pub fn child_down(&self) -> Option<NodeId> {
        self.branching.map(|b| b.children[0])
    }

    /// Next node up in the same generation.
    pub fn sibling_up(&self) -> Option<NodeId> {
        self.sibling_up
    }

    /// Next node down in the same generation.
    pub fn sibling_down(&self) -> Option<NodeId> {
        self.sibling_down
    }

    /// Option value, once backward induction has reached this node.
    pub fn value(&self) -> Option<Real> {
        self.value
    }

    pub(crate) fn set_value(&mut self, value: Real) {
        debug_assert!(self.value.is_none(), "node {} valued twice", self.id);
        self.value = Some(value);
    }

    /// Check that the branching reproduces the node's moments.
    ///
    /// Probabilities must sum to one within `probability_tolerance`; the
    /// mean must match `forward_price` and the second moment
    /// `variance + forward_price²`, both within `moment_tolerance`
    /// (relative). Leaves pass trivially.
    pub fn check_moments(&self, probability_tolerance: Real, moment_tolerance: Real) -> Result<()> {
        let Some(branching) = &self.branching else {
            return Ok(());
        };
        let violation = |check, deviation| Error::InvariantViolation {
            generation: self.id.generation(),
            date: self.date,
            check,
            deviation,
        };

        let sum_deviation = (branching.probabilities.sum() - 1.0).abs();
        if sum_deviation > probability_tolerance {
            return Err(violation(MomentCheck::ProbabilitySum, sum_deviation));
        }

        let (first, second) = branching.moments();
        let mean_deviation = relative_error(first, self.forward_price);
        if mean_deviation > moment_tolerance {
            return Err(violation(MomentCheck::Mean, mean_deviation));
        }

        let target = self.variance + self.forward_price * self.forward_price;
        let second_deviation = relative_error(second, target);
        if second_deviation > moment_tolerance {
            return Err(violation(MomentCheck::SecondMoment, second_deviation));
        }
        Ok(())
    }
}

impl fmt::Display for LatticeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node{} {}: spot {:.4}, forward {:.4}, variance {:.6}",
            self.id, self.date, self.spot_price, self.forward_price, self.variance
        )?;
        if let Some(b) = &self.branching {
            let [d, m, u] = b.prices;
            let p = &b.probabilities;
            write!(
                f,
                ", down {d:.4} ({:.6}), mid {m:.4} ({:.6}), up {u:.4} ({:.6})",
                p.down, p.mid, p.up
            )?;
        }
        match self.value {
            Some(v) => write!(f, ", value {v:.6}"),
            None => write!(f, ", not valued"),
        }
    }
}
