//! Recombining trinomial lattice.
//!
//! Nodes live in an arena indexed by [`NodeId`]: generation `k` is a
//! `Vec` of `2k + 1` nodes ordered by price. Children and siblings are ids
//! into the arena, so shared children are stored once and need no
//! reference counting.
//!
//! Valuation is by backward induction over generations, from the leaves to
//! the root.

mod builder;
mod node;
pub mod probability;

pub use builder::LatticeBuilder;
pub use node::{Branching, LatticeNode, NodeId};
pub use probability::BranchProbabilities;

use node::PriceGrid;
use tl_core::{
    ensure, errors::Result, DiscountFactor, Error, LatticeSettings, Real, Size, Time,
};
use tl_instruments::{MarketConditions, OptionContract};
use tl_time::{Actual365Fixed, Date, DayCounter};
use tracing::trace;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Inputs derived once per lattice: step size, spacing, discounting and
/// the location of the dividend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParameters {
    /// Market snapshot the lattice is built from.
    pub market: MarketConditions,
    /// Date of the root node.
    pub pricing_date: Date,
    /// Date of the leaves.
    pub maturity_date: Date,
    /// Number of time steps.
    pub steps: Size,
    /// Years from pricing date to maturity (Actual/365 Fixed).
    pub time_to_maturity: Time,
    /// Years per step.
    pub delta_t: Time,
    /// Multiplicative spacing between adjacent price levels.
    pub alpha: Real,
    /// One-step discount factor.
    pub discount_factor: DiscountFactor,
    /// Generation whose following step contains the ex-dividend date, if
    /// a dividend goes ex in `(pricing_date, maturity_date]`.
    pub dividend_step: Option<Size>,
}

impl LatticeParameters {
    /// Derive the parameters for an `steps`-step lattice from
    /// `pricing_date` to `maturity_date`.
    ///
    /// The dividend is assigned to generation `k` when its ex-time `t_ex`
    /// satisfies `k·dt < t_ex ≤ (k + 1)·dt`.
    pub fn new(
        market: MarketConditions,
        pricing_date: Date,
        maturity_date: Date,
        steps: Size,
    ) -> Result<Self> {
        ensure!(steps >= 1, "number of steps must be at least 1, got {steps}");
        ensure!(
            pricing_date < maturity_date,
            "pricing date {pricing_date} must be before maturity {maturity_date}"
        );
        market.validate()?;

        let day_counter = Actual365Fixed;
        let time_to_maturity = day_counter.year_fraction(pricing_date, maturity_date);
        let delta_t = time_to_maturity / steps as Real;
        let rate = market.interest_rate;

        let dividend_step = market
            .pays_dividend_between(pricing_date, maturity_date)
            .then(|| {
                let ex_time = day_counter.year_fraction(pricing_date, market.dividend_ex_date);
                // ex-dates on a step boundary belong to the step that ends there
                let window = (ex_time / delta_t - 1e-9).ceil().max(1.0) as Size;
                (window - 1).min(steps - 1)
            });

        Ok(Self {
            market,
            pricing_date,
            maturity_date,
            steps,
            time_to_maturity,
            delta_t,
            alpha: probability::alpha(market.volatility, delta_t),
            discount_factor: probability::discount_factor(rate, delta_t),
            dividend_step,
        })
    }

    /// Whether the volatility is too small to give a usable spacing.
    pub fn is_degenerate(&self) -> bool {
        probability::is_degenerate(self.alpha)
    }

    /// Years from the pricing date to generation `k`.
    pub fn time(&self, generation: Size) -> Time {
        generation as Real * self.delta_t
    }

    /// Calendar date of generation `k`.
    pub fn date(&self, generation: Size) -> Result<Date> {
        Actual365Fixed.date_after(self.pricing_date, self.time(generation))
    }
}

// ── Generations ───────────────────────────────────────────────────────────────

/// All nodes at one time step.
#[derive(Debug, Clone)]
pub struct Generation {
    index: Size,
    time: Time,
    date: Date,
    dividend: Option<Real>,
    confined: Size,
    grid: Option<PriceGrid>,
    nodes: Vec<LatticeNode>,
}

impl Generation {
    /// Time-step index.
    pub fn index(&self) -> Size {
        self.index
    }

    /// Years since the pricing date.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Calendar date.
    pub fn date(&self) -> Date {
        self.date
    }

    /// Dividend going ex over the following step, if any.
    pub fn dividend(&self) -> Option<Real> {
        self.dividend
    }

    /// Nodes whose forward was held inside the next generation's price
    /// range and so pay less than the full dividend. Zero outside the
    /// dividend step.
    pub fn confined_nodes(&self) -> Size {
        self.confined
    }

    /// Number of nodes (`2k + 1`).
    pub fn len(&self) -> Size {
        self.nodes.len()
    }

    /// Always false: every generation holds at least its trunk node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes ordered from the lowest to the highest price.
    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    /// The node on the trunk (level 0).
    pub fn trunk(&self) -> &LatticeNode {
        &self.nodes[self.index]
    }

    /// Node by id, if it belongs to this generation.
    pub fn node(&self, id: NodeId) -> Option<&LatticeNode> {
        if id.generation() != self.index {
            return None;
        }
        self.nodes.get(id.index())
    }
}

// ── Lattice ───────────────────────────────────────────────────────────────────

/// A fully constructed trinomial lattice.
///
/// Built by [`LatticeBuilder`]; node data is immutable afterwards apart
/// from the option values written by [`Lattice::roll_back`].
#[derive(Debug, Clone)]
pub struct Lattice {
    params: LatticeParameters,
    generations: Vec<Generation>,
    nodes_built: Size,
    valued: bool,
}

impl Lattice {
    /// Build a lattice from derived parameters.
    pub fn build(params: LatticeParameters) -> Result<Self> {
        LatticeBuilder::new(params).build()
    }

    /// Parameters the lattice was built from.
    pub fn parameters(&self) -> &LatticeParameters {
        &self.params
    }

    /// Number of time steps.
    pub fn steps(&self) -> Size {
        self.params.steps
    }

    /// Years per step.
    pub fn delta_t(&self) -> Time {
        self.params.delta_t
    }

    /// Spacing between adjacent price levels.
    pub fn alpha(&self) -> Real {
        self.params.alpha
    }

    /// One-step discount factor.
    pub fn discount_factor(&self) -> DiscountFactor {
        self.params.discount_factor
    }

    /// The root node.
    pub fn root(&self) -> &LatticeNode {
        self.generations[0].trunk()
    }

    /// Generation `k`, if `k ≤ steps`.
    pub fn generation(&self, k: Size) -> Option<&Generation> {
        self.generations.get(k)
    }

    /// All generations, root first.
    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&LatticeNode> {
        self.generations.get(id.generation())?.node(id)
    }

    /// Nodes from the root to maturity along mid children.
    pub fn trunk(&self) -> impl Iterator<Item = &LatticeNode> + '_ {
        std::iter::successors(Some(self.root()), move |node| {
            node.child_mid().and_then(|id| self.node(id))
        })
    }

    /// Total number of nodes held, `(steps + 1)²`.
    pub fn node_count(&self) -> Size {
        self.generations.iter().map(Generation::len).sum()
    }

    /// Nodes of the dividend step that pay less than the full dividend.
    pub fn confined_nodes(&self) -> Size {
        self.generations.iter().map(Generation::confined_nodes).sum()
    }

    /// Number of distinct nodes reached by the builder: the root plus every
    /// node some parent links to as a child.
    pub fn nodes_built(&self) -> Size {
        self.nodes_built
    }

    /// Whether backward induction has written the node values.
    pub fn is_valued(&self) -> bool {
        self.valued
    }

    /// Check every interior node's branching against the tolerances in
    /// `settings`.
    pub fn validate(&self, settings: &LatticeSettings) -> Result<()> {
        self.generations
            .iter()
            .flat_map(|g| g.nodes.iter())
            .try_for_each(|node| {
                node.check_moments(settings.probability_tolerance, settings.moment_tolerance)
            })
    }

    /// Value `contract` by backward induction, storing each node's value.
    ///
    /// Node values are written once; rolling back a second time is an
    /// error.
    pub fn roll_back(&mut self, contract: &OptionContract) -> Result<Real> {
        ensure!(
            !self.valued,
            "lattice has already been rolled back; build a new lattice for another contract"
        );
        let discount = self.params.discount_factor;
        let mut next: Vec<Real> = Vec::new();
        for generation in self.generations.iter_mut().rev() {
            let values = value_generation(generation, &next, discount, contract);
            for (node, &value) in generation.nodes.iter_mut().zip(&values) {
                node.set_value(value);
            }
            trace!(generation = generation.index, "rolled back");
            next = values;
        }
        self.valued = true;
        root_value(&next)
    }

    /// Value `contract` by backward induction, releasing each generation
    /// once the one before it has been valued.
    pub fn into_value(mut self, contract: &OptionContract) -> Result<Real> {
        let discount = self.params.discount_factor;
        let mut next: Vec<Real> = Vec::new();
        while let Some(generation) = self.generations.pop() {
            next = value_generation(&generation, &next, discount, contract);
        }
        root_value(&next)
    }
}

/// Values of one generation given the values of the next (empty for the
/// leaves).
fn value_generation(
    generation: &Generation,
    next: &[Real],
    discount: DiscountFactor,
    contract: &OptionContract,
) -> Vec<Real> {
    let early_exercise = contract.exercise_style.allows_early_exercise();
    generation
        .nodes
        .iter()
        .map(|node| {
            let exercise = contract.payoff_value(node.spot_price());
            match node.branching() {
                None => exercise,
                Some(branching) => {
                    let hold = discount * branching.expectation(|id| next[id.index()]);
                    if early_exercise {
                        hold.max(exercise)
                    } else {
                        hold
                    }
                }
            }
        })
        .collect()
}

fn root_value(values: &[Real]) -> Result<Real> {
    values
        .first()
        .copied()
        .ok_or_else(|| Error::Runtime("lattice has no root".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tl_instruments::OptionType;
    use tl_time::ymd;

    fn params(steps: Size, dividend: Real, ex: Date) -> LatticeParameters {
        let market = MarketConditions::new(0.04, 0.25, 100.0, dividend, ex);
        LatticeParameters::new(
            market,
            ymd(2023, 9, 20).unwrap(),
            ymd(2024, 9, 19).unwrap(),
            steps,
        )
        .unwrap()
    }

    #[test]
    fn parameters_follow_the_step_size() {
        let p = params(4, 0.0, Date::MIN);
        assert_relative_eq!(p.time_to_maturity, 1.0);
        assert_relative_eq!(p.delta_t, 0.25);
        assert_relative_eq!(p.alpha, (0.25 * 0.75f64.sqrt()).exp());
        assert_relative_eq!(p.discount_factor, (-0.01f64).exp());
        assert_eq!(p.dividend_step, None);
        assert_eq!(p.date(4).unwrap(), ymd(2024, 9, 19).unwrap());
    }

    #[test]
    fn dividend_step_window_is_half_open() {
        // 365-day year, four 91.25-day steps
        let start = ymd(2023, 9, 20).unwrap();
        let step_of = |days: i64| {
            let ex = tl_time::date::add_days(start, days).unwrap();
            params(4, 2.0, ex).dividend_step
        };
        assert_eq!(step_of(1), Some(0));
        assert_eq!(step_of(91), Some(0));
        assert_eq!(step_of(92), Some(1));
        assert_eq!(step_of(365), Some(3));
        assert_eq!(step_of(0), None);
        assert_eq!(step_of(366), None);
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let market = MarketConditions::without_dividend(0.04, 0.25, 100.0);
        let d = ymd(2024, 1, 1).unwrap();
        assert!(matches!(
            LatticeParameters::new(market, d, d, 10),
            Err(Error::Precondition(_))
        ));
        assert!(LatticeParameters::new(market, d, ymd(2025, 1, 1).unwrap(), 0).is_err());
        assert!(LatticeParameters::new(
            market.with_spot(-1.0),
            d,
            ymd(2025, 1, 1).unwrap(),
            10
        )
        .is_err());
    }

    #[test]
    fn generations_have_odd_widths() {
        let lattice = Lattice::build(params(12, 0.0, Date::MIN)).unwrap();
        for (k, g) in lattice.generations().iter().enumerate() {
            assert_eq!(g.index(), k);
            assert_eq!(g.len(), 2 * k + 1);
            assert_eq!(g.trunk().id(), NodeId::at_level(k, 0));
        }
        assert_eq!(lattice.node_count(), 13 * 13);
        assert_eq!(lattice.nodes_built(), 13 * 13);
        assert_eq!(lattice.trunk().count(), 13);
    }

    #[test]
    fn node_lookup_respects_generation() {
        let lattice = Lattice::build(params(3, 0.0, Date::MIN)).unwrap();
        let g = lattice.generation(2).unwrap();
        assert!(g.node(NodeId::at_level(1, 0)).is_none());
        assert!(lattice.node(NodeId::at_level(3, 3)).is_some());
        assert!(lattice.node(NodeId::new(4, 0)).is_none());
    }

    #[test]
    fn roll_back_writes_each_value_once() {
        let mut lattice = Lattice::build(params(20, 0.0, Date::MIN)).unwrap();
        let maturity = ymd(2024, 9, 19).unwrap();
        let put = OptionContract::american(OptionType::Put, 102.0, maturity);

        let value = lattice.roll_back(&put).unwrap();
        assert!(lattice.is_valued());
        assert_eq!(lattice.root().value(), Some(value));
        assert!(lattice
            .generations()
            .iter()
            .flat_map(|g| g.nodes())
            .all(|n| n.value().is_some()));
        assert!(matches!(lattice.roll_back(&put), Err(Error::Precondition(_))));
    }

    #[test]
    fn into_value_agrees_with_roll_back() {
        let p = params(50, 0.0, Date::MIN);
        let maturity = ymd(2024, 9, 19).unwrap();
        let call = OptionContract::european(OptionType::Call, 102.0, maturity);
        let mut stored = Lattice::build(p).unwrap();
        let a = stored.roll_back(&call).unwrap();
        let b = Lattice::build(p).unwrap().into_value(&call).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn american_nodes_dominate_intrinsic() {
        let mut lattice = Lattice::build(params(30, 0.0, Date::MIN)).unwrap();
        let maturity = ymd(2024, 9, 19).unwrap();
        let put = OptionContract::american(OptionType::Put, 110.0, maturity);
        lattice.roll_back(&put).unwrap();
        for node in lattice.generations().iter().flat_map(|g| g.nodes()) {
            let value = node.value().unwrap();
            assert!(value >= put.payoff_value(node.spot_price()) - 1e-12);
        }
    }

    #[test]
    fn validation_passes_with_and_without_dividend() {
        let settings = LatticeSettings::default();
        Lattice::build(params(40, 0.0, Date::MIN))
            .unwrap()
            .validate(&settings)
            .unwrap();
        Lattice::build(params(40, 3.0, ymd(2024, 3, 1).unwrap()))
            .unwrap()
            .validate(&settings)
            .unwrap();
    }
}
