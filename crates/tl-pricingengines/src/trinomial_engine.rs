//! Trinomial lattice engine for vanilla options.
//!
//! Builds a recombining trinomial lattice from a market snapshot, checks its
//! moment-matching invariants, and values the contract by backward
//! induction. European and American exercise are both supported; a single
//! discrete cash dividend is taken out of the forward in the step that
//! contains its ex-date.

use tl_core::{ensure, errors::Result, LatticeSettings, Price, Real, Size};
use tl_instruments::{MarketConditions, OptionContract, PricingEngine, PricingResults};
use tl_methods::lattice::probability::forward_price;
use tl_methods::{Lattice, LatticeParameters};
use tl_time::Date;
use tracing::debug;

/// Price `contract` on an `n_steps`-step lattice.
///
/// Convenience wrapper around [`TrinomialEngine`] with default settings.
pub fn price(
    market: &MarketConditions,
    contract: &OptionContract,
    pricing_date: Date,
    n_steps: Size,
) -> Result<Price> {
    TrinomialEngine::new(*market, pricing_date, n_steps).npv(contract)
}

/// Trinomial lattice pricing engine.
///
/// Each call derives its own parameters and builds a fresh lattice; nothing
/// is cached between calls.
///
/// With zero volatility the lattice has no spacing; the contract is then
/// valued along the deterministic forward path instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrinomialEngine {
    market: MarketConditions,
    pricing_date: Date,
    steps: Size,
    settings: LatticeSettings,
}

impl TrinomialEngine {
    /// Create an engine with default [`LatticeSettings`].
    pub fn new(market: MarketConditions, pricing_date: Date, steps: Size) -> Self {
        Self {
            market,
            pricing_date,
            steps,
            settings: LatticeSettings::default(),
        }
    }

    /// Replace the numerical settings.
    pub fn with_settings(mut self, settings: LatticeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Market snapshot.
    pub fn market(&self) -> &MarketConditions {
        &self.market
    }

    /// Number of time steps.
    pub fn steps(&self) -> Size {
        self.steps
    }

    /// Derive the lattice parameters for `contract`.
    pub fn parameters(&self, contract: &OptionContract) -> Result<LatticeParameters> {
        contract.validate()?;
        let params = LatticeParameters::new(
            self.market,
            self.pricing_date,
            contract.maturity_date,
            self.steps,
        )?;
        debug!(
            steps = params.steps,
            delta_t = params.delta_t,
            alpha = params.alpha,
            discount_factor = params.discount_factor,
            "derived lattice parameters"
        );
        Ok(params)
    }

    /// Build (and, if enabled, validate) the lattice for `contract` without
    /// valuing it.
    pub fn build_lattice(&self, contract: &OptionContract) -> Result<Lattice> {
        let lattice = Lattice::build(self.parameters(contract)?)?;
        if self.settings.validate {
            lattice.validate(&self.settings)?;
        }
        Ok(lattice)
    }

    /// Net present value of `contract`.
    pub fn npv(&self, contract: &OptionContract) -> Result<Price> {
        let params = self.parameters(contract)?;
        Ok(self.valuation(params, contract)?.npv)
    }

    fn valuation(
        &self,
        params: LatticeParameters,
        contract: &OptionContract,
    ) -> Result<Valuation> {
        if params.is_degenerate() {
            return Ok(Valuation {
                npv: deterministic_value(&params, contract)?,
                nodes: params.steps + 1,
                confined: 0,
            });
        }
        let lattice = Lattice::build(params)?;
        if self.settings.validate {
            lattice.validate(&self.settings)?;
        }
        let nodes = lattice.nodes_built();
        let confined = lattice.confined_nodes();
        Ok(Valuation {
            npv: lattice.into_value(contract)?,
            nodes,
            confined,
        })
    }
}

/// Value and shape of one pricing run.
struct Valuation {
    npv: Price,
    nodes: Size,
    confined: Size,
}

impl PricingEngine<OptionContract> for TrinomialEngine {
    fn calculate(&self, contract: &OptionContract) -> Result<PricingResults> {
        let params = self.parameters(contract)?;
        let valuation = self.valuation(params, contract)?;
        Ok(PricingResults::from_npv(valuation.npv)
            .with_result("steps", params.steps as Real)
            .with_result("nodes", valuation.nodes as Real)
            .with_result("confined_nodes", valuation.confined as Real)
            .with_result("delta_t", params.delta_t)
            .with_result("alpha", params.alpha))
    }
}

/// Value along the forward path when the volatility is zero.
///
/// The path grows at the risk-free rate and drops by the dividend at the
/// end of the dividend step. American contracts compare the continuation
/// value with intrinsic at every step.
fn deterministic_value(params: &LatticeParameters, contract: &OptionContract) -> Result<Price> {
    let rate = params.market.interest_rate;
    let mut path = Vec::with_capacity(params.steps + 1);
    let mut spot = params.market.spot_price;
    path.push(spot);
    for k in 0..params.steps {
        spot = forward_price(spot, rate, params.delta_t);
        if params.dividend_step == Some(k) {
            spot -= params.market.dividend_amount;
            ensure!(
                spot > 0.0,
                "dividend {} exceeds the forward at generation {k}",
                params.market.dividend_amount
            );
        }
        path.push(spot);
    }
    debug!(
        steps = params.steps,
        terminal = spot,
        "zero volatility, valuing along the forward path"
    );

    let early_exercise = contract.exercise_style.allows_early_exercise();
    let value = path
        .iter()
        .rev()
        .fold(None, |next: Option<Real>, &s| {
            let exercise = contract.payoff_value(s);
            Some(match next {
                None => exercise,
                Some(v) if early_exercise => (params.discount_factor * v).max(exercise),
                Some(v) => params.discount_factor * v,
            })
        })
        .unwrap_or_default();
    Ok(value)
}
