//! Generation-by-generation lattice construction.

use super::node::{LatticeNode, NodeId, PriceGrid, StepContext};
use super::probability::forward_price;
use super::{Generation, Lattice, LatticeParameters};
use std::collections::VecDeque;
use tl_core::{ensure, ensure_post, errors::Result, fail, Price, Real, Size};
use tracing::debug;

/// Builds a [`Lattice`] from the root outwards.
///
/// Generation `k + 1` is laid out by a walk over generation `k`: the trunk
/// node creates its three children, then the walk follows sibling links
/// upward and downward, each node adding only its outermost child since the
/// other two are shared with its inner neighbour. Every generation
/// therefore grows by exactly two nodes.
#[derive(Debug)]
pub struct LatticeBuilder {
    params: LatticeParameters,
    nodes_built: Size,
}

impl LatticeBuilder {
    /// A builder for the given parameters.
    pub fn new(params: LatticeParameters) -> Self {
        Self {
            params,
            nodes_built: 0,
        }
    }

    /// Construct all `steps + 1` generations.
    ///
    /// Fails if the spacing is degenerate, if a dividend exceeds the trunk
    /// forward, or if any branch probability falls outside `[0, 1]`.
    pub fn build(mut self) -> Result<Lattice> {
        let params = self.params;
        ensure!(
            !params.is_degenerate(),
            "volatility {} gives no price spacing over a step of {} years",
            params.market.volatility,
            params.delta_t
        );
        debug!(
            steps = params.steps,
            delta_t = params.delta_t,
            alpha = params.alpha,
            dividend_step = ?params.dividend_step,
            "building trinomial lattice"
        );

        let mut generations = Vec::with_capacity(params.steps + 1);
        let mut spots = vec![params.market.spot_price];
        self.nodes_built = 1;
        for k in 0..=params.steps {
            let generation = self.construct(k, std::mem::take(&mut spots))?;
            if k < params.steps {
                spots = grow(&generation)?;
                self.nodes_built += reached_children(&generation, spots.len())?;
            }
            generations.push(generation);
        }

        let expected = (params.steps + 1) * (params.steps + 1);
        ensure_post!(
            self.nodes_built == expected,
            "built {} nodes for {} steps, expected {expected}",
            self.nodes_built,
            params.steps
        );
        debug!(nodes = self.nodes_built, "lattice built");

        Ok(Lattice {
            params,
            generations,
            nodes_built: self.nodes_built,
            valued: false,
        })
    }

    /// Turn the spots of generation `k` into nodes.
    fn construct(&self, k: Size, spots: Vec<Price>) -> Result<Generation> {
        let params = &self.params;
        let time = params.time(k);
        let date = params.date(k)?;
        let dividend = (params.dividend_step == Some(k)).then_some(params.market.dividend_amount);

        let grid = if k < params.steps {
            let trunk_forward =
                forward_price(spots[k], params.market.interest_rate, params.delta_t);
            let base = match dividend {
                Some(amount) => trunk_forward - amount,
                None => trunk_forward,
            };
            ensure!(
                base > 0.0,
                "dividend {} exceeds the forward {trunk_forward} at generation {k} ({date})",
                params.market.dividend_amount
            );
            Some(PriceGrid {
                base,
                alpha: params.alpha,
                half_width: k as i64 + 1,
            })
        } else {
            None
        };

        let ctx = StepContext {
            params,
            generation: k,
            time,
            date,
            dividend,
            next: grid,
        };
        let nodes = spots
            .into_iter()
            .enumerate()
            .map(|(i, spot)| LatticeNode::new(NodeId::new(k, i), spot, &ctx))
            .collect::<Result<Vec<_>>>()?;

        let confined = match dividend {
            Some(amount) => nodes
                .iter()
                .filter(|n| (n.dividend() - amount).abs() > 1e-9 * amount)
                .count(),
            None => 0,
        };
        if let Some(amount) = dividend {
            debug!(
                generation = k,
                %date,
                dividend = amount,
                confined,
                "dividend step"
            );
        }

        Ok(Generation {
            index: k,
            time,
            date,
            dividend,
            confined,
            grid,
            nodes,
        })
    }

}

/// Lay out the spots of the generation after `current`.
fn grow(current: &Generation) -> Result<Vec<Price>> {
    let Some(grid) = current.grid else {
        fail!("generation {} has no successor", current.index);
    };
    let trunk = current.trunk();
    let mut spots: VecDeque<Real> = VecDeque::with_capacity(current.len() + 2);

    spots.extend([grid.spot(-1), grid.spot(0), grid.spot(1)]);

    let mut cursor = trunk.sibling_up();
    while let Some(id) = cursor {
        spots.push_back(grid.spot(id.level() + 1));
        cursor = current.nodes[id.index()].sibling_up();
    }

    let mut cursor = trunk.sibling_down();
    while let Some(id) = cursor {
        spots.push_front(grid.spot(id.level() - 1));
        cursor = current.nodes[id.index()].sibling_down();
    }

    Ok(spots.into())
}

/// Number of distinct nodes of the next generation that `current` links to.
///
/// Every child id must point into a generation of `next_len` nodes, and
/// every one of those nodes must be some parent's child.
fn reached_children(current: &Generation, next_len: Size) -> Result<Size> {
    let mut reached = vec![false; next_len];
    for node in current.nodes() {
        let Some(branching) = node.branching() else {
            fail!("node {} of generation {} has no children", node.id(), current.index);
        };
        for child in branching.children {
            ensure_post!(
                child.generation() == current.index + 1 && child.index() < next_len,
                "node {} links to {child}, outside generation {} of {next_len} nodes",
                node.id(),
                current.index + 1
            );
            reached[child.index()] = true;
        }
    }
    let orphans = reached.iter().filter(|r| !**r).count();
    ensure_post!(
        orphans == 0,
        "{orphans} of {next_len} nodes in generation {} have no parent",
        current.index + 1
    );
    Ok(next_len)
}
