//! # tl-methods
//!
//! Numerical methods: the recombining trinomial lattice used to price
//! vanilla options under a lognormal diffusion.
//!
//! # Modules
//!
//! * [`lattice`]: probability model, nodes, builder, and backward induction

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Trinomial lattice: construction and backward-induction valuation.
pub mod lattice;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use lattice::{
    BranchProbabilities, Branching, Generation, Lattice, LatticeBuilder, LatticeNode,
    LatticeParameters, NodeId,
};
