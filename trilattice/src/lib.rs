//! # trilattice
//!
//! Prices European and American vanilla options on a recombining trinomial
//! lattice, with support for one discrete cash dividend.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on this crate rather than the individual
//! `tl-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use trilattice::instruments::{MarketConditions, OptionContract, OptionType};
//! use trilattice::pricingengines::price;
//! use trilattice::time::ymd;
//!
//! let market = MarketConditions::without_dividend(0.04, 0.25, 100.0);
//! let put = OptionContract::american(OptionType::Put, 102.0, ymd(2024, 9, 19)?);
//! let npv = price(&market, &put, ymd(2023, 9, 20)?, 200)?;
//! assert!(npv > put.payoff_value(100.0));
//! # Ok::<(), trilattice::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, settings, and error definitions.
pub use tl_core as core;

/// Dates and the Actual/365 (Fixed) day counter.
pub use tl_time as time;

/// Comparisons and the normal distribution.
pub use tl_math as math;

/// Option contracts, market snapshot, and the engine trait.
pub use tl_instruments as instruments;

/// The trinomial lattice.
pub use tl_methods as methods;

/// Pricing engines and finite-difference Greeks.
pub use tl_pricingengines as pricingengines;
