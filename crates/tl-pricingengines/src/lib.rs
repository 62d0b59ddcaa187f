//! # tl-pricingengines
//!
//! Pricing engines for vanilla options.
//!
//! ## Engines
//!
//! - [`TrinomialEngine`]: recombining trinomial lattice, European and American exercise
//! - [`AnalyticEuropeanEngine`]: Black-Scholes closed form for European options
//! - [`FiniteDifferenceGreeks`]: bump-and-reprice sensitivities on the lattice

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod finite_difference_greeks;
pub mod trinomial_engine;

pub use analytic_european_engine::{black_scholes, AnalyticEuropeanEngine, BlackScholesResults};
pub use finite_difference_greeks::{FiniteDifferenceGreeks, Greeks};
pub use trinomial_engine::{price, TrinomialEngine};
