//! # tl-instruments
//!
//! Vanilla option contracts, their payoffs and exercise styles, the market
//! inputs they are priced against, and the `PricingEngine` trait.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod exercise;
pub mod instrument;
pub mod market;
pub mod option;
pub mod payoff;

pub use exercise::ExerciseType;
pub use instrument::{PricingEngine, PricingResults};
pub use market::MarketConditions;
pub use option::OptionContract;
pub use payoff::{OptionType, PlainVanillaPayoff};
