//! # tl-math
//!
//! Mathematical utilities: relative-error comparison and the standard
//! normal distribution (via statrs).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Relative-error comparison.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::relative_error;
pub use distributions::{normal_cdf, normal_pdf};
