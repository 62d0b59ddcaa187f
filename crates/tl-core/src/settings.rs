//! Lattice configuration.
//!
//! [`LatticeSettings`] controls the numerical checks run on every built
//! lattice. It is a plain value passed to the engines; there is no
//! process-wide mutable configuration.

use crate::Real;

/// Default tolerance on `p_down + p_mid + p_up == 1`.
pub const DEFAULT_PROBABILITY_TOLERANCE: Real = 1e-6;

/// Default relative tolerance on the first and second moment checks.
pub const DEFAULT_MOMENT_TOLERANCE: Real = 1e-4;

/// Numerical settings applied when building and rolling back a lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatticeSettings {
    /// Check the moment-matching invariants of every node before valuing.
    pub validate: bool,
    /// Absolute tolerance on the probability sum.
    pub probability_tolerance: Real,
    /// Relative tolerance on the mean and second-moment checks.
    pub moment_tolerance: Real,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            validate: true,
            probability_tolerance: DEFAULT_PROBABILITY_TOLERANCE,
            moment_tolerance: DEFAULT_MOMENT_TOLERANCE,
        }
    }
}

impl LatticeSettings {
    /// Enable or disable the per-node invariant checks.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set the probability-sum tolerance.
    pub fn with_probability_tolerance(mut self, tolerance: Real) -> Self {
        self.probability_tolerance = tolerance;
        self
    }

    /// Set the relative moment tolerance.
    pub fn with_moment_tolerance(mut self, tolerance: Real) -> Self {
        self.moment_tolerance = tolerance;
        self
    }
}
