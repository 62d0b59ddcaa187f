//! `PricingEngine` trait and `PricingResults`.
//!
//! Engines hold their market inputs and configuration; an instrument (here
//! always an [`OptionContract`](crate::OptionContract)) is passed in and a
//! set of results is returned.

use std::collections::HashMap;
use tl_core::{errors::Result, Real};

/// Results of pricing an instrument.
///
/// Contains the NPV and optionally additional named results
/// (e.g. "delta", "nodes", "alpha").
#[derive(Debug, Clone, Default)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Additional named results.
    pub additional_results: HashMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            additional_results: HashMap::new(),
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// Look up a named result.
    pub fn result(&self, key: &str) -> Option<Real> {
        self.additional_results.get(key).copied()
    }
}

/// Base trait for all pricing engines.
pub trait PricingEngine<Args>: std::fmt::Debug + Send + Sync {
    /// Price the instrument described by `args`.
    fn calculate(&self, args: &Args) -> Result<PricingResults>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_results_builder() {
        let r = PricingResults::from_npv(42.0)
            .with_result("delta", 0.55)
            .with_result("gamma", 0.02);
        assert!((r.npv - 42.0).abs() < 1e-15);
        assert_eq!(r.result("delta"), Some(0.55));
        assert_eq!(r.result("gamma"), Some(0.02));
        assert_eq!(r.result("vega"), None);
    }
}
