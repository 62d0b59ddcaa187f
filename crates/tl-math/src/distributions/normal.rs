//! Standard normal distribution.
//!
//! Wraps the `statrs` crate's normal implementation, whose CDF is built on
//! the complementary error function and is accurate to machine precision
//! across the range the closed-form pricer needs.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use std::sync::OnceLock;
use tl_core::Real;

fn standard() -> &'static Normal {
    static STANDARD: OnceLock<Normal> = OnceLock::new();
    STANDARD.get_or_init(Normal::standard)
}

/// The standard normal probability density function.
///
/// `φ(x) = exp(-x²/2) / √(2π)`
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    standard().pdf(x)
}

/// The standard normal cumulative distribution function Φ(x).
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    standard().cdf(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn known_values() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(1.959_963_984_540_054), 0.975, epsilon = 1e-12);
        assert_abs_diff_eq!(normal_cdf(-1.0), 0.158_655_253_931_457_05, epsilon = 1e-12);
        assert_abs_diff_eq!(
            normal_pdf(0.0),
            1.0 / (2.0 * std::f64::consts::PI).sqrt(),
            epsilon = 1e-15
        );
    }

    proptest! {
        #[test]
        fn cdf_symmetry(x in -8.0f64..8.0) {
            prop_assert!((normal_cdf(x) + normal_cdf(-x) - 1.0).abs() < 1e-12);
        }

        #[test]
        fn pdf_is_even(x in -8.0f64..8.0) {
            prop_assert!((normal_pdf(x) - normal_pdf(-x)).abs() < 1e-15);
        }
    }
}
