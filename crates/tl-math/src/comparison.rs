//! Comparison utilities.

use tl_core::Real;

/// Relative deviation `|actual - expected| / |expected|`.
///
/// Falls back to the absolute deviation when `expected` is zero.
#[inline]
pub fn relative_error(actual: Real, expected: Real) -> Real {
    let diff = (actual - expected).abs();
    if expected == 0.0 {
        diff
    } else {
        diff / expected.abs()
    }
}
