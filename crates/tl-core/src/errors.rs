//! Error types for trilattice.
//!
//! A single `thiserror`-derived enum covers every failure a pricing call can
//! report. The `ensure!`, `ensure_post!` and `fail!` macros defined here are
//! the usual way to raise the string-carrying variants.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use crate::Real;

/// The moment-matching check that a lattice node failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MomentCheck {
    /// `p_down + p_mid + p_up == 1`.
    ProbabilitySum,
    /// The branch mean equals the node's forward price.
    Mean,
    /// The branch second moment equals `variance + forward²`.
    SecondMoment,
}

impl fmt::Display for MomentCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentCheck::ProbabilitySum => write!(f, "probability sum"),
            MomentCheck::Mean => write!(f, "first moment"),
            MomentCheck::SecondMoment => write!(f, "second moment"),
        }
    }
}

/// The top-level error type used throughout trilattice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (bad inputs, pricing date after maturity, ...).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// A lattice node failed one of its moment-matching checks.
    #[error(
        "{check} check failed at generation {generation} ({date}): deviation {deviation:e}"
    )]
    InvariantViolation {
        /// Generation (time step index) of the offending node.
        generation: usize,
        /// Calendar date of that generation.
        date: NaiveDate,
        /// Which check failed.
        check: MomentCheck,
        /// Magnitude of the deviation (absolute for the probability sum,
        /// relative for the moments).
        deviation: Real,
    },

    /// A branch probability fell outside `[0, 1]`.
    ///
    /// The spacing is too coarse for the requested volatility and step
    /// count, or the dividend moves the forward off the grid.
    #[error(
        "{branch} probability {value} outside [0, 1] at generation {generation}, level {level}"
    )]
    InvalidProbability {
        /// Generation of the node.
        generation: usize,
        /// Signed level of the node relative to the trunk.
        level: i64,
        /// Branch name (`"down"`, `"mid"` or `"up"`).
        branch: &'static str,
        /// The offending probability.
        value: Real,
    },

    /// Date-related error.
    #[error("date error: {0}")]
    Date(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Shorthand `Result` type used throughout trilattice.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use tl_core::{ensure, errors::Error};
/// fn positive(x: f64) -> tl_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use tl_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> tl_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use tl_core::{fail, errors::Error};
/// fn always_err() -> tl_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
