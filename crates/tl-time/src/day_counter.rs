//! `DayCounter` trait and the Actual/365 (Fixed) convention.
//!
//! A day counter computes the fraction of a year between two dates. The
//! lattice works in year fractions internally and maps them back to calendar
//! dates when it reports a node's date or locates the ex-dividend step.

use crate::date::{add_days, Date};
use tl_core::{errors::Result, Real, Time};

/// A convention for counting the fraction of a year between two dates.
pub trait DayCounter: std::fmt::Debug + Send + Sync {
    /// Human-readable name of this convention (e.g. `"Actual/365 (Fixed)"`).
    fn name(&self) -> &str;

    /// Number of days between `d1` and `d2` according to this convention.
    fn day_count(&self, d1: Date, d2: Date) -> i64;

    /// Fraction of a year between `d1` and `d2`.
    fn year_fraction(&self, d1: Date, d2: Date) -> Time;

    /// The date lying `t` years after `start`, rounded to the nearest day.
    fn date_after(&self, start: Date, t: Time) -> Result<Date>;
}

/// Actual/365 (Fixed) day counter.
///
/// `year_fraction = actual_days / 365`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actual365Fixed;

impl Actual365Fixed {
    /// Days per year under this convention.
    pub const DAYS_PER_YEAR: Real = 365.0;
}

impl DayCounter for Actual365Fixed {
    fn name(&self) -> &str {
        "Actual/365 (Fixed)"
    }

    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        (d2 - d1).num_days()
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / Self::DAYS_PER_YEAR
    }

    fn date_after(&self, start: Date, t: Time) -> Result<Date> {
        add_days(start, (t * Self::DAYS_PER_YEAR).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::ymd;

    #[test]
    fn one_calendar_year() {
        let dc = Actual365Fixed;
        let t = dc.year_fraction(ymd(2023, 9, 20).unwrap(), ymd(2024, 9, 19).unwrap());
        assert!((t - 1.0).abs() < 1e-15, "t = {t}");
    }

    #[test]
    fn date_after_rounds_to_nearest_day() {
        let dc = Actual365Fixed;
        let start = ymd(2024, 1, 1).unwrap();
        assert_eq!(dc.date_after(start, 0.0).unwrap(), start);
        // 10.4 days → 10
        assert_eq!(
            dc.date_after(start, 10.4 / 365.0).unwrap(),
            ymd(2024, 1, 11).unwrap()
        );
        // 10.6 days → 11
        assert_eq!(
            dc.date_after(start, 10.6 / 365.0).unwrap(),
            ymd(2024, 1, 12).unwrap()
        );
    }
}
