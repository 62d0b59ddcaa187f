//! `Date` type.
//!
//! Dates are plain calendar days without a time-of-day component, backed by
//! [`chrono::NaiveDate`]. Pricing only ever needs day differences, so no
//! time zone or calendar adjustment is involved.

use tl_core::errors::{Error, Result};

/// A calendar date.
pub type Date = chrono::NaiveDate;

/// Create a date from year, month (1–12), and day-of-month (1–31).
///
/// # Example
/// ```
/// let d = tl_time::ymd(2024, 9, 19).unwrap();
/// assert_eq!(d.to_string(), "2024-09-19");
/// assert!(tl_time::ymd(2023, 2, 29).is_err());
/// ```
pub fn ymd(year: i32, month: u32, day: u32) -> Result<Date> {
    Date::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::Date(format!("invalid date {year}-{month:02}-{day:02}")))
}

/// Advance `date` by a signed number of calendar days.
pub fn add_days(date: Date, days: i64) -> Result<Date> {
    let delta = chrono::Duration::try_days(days)
        .ok_or_else(|| Error::Date(format!("day offset {days} out of range")))?;
    date.checked_add_signed(delta)
        .ok_or_else(|| Error::Date(format!("{date} + {days} days out of range")))
}
