//! Integration tests for the `DayCounter` trait and the Actual/365 (Fixed)
//! convention.

use proptest::prelude::*;
use tl_time::{ymd, Actual365Fixed, Date, DayCounter};

fn date(y: i32, m: u32, d: u32) -> Date {
    ymd(y, m, d).unwrap()
}

#[test]
fn actual_365_fixed_known_fractions() {
    let dc = Actual365Fixed;
    assert_eq!(dc.name(), "Actual/365 (Fixed)");

    let cases: Vec<(Date, Date, f64)> = vec![
        (date(2023, 9, 20), date(2024, 9, 19), 1.0),
        // leap year counts 366 actual days
        (date(2024, 1, 1), date(2025, 1, 1), 366.0 / 365.0),
        (date(2024, 1, 1), date(2024, 7, 1), 182.0 / 365.0),
        (date(2024, 5, 24), date(2024, 5, 24), 0.0),
    ];

    for (i, (d1, d2, expected)) in cases.iter().enumerate() {
        let calculated = dc.year_fraction(*d1, *d2);
        approx::assert_abs_diff_eq!(calculated, *expected, epsilon = 1e-14);
        assert_eq!(
            dc.day_count(*d1, *d2),
            (*d2 - *d1).num_days(),
            "case {i}: day count mismatch"
        );
    }
}

#[test]
fn year_fraction_is_antisymmetric() {
    let dc = Actual365Fixed;
    let a = date(2023, 9, 20);
    let b = date(2024, 5, 24);
    assert_eq!(dc.year_fraction(a, b), -dc.year_fraction(b, a));
}

proptest! {
    #[test]
    fn date_after_inverts_year_fraction(offset in 0i64..20_000) {
        let dc = Actual365Fixed;
        let start = date(2000, 1, 1);
        let end = start + chrono::Duration::days(offset);
        let t = dc.year_fraction(start, end);
        prop_assert_eq!(dc.date_after(start, t).unwrap(), end);
    }
}
