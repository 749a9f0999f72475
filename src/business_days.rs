// =============================================================================
// business_days.rs — DURATION ARITHMETIC AND THE WEEKEND SHIFT
// =============================================================================
//
// Statutory durations are "two weeks", "one month", "three months and ten
// days". Months are applied first, then days, with chrono's calendar
// arithmetic handling month lengths and leap years (chrono clamps Jan 31 +
// 1 month to the end of February, which for deadlines is also the earlier
// and therefore safer answer).
//
// A deadline ending on a weekend rolls to the next business day: Saturday
// shifts +2, Sunday shifts +1. NO holiday calendar is applied — that is a
// documented limitation of the engine, not an oversight. Until the product
// grows a per-jurisdiction holiday table, Corpus Christi in Bavaria is the
// reviewing lawyer's problem.
// =============================================================================

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

/// Add a statutory duration to a base date: months first, then days.
pub fn add_duration(base: NaiveDate, days: i64, months: u32) -> NaiveDate {
    let with_months = if months > 0 {
        base.checked_add_months(Months::new(months)).unwrap_or(base)
    } else {
        base
    };
    with_months
        .checked_add_signed(Duration::days(days))
        .unwrap_or(with_months)
}

/// Roll weekend landings forward to Monday.
pub fn normalize_to_business_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn days_only() {
        assert_eq!(add_duration(d(2026, 2, 10), 14, 0), d(2026, 2, 24));
    }

    #[test]
    fn month_overflow_clamps_to_month_end_never_rolls_over() {
        // The contract at the month-end boundary: Jan 31 + 1 month is
        // Feb 28, NOT Mar 3. Overflow-style rollover would push a deadline
        // past the statutory month; the clamped (earlier) day is the one
        // this engine promises.
        assert_eq!(add_duration(d(2026, 1, 31), 0, 1), d(2026, 2, 28));
        assert_eq!(add_duration(d(2026, 3, 31), 0, 1), d(2026, 4, 30));
        assert_eq!(add_duration(d(2026, 8, 31), 0, 6), d(2027, 2, 28));
        // Leap year: the clamp lands on the 29th.
        assert_eq!(add_duration(d(2024, 1, 31), 0, 1), d(2024, 2, 29));
    }

    #[test]
    fn months_then_days() {
        // Two months + ten days, the EU court's favorite.
        assert_eq!(add_duration(d(2026, 1, 15), 10, 2), d(2026, 3, 25));
    }

    #[test]
    fn saturday_shifts_to_monday() {
        // 2026-02-28 is a Saturday.
        assert_eq!(normalize_to_business_day(d(2026, 2, 28)), d(2026, 3, 2));
    }

    #[test]
    fn sunday_shifts_to_monday() {
        // 2026-03-01 is a Sunday.
        assert_eq!(normalize_to_business_day(d(2026, 3, 1)), d(2026, 3, 2));
    }

    #[test]
    fn weekdays_pass_through() {
        // 2026-02-24 is a Tuesday.
        assert_eq!(normalize_to_business_day(d(2026, 2, 24)), d(2026, 2, 24));
    }
}
