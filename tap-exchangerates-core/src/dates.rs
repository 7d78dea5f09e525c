//! Calendar-date helpers: parsing, formatting, the clock, and the day-by-day walker.
//!
//! The walker re-reads the clock every time it is advanced, so a run that
//! crosses midnight UTC picks up the new day as well.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Wire format for dates in config, state and provider URLs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date given either as `YYYY-MM-DD` or as a date-time.
///
/// Date-times with an offset keep the calendar date of that offset; naive
/// date-times are taken as-is. The time of day is discarded.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Source of the current UTC date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock frozen on one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Yields one date per calendar day from `start` up to and including today.
///
/// "Today" is evaluated on every call to `next()`, not captured once.
pub struct DateWalker<'a> {
    next: Option<NaiveDate>,
    clock: &'a dyn Clock,
}

impl<'a> DateWalker<'a> {
    pub fn new(start: NaiveDate, clock: &'a dyn Clock) -> Self {
        Self {
            next: Some(start),
            clock,
        }
    }
}

impl Iterator for DateWalker<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let candidate = self.next?;
        if candidate > self.clock.today() {
            return None;
        }
        self.next = candidate.succ_opt();
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Advances one day every time it is read.
    struct TickingClock(Cell<NaiveDate>);

    impl Clock for TickingClock {
        fn today(&self) -> NaiveDate {
            let today = self.0.get();
            self.0.set(today.succ_opt().unwrap());
            today
        }
    }

    #[test]
    fn parses_plain_dates() {
        assert_eq!(parse_date("2024-01-01").unwrap(), d(2024, 1, 1));
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn parses_datetimes_keeping_local_calendar_date() {
        assert_eq!(parse_date("2024-01-01T00:00:00Z").unwrap(), d(2024, 1, 1));
        // 23:30 at -05:00 is already the 2nd in UTC, but the written date wins
        assert_eq!(
            parse_date("2024-01-01T23:30:00-05:00").unwrap(),
            d(2024, 1, 1)
        );
        assert_eq!(parse_date("2024-03-05T12:00:00").unwrap(), d(2024, 3, 5));
        assert_eq!(
            parse_date("2024-03-05T12:00:00.250").unwrap(),
            d(2024, 3, 5)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn formats_as_iso_date() {
        assert_eq!(format_date(d(2024, 1, 5)), "2024-01-05");
    }

    #[test]
    fn walks_inclusive_range() {
        let clock = FixedClock(d(2024, 1, 3));
        let dates: Vec<_> = DateWalker::new(d(2024, 1, 1), &clock).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
    }

    #[test]
    fn start_equal_to_today_yields_one_date() {
        let clock = FixedClock(d(2024, 1, 1));
        let dates: Vec<_> = DateWalker::new(d(2024, 1, 1), &clock).collect();
        assert_eq!(dates, vec![d(2024, 1, 1)]);
    }

    #[test]
    fn start_in_future_yields_nothing() {
        let clock = FixedClock(d(2024, 1, 1));
        assert_eq!(DateWalker::new(d(2024, 1, 2), &clock).count(), 0);
    }

    #[test]
    fn crosses_month_and_leap_day() {
        let clock = FixedClock(d(2024, 3, 1));
        let dates: Vec<_> = DateWalker::new(d(2024, 2, 28), &clock).collect();
        assert_eq!(dates, vec![d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]);
    }

    #[test]
    fn upper_bound_is_reevaluated_each_step() {
        // The clock moves forward as fast as the walker, so the bound keeps receding.
        let clock = TickingClock(Cell::new(d(2024, 1, 1)));
        let dates: Vec<_> = DateWalker::new(d(2024, 1, 1), &clock).take(5).collect();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[4], d(2024, 1, 5));
    }
}
