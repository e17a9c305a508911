// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Stored records use local calendar dates (`YYYY-MM-DD`) and local ISO
//! timestamps (`YYYY-MM-DDTHH:MM:SS`).

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Today's local date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current local time of day.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a time of day as `HH:MM`.
pub fn format_clock(ts: NaiveDateTime) -> String {
    ts.format("%H:%M").to_string()
}

/// Parse the date portion of a stored date or timestamp string.
///
/// Accepts both `2026-03-01` and `2026-03-01T07:45:00.123456`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Parse a full stored timestamp (fractional seconds optional).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Parse `HH:MM` (seconds optional).
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Whole days from `earlier` to `later` (negative if reversed).
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(parse_date("2026-03-01"), Some(expected));
        assert_eq!(parse_date("2026-03-01T07:45:00.123456"), Some(expected));
        assert_eq!(parse_date("03/01/2026"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)), Some(ts));
        assert!(parse_timestamp("2026-03-01T07:45:00.123456").is_some());
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("22:30"), NaiveTime::from_hms_opt(22, 30, 0));
        assert_eq!(parse_clock("06:05:30"), NaiveTime::from_hms_opt(6, 5, 30));
        assert_eq!(parse_clock("25:00"), None);
    }
}
