// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout and login streaks.

use crate::models::User;
use crate::time_utils::{days_between, parse_date};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Largest gap, in days, between workouts that still continues a streak.
pub const MAX_STREAK_GAP_DAYS: i64 = 2;

/// Length of the most recent run of workout dates.
///
/// Dates are de-duplicated and walked newest first. Each step to an older
/// date continues the streak while the gap is at most two days, so
/// `[D, D-1, D-3]` counts 3. Unparseable dates are ignored.
pub fn workout_streak<'a>(dates: impl IntoIterator<Item = &'a str>) -> u32 {
    let unique: BTreeSet<NaiveDate> = dates.into_iter().filter_map(parse_date).collect();

    let mut iter = unique.iter().rev();
    let Some(&newest) = iter.next() else {
        return 0;
    };

    let mut streak = 1;
    let mut current = newest;
    for &older in iter {
        if days_between(older, current) <= MAX_STREAK_GAP_DAYS {
            streak += 1;
            current = older;
        } else {
            break;
        }
    }
    streak
}

/// Workout streak for a user.
pub fn user_workout_streak(user: &User) -> u32 {
    workout_streak(user.exercises.iter().map(|e| e.date.as_str()))
}

/// Login streak after a login on `today`.
///
/// Same day keeps the streak, the next day extends it, anything else
/// restarts it at 1.
pub fn next_login_streak(last_login: Option<&str>, current: u32, today: NaiveDate) -> u32 {
    match last_login.and_then(parse_date) {
        Some(last) => match days_between(last, today) {
            0 => current,
            1 => current + 1,
            _ => 1,
        },
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_gap_of_two_days_continues() {
        assert_eq!(workout_streak(["2026-03-10", "2026-03-09", "2026-03-07"]), 3);
    }

    #[test]
    fn test_gap_of_three_days_breaks() {
        assert_eq!(workout_streak(["2026-03-10", "2026-03-09", "2026-03-06"]), 2);
    }

    #[test]
    fn test_duplicates_and_order_do_not_matter() {
        assert_eq!(
            workout_streak(["2026-03-07", "2026-03-10", "2026-03-10", "2026-03-09"]),
            3
        );
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(workout_streak(Vec::<&str>::new()), 0);
        assert_eq!(workout_streak(["2026-03-10"]), 1);
        assert_eq!(workout_streak(["garbage"]), 0);
    }

    #[test]
    fn test_login_streak() {
        assert_eq!(next_login_streak(Some("2026-03-09T08:00:00"), 4, d(10)), 5);
        assert_eq!(next_login_streak(Some("2026-03-10T07:00:00"), 4, d(10)), 4);
        assert_eq!(next_login_streak(Some("2026-03-01T07:00:00"), 4, d(10)), 1);
        assert_eq!(next_login_streak(None, 0, d(10)), 1);
    }
}
