// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Performance insights: NAPFA projection, sleep impact, injury risk and the
//! weekly progress report.

use crate::models::{Intensity, SleepRecord, User};
use crate::services::badges::{level_for, level_progress};
use crate::services::napfa::{GOLD_TOTAL, MAX_TOTAL};
use crate::services::streak::user_workout_streak;
use crate::time_utils::{days_between, format_date, parse_date};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

// ─── NAPFA projection ────────────────────────────────────────

/// Months projected forward (plus the current point).
const PROJECTION_MONTHS: i64 = 6;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectionPoint {
    pub date: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GoldOutlook {
    /// Latest total already reaches gold.
    Achieved,
    /// Improving: estimated days until the total reaches gold.
    Predicted {
        points_needed: u32,
        days_to_gold: f64,
        predicted_date: String,
    },
    /// Flat or falling totals never reach gold at this rate.
    Declining { points_needed: u32 },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NapfaProjection {
    NoTests,
    /// One test: only the distance to gold is known.
    SingleTest {
        current_score: u32,
        points_needed: u32,
    },
    /// Two or more tests taken on the same day.
    NoTimeSpan { current_score: u32 },
    Trend {
        current_score: u32,
        rate_per_day: f64,
        rate_per_month: f64,
        outlook: GoldOutlook,
        points: Vec<ProjectionPoint>,
        /// "Low", "Medium" or "High" by number of tests
        confidence: &'static str,
        tests: usize,
    },
}

/// Project NAPFA totals forward with the consecutive-delta heuristic.
///
/// The rate is the sum of total changes between consecutive tests divided
/// by the sum of the day gaps between them. This is not a least-squares
/// fit: only the first and last totals and the overall span matter.
pub fn consecutive_delta_projection(user: &User, today: NaiveDate) -> NapfaProjection {
    let history = &user.napfa_history;
    let Some(latest) = history.last() else {
        return NapfaProjection::NoTests;
    };
    let current = latest.total;

    if history.len() < 2 {
        return NapfaProjection::SingleTest {
            current_score: current,
            points_needed: GOLD_TOTAL.saturating_sub(current),
        };
    }

    let mut total_days = 0i64;
    let mut total_change = 0i64;
    for pair in history.windows(2) {
        let (Some(a), Some(b)) = (parse_date(&pair[0].date), parse_date(&pair[1].date)) else {
            continue;
        };
        total_days += days_between(a, b);
        total_change += pair[1].total as i64 - pair[0].total as i64;
    }

    if total_days <= 0 {
        return NapfaProjection::NoTimeSpan {
            current_score: current,
        };
    }

    let rate = total_change as f64 / total_days as f64;
    let points_needed = GOLD_TOTAL.saturating_sub(current);
    let outlook = if current >= GOLD_TOTAL {
        GoldOutlook::Achieved
    } else if rate > 0.0 {
        let days = points_needed as f64 / rate;
        GoldOutlook::Predicted {
            points_needed,
            days_to_gold: days,
            predicted_date: format_date(today + Duration::days(days.ceil() as i64)),
        }
    } else {
        GoldOutlook::Declining { points_needed }
    };

    let points = (0..=PROJECTION_MONTHS)
        .map(|i| ProjectionPoint {
            date: format_date(today + Duration::days(30 * i)),
            score: (current as f64 + rate * 30.0 * i as f64).clamp(0.0, MAX_TOTAL as f64),
        })
        .collect();

    let confidence = match history.len() {
        4.. => "High",
        3 => "Medium",
        _ => "Low",
    };

    NapfaProjection::Trend {
        current_score: current,
        rate_per_day: rate,
        rate_per_month: rate * 30.0,
        outlook,
        points,
        confidence,
        tests: history.len(),
    }
}

// ─── Sleep impact ────────────────────────────────────────────

pub const MIN_SLEEP_RECORDS: usize = 7;
pub const MIN_WORKOUTS_FOR_RISK: usize = 5;

pub fn average_sleep_hours<'a>(records: impl IntoIterator<Item = &'a SleepRecord>) -> Option<f64> {
    let (sum, n) = records
        .into_iter()
        .fold((0.0, 0usize), |(s, n), r| (s + r.total_hours(), n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SleepImpact {
    pub average_sleep_hours: f64,
    pub napfa_score: u32,
    /// "Optimal", "Good" or "Below Optimal"
    pub rating: &'static str,
    pub insight: &'static str,
    pub potential_gain: f64,
}

/// Needs at least a week of sleep records and one NAPFA test.
pub fn sleep_impact(user: &User) -> Option<SleepImpact> {
    if user.sleep_history.len() < MIN_SLEEP_RECORDS {
        return None;
    }
    let napfa = user.latest_napfa()?;
    let avg = average_sleep_hours(&user.sleep_history)?;

    let (rating, insight, gain) = if avg >= 8.0 {
        ("Optimal", "Your sleep supports peak performance! Keep it up.", 0.0)
    } else if avg >= 7.0 {
        (
            "Good",
            "Good sleep, but getting 8+ hours could improve your NAPFA score by ~2-3 points.",
            2.5,
        )
    } else {
        (
            "Below Optimal",
            "Poor sleep is limiting your performance. Getting 8+ hours could improve your score by ~5 points!",
            5.0,
        )
    };

    Some(SleepImpact {
        average_sleep_hours: avg,
        napfa_score: napfa.total,
        rating,
        insight,
        potential_gain: gain,
    })
}

// ─── Injury risk ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InjuryRisk {
    pub score: u32,
    /// "High Risk", "Moderate Risk" or "Low Risk"
    pub level: &'static str,
    pub recommendation: &'static str,
    pub factors: Vec<&'static str>,
    pub high_intensity_ratio: f64,
    pub workouts_per_week: f64,
}

/// Needs at least five logged workouts.
pub fn injury_risk(user: &User, today: NaiveDate) -> Option<InjuryRisk> {
    let exercises = &user.exercises;
    if exercises.len() < MIN_WORKOUTS_FOR_RISK {
        return None;
    }

    let high = exercises
        .iter()
        .filter(|e| e.intensity == Intensity::High)
        .count();
    let high_ratio = high as f64 / exercises.len() as f64;

    let two_weeks_ago = today - Duration::days(14);
    let recent = exercises
        .iter()
        .filter(|e| parse_date(&e.date).is_some_and(|d| d > two_weeks_ago))
        .count();
    let per_week = recent as f64 / 2.0;

    let mut score = 0;
    let mut factors = Vec::new();
    if high_ratio > 0.7 {
        score += 30;
        factors.push("Too many high-intensity workouts (>70%)");
    }
    if per_week > 6.0 {
        score += 25;
        factors.push("Insufficient rest days (<1 per week)");
    }
    if per_week < 2.0 {
        score += 15;
        factors.push("Inconsistent training increases injury risk");
    }
    if user.sleep_history.len() >= MIN_SLEEP_RECORDS
        && average_sleep_hours(&user.sleep_history).is_some_and(|h| h < 7.0)
    {
        score += 20;
        factors.push("Poor sleep reduces recovery");
    }

    let (level, recommendation) = if score >= 50 {
        ("High Risk", "Reduce intensity and take more rest days!")
    } else if score >= 25 {
        ("Moderate Risk", "Balance your training intensity and rest.")
    } else {
        ("Low Risk", "Your training is well-balanced!")
    };

    Some(InjuryRisk {
        score,
        level,
        recommendation,
        factors,
        high_intensity_ratio: high_ratio,
        workouts_per_week: per_week,
    })
}

// ─── Weekly report ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WeeklyReport {
    // This week
    pub workouts_this_week: usize,
    pub minutes_this_week: u32,
    pub sleep_logs_this_week: usize,
    pub avg_sleep_this_week: Option<f64>,

    // All time
    pub total_workouts: usize,
    pub total_minutes: u32,
    pub napfa_tests: usize,
    pub bmi_records: usize,
    pub active_goals: usize,
    pub workout_streak: u32,
    pub exercise_frequency: BTreeMap<String, usize>,
    pub intensity: BTreeMap<String, usize>,

    // Sleep
    pub avg_sleep_hours: Option<f64>,
    pub sleep_quality: BTreeMap<String, usize>,

    // NAPFA
    pub latest_napfa_total: Option<u32>,
    pub latest_medal: Option<String>,
    /// Change from first to latest test
    pub napfa_improvement: Option<i64>,

    // Quick stats
    pub house_points: f64,
    pub badges: usize,
    pub level: String,
    pub level_progress: f64,
    pub login_streak: u32,
}

pub fn weekly_report(user: &User, today: NaiveDate) -> WeeklyReport {
    let week_ago = today - Duration::days(7);
    let in_week = |date: &str| parse_date(date).is_some_and(|d| d > week_ago);

    let this_week: Vec<_> = user.exercises.iter().filter(|e| in_week(&e.date)).collect();
    let sleep_week: Vec<_> = user
        .sleep_history
        .iter()
        .filter(|s| in_week(&s.date))
        .collect();

    let mut exercise_frequency = BTreeMap::new();
    let mut intensity = BTreeMap::new();
    for e in &user.exercises {
        *exercise_frequency.entry(e.name.clone()).or_insert(0) += 1;
        *intensity.entry(format!("{:?}", e.intensity)).or_insert(0) += 1;
    }

    let mut sleep_quality = BTreeMap::new();
    for s in &user.sleep_history {
        *sleep_quality.entry(s.quality.clone()).or_insert(0) += 1;
    }

    let napfa_improvement = match (user.napfa_history.first(), user.napfa_history.last()) {
        (Some(first), Some(last)) if user.napfa_history.len() > 1 => {
            Some(last.total as i64 - first.total as i64)
        }
        _ => None,
    };

    WeeklyReport {
        workouts_this_week: this_week.len(),
        minutes_this_week: this_week.iter().map(|e| e.duration).sum(),
        sleep_logs_this_week: sleep_week.len(),
        avg_sleep_this_week: average_sleep_hours(sleep_week.iter().copied()),
        total_workouts: user.exercises.len(),
        total_minutes: user.exercises.iter().map(|e| e.duration).sum(),
        napfa_tests: user.napfa_history.len(),
        bmi_records: user.bmi_history.len(),
        active_goals: user.goals.len() + user.smart_goals.len(),
        workout_streak: user_workout_streak(user),
        exercise_frequency,
        intensity,
        avg_sleep_hours: average_sleep_hours(&user.sleep_history),
        sleep_quality,
        latest_napfa_total: user.latest_napfa().map(|n| n.total),
        latest_medal: user.latest_napfa().map(|n| n.medal.clone()),
        napfa_improvement,
        house_points: user.house_points_contributed,
        badges: user.badges.len(),
        level: level_for(user.total_points).name.to_string(),
        level_progress: level_progress(user.total_points),
        login_streak: user.login_streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseEntry, NapfaResult};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn napfa(date: &str, total: u32) -> NapfaResult {
        NapfaResult {
            date: date.to_string(),
            total,
            ..Default::default()
        }
    }

    fn sleep(date: &str, hours: u32) -> SleepRecord {
        SleepRecord {
            date: date.to_string(),
            hours,
            ..Default::default()
        }
    }

    #[test]
    fn test_projection_needs_two_tests() {
        let mut user = User::default();
        assert_eq!(consecutive_delta_projection(&user, today()), NapfaProjection::NoTests);

        user.napfa_history.push(napfa("2026-01-01", 15));
        assert_eq!(
            consecutive_delta_projection(&user, today()),
            NapfaProjection::SingleTest {
                current_score: 15,
                points_needed: 6
            }
        );
    }

    #[test]
    fn test_projection_rate_and_gold_date() {
        let mut user = User::default();
        user.napfa_history.push(napfa("2026-01-01", 12));
        user.napfa_history.push(napfa("2026-01-31", 15));

        let NapfaProjection::Trend {
            rate_per_day,
            outlook,
            points,
            confidence,
            ..
        } = consecutive_delta_projection(&user, today())
        else {
            panic!("expected a trend");
        };

        assert!((rate_per_day - 0.1).abs() < 1e-9);
        assert_eq!(confidence, "Low");
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].score, 15.0);
        assert!((points[1].score - 18.0).abs() < 1e-9);
        // Clamped at the maximum total
        assert_eq!(points[6].score, 30.0);
        match outlook {
            GoldOutlook::Predicted {
                points_needed,
                days_to_gold,
                ..
            } => {
                assert_eq!(points_needed, 6);
                assert!((days_to_gold - 60.0).abs() < 1e-6);
            }
            other => panic!("unexpected outlook {other:?}"),
        }
    }

    #[test]
    fn test_projection_declining_never_negative() {
        let mut user = User::default();
        user.napfa_history.push(napfa("2026-01-01", 10));
        user.napfa_history.push(napfa("2026-01-11", 5));

        let NapfaProjection::Trend { outlook, points, .. } =
            consecutive_delta_projection(&user, today())
        else {
            panic!("expected a trend");
        };
        assert_eq!(outlook, GoldOutlook::Declining { points_needed: 16 });
        assert!(points.iter().all(|p| p.score >= 0.0));
        assert_eq!(points[6].score, 0.0);
    }

    #[test]
    fn test_projection_same_day_tests() {
        let mut user = User::default();
        user.napfa_history.push(napfa("2026-01-01", 10));
        user.napfa_history.push(napfa("2026-01-01", 12));
        assert_eq!(
            consecutive_delta_projection(&user, today()),
            NapfaProjection::NoTimeSpan { current_score: 12 }
        );
    }

    #[test]
    fn test_sleep_impact_ratings() {
        let mut user = User::default();
        user.napfa_history.push(napfa("2026-01-01", 18));
        for d in 1..=7 {
            user.sleep_history.push(sleep(&format!("2026-05-{:02}", d), 7));
        }
        let impact = sleep_impact(&user).unwrap();
        assert_eq!(impact.rating, "Good");
        assert_eq!(impact.potential_gain, 2.5);

        user.sleep_history.pop();
        assert!(sleep_impact(&user).is_none());
    }

    #[test]
    fn test_injury_risk_high_intensity_and_inactive() {
        let mut user = User::default();
        for _ in 0..5 {
            user.exercises.push(ExerciseEntry {
                date: "2026-01-01".to_string(),
                intensity: Intensity::High,
                ..Default::default()
            });
        }
        let risk = injury_risk(&user, today()).unwrap();
        // >70% high intensity (30) and under two workouts a week (15)
        assert_eq!(risk.score, 45);
        assert_eq!(risk.level, "Moderate Risk");
        assert_eq!(risk.factors.len(), 2);
    }

    #[test]
    fn test_injury_risk_needs_five_workouts() {
        let mut user = User::default();
        user.exercises.push(ExerciseEntry::default());
        assert!(injury_risk(&user, today()).is_none());
    }

    #[test]
    fn test_weekly_report_counts_recent_activity() {
        let mut user = User::default();
        user.exercises.push(ExerciseEntry {
            name: "Jog".to_string(),
            date: "2026-05-30".to_string(),
            duration: 25,
            ..Default::default()
        });
        user.exercises.push(ExerciseEntry {
            name: "Jog".to_string(),
            date: "2026-04-01".to_string(),
            duration: 40,
            ..Default::default()
        });
        user.napfa_history.push(napfa("2026-01-01", 10));
        user.napfa_history.push(napfa("2026-03-01", 14));

        let report = weekly_report(&user, today());
        assert_eq!(report.workouts_this_week, 1);
        assert_eq!(report.minutes_this_week, 25);
        assert_eq!(report.total_minutes, 65);
        assert_eq!(report.exercise_frequency["Jog"], 2);
        assert_eq!(report.napfa_improvement, Some(4));
        assert_eq!(report.level, "Novice");
    }
}
