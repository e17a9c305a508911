// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saving counter and cardio workouts: points, steps, house credit.
//!
//! Photo verification happens before the store lock is taken. The
//! functions here only apply an already-known verdict to the user record.

use crate::db::Store;
use crate::models::{
    Badge, ExerciseEntry, Intensity, StepsEntry, User, VerificationStatus, WorkoutType,
};
use crate::models::user::DEFAULT_STRICTNESS;
use crate::services::badges::award_badges;
use crate::services::session::SetLog;
use crate::services::vision::{Verdict, Verification};
use crate::time_utils::{format_clock, format_date, parse_date};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

pub const PLANK: &str = "Plank (seconds)";
/// Cardio timers shorter than this fall back to the entered duration.
const MIN_TIMER_MINUTES: f64 = 0.1;
/// Longest cardio session credited, timed or entered.
pub const MAX_CARDIO_MINUTES: u32 = 300;

/// Points per minute for (no photo, verified, failed, unverifiable photo).
struct Rates {
    plain: f64,
    verified: f64,
    failed: f64,
    mock: f64,
}

const COUNTER_RATES: Rates = Rates {
    plain: 5.0,
    verified: 10.0,
    failed: 3.0,
    mock: 10.0,
};

const CARDIO_RATES: Rates = Rates {
    plain: 8.0,
    verified: 12.0,
    failed: 8.0,
    mock: 10.0,
};

fn score(rates: &Rates, minutes: f64, verification: Option<&Verification>) -> (i64, VerificationStatus) {
    let (rate, status) = match verification.map(|v| v.verdict) {
        None => (rates.plain, VerificationStatus::Unverified),
        Some(Verdict::Valid) => (rates.verified, VerificationStatus::Verified),
        Some(Verdict::Invalid) => (rates.failed, VerificationStatus::Failed),
        Some(Verdict::Unknown) => (rates.mock, VerificationStatus::Mock),
    };
    ((minutes * rate) as i64, status)
}

pub fn counter_points(minutes: u32, verification: Option<&Verification>) -> (i64, VerificationStatus) {
    score(&COUNTER_RATES, f64::from(minutes), verification)
}

pub fn cardio_points(minutes: f64, verification: Option<&Verification>) -> (i64, VerificationStatus) {
    score(&CARDIO_RATES, minutes, verification)
}

pub fn steps_per_minute(activity: &str) -> u32 {
    match activity {
        "Walk" => 100,
        "Jog" => 140,
        "Run" => 170,
        "Sprint" => 200,
        _ => 120,
    }
}

/// Verification strictness set by the student's teacher.
pub fn strictness_for(store: &Store, student: &User) -> u8 {
    student
        .teacher_class
        .as_deref()
        .and_then(|t| store.user(t))
        .map_or(DEFAULT_STRICTNESS, User::strictness)
}

/// A verified (or unverifiable) photo attached to a workout.
#[derive(Debug, Clone)]
pub struct PhotoCheck {
    pub photo_b64: String,
    pub verification: Verification,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WorkoutError {
    #[error("Log at least one set or some reps first")]
    NoSets,
    #[error("Duration must be between 1 and {0} minutes")]
    BadDuration(u32),
}

#[derive(Debug, Clone)]
pub struct CounterWorkout {
    pub exercise: String,
    pub sets: Vec<SetLog>,
    pub duration: u32,
    pub intensity: Intensity,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct CardioWorkout {
    pub activity: String,
    /// Minutes measured by the session timer
    pub timer_minutes: f64,
    /// Minutes entered by hand, used when the timer was not run
    pub duration: Option<u32>,
    pub distance_km: f64,
    pub intensity: Intensity,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedWorkout {
    pub workout: ExerciseEntry,
    pub new_badges: Vec<Badge>,
    pub total_points: i64,
    pub level: String,
}

fn new_entry(
    name: &str,
    duration: u32,
    intensity: Intensity,
    notes: String,
    points: i64,
    status: VerificationStatus,
    photo: Option<PhotoCheck>,
    now: NaiveDateTime,
) -> ExerciseEntry {
    let (ai_feedback, photo_b64) = match photo {
        Some(p) => (Some(p.verification.feedback), Some(p.photo_b64)),
        None => (None, None),
    };
    ExerciseEntry {
        name: name.to_string(),
        date: format_date(now.date()),
        time: format_clock(now),
        duration,
        intensity,
        notes,
        points_earned: points,
        ai_feedback,
        verification_status: status,
        has_photo: photo_b64.is_some(),
        photo_b64,
        ..Default::default()
    }
}

/// Newest first, credit points and house hours, then check badges.
fn credit(user: &mut User, entry: ExerciseEntry, hours: f64, now: NaiveDateTime) -> SavedWorkout {
    user.total_points += entry.points_earned;
    user.house_points_contributed += hours;
    user.total_workout_hours += hours;
    user.exercises.insert(0, entry.clone());

    let new_badges = award_badges(user, now.date());
    SavedWorkout {
        workout: entry,
        new_badges,
        total_points: user.total_points,
        level: user.level.clone(),
    }
}

pub fn record_counter(
    user: &mut User,
    workout: CounterWorkout,
    photo: Option<PhotoCheck>,
    now: NaiveDateTime,
) -> Result<SavedWorkout, WorkoutError> {
    if workout.sets.iter().all(|s| s.reps == 0) {
        return Err(WorkoutError::NoSets);
    }
    if !(1..=180).contains(&workout.duration) {
        return Err(WorkoutError::BadDuration(180));
    }

    let (points, status) = counter_points(workout.duration, photo.as_ref().map(|p| &p.verification));
    let sets: Vec<&SetLog> = workout.sets.iter().filter(|s| s.reps > 0).collect();
    let unit = if workout.exercise == PLANK { "sec" } else { "reps" };

    let mut entry = new_entry(
        &workout.exercise,
        workout.duration,
        workout.intensity,
        workout.notes,
        points,
        status,
        photo,
        now,
    );
    entry.sets = Some(sets.len() as u32);
    entry.total_reps = Some(sets.iter().map(|s| s.reps).sum());
    entry.reps_unit = Some(unit.to_string());
    entry.workout_type = WorkoutType::Counter;

    let hours = f64::from(workout.duration) / 60.0;
    Ok(credit(user, entry, hours, now))
}

pub fn record_cardio(
    user: &mut User,
    workout: CardioWorkout,
    photo: Option<PhotoCheck>,
    now: NaiveDateTime,
) -> Result<SavedWorkout, WorkoutError> {
    let minutes = if workout.timer_minutes > MIN_TIMER_MINUTES {
        workout.timer_minutes.min(f64::from(MAX_CARDIO_MINUTES))
    } else {
        match workout.duration {
            Some(d) if (1..=MAX_CARDIO_MINUTES).contains(&d) => f64::from(d),
            _ => return Err(WorkoutError::BadDuration(MAX_CARDIO_MINUTES)),
        }
    };

    let (points, status) = cardio_points(minutes, photo.as_ref().map(|p| &p.verification));
    let steps = (f64::from(steps_per_minute(&workout.activity)) * minutes) as u64;
    let distance = workout.distance_km.max(0.0);

    let mut entry = new_entry(
        &workout.activity,
        minutes as u32,
        workout.intensity,
        workout.notes,
        points,
        status,
        photo,
        now,
    );
    entry.distance_km = Some(distance);
    entry.estimated_steps = Some(steps);
    entry.workout_type = WorkoutType::Cardio;

    user.steps_data.insert(
        0,
        StepsEntry {
            date: entry.date.clone(),
            kind: "run_walk".to_string(),
            activity: workout.activity.clone(),
            distance_km: distance,
            duration_min: minutes as u32,
            steps,
            points_earned: points / 10,
        },
    );

    Ok(credit(user, entry, minutes / 60.0, now))
}

// ─── History ─────────────────────────────────────────────────

pub const RECENT_WORKOUTS: usize = 15;

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutHistory {
    pub total_workouts: usize,
    pub total_minutes: u64,
    pub total_points: i64,
    pub this_week: usize,
    pub recent: Vec<ExerciseEntry>,
    /// Workout count per exercise name
    pub breakdown: BTreeMap<String, usize>,
}

/// Summary of logged workouts. Photos are left out of `recent`.
pub fn history(user: &User, now: NaiveDateTime) -> WorkoutHistory {
    let week_ago = now.date() - Duration::days(7);
    let mut breakdown = BTreeMap::new();
    for e in &user.exercises {
        *breakdown.entry(e.name.clone()).or_insert(0) += 1;
    }

    WorkoutHistory {
        total_workouts: user.exercises.len(),
        total_minutes: user.exercises.iter().map(|e| u64::from(e.duration)).sum(),
        total_points: user.exercises.iter().map(|e| e.points_earned).sum(),
        this_week: user
            .exercises
            .iter()
            .filter(|e| parse_date(&e.date).is_some_and(|d| d >= week_ago))
            .count(),
        recent: user
            .exercises
            .iter()
            .take(RECENT_WORKOUTS)
            .map(|e| ExerciseEntry {
                photo_b64: None,
                ..e.clone()
            })
            .collect(),
        breakdown,
    }
}
