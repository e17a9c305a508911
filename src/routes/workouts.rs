// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live workout session (rep counter and timers) and saving workouts.

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Intensity;
use crate::routes::{current, current_mut, MessageResponse};
use crate::services::session::{
    IntervalStatus, IntervalTimer, RepCounter, SetLog, SimpleTimer, TimerStatus, WorkoutSession,
};
use crate::services::workout::{
    self, CardioWorkout, CounterWorkout, PhotoCheck, SavedWorkout, WorkoutHistory,
};
use crate::time_utils::now_local;
use crate::AppState;

/// Photos arrive inline as base64, so saves need more than axum's 2 MB default.
const MAX_WORKOUT_BODY: usize = 12 * 1024 * 1024;
/// 120:59 on the simple timer.
const MAX_TIMER_SECONDS: u64 = 120 * 60 + 59;
const MIN_PERIOD_SECONDS: u64 = 5;
const MAX_PERIOD_SECONDS: u64 = 300;
const MAX_INTERVAL_ROUNDS: u32 = 50;
/// The counter's +1 and +5 buttons.
const COUNTER_STEPS: [u32; 2] = [1, 5];

pub fn routes() -> Router<Arc<AppState>> {
    let saves = Router::new()
        .route("/api/workouts/counter", post(save_counter))
        .route("/api/workouts/cardio", post(save_cardio))
        .layer(DefaultBodyLimit::max(MAX_WORKOUT_BODY));

    Router::new()
        .route("/api/session", get(get_session).delete(clear_session))
        .route("/api/session/counter", post(counter_action))
        .route("/api/session/timer", post(timer_action))
        .route("/api/session/interval", post(interval_action))
        .route("/api/workouts", get(get_history))
        .merge(saves)
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub counter: RepCounter,
    /// Finished sets plus the set in progress
    pub all_sets: Vec<SetLog>,
    pub timer: Option<TimerStatus>,
    pub interval: Option<IntervalStatus>,
}

fn view(session: &mut WorkoutSession, now: Instant) -> SessionView {
    SessionView {
        counter: session.counter.clone(),
        all_sets: session.counter.all_sets(),
        timer: session.timer.as_mut().map(|t| t.status(now)),
        interval: session.interval.as_mut().map(|i| i.status(now)),
    }
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionView> {
    let now = Instant::now();
    Json(state.sessions.with(&user.username, |s| view(s, now)))
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<MessageResponse> {
    state.sessions.clear(&user.username);
    MessageResponse::new("Session cleared")
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CounterAction {
    Select { exercise: String },
    Add {
        #[serde(default = "one")]
        amount: u32,
    },
    Decrement,
    Reset,
    FinishSet,
}

async fn counter_action(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(action): Json<CounterAction>,
) -> Result<Json<SessionView>> {
    match &action {
        CounterAction::Select { exercise } if exercise.trim().is_empty() => {
            return Err(AppError::bad_request("Exercise name is required"));
        }
        CounterAction::Add { amount } if !COUNTER_STEPS.contains(amount) => {
            return Err(AppError::bad_request("Reps can only be added one or five at a time"));
        }
        _ => {}
    }
    let now = Instant::now();
    let view = state.sessions.with(&user.username, |s| {
        match action {
            CounterAction::Select { exercise } => s.counter.select_exercise(exercise.trim()),
            CounterAction::Add { amount } => s.counter.add(amount),
            CounterAction::Decrement => s.counter.decrement(),
            CounterAction::Reset => s.counter.reset_reps(),
            CounterAction::FinishSet => {
                if let Some(set) = s.counter.finish_set() {
                    tracing::debug!(set = set.set, reps = set.reps, "Set finished");
                }
            }
        }
        view(s, now)
    });
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TimerAction {
    Set { seconds: u64 },
    Start,
    Pause,
    Reset,
}

async fn timer_action(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(action): Json<TimerAction>,
) -> Result<Json<SessionView>> {
    if let TimerAction::Set { seconds } = action {
        if !(1..=MAX_TIMER_SECONDS).contains(&seconds) {
            return Err(AppError::bad_request(format!(
                "Timer must be between 1 and {MAX_TIMER_SECONDS} seconds"
            )));
        }
    }
    let now = Instant::now();
    let result = state.sessions.with(&user.username, |s| {
        match action {
            TimerAction::Set { seconds } => {
                s.timer = Some(SimpleTimer::new(seconds));
                s.interval = None;
            }
            TimerAction::Start => s.timer.as_mut().ok_or("Set the timer first")?.start(now),
            TimerAction::Pause => s.timer.as_mut().ok_or("Set the timer first")?.pause(now),
            TimerAction::Reset => s.timer.as_mut().ok_or("Set the timer first")?.reset(),
        }
        Ok::<_, &str>(view(s, now))
    });
    result.map(Json).map_err(AppError::bad_request)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IntervalAction {
    Set {
        work_seconds: u64,
        rest_seconds: u64,
        rounds: u32,
    },
    Start,
    Pause,
    Reset,
}

async fn interval_action(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(action): Json<IntervalAction>,
) -> Result<Json<SessionView>> {
    if let IntervalAction::Set {
        work_seconds,
        rest_seconds,
        rounds,
    } = action
    {
        let periods = MIN_PERIOD_SECONDS..=MAX_PERIOD_SECONDS;
        if !periods.contains(&work_seconds) || !periods.contains(&rest_seconds) {
            return Err(AppError::bad_request(format!(
                "Work and rest periods must be between {MIN_PERIOD_SECONDS} and {MAX_PERIOD_SECONDS} seconds"
            )));
        }
        if !(1..=MAX_INTERVAL_ROUNDS).contains(&rounds) {
            return Err(AppError::bad_request(format!(
                "Rounds must be between 1 and {MAX_INTERVAL_ROUNDS}"
            )));
        }
    }
    let now = Instant::now();
    let result = state.sessions.with(&user.username, |s| {
        match action {
            IntervalAction::Set {
                work_seconds,
                rest_seconds,
                rounds,
            } => {
                s.interval = Some(IntervalTimer::new(work_seconds, rest_seconds, rounds));
                s.timer = None;
            }
            IntervalAction::Start => s.interval.as_mut().ok_or("Set up the intervals first")?.start(now),
            IntervalAction::Pause => s.interval.as_mut().ok_or("Set up the intervals first")?.pause(now),
            IntervalAction::Reset => s.interval.as_mut().ok_or("Set up the intervals first")?.reset(),
        }
        Ok::<_, &str>(view(s, now))
    });
    result.map(Json).map_err(AppError::bad_request)
}

// ─── Saving workouts ─────────────────────────────────────────

/// Decode-check an optional photo and have it judged.
///
/// The vision call happens outside the store lock; only the strictness is
/// read under it.
async fn check_photo(
    state: &AppState,
    username: &str,
    photo_b64: Option<String>,
    exercise: &str,
) -> Result<Option<PhotoCheck>> {
    let Some(photo) = photo_b64 else {
        return Ok(None);
    };
    let photo = photo.trim();
    let photo = match photo.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => photo,
    };
    if photo.is_empty() {
        return Ok(None);
    }
    STANDARD
        .decode(photo)
        .map_err(|_| AppError::bad_request("Photo is not valid base64"))?;

    let strictness = state
        .store
        .read(|s| current(s, username).map(|u| workout::strictness_for(s, u)))
        .await?;
    let verification = state.vision.verify(photo, exercise, strictness).await;
    Ok(Some(PhotoCheck {
        photo_b64: photo.to_string(),
        verification,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CounterSaveRequest {
    pub duration: u32,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub notes: String,
    pub photo_b64: Option<String>,
}

/// Save the reps in the session counter as a workout.
async fn save_counter(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CounterSaveRequest>,
) -> Result<Json<SavedWorkout>> {
    let (exercise, sets) = state.sessions.with(&user.username, |s| {
        (s.counter.exercise.clone(), s.counter.all_sets())
    });
    if exercise.is_empty() {
        return Err(AppError::bad_request("Select an exercise first"));
    }
    if sets.iter().all(|s| s.reps == 0) {
        return Err(workout::WorkoutError::NoSets.into());
    }

    let photo = check_photo(&state, &user.username, req.photo_b64, &exercise).await?;
    let counter = CounterWorkout {
        exercise: exercise.clone(),
        sets,
        duration: req.duration,
        intensity: req.intensity,
        notes: req.notes,
    };
    let now = now_local();
    let saved = state
        .store
        .update(|s| {
            let student = current_mut(s, &user.username)?;
            Ok::<_, AppError>(workout::record_counter(student, counter, photo, now)?)
        })
        .await?;

    state.sessions.with(&user.username, |s| {
        s.counter = RepCounter::default();
        s.counter.select_exercise(&exercise);
    });
    tracing::info!(
        username = %user.username,
        exercise = %exercise,
        points = saved.workout.points_earned,
        "Counter workout saved"
    );
    Ok(Json(saved))
}

#[derive(Debug, Deserialize)]
pub struct CardioSaveRequest {
    pub activity: String,
    /// Manual minutes, used when the timer was not run
    pub duration: Option<u32>,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub notes: String,
    pub photo_b64: Option<String>,
}

/// Save a cardio workout timed by the session timer or entered by hand.
async fn save_cardio(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CardioSaveRequest>,
) -> Result<Json<SavedWorkout>> {
    let activity = req.activity.trim().to_string();
    if activity.is_empty() {
        return Err(AppError::bad_request("Activity is required"));
    }
    let timer_minutes = state
        .sessions
        .with(&user.username, |s| s.timer_minutes(Instant::now()));

    let photo = check_photo(&state, &user.username, req.photo_b64, &activity).await?;
    let cardio = CardioWorkout {
        activity: activity.clone(),
        timer_minutes,
        duration: req.duration,
        distance_km: req.distance_km,
        intensity: req.intensity,
        notes: req.notes,
    };
    let now = now_local();
    let saved = state
        .store
        .update(|s| {
            let student = current_mut(s, &user.username)?;
            Ok::<_, AppError>(workout::record_cardio(student, cardio, photo, now)?)
        })
        .await?;

    state.sessions.with(&user.username, WorkoutSession::clear_timers);
    tracing::info!(
        username = %user.username,
        activity = %activity,
        points = saved.workout.points_earned,
        "Cardio workout saved"
    );
    Ok(Json(saved))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WorkoutHistory>> {
    let now = now_local();
    let history = state
        .store
        .read(|s| current(s, &user.username).map(|u| workout::history(u, now)))
        .await?;
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_actions_parse() {
        let add: CounterAction = serde_json::from_str(r#"{"action":"add"}"#).unwrap();
        assert!(matches!(add, CounterAction::Add { amount: 1 }));

        let add: CounterAction = serde_json::from_str(r#"{"action":"add","amount":5}"#).unwrap();
        assert!(matches!(add, CounterAction::Add { amount: 5 }));

        let finish: CounterAction = serde_json::from_str(r#"{"action":"finish_set"}"#).unwrap();
        assert!(matches!(finish, CounterAction::FinishSet));
    }

    #[test]
    fn test_view_includes_set_in_progress() {
        let mut session = WorkoutSession::default();
        session.counter.select_exercise("Push-ups");
        session.counter.add(10);
        session.counter.finish_set();
        session.counter.add(4);

        let v = view(&mut session, Instant::now());
        assert_eq!(v.all_sets.len(), 2);
        assert!(v.timer.is_none());
        assert!(v.interval.is_none());
    }
}
