// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress insights, goals, training plans, schedule and reminders.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Badge, Goal, ScheduleEntry, SmartGoal};
use crate::routes::{current, current_mut, MessageResponse};
use crate::services::badges::award_badges;
use crate::services::goals::{self, Assessment, NewSmartGoal};
use crate::services::insights::{self, InjuryRisk, NapfaProjection, SleepImpact, WeeklyReport};
use crate::services::planner::{self, Reminders, ScheduleError, TrainingPlan};
use crate::time_utils::today;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/insights/projection", get(get_projection))
        .route("/api/insights/sleep-impact", get(get_sleep_impact))
        .route("/api/insights/injury-risk", get(get_injury_risk))
        .route("/api/insights/weekly-report", get(get_weekly_report))
        .route("/api/goals/smart", get(list_smart_goals).post(create_smart_goal))
        .route(
            "/api/goals/smart/{index}",
            put(update_smart_goal).delete(delete_smart_goal),
        )
        .route("/api/goals", get(list_goals).post(add_goal))
        .route("/api/goals/{index}", put(update_goal))
        .route("/api/plan", get(get_plan))
        .route("/api/plan/save", post(save_plan))
        .route("/api/schedule", get(get_schedule).post(add_schedule_entry))
        .route("/api/schedule/{index}", delete(delete_schedule_entry))
        .route("/api/reminders", get(get_reminders))
}

// ─── Insights ────────────────────────────────────────────────

async fn get_projection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<NapfaProjection>> {
    let today = today();
    let projection = state
        .store
        .read(|s| current(s, &user.username).map(|u| insights::consecutive_delta_projection(u, today)))
        .await?;
    Ok(Json(projection))
}

/// `null` until there are enough sleep records and a NAPFA test.
async fn get_sleep_impact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Option<SleepImpact>>> {
    let impact = state
        .store
        .read(|s| current(s, &user.username).map(insights::sleep_impact))
        .await?;
    Ok(Json(impact))
}

/// `null` until enough workouts are logged.
async fn get_injury_risk(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Option<InjuryRisk>>> {
    let today = today();
    let risk = state
        .store
        .read(|s| current(s, &user.username).map(|u| insights::injury_risk(u, today)))
        .await?;
    Ok(Json(risk))
}

async fn get_weekly_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WeeklyReport>> {
    let today = today();
    let report = state
        .store
        .read(|s| current(s, &user.username).map(|u| insights::weekly_report(u, today)))
        .await?;
    Ok(Json(report))
}

// ─── SMART goals ─────────────────────────────────────────────

async fn list_smart_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SmartGoal>>> {
    let goals = state
        .store
        .read(|s| current(s, &user.username).map(|u| u.smart_goals.clone()))
        .await?;
    Ok(Json(goals))
}

#[derive(Debug, Serialize)]
pub struct SmartGoalCreated {
    pub index: usize,
    pub goal: SmartGoal,
    pub assessment: Assessment,
}

async fn create_smart_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewSmartGoal>,
) -> Result<Json<SmartGoalCreated>> {
    let today = today();
    let created = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            let (goal, assessment) = goals::build_goal(&req, me, today)?;
            me.smart_goals.push(goal.clone());
            Ok::<_, AppError>(SmartGoalCreated {
                index: me.smart_goals.len() - 1,
                goal,
                assessment,
            })
        })
        .await?;
    tracing::info!(
        username = %user.username,
        category = %created.goal.category,
        rating = created.assessment.rating,
        "SMART goal created"
    );
    Ok(Json(created))
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub progress: u32,
}

#[derive(Debug, Serialize)]
pub struct ProgressUpdated {
    pub progress: u32,
    pub new_badges: Vec<Badge>,
}

async fn update_smart_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(index): Path<usize>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressUpdated>> {
    let today = today();
    let updated = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            goals::update_progress(me, index, req.progress, today)?;
            Ok::<_, AppError>(ProgressUpdated {
                progress: req.progress,
                new_badges: award_badges(me, today),
            })
        })
        .await?;
    Ok(Json(updated))
}

async fn delete_smart_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(index): Path<usize>,
) -> Result<Json<MessageResponse>> {
    let removed = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            Ok::<_, AppError>(goals::delete_goal(me, index)?)
        })
        .await?;
    Ok(MessageResponse::new(format!("Deleted goal: {}", removed.specific)))
}

// ─── Simple goals ────────────────────────────────────────────

async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Goal>>> {
    let goals = state
        .store
        .read(|s| current(s, &user.username).map(|u| u.goals.clone()))
        .await?;
    Ok(Json(goals))
}

#[derive(Debug, Deserialize)]
pub struct NewGoal {
    pub target: String,
    /// Deadline (YYYY-MM-DD)
    pub date: String,
}

async fn add_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewGoal>,
) -> Result<Json<Goal>> {
    let goal = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            Ok::<_, AppError>(goals::add_simple_goal(me, &req.target, &req.date)?)
        })
        .await?;
    Ok(Json(goal))
}

async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(index): Path<usize>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressUpdated>> {
    let today = today();
    let updated = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            goals::set_simple_goal_progress(me, index, req.progress)?;
            Ok::<_, AppError>(ProgressUpdated {
                progress: req.progress,
                new_badges: award_badges(me, today),
            })
        })
        .await?;
    Ok(Json(updated))
}

// ─── Training plan ───────────────────────────────────────────

async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TrainingPlan>> {
    let plan = state
        .store
        .read(|s| {
            let me = current(s, &user.username)?;
            Ok::<_, AppError>(planner::generate_plan(me)?)
        })
        .await?;
    Ok(Json(plan))
}

/// Generate the plan and keep it on the profile.
async fn save_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TrainingPlan>> {
    let plan = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            let plan = planner::generate_plan(me)?;
            let value = serde_json::to_value(&plan)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Plan serialization failed: {e}")))?;
            me.saved_workout_plan = Some(value);
            Ok::<_, AppError>(plan)
        })
        .await?;
    tracing::info!(username = %user.username, "Training plan saved");
    Ok(Json(plan))
}

// ─── Schedule ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DaySchedule {
    pub day: &'static str,
    pub entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleView {
    /// In insertion order; positions are the indexes used for deletion
    pub entries: Vec<ScheduleEntry>,
    pub by_day: Vec<DaySchedule>,
}

async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ScheduleView>> {
    let view = state
        .store
        .read(|s| {
            current(s, &user.username).map(|u| ScheduleView {
                entries: u.schedule.clone(),
                by_day: planner::weekly_schedule(u)
                    .into_iter()
                    .map(|(day, entries)| DaySchedule {
                        day,
                        entries: entries.into_iter().cloned().collect(),
                    })
                    .collect(),
            })
        })
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct NewScheduleEntry {
    pub day: String,
    pub activity: String,
    #[serde(default)]
    pub time: String,
    pub duration: u32,
}

async fn add_schedule_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewScheduleEntry>,
) -> Result<Json<ScheduleEntry>> {
    let entry = planner::schedule_entry(&req.day, &req.activity, &req.time, req.duration)?;
    state
        .store
        .update(|s| {
            current_mut(s, &user.username)?.schedule.push(entry.clone());
            Ok::<_, AppError>(())
        })
        .await?;
    Ok(Json(entry))
}

async fn delete_schedule_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(index): Path<usize>,
) -> Result<Json<MessageResponse>> {
    let removed = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            if index >= me.schedule.len() {
                return Err(AppError::from(ScheduleError::NoSuchEntry(index)));
            }
            Ok::<_, AppError>(me.schedule.remove(index))
        })
        .await?;
    Ok(MessageResponse::new(format!(
        "Removed {} on {}",
        removed.activity, removed.day
    )))
}

async fn get_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Reminders>> {
    let today = today();
    let reminders = state
        .store
        .read(|s| current(s, &user.username).map(|u| planner::reminders(u, today)))
        .await?;
    Ok(Json(reminders))
}
