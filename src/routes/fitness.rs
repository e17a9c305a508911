// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, health calculators, NAPFA tests and achievements.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Badge, BmiRecord, BmrRecord, BodyCompRecord, HeartRateRecord, NapfaResult, Role,
    SleepRecord,
};
use crate::routes::{current, current_mut};
use crate::services::badges::{self, BadgeInfo, Level};
use crate::services::health::{self, ActivityLevel, BodyType, HeartRateZone, Measurements, MetabolicProfile};
use crate::services::napfa::{self, Gender, NapfaScores};
use crate::services::streak::user_workout_streak;
use crate::time_utils::{format_date, parse_clock, today};
use crate::AppState;

/// Oldest age offered when the NAPFA age is taken from the profile.
const NAPFA_DEFAULT_MAX_AGE: u32 = 16;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/records", get(get_records))
        .route("/api/bmi", post(log_bmi))
        .route("/api/napfa", post(log_napfa))
        .route("/api/sleep", post(log_sleep))
        .route("/api/bmr", post(log_bmr))
        .route("/api/heart-rate", post(log_heart_rate))
        .route("/api/body-fat", post(log_body_fat))
        .route("/api/achievements", get(get_achievements))
        .route("/api/achievements/check", post(check_achievements))
}

/// Gender from the request, falling back to the profile.
fn resolve_gender(requested: Option<&str>, profile: &str) -> Result<Gender> {
    let value = requested.unwrap_or(profile);
    Gender::parse(value).ok_or_else(|| AppError::bad_request(format!("Unknown gender: {value}")))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub school: String,
    pub age: u32,
    pub gender: String,
    pub house: Option<String>,
    pub level: Level,
    pub level_progress: f64,
    pub total_points: i64,
    pub login_streak: u32,
    pub workout_streak: u32,
    pub badges: usize,
    pub show_on_leaderboards: bool,
    /// Label of the class a student belongs to
    pub class: Option<String>,
    /// Teachers only
    pub class_code: Option<String>,
    pub latest_bmi: Option<BmiRecord>,
    pub latest_napfa: Option<NapfaResult>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let today = today();
    state
        .store
        .read(|s| {
            let u = current(s, &user.username)?;
            Ok::<_, AppError>(Json(ProfileResponse {
                username: user.username.clone(),
                name: u.name.clone(),
                email: u.email.clone(),
                role: u.role,
                school: u.school.clone(),
                age: health::user_age(u, today),
                gender: u.gender.clone(),
                house: u.house.clone(),
                level: badges::level_for(u.total_points),
                level_progress: badges::level_progress(u.total_points),
                total_points: u.total_points,
                login_streak: u.login_streak,
                workout_streak: user_workout_streak(u),
                badges: u.badges.len(),
                show_on_leaderboards: u.show_on_leaderboards,
                class: u
                    .teacher_class
                    .as_deref()
                    .and_then(|t| s.user(t))
                    .map(|t| t.class_display_label()),
                class_code: u.class_code.clone(),
                latest_bmi: u.bmi_history.last().cloned(),
                latest_napfa: u.latest_napfa().cloned(),
            }))
        })
        .await
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub bmi_history: Vec<BmiRecord>,
    pub napfa_history: Vec<NapfaResult>,
    pub sleep_history: Vec<SleepRecord>,
    pub bmr_history: Vec<BmrRecord>,
    pub heart_rate_data: Vec<HeartRateRecord>,
    pub body_comp_history: Vec<BodyCompRecord>,
}

async fn get_records(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecordsResponse>> {
    state
        .store
        .read(|s| {
            let u = current(s, &user.username)?;
            Ok::<_, AppError>(Json(RecordsResponse {
                bmi_history: u.bmi_history.clone(),
                napfa_history: u.napfa_history.clone(),
                sleep_history: u.sleep_history.clone(),
                bmr_history: u.bmr_history.clone(),
                heart_rate_data: u.heart_rate_data.clone(),
                body_comp_history: u.body_comp_history.clone(),
            }))
        })
        .await
}

// ─── BMI ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct BmiRequest {
    #[validate(range(min = 20.0, max = 200.0))]
    pub weight_kg: f64,
    /// Metres
    #[validate(range(min = 1.0, max = 2.5))]
    pub height_m: f64,
}

#[derive(Debug, Serialize)]
pub struct BmiResponse {
    pub record: BmiRecord,
    pub body_type: BodyType,
    pub new_badges: Vec<Badge>,
}

async fn log_bmi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BmiRequest>,
) -> Result<Json<BmiResponse>> {
    req.validate()?;
    let today = today();
    let record = health::bmi_record(req.weight_kg, req.height_m, &format_date(today));

    let new_badges = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            u.bmi_history.push(record.clone());
            Ok::<_, AppError>(badges::award_badges(u, today))
        })
        .await?;

    tracing::info!(username = %user.username, bmi = record.bmi, "BMI recorded");
    Ok(Json(BmiResponse {
        body_type: health::body_type(req.weight_kg, req.height_m),
        record,
        new_badges,
    }))
}

// ─── NAPFA ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct NapfaRequest {
    /// Defaults to the profile age (12-16)
    pub age: Option<u32>,
    /// Defaults to the profile gender
    pub gender: Option<String>,
    #[validate(range(max = 100))]
    pub sit_ups: u32,
    #[validate(range(max = 400))]
    pub broad_jump_cm: u32,
    #[validate(range(max = 100))]
    pub sit_reach_cm: u32,
    #[validate(range(max = 50))]
    pub pull_ups: u32,
    #[validate(range(min = 0.0, max = 30.0))]
    pub shuttle_run_s: f64,
    /// 2.4km run time as "m:ss"
    pub run_time: String,
}

#[derive(Debug, Serialize)]
pub struct NapfaResponse {
    pub result: NapfaResult,
    pub new_badges: Vec<Badge>,
}

async fn log_napfa(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NapfaRequest>,
) -> Result<Json<NapfaResponse>> {
    req.validate()?;
    let today = today();
    let scores = NapfaScores {
        sit_ups: f64::from(req.sit_ups),
        broad_jump_cm: f64::from(req.broad_jump_cm),
        sit_reach_cm: f64::from(req.sit_reach_cm),
        pull_ups: f64::from(req.pull_ups),
        shuttle_run_s: req.shuttle_run_s,
        run_minutes: napfa::parse_run_time(&req.run_time)?,
    };

    let (result, new_badges) = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            let age = req.age.unwrap_or_else(|| {
                health::user_age(u, today).clamp(napfa::MIN_AGE, NAPFA_DEFAULT_MAX_AGE)
            });
            let gender = resolve_gender(req.gender.as_deref(), &u.gender)?;
            let result = napfa::grade_test(age, gender, &scores, &format_date(today))?;
            u.napfa_history.push(result.clone());
            let new_badges = badges::award_badges(u, today);
            Ok::<_, AppError>((result, new_badges))
        })
        .await?;

    tracing::info!(
        username = %user.username,
        total = result.total,
        medal = %result.medal,
        "NAPFA test recorded"
    );
    Ok(Json(NapfaResponse { result, new_badges }))
}

// ─── Sleep ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SleepRequest {
    /// "HH:MM"
    pub sleep_start: String,
    /// "HH:MM", may be past midnight
    pub sleep_end: String,
}

#[derive(Debug, Serialize)]
pub struct SleepResponse {
    pub record: SleepRecord,
    pub advice: &'static str,
    pub new_badges: Vec<Badge>,
}

async fn log_sleep(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SleepRequest>,
) -> Result<Json<SleepResponse>> {
    let parse = |value: &str| {
        parse_clock(value).ok_or_else(|| AppError::bad_request(format!("Invalid time: {value}")))
    };
    let today = today();
    let record = health::sleep_record(parse(&req.sleep_start)?, parse(&req.sleep_end)?, &format_date(today));

    let new_badges = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            u.sleep_history.push(record.clone());
            Ok::<_, AppError>(badges::award_badges(u, today))
        })
        .await?;

    Ok(Json(SleepResponse {
        advice: health::sleep_advice(&record.quality),
        record,
        new_badges,
    }))
}

// ─── BMR / heart rate / body fat ─────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct BmrRequest {
    #[validate(range(min = 20.0, max = 200.0))]
    pub weight_kg: f64,
    #[validate(range(min = 100.0, max = 250.0))]
    pub height_cm: f64,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub activity_level: ActivityLevel,
}

#[derive(Debug, Serialize)]
pub struct BmrResponse {
    pub profile: MetabolicProfile,
    pub activity_level: &'static str,
}

async fn log_bmr(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BmrRequest>,
) -> Result<Json<BmrResponse>> {
    req.validate()?;
    let today = today();
    let profile = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            let age = req.age.unwrap_or_else(|| health::user_age(u, today));
            let gender = resolve_gender(req.gender.as_deref(), &u.gender)?;
            let profile = health::metabolic_profile(req.weight_kg, req.height_cm, age, gender, req.activity_level);
            u.bmr_history.push(BmrRecord {
                date: format_date(today),
                bmr: profile.bmr.round() as i64,
                tdee: profile.tdee.round() as i64,
                weight: req.weight_kg,
                height: req.height_cm,
                activity_level: req.activity_level.label().to_string(),
            });
            Ok::<_, AppError>(profile)
        })
        .await?;

    Ok(Json(BmrResponse {
        profile,
        activity_level: req.activity_level.label(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct HeartRateRequest {
    #[validate(range(min = 30, max = 120))]
    pub resting_hr: u32,
    pub age: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HeartRateResponse {
    pub max_hr: u32,
    pub zones: Vec<HeartRateZone>,
}

async fn log_heart_rate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<HeartRateRequest>,
) -> Result<Json<HeartRateResponse>> {
    req.validate()?;
    let today = today();
    let age = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            let age = req.age.unwrap_or_else(|| health::user_age(u, today));
            u.heart_rate_data.push(HeartRateRecord {
                date: format_date(today),
                resting_hr: req.resting_hr,
                max_hr: health::max_heart_rate(age),
            });
            Ok::<_, AppError>(age)
        })
        .await?;

    Ok(Json(HeartRateResponse {
        max_hr: health::max_heart_rate(age),
        zones: health::heart_rate_zones(age, req.resting_hr),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BodyFatRequest {
    #[validate(range(min = 20.0, max = 200.0))]
    pub weight_kg: f64,
    #[validate(range(min = 100.0, max = 250.0))]
    pub height_cm: f64,
    #[validate(range(min = 20.0, max = 60.0))]
    pub neck_cm: f64,
    #[validate(range(min = 40.0, max = 200.0))]
    pub waist_cm: f64,
    pub hip_cm: Option<f64>,
    pub gender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BodyFatResponse {
    pub record: BodyCompRecord,
    pub category: &'static str,
}

async fn log_body_fat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BodyFatRequest>,
) -> Result<Json<BodyFatResponse>> {
    req.validate()?;
    let today = today();
    let measurements = Measurements {
        weight_kg: req.weight_kg,
        height_cm: req.height_cm,
        neck_cm: req.neck_cm,
        waist_cm: req.waist_cm,
        hip_cm: req.hip_cm,
    };

    let (record, category) = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            let gender = resolve_gender(req.gender.as_deref(), &u.gender)?;
            let (record, category) = health::body_comp_record(&measurements, gender, &format_date(today))?;
            u.body_comp_history.push(record.clone());
            Ok::<_, AppError>((record, category))
        })
        .await?;

    Ok(Json(BodyFatResponse { record, category }))
}

// ─── Achievements ────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub badges: Vec<Badge>,
    pub remaining: Vec<BadgeInfo>,
    pub level: Level,
    pub level_progress: f64,
    pub total_points: i64,
}

fn achievements(u: &crate::models::User) -> AchievementsResponse {
    AchievementsResponse {
        badges: u.badges.clone(),
        remaining: badges::remaining_badges(u),
        level: badges::level_for(u.total_points),
        level_progress: badges::level_progress(u.total_points),
        total_points: u.total_points,
    }
}

async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AchievementsResponse>> {
    state
        .store
        .read(|s| Ok::<_, AppError>(Json(achievements(current(s, &user.username)?))))
        .await
}

#[derive(Debug, Serialize)]
pub struct BadgeCheckResponse {
    pub new_badges: Vec<Badge>,
    #[serde(flatten)]
    pub achievements: AchievementsResponse,
}

/// Award anything earned since the last check.
async fn check_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BadgeCheckResponse>> {
    let today = today();
    let response = state
        .store
        .update(|s| {
            let u = current_mut(s, &user.username)?;
            let new_badges = badges::award_badges(u, today);
            Ok::<_, AppError>(BadgeCheckResponse {
                new_badges,
                achievements: achievements(u),
            })
        })
        .await?;
    Ok(Json(response))
}
