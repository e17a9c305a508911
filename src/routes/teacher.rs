// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Teacher dashboard: class roster, houses, photo reviews, performance,
//! class settings and the CSV report.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::routes::MessageResponse;
use crate::services::teacher::{
    self, ClassHouses, ClassOverview, Override, Performance, ReportOptions, Review, ReviewFilter,
    StudentRow,
};
use crate::time_utils::today;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/teacher/overview", get(get_overview))
        .route("/api/teacher/students", get(get_students))
        .route("/api/teacher/students/{username}", delete(remove_student))
        .route("/api/teacher/students/{username}/house", put(assign_house))
        .route("/api/teacher/houses", get(get_houses))
        .route("/api/teacher/reviews", get(get_reviews))
        .route("/api/teacher/reviews/{username}/{index}", put(override_points))
        .route(
            "/api/teacher/reviews/{username}/{index}/override",
            delete(reset_override),
        )
        .route("/api/teacher/performance", get(get_performance))
        .route("/api/teacher/class/label", put(set_label))
        .route("/api/teacher/class/strictness", put(set_strictness))
        .route("/api/teacher/report", get(get_report))
}

async fn get_overview(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ClassOverview>> {
    let today = today();
    let overview = state
        .store
        .read(|s| teacher::class_overview(s, &user.username, today))
        .await?;
    Ok(Json(overview))
}

#[derive(Debug, Deserialize)]
pub struct StudentSearch {
    pub search: Option<String>,
}

async fn get_students(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<StudentSearch>,
) -> Result<Json<Vec<StudentRow>>> {
    let today = today();
    let rows = state
        .store
        .read(|s| teacher::student_list(s, &user.username, q.search.as_deref(), today))
        .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct HouseRequest {
    pub house: String,
}

async fn assign_house(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(student): Path<String>,
    Json(req): Json<HouseRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| teacher::assign_house(s, &user.username, &student, &req.house).map_err(AppError::from))
        .await?;
    tracing::info!(teacher = %user.username, student = %student, house = %req.house, "House assigned");
    Ok(MessageResponse::new(format!(
        "Assigned {student} to {}",
        crate::services::leaderboard::house_display(&req.house.trim().to_lowercase())
    )))
}

async fn remove_student(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(student): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| teacher::remove_from_class(s, &user.username, &student).map_err(AppError::from))
        .await?;
    tracing::info!(teacher = %user.username, student = %student, "Student removed from class");
    Ok(MessageResponse::new(format!("Removed {student} from your class")))
}

async fn get_houses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ClassHouses>> {
    let houses = state
        .store
        .read(|s| teacher::class_houses(s, &user.username))
        .await?;
    Ok(Json(houses))
}

// ─── Reviews ─────────────────────────────────────────────────

async fn get_reviews(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<Review>>> {
    let reviews = state
        .store
        .read(|s| teacher::workout_reviews(s, &user.username, &filter))
        .await?;
    Ok(Json(reviews))
}

#[derive(Debug, Deserialize)]
pub struct PointsRequest {
    pub points: i64,
}

async fn override_points(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((student, index)): Path<(String, usize)>,
    Json(req): Json<PointsRequest>,
) -> Result<Json<Override>> {
    let result = state
        .store
        .update(|s| {
            teacher::override_points(s, &user.username, &student, index, req.points).map_err(AppError::from)
        })
        .await?;
    tracing::info!(
        teacher = %user.username,
        student = %student,
        index,
        points = result.points_earned,
        difference = result.difference,
        "Workout points overridden"
    );
    Ok(Json(result))
}

async fn reset_override(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((student, index)): Path<(String, usize)>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| teacher::reset_override(s, &user.username, &student, index).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new("Override flag cleared"))
}

async fn get_performance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Performance>> {
    let today = today();
    let performance = state
        .store
        .read(|s| teacher::performance(s, &user.username, today))
        .await?;
    Ok(Json(performance))
}

// ─── Settings ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct LabelRequest {
    pub label: String,
}

async fn set_label(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<LabelRequest>,
) -> Result<Json<LabelRequest>> {
    let label = state
        .store
        .update(|s| teacher::set_class_label(s, &user.username, &req.label).map_err(AppError::from))
        .await?;
    Ok(Json(LabelRequest { label }))
}

#[derive(Debug, Deserialize)]
pub struct StrictnessRequest {
    pub level: u8,
}

#[derive(Debug, Serialize)]
pub struct StrictnessResponse {
    pub level: u8,
    pub description: &'static str,
}

async fn set_strictness(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StrictnessRequest>,
) -> Result<Json<StrictnessResponse>> {
    let level = state
        .store
        .update(|s| teacher::set_strictness(s, &user.username, req.level).map_err(AppError::from))
        .await?;
    tracing::info!(teacher = %user.username, level, "Verification strictness changed");
    Ok(Json(StrictnessResponse {
        level,
        description: teacher::strictness_description(level),
    }))
}

// ─── Report ──────────────────────────────────────────────────

/// Class report as a CSV download. Sections are chosen with the
/// `napfa`, `workouts` and `attendance` query flags.
async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(options): Query<ReportOptions>,
) -> Result<impl IntoResponse> {
    let today = today();
    let csv = state
        .store
        .read(|s| teacher::class_report_csv(s, &user.username, options, today))
        .await?;
    let disposition = format!("attachment; filename=\"{}\"", teacher::report_filename(today));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
