// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod community;
pub mod fitness;
pub mod insights;
pub mod integrations;
pub mod teacher;
pub mod workouts;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::auth::require_auth;
use crate::models::User;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    let protected_routes = Router::new()
        .merge(auth::session_routes())
        .merge(fitness::routes())
        .merge(workouts::routes())
        .merge(community::routes())
        .merge(insights::routes())
        .merge(teacher::routes())
        .merge(integrations::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Helpers shared by handlers ──────────────────────────────

/// The caller's record. The auth middleware has already checked it exists,
/// but it can vanish between requests.
pub(crate) fn current<'a>(store: &'a Store, username: &str) -> Result<&'a User> {
    store
        .user(username)
        .ok_or_else(|| AppError::not_found(format!("User {username} not found")))
}

pub(crate) fn current_mut<'a>(store: &'a mut Store, username: &str) -> Result<&'a mut User> {
    store
        .user_mut(username)
        .ok_or_else(|| AppError::not_found(format!("User {username} not found")))
}

/// Reject callers who are not students.
pub(crate) fn require_student(user: &User) -> Result<()> {
    if user.is_student() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only students can do that".to_string()))
    }
}

/// Plain `{"message": ...}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}
