// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login, password reset and logout.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, removal_cookie, session_cookie, AuthUser};
use crate::models::Role;
use crate::routes::MessageResponse;
use crate::services::accounts::{self, RegisterRequest, Registered};
use crate::time_utils::now_local;
use crate::AppState;

/// Routes that work without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/reset-password", post(reset_password))
}

/// Routes that need a session (mounted behind `require_auth`).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registered>)> {
    req.validate()?;
    let now = now_local();
    let registered = state
        .store
        .update(|s| accounts::register(s, req, now).map_err(AppError::from))
        .await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub login_streak: u32,
}

/// Check credentials, record the login and start a session.
///
/// The token is returned in the body and set as an HttpOnly cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;
    let now = now_local();
    let (username, role, name, login_streak) = state
        .store
        .update(|s| {
            let username = accounts::login(s, &req.email, &req.password, now)?;
            let user = crate::routes::current(s, &username)?;
            Ok::<_, AppError>((username.clone(), user.role, user.name.clone(), user.login_streak))
        })
        .await?;

    let token = create_jwt(&username, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(username = %username, "Login successful");
    Ok((
        jar.add(session_cookie(token.clone())),
        Json(LoginResponse {
            token,
            username,
            role,
            name,
            login_streak,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;
    state
        .store
        .update(|s| {
            accounts::reset_password(s, &req.email, &req.password, &req.confirm_password)
                .map_err(AppError::from)
        })
        .await?;
    Ok(MessageResponse::new("Password updated. You can now log in."))
}

/// End the session and drop any in-progress workout.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    state.sessions.clear(&user.username);
    tracing::info!(username = %user.username, "Logout");
    (jar.remove(removal_cookie()), MessageResponse::new("Logged out"))
}
