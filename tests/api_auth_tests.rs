// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Registration and login issue a working session
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Datelike, Local};
use fittrack::models::Role;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

/// Birthday making the registrant `years` old today.
fn birthday(years: i32) -> String {
    let today = Local::now().date_naive();
    format!("{}-01-01", today.year() - years)
}

fn registration(email: &str, role: &str, years: i32) -> Value {
    json!({
        "email": email,
        "name": "Jo Tan",
        "password": "secret1",
        "confirm_password": "secret1",
        "role": role,
        "birthday": birthday(years),
        "gender": "f",
        "house": "blue",
    })
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _dir) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Should return 401 Unauthorized without token
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _dir) = common::create_test_app();

    let (status, _) = common::send(&app, "GET", "/api/me", Some("invalid.token.here"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_missing_account_is_rejected() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::create_test_jwt("ghost", &state.config.jwt_signing_key);

    let (status, _) = common::send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, body) = common::send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "student");
}

#[tokio::test]
async fn test_register_then_login() {
    let (app, _, _dir) = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(registration("Jo.Tan@school.edu.sg", "student", 14)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["username"], "Jo_Tan");

    // Email matching is case-insensitive
    let (status, body) = common::send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "jo.tan@SCHOOL.edu.sg", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = common::send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["house"], "blue");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (app, _, _dir) = common::create_test_app();
    let req = registration("dup@school.edu.sg", "student", 13);

    let (status, _) = common::send(&app, "POST", "/auth/register", None, Some(req.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = common::send(&app, "POST", "/auth/register", None, Some(req)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_teacher_registration_gets_class_code() {
    let (app, _, _dir) = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(registration("ms.lim@school.edu.sg", "teacher", 30)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let code = body["class_code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, state, _dir) = common::create_test_app();
    common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "alice@school.edu.sg", "password": "wrong!!"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, state, _dir) = common::create_test_app();
    common::seed_user(&state, "alice", Role::Student).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "alice@school.edu.sg", "password": common::PASSWORD}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("fittrack_token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::COOKIE, format!("fittrack_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset() {
    let (app, state, _dir) = common::create_test_app();
    common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(
        &app,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({
            "email": "alice@school.edu.sg",
            "password": "newpass1",
            "confirm_password": "newpass1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "alice@school.edu.sg", "password": "newpass1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _dir) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/me")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    // Should have CORS headers
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _, _dir) = common::create_test_app();

    let (status, body) = common::send(&app, "GET", "/health", None, None).await;

    // Health should be accessible without auth
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
