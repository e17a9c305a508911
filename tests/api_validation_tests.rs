// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests. Rejected input must leave the store unchanged.

use axum::http::StatusCode;
use fittrack::models::Role;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_bmi_out_of_range() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/bmi",
        Some(&token),
        Some(json!({"weight_kg": 250.0, "height_m": 1.6})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let records = state
        .store
        .read(|s| s.user("alice").map(|u| u.bmi_history.len()))
        .await;
    assert_eq!(records, Some(0));
}

#[tokio::test]
async fn test_invalid_run_time() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/napfa",
        Some(&token),
        Some(json!({
            "sit_ups": 30, "broad_jump_cm": 200, "sit_reach_cm": 35,
            "pull_ups": 5, "shuttle_run_s": 10.5, "run_time": "eleven minutes",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_invalid_sleep_time() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/sleep",
        Some(&token),
        Some(json!({"sleep_start": "25:00", "sleep_end": "07:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let (app, _, _dir) = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "amy@school.edu.sg",
            "name": "Amy",
            "password": "secret1",
            "confirm_password": "secret2",
            "birthday": "2012-01-01",
            "gender": "f",
            "house": "red",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_register_invalid_email() {
    let (app, _, _dir) = common::create_test_app();

    let (status, _) = common::send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "not-an-email",
            "name": "Amy",
            "password": "secret1",
            "confirm_password": "secret1",
            "birthday": "2012-01-01",
            "gender": "f",
            "house": "red",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_interval_rounds_out_of_range() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/session/interval",
        Some(&token),
        Some(json!({"action": "set", "work_seconds": 30, "rest_seconds": 10, "rounds": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_timer_start_before_set() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/session/timer",
        Some(&token),
        Some(json!({"action": "start"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Set the timer first");
}

#[tokio::test]
async fn test_empty_food_query() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(&app, "GET", "/api/foods?query=%20", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_override_points_out_of_range() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "ms_lim", Role::Teacher).await;

    let (status, _) = common::send(
        &app,
        "PUT",
        "/api/teacher/reviews/alice/0",
        Some(&token),
        Some(json!({"points": 900})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
