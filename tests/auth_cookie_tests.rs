// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! Logout must clear the session cookie with the same name and path it was
//! created with, and drop the in-progress workout session.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use fittrack::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[tokio::test]
async fn test_logout_removes_session_cookie() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, format!("fittrack_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "fittrack_token");
    assert!(token_cookie.contains("Path=/"), "{token_cookie}");
    assert!(token_cookie.contains("Max-Age=0"), "{token_cookie}");
}

#[tokio::test]
async fn test_logout_clears_workout_session() {
    let (app, state, _dir) = common::create_test_app();
    let token = common::seed_user(&state, "alice", Role::Student).await;

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/session/counter",
        Some(&token),
        Some(json!({"action": "select", "exercise": "Push-ups"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.sessions.len(), 1);

    let (status, _) = common::send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_logout_requires_session() {
    let (app, _, _dir) = common::create_test_app();

    let (status, _) = common::send(&app, "POST", "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
