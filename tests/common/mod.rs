// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fittrack::config::Config;
use fittrack::models::{Role, User};
use fittrack::routes::create_router;
use fittrack::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tower::ServiceExt;

/// Password given to every seeded account.
#[allow(dead_code)]
pub const PASSWORD: &str = "secret1";

/// Class code given to seeded teachers.
#[allow(dead_code)]
pub const CLASS_CODE: &str = "TEACH1";

/// Create a test app backed by a data file in a fresh temp dir.
/// Keep the returned `TempDir` alive for the duration of the test.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::test_default();
    config.data_file = dir.path().join("users.json");
    // Unroutable upstreams so no test ever reaches a real API
    config.openai_base_url = "http://127.0.0.1:9".to_string();
    config.openweather_base_url = "http://127.0.0.1:9".to_string();
    config.usda_base_url = "http://127.0.0.1:9".to_string();

    let state = Arc::new(AppState::new(config).expect("Failed to open store"));
    (create_router(state.clone()), state, dir)
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(username: &str, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: username.to_string(),
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Insert an account directly into the store and return a token for it.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, username: &str, role: Role) -> String {
    let user = User {
        email: format!("{username}@school.edu.sg"),
        password: PASSWORD.to_string(),
        role,
        name: username.replace('_', " "),
        age: Some(if role == Role::Teacher { 35 } else { 14 }),
        gender: "m".to_string(),
        school: "Test School".to_string(),
        level: "Novice".to_string(),
        email_verified: true,
        house: (role == Role::Student).then(|| "red".to_string()),
        show_on_leaderboards: true,
        class_code: (role == Role::Teacher).then(|| CLASS_CODE.to_string()),
        ..Default::default()
    };
    let name = username.to_string();
    state
        .store
        .update(move |s| {
            s.users.insert(name, user);
            Ok::<_, fittrack::db::StoreError>(())
        })
        .await
        .expect("Failed to seed user");
    create_test_jwt(username, &state.config.jwt_signing_key)
}

/// Send a request with an optional bearer token and JSON body. Returns the
/// status and the parsed body (`Null` when empty or not JSON).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
