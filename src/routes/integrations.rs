// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather advice and food search. Both always answer, falling back to
//! local data when the upstream service is unavailable.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::nutrition::{FoodSearch, SortOrder};
use crate::services::weather::WeatherReport;
use crate::AppState;

const DEFAULT_LOCATION: &str = "Singapore";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/weather", get(get_weather))
        .route("/api/foods", get(search_foods))
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub location: Option<String>,
}

async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(q): Query<WeatherQuery>,
) -> Json<WeatherReport> {
    let location = q
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LOCATION);
    Json(state.weather.report(location).await)
}

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub sort: SortOrder,
}

async fn search_foods(
    State(state): State<Arc<AppState>>,
    Query(q): Query<FoodQuery>,
) -> Result<Json<FoodSearch>> {
    let query = q.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("Please enter a food to search for"));
    }
    Ok(Json(state.nutrition.search(query, q.sort).await))
}
