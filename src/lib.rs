// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitTrack: school fitness tracking service
//!
//! Students log workouts, take NAPFA fitness tests and compete on house and
//! class leaderboards. Teachers manage classes and review workout photos.
//! Everything is persisted in a single JSON document.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::JsonStore;
use services::{NutritionClient, SessionStore, VisionClient, WeatherClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: JsonStore,
    /// In-progress workouts, never persisted
    pub sessions: SessionStore,
    pub vision: VisionClient,
    pub weather: WeatherClient,
    pub nutrition: NutritionClient,
}

impl AppState {
    /// Build the state from config, opening (or creating) the data file.
    pub fn new(config: Config) -> Result<Self, db::StoreError> {
        let store = JsonStore::open(config.data_file.clone())?;
        Ok(Self {
            vision: VisionClient::new(&config.openai_base_url, config.openai_api_key.clone()),
            weather: WeatherClient::new(
                &config.openweather_base_url,
                config.openweather_api_key.clone(),
            ),
            nutrition: NutritionClient::new(&config.usda_base_url, config.usda_api_key.clone()),
            sessions: SessionStore::new(),
            store,
            config,
        })
    }
}
