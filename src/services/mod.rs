// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.
//!
//! Pure functions over [`crate::db::Store`] and [`crate::models::User`],
//! plus the three HTTP adapters (vision, weather, nutrition).

pub mod accounts;
pub mod badges;
pub mod challenges;
pub mod goals;
pub mod health;
pub mod insights;
pub mod leaderboard;
pub mod napfa;
pub mod nutrition;
pub mod planner;
pub mod session;
pub mod social;
pub mod streak;
pub mod teacher;
pub mod vision;
pub mod weather;
pub mod workout;

pub use nutrition::NutritionClient;
pub use session::SessionStore;
pub use vision::VisionClient;
pub use weather::WeatherClient;
