// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Logged workouts and step estimates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of photo verification for a workout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// No photo, or saved before verification existed
    #[default]
    Unverified,
    Verified,
    Failed,
    /// Photo attached but no verifier available
    Mock,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    /// Sets and reps
    #[default]
    Counter,
    /// Timed walk/jog/run/sprint
    Cardio,
}

/// A single logged workout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseEntry {
    /// Exercise name, e.g. "Push-Ups" or "Jog"
    pub name: String,
    /// Date (YYYY-MM-DD)
    pub date: String,
    /// Time of day (HH:MM)
    pub time: String,
    /// Minutes
    pub duration: u32,
    pub intensity: Intensity,

    // ─── Counter workouts ────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reps: Option<u32>,
    /// "reps" or "sec"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps_unit: Option<String>,

    // ─── Cardio workouts ─────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_steps: Option<u64>,

    pub notes: String,
    pub points_earned: i64,
    pub ai_feedback: Option<String>,
    pub verification_status: VerificationStatus,
    pub has_photo: bool,
    /// JPEG bytes, base64 encoded
    pub photo_b64: Option<String>,
    /// Set once a teacher has adjusted the points
    pub teacher_override: bool,
    pub workout_type: WorkoutType,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExerciseEntry {
    /// "date time" key used to order reviews.
    pub fn sort_key(&self) -> String {
        format!("{} {}", self.date, self.time)
    }
}

/// Step estimate recorded alongside a cardio workout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsEntry {
    pub date: String,
    /// Always "run_walk" for entries created by the workout logger
    #[serde(rename = "type")]
    pub kind: String,
    pub activity: String,
    pub distance_km: f64,
    pub duration_min: u32,
    pub steps: u64,
    pub points_earned: i64,
}
