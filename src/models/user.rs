// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account model for storage and API.
//!
//! A single record type serves both roles. Student-only and teacher-only
//! fields default when absent so older or hand-edited files still load.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    Badge, BmiRecord, BmrRecord, BodyCompRecord, CompletedChallenge, ExerciseEntry, Goal,
    HeartRateRecord, NapfaResult, ScheduleEntry, SleepRecord, SmartGoal, StepsEntry,
};

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

/// School houses a student can belong to.
pub const HOUSES: [&str; 5] = ["yellow", "red", "blue", "green", "black"];

/// Default photo verification strictness (1 lenient, 2 standard, 3 strict).
pub const DEFAULT_STRICTNESS: u8 = 2;

/// User record, stored under its username in the data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    // ─── Account ─────────────────────────────────────────────────
    /// Login email, stored lowercase
    pub email: String,
    /// Plaintext password (legacy file format)
    pub password: String,
    pub role: Role,
    /// Display name
    pub name: String,
    /// Birthday (YYYY-MM-DD)
    pub birthday: Option<String>,
    /// Age captured at registration
    pub age: Option<u32>,
    /// "m" or "f"
    pub gender: String,
    pub school: String,
    /// Registration timestamp
    pub created: String,
    /// Last login timestamp
    pub last_login: Option<String>,
    /// Consecutive days with a login
    pub login_streak: u32,
    /// Level name derived from total points
    pub level: String,
    pub total_points: i64,
    pub email_verified: bool,

    // ─── Student ─────────────────────────────────────────────────
    /// One of [`HOUSES`]
    pub house: Option<String>,
    /// Workout hours credited to the house
    pub house_points_contributed: f64,
    pub total_workout_hours: f64,
    /// Opt-in for public leaderboards
    pub show_on_leaderboards: bool,
    pub bmi_history: Vec<BmiRecord>,
    pub napfa_history: Vec<NapfaResult>,
    pub sleep_history: Vec<SleepRecord>,
    /// Logged workouts, newest first
    pub exercises: Vec<ExerciseEntry>,
    /// Cardio step estimates, newest first
    pub steps_data: Vec<StepsEntry>,
    pub goals: Vec<Goal>,
    pub smart_goals: Vec<SmartGoal>,
    pub schedule: Vec<ScheduleEntry>,
    pub saved_workout_plan: Option<Value>,
    /// Usernames (may dangle)
    pub friends: Vec<String>,
    /// Usernames with pending requests to this user
    pub friend_requests: Vec<String>,
    pub badges: Vec<Badge>,
    /// Group ids (may dangle)
    pub groups: Vec<String>,
    pub group_invites: Vec<String>,
    pub active_challenges: Vec<Value>,
    pub completed_challenges: Vec<CompletedChallenge>,
    /// Username of the student's teacher (may dangle)
    pub teacher_class: Option<String>,
    pub bmr_history: Vec<BmrRecord>,
    pub heart_rate_data: Vec<HeartRateRecord>,
    pub body_comp_history: Vec<BodyCompRecord>,

    // ─── Teacher ─────────────────────────────────────────────────
    /// Six-character join code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Roster of student usernames (may dangle)
    pub students: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes_created: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_strictness: Option<u8>,

    /// Fields this version does not know about, kept for round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    /// Most recent NAPFA test, if any.
    pub fn latest_napfa(&self) -> Option<&NapfaResult> {
        self.napfa_history.last()
    }

    pub fn strictness(&self) -> u8 {
        self.verification_strictness
            .unwrap_or(DEFAULT_STRICTNESS)
            .clamp(1, 3)
    }

    /// Class label shown to students, falling back to the teacher's name.
    pub fn class_display_label(&self) -> String {
        match self.class_label.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("{}'s class", self.name),
        }
    }

    pub fn has_badge(&self, name: &str) -> bool {
        self.badges.iter().any(|b| b.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_record_loads_with_defaults() {
        let json = r#"{"email": "a@school.sg", "password": "secret1", "role": "teacher", "name": "Ms Tan"}"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert!(user.is_teacher());
        assert!(user.exercises.is_empty());
        assert_eq!(user.strictness(), DEFAULT_STRICTNESS);
        assert_eq!(user.class_display_label(), "Ms Tan's class");
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let json = r#"{"email": "b@school.sg", "role": "student", "favourite_colour": "teal", "legacy": {"x": 1}}"#;
        let user: User = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&user).unwrap();

        assert_eq!(back["favourite_colour"], "teal");
        assert_eq!(back["legacy"]["x"], 1);
    }
}
