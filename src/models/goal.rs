// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness goals.

use serde::{Deserialize, Serialize};

/// Simple dated goal from older data files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
    pub target: String,
    /// Deadline (YYYY-MM-DD)
    pub date: String,
    /// Percent complete
    pub progress: u32,
}

/// Goal written in the Specific / Measurable / Achievable / Relevant /
/// Time-bound form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartGoal {
    pub category: String,
    pub specific: String,
    /// Tracking methods
    pub measurable: Vec<String>,
    /// Achievability rating, e.g. "Highly Achievable"
    pub achievable: String,
    /// Motivation in the student's words
    pub relevant: String,
    /// Target date (YYYY-MM-DD)
    pub time_bound: String,
    pub milestones: Vec<String>,
    pub created_date: String,
    /// Percent complete
    pub progress: u32,
    pub weekly_checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkpoint {
    pub date: String,
    pub progress: u32,
}
