// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health and fitness history records.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmiRecord {
    pub date: String,
    /// Rounded to two decimals
    pub bmi: f64,
    /// Kilograms
    pub weight: f64,
    /// Metres
    pub height: f64,
    pub category: String,
}

/// One NAPFA test sitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NapfaResult {
    pub date: String,
    pub age: u32,
    pub gender: String,
    /// Raw scores keyed by component code (SU, SBJ, SAR, PU, SR, RUN).
    /// Counted and centimetre stations are whole numbers.
    pub scores: BTreeMap<String, Number>,
    /// Grades 0..=5 keyed by component code
    pub grades: BTreeMap<String, u8>,
    pub total: u32,
    pub medal: String,
}

impl NapfaResult {
    pub fn grade(&self, component: &str) -> u8 {
        self.grades.get(component).copied().unwrap_or(0)
    }

    pub fn score(&self, component: &str) -> Option<f64> {
        self.scores.get(component).and_then(Number::as_f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepRecord {
    pub date: String,
    /// HH:MM:SS
    pub sleep_start: String,
    pub sleep_end: String,
    pub hours: u32,
    pub minutes: u32,
    pub quality: String,
}

impl SleepRecord {
    /// Duration in fractional hours.
    pub fn total_hours(&self) -> f64 {
        self.hours as f64 + self.minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmrRecord {
    pub date: String,
    pub bmr: i64,
    pub tdee: i64,
    pub weight: f64,
    /// Centimetres
    pub height: f64,
    pub activity_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateRecord {
    pub date: String,
    pub resting_hr: u32,
    pub max_hr: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyCompRecord {
    pub date: String,
    pub body_fat_pct: f64,
    pub fat_mass: f64,
    pub lean_mass: f64,
    pub weight: f64,
    pub neck: f64,
    pub waist: f64,
    /// Only recorded for female students
    pub hip: Option<f64>,
}

/// Fixed weekly slot in a student's schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleEntry {
    pub day: String,
    pub activity: String,
    pub time: String,
    /// Minutes
    pub duration: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletedChallenge {
    pub name: String,
    pub completed_date: String,
    pub points: u32,
}
