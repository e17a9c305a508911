// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health calculators: BMI, body type, sleep quality, BMR/TDEE, heart-rate
//! zones and US Navy body-fat estimation.

use crate::models::{BmiRecord, BodyCompRecord, SleepRecord, User};
use crate::services::napfa::Gender;
use crate::time_utils::parse_date;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

/// Age used when a user has neither a birthday nor a stored age.
pub const DEFAULT_AGE: u32 = 14;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ─── Age ─────────────────────────────────────────────────────

/// Completed years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

/// Current age from the stored birthday, else the stored age, else 14.
pub fn user_age(user: &User, today: NaiveDate) -> u32 {
    match user.birthday.as_deref().and_then(parse_date) {
        Some(dob) => age_on(dob, today),
        None => user.age.unwrap_or(DEFAULT_AGE),
    }
}

// ─── BMI ─────────────────────────────────────────────────────

pub fn bmi(weight_kg: f64, height_m: f64) -> f64 {
    weight_kg / (height_m * height_m)
}

pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obesity"
    }
}

pub fn bmi_record(weight_kg: f64, height_m: f64, date: &str) -> BmiRecord {
    let value = bmi(weight_kg, height_m);
    BmiRecord {
        date: date.to_string(),
        bmi: round_to(value, 2),
        weight: weight_kg,
        height: height_m,
        category: bmi_category(value).to_string(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BodyType {
    pub name: &'static str,
    pub description: &'static str,
}

/// Somatotype estimate from BMI alone.
pub fn body_type(weight_kg: f64, height_m: f64) -> BodyType {
    let value = bmi(weight_kg, height_m);
    if value < 21.5 {
        BodyType {
            name: "Ectomorph",
            description: "Naturally lean, fast metabolism, difficulty gaining weight",
        }
    } else if value < 30.0 {
        BodyType {
            name: "Mesomorph",
            description: "Athletic build, gains muscle easily, responds well to training",
        }
    } else {
        BodyType {
            name: "Endomorph",
            description: "Larger bone structure, gains weight easily, slower metabolism",
        }
    }
}

// ─── Sleep ───────────────────────────────────────────────────

pub fn sleep_quality(hours: u32) -> &'static str {
    match hours {
        8.. => "Excellent",
        7 => "Good",
        6 => "Fair",
        _ => "Poor",
    }
}

pub fn sleep_advice(quality: &str) -> &'static str {
    match quality {
        "Excellent" => "Great job! You're getting enough sleep.",
        "Good" => "Good sleep duration. Try to get a bit more.",
        _ => "You need more sleep. Aim for 8-10 hours per night.",
    }
}

/// Build a sleep record. A wake time earlier than the start wraps past
/// midnight.
pub fn sleep_record(start: NaiveTime, end: NaiveTime, date: &str) -> SleepRecord {
    let mut seconds = end.num_seconds_from_midnight() as i64 - start.num_seconds_from_midnight() as i64;
    if seconds < 0 {
        seconds += 24 * 3600;
    }
    let hours = (seconds / 3600) as u32;
    let minutes = ((seconds % 3600) / 60) as u32;
    let quality = sleep_quality(hours);

    SleepRecord {
        date: date.to_string(),
        sleep_start: start.format("%H:%M:%S").to_string(),
        sleep_end: end.format("%H:%M:%S").to_string(),
        hours,
        minutes,
        quality: quality.to_string(),
    }
}

// ─── BMR / TDEE ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary (little/no exercise)",
            ActivityLevel::LightlyActive => "Lightly Active (1-3 days/week)",
            ActivityLevel::ModeratelyActive => "Moderately Active (3-5 days/week)",
            ActivityLevel::VeryActive => "Very Active (6-7 days/week)",
            ActivityLevel::ExtremelyActive => "Extremely Active (athlete, 2x/day)",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetabolicProfile {
    pub bmr: f64,
    pub tdee: f64,
    pub protein_grams: f64,
    pub fat_grams: f64,
    pub carb_grams: f64,
}

/// Mifflin-St Jeor BMR with a TDEE multiplier and a simple macro split.
pub fn metabolic_profile(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: Gender,
    level: ActivityLevel,
) -> MetabolicProfile {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    let bmr = match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    };
    let tdee = bmr * level.multiplier();

    let protein_grams = weight_kg * 1.6;
    let fat_cals = tdee * 0.25;
    let carb_cals = tdee - protein_grams * 4.0 - fat_cals;

    MetabolicProfile {
        bmr,
        tdee,
        protein_grams,
        fat_grams: fat_cals / 9.0,
        carb_grams: carb_cals / 4.0,
    }
}

// ─── Heart rate ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeartRateZone {
    pub name: &'static str,
    pub description: &'static str,
    pub min_bpm: u32,
    pub max_bpm: u32,
}

const ZONES: [(&str, &str, f64, f64); 5] = [
    ("Zone 1 - Very Light", "Recovery, warm-up", 0.50, 0.60),
    ("Zone 2 - Light", "Fat burning, base training", 0.60, 0.70),
    ("Zone 3 - Moderate", "Aerobic endurance", 0.70, 0.80),
    ("Zone 4 - Hard", "Lactate threshold", 0.80, 0.90),
    ("Zone 5 - Maximum", "VO2 Max, sprints", 0.90, 1.00),
];

pub fn max_heart_rate(age: u32) -> u32 {
    220u32.saturating_sub(age)
}

/// Karvonen training zones: a share of the heart-rate reserve on top of
/// the resting rate.
pub fn heart_rate_zones(age: u32, resting_hr: u32) -> Vec<HeartRateZone> {
    let max_hr = max_heart_rate(age) as f64;
    let resting = resting_hr as f64;
    let reserve = max_hr - resting;

    ZONES
        .iter()
        .map(|&(name, description, lo, hi)| HeartRateZone {
            name,
            description,
            min_bpm: (resting + reserve * lo) as u32,
            max_bpm: (resting + reserve * hi) as u32,
        })
        .collect()
}

// ─── Body fat ────────────────────────────────────────────────

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BodyFatError {
    #[error("Waist must be larger than neck")]
    WaistNotAboveNeck,
    #[error("Hip measurement is required for female students")]
    MissingHip,
}

/// Body measurements in centimetres and kilograms.
#[derive(Debug, Clone, Copy)]
pub struct Measurements {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub neck_cm: f64,
    pub waist_cm: f64,
    pub hip_cm: Option<f64>,
}

/// US Navy body-fat estimate.
pub fn body_fat_percent(m: &Measurements, gender: Gender) -> Result<f64, BodyFatError> {
    match gender {
        Gender::Male => {
            let girth = m.waist_cm - m.neck_cm;
            if girth <= 0.0 {
                return Err(BodyFatError::WaistNotAboveNeck);
            }
            Ok(495.0 / (1.0324 - 0.19077 * girth.log10() + 0.15456 * m.height_cm.log10()) - 450.0)
        }
        Gender::Female => {
            let hip = m.hip_cm.ok_or(BodyFatError::MissingHip)?;
            let girth = m.waist_cm + hip - m.neck_cm;
            if girth <= 0.0 {
                return Err(BodyFatError::WaistNotAboveNeck);
            }
            Ok(495.0 / (1.29579 - 0.35004 * girth.log10() + 0.22100 * m.height_cm.log10()) - 450.0)
        }
    }
}

pub fn body_fat_category(pct: f64, gender: Gender) -> &'static str {
    let bands = match gender {
        Gender::Male => [6.0, 14.0, 18.0, 25.0],
        Gender::Female => [14.0, 21.0, 25.0, 32.0],
    };
    if pct < bands[0] {
        "Essential Fat Only"
    } else if pct < bands[1] {
        "Athletes"
    } else if pct < bands[2] {
        "Fitness"
    } else if pct < bands[3] {
        "Average"
    } else {
        "Above Average"
    }
}

pub fn body_comp_record(
    m: &Measurements,
    gender: Gender,
    date: &str,
) -> Result<(BodyCompRecord, &'static str), BodyFatError> {
    let pct = body_fat_percent(m, gender)?;
    let fat_mass = m.weight_kg * pct / 100.0;
    let record = BodyCompRecord {
        date: date.to_string(),
        body_fat_pct: round_to(pct, 1),
        fat_mass: round_to(fat_mass, 1),
        lean_mass: round_to(m.weight_kg - fat_mass, 1),
        weight: m.weight_kg,
        neck: m.neck_cm,
        waist: m.waist_cm,
        hip: match gender {
            Gender::Female => m.hip_cm,
            Gender::Male => None,
        },
    };
    Ok((record, body_fat_category(pct, gender)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bmi_normal_example() {
        let record = bmi_record(60.0, 1.65, "2026-03-01");
        assert!((record.bmi - 22.04).abs() < 0.005);
        assert_eq!(record.category, "Normal");
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(bmi_category(18.49), "Underweight");
        assert_eq!(bmi_category(18.5), "Normal");
        assert_eq!(bmi_category(25.0), "Overweight");
        assert_eq!(bmi_category(30.0), "Obesity");
    }

    #[test]
    fn test_body_type() {
        assert_eq!(body_type(50.0, 1.70).name, "Ectomorph");
        assert_eq!(body_type(70.0, 1.70).name, "Mesomorph");
        assert_eq!(body_type(95.0, 1.70).name, "Endomorph");
    }

    #[test]
    fn test_sleep_wraps_midnight() {
        let start = NaiveTime::from_hms_opt(22, 30, 0).unwrap();
        let end = NaiveTime::from_hms_opt(6, 45, 0).unwrap();
        let record = sleep_record(start, end, "2026-03-01");

        assert_eq!(record.hours, 8);
        assert_eq!(record.minutes, 15);
        assert_eq!(record.quality, "Excellent");
        assert_eq!(record.sleep_start, "22:30:00");
    }

    #[test]
    fn test_sleep_quality_bands() {
        assert_eq!(sleep_quality(7), "Good");
        assert_eq!(sleep_quality(6), "Fair");
        assert_eq!(sleep_quality(5), "Poor");
    }

    #[test]
    fn test_age_from_birthday() {
        let user = User {
            birthday: Some("2012-06-15".to_string()),
            age: Some(99),
            ..Default::default()
        };
        assert_eq!(user_age(&user, date(2026, 6, 14)), 13);
        assert_eq!(user_age(&user, date(2026, 6, 15)), 14);

        let stored = User {
            age: Some(15),
            ..Default::default()
        };
        assert_eq!(user_age(&stored, date(2026, 1, 1)), 15);
        assert_eq!(user_age(&User::default(), date(2026, 1, 1)), DEFAULT_AGE);
    }

    #[test]
    fn test_metabolic_profile_male() {
        let p = metabolic_profile(60.0, 170.0, 15, Gender::Male, ActivityLevel::ModeratelyActive);
        // 600 + 1062.5 - 75 + 5
        assert!((p.bmr - 1592.5).abs() < 1e-9);
        assert!((p.tdee - 1592.5 * 1.55).abs() < 1e-9);
        assert!((p.protein_grams - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_heart_rate_zones() {
        let zones = heart_rate_zones(15, 65);
        assert_eq!(zones.len(), 5);
        // reserve = 205 - 65 = 140
        assert_eq!(zones[0].min_bpm, 135);
        assert_eq!(zones[4].max_bpm, 205);
    }

    #[test]
    fn test_body_fat_requires_hip_for_female() {
        let m = Measurements {
            weight_kg: 55.0,
            height_cm: 160.0,
            neck_cm: 32.0,
            waist_cm: 70.0,
            hip_cm: None,
        };
        assert_eq!(body_fat_percent(&m, Gender::Female), Err(BodyFatError::MissingHip));
    }

    #[test]
    fn test_body_comp_record_male() {
        let m = Measurements {
            weight_kg: 65.0,
            height_cm: 175.0,
            neck_cm: 37.0,
            waist_cm: 80.0,
            hip_cm: Some(90.0),
        };
        let (record, category) = body_comp_record(&m, Gender::Male, "2026-03-01").unwrap();
        assert!(record.body_fat_pct > 5.0 && record.body_fat_pct < 20.0);
        assert_eq!(record.hip, None);
        assert!((record.fat_mass + record.lean_mass - 65.0).abs() < 0.2);
        assert_eq!(category, body_fat_category(record.body_fat_pct, Gender::Male));
    }
}
