// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly training plans, the schedule manager and daily reminders.

use crate::models::{ScheduleEntry, User};
use crate::services::health::body_type;
use crate::services::insights::average_sleep_hours;
use crate::services::napfa::Component;
use crate::time_utils::{days_between, format_date, parse_date};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

pub const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn day_name(weekday: Weekday) -> &'static str {
    DAYS[weekday.num_days_from_monday() as usize]
}

/// Stations graded 2 or lower count as weak.
const WEAK_GRADE: u8 = 2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanSlot {
    pub day: &'static str,
    pub time: &'static str,
    pub activity: &'static str,
    /// Cardio, Strength, Flexibility or Rest
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeakStation {
    pub code: &'static str,
    pub name: &'static str,
    pub grade: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainingPlan {
    pub latest_bmi: f64,
    pub body_type: &'static str,
    pub napfa_total: u32,
    pub medal: String,
    pub avg_sleep_hours: f64,
    pub weak_stations: Vec<WeakStation>,
    pub slots: Vec<PlanSlot>,
    pub nutrition_goal: &'static str,
    pub nutrition: [&'static str; 4],
    pub sleep_advice: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PlannerError {
    #[error("Missing data for a personalised plan: {}", .0.join(", "))]
    MissingData(Vec<&'static str>),
}

fn slot(day: &'static str, time: &'static str, activity: &'static str, kind: &'static str) -> PlanSlot {
    PlanSlot {
        day,
        time,
        activity,
        kind,
    }
}

/// Build a weekly plan focused on the student's weakest NAPFA stations.
///
/// Needs a NAPFA test, a BMI record and at least one sleep record.
pub fn generate_plan(user: &User) -> Result<TrainingPlan, PlannerError> {
    let mut missing = Vec::new();
    if user.napfa_history.is_empty() {
        missing.push("NAPFA Test");
    }
    if user.bmi_history.is_empty() {
        missing.push("BMI Calculation");
    }
    if user.sleep_history.is_empty() {
        missing.push("Sleep Tracking");
    }
    let (Some(napfa), Some(bmi), false) = (
        user.napfa_history.last(),
        user.bmi_history.last(),
        user.sleep_history.is_empty(),
    ) else {
        return Err(PlannerError::MissingData(missing));
    };

    let recent_sleep = &user.sleep_history[user.sleep_history.len().saturating_sub(7)..];
    let avg_sleep = average_sleep_hours(recent_sleep).unwrap_or(0.0);

    let weak_stations: Vec<WeakStation> = Component::ALL
        .into_iter()
        .filter_map(|c| {
            let grade = *napfa.grades.get(c.code())?;
            (grade <= WEAK_GRADE).then_some(WeakStation {
                code: c.code(),
                name: c.label(),
                grade,
            })
        })
        .collect();
    let weak = |c: Component| weak_stations.iter().any(|w| w.code == c.code());

    let mut slots = Vec::new();
    if weak(Component::RUN) {
        slots.push(slot("Monday", "06:00-06:45", "Morning Run (2-3km)", "Cardio"));
        slots.push(slot("Wednesday", "17:30-18:15", "Interval Training", "Cardio"));
        slots.push(slot("Friday", "17:30-18:30", "Long Distance Run (3-4km)", "Cardio"));
    }
    if weak(Component::PU) || weak(Component::SU) {
        slots.push(slot("Tuesday", "17:30-18:30", "Upper Body: Pull-ups, Push-ups, Sit-ups", "Strength"));
        slots.push(slot("Thursday", "17:30-18:30", "Core & Lower Body: Planks, Squats, Lunges", "Strength"));
        slots.push(slot("Saturday", "09:00-10:00", "Full Body Circuit Training", "Strength"));
    }
    if weak(Component::SAR) {
        slots.push(slot("Monday", "19:30-20:00", "Stretching & Flexibility", "Flexibility"));
        slots.push(slot("Wednesday", "19:30-20:00", "Yoga/Stretching", "Flexibility"));
        slots.push(slot("Friday", "19:30-20:00", "Deep Stretching", "Flexibility"));
    }
    if weak_stations.is_empty() {
        slots.push(slot("Monday", "06:00-06:45", "Morning Run (3km)", "Cardio"));
        slots.push(slot("Tuesday", "17:30-18:30", "Strength Training", "Strength"));
        slots.push(slot("Wednesday", "06:00-06:45", "Speed Work", "Cardio"));
        slots.push(slot("Thursday", "17:30-18:30", "Core & Upper Body", "Strength"));
        slots.push(slot("Friday", "17:30-18:30", "Endurance Run", "Cardio"));
        slots.push(slot("Saturday", "09:00-10:00", "Flexibility & Recovery", "Flexibility"));
    }
    slots.push(slot("Sunday", "All Day", "Rest & Recovery", "Rest"));
    slots.sort_by_key(|s| DAYS.iter().position(|d| *d == s.day));

    let (nutrition_goal, nutrition) = if bmi.bmi < 18.5 {
        (
            "Healthy weight gain with muscle building",
            [
                "Daily Calories: 2,800-3,200 kcal",
                "Protein: 1.8-2.2g per kg body weight",
                "Meals: 5-6 small meals throughout the day",
                "Focus: Lean proteins, complex carbs, healthy fats",
            ],
        )
    } else if bmi.bmi > 25.0 {
        (
            "Healthy weight loss with muscle preservation",
            [
                "Daily Calories: 1,800-2,200 kcal",
                "Protein: 1.6-2.0g per kg body weight",
                "Meals: 4-5 balanced meals",
                "Focus: High protein, moderate carbs, healthy fats",
            ],
        )
    } else {
        (
            "Maintain weight and build fitness",
            [
                "Daily Calories: 2,200-2,600 kcal",
                "Protein: 1.6-1.8g per kg body weight",
                "Meals: 4-5 balanced meals",
                "Focus: Balanced macros, nutrient-dense foods",
            ],
        )
    };

    let sleep_advice = if avg_sleep < 8.0 {
        format!(
            "You're averaging {avg_sleep:.1}h - aim for 8-10h. Bedtime 22:00-22:30, wake 06:00-06:30, no screens 1hr before bed."
        )
    } else {
        format!("Great sleep average: {avg_sleep:.1}h - keep a consistent 22:00-22:30 bedtime, weekends too.")
    };

    Ok(TrainingPlan {
        latest_bmi: bmi.bmi,
        body_type: body_type(bmi.weight, bmi.height).name,
        napfa_total: napfa.total,
        medal: napfa.medal.clone(),
        avg_sleep_hours: avg_sleep,
        weak_stations,
        slots,
        nutrition_goal,
        nutrition,
        sleep_advice,
    })
}

// ─── Schedule manager ────────────────────────────────────────

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScheduleError {
    #[error("Unknown day: {0}")]
    BadDay(String),
    #[error("Activity name is required")]
    MissingActivity,
    #[error("Duration must be between 1 and 300 minutes")]
    BadDuration,
    #[error("No schedule entry at index {0}")]
    NoSuchEntry(usize),
}

/// Validate and normalise a new schedule entry.
pub fn schedule_entry(
    day: &str,
    activity: &str,
    time: &str,
    duration: u32,
) -> Result<ScheduleEntry, ScheduleError> {
    let day = DAYS
        .iter()
        .find(|d| d.eq_ignore_ascii_case(day.trim()))
        .ok_or_else(|| ScheduleError::BadDay(day.to_string()))?;
    if activity.trim().is_empty() {
        return Err(ScheduleError::MissingActivity);
    }
    if !(1..=300).contains(&duration) {
        return Err(ScheduleError::BadDuration);
    }
    Ok(ScheduleEntry {
        day: day.to_string(),
        activity: activity.trim().to_string(),
        time: time.to_string(),
        duration,
    })
}

/// Schedule entries grouped by weekday, Monday first.
pub fn weekly_schedule(user: &User) -> Vec<(&'static str, Vec<&ScheduleEntry>)> {
    DAYS.iter()
        .map(|&day| (day, user.schedule.iter().filter(|s| s.day == day).collect::<Vec<_>>()))
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
}

// ─── Reminders ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reminders {
    pub today: String,
    pub day: &'static str,
    /// Schedule entries for today
    pub scheduled: Vec<ScheduleEntry>,
    pub reminders: Vec<String>,
}

pub fn reminders(user: &User, today: NaiveDate) -> Reminders {
    let day = day_name(today.weekday());
    let since = |date: &str| parse_date(date).map(|d| days_between(d, today));
    let mut out = Vec::new();

    if let Some(days) = user.latest_napfa().and_then(|n| since(&n.date)) {
        if days > 30 {
            out.push(format!(
                "It's been {days} days since your last NAPFA test. Consider retesting to track progress!"
            ));
        }
    }

    if let Some(days) = user.bmi_history.last().and_then(|b| since(&b.date)) {
        if days > 14 {
            out.push(format!("Update your BMI - last recorded {days} days ago"));
        }
    }

    match user.sleep_history.last() {
        Some(last) if parse_date(&last.date) == Some(today) => {}
        Some(_) => out.push("Don't forget to log your sleep from last night!".to_string()),
        None => out.push("Start tracking your sleep for better recovery insights!".to_string()),
    }

    match user.exercises.first() {
        Some(latest) => {
            if let Some(days) = since(&latest.date).filter(|d| *d > 2) {
                out.push(format!(
                    "It's been {days} days since your last logged workout. Time to get moving!"
                ));
            }
        }
        None => out.push("Start logging your exercises to track your fitness journey!".to_string()),
    }

    for goal in &user.goals {
        if let Some(until) = parse_date(&goal.date).map(|d| days_between(today, d)) {
            if (0..=7).contains(&until) {
                out.push(format!(
                    "Goal deadline approaching: '{}' in {until} days!",
                    goal.target
                ));
            }
        }
    }

    Reminders {
        today: format_date(today),
        day,
        scheduled: user
            .schedule
            .iter()
            .filter(|s| s.day == day)
            .cloned()
            .collect(),
        reminders: out,
    }
}
