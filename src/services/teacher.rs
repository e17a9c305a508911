// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Class management for teachers.
//!
//! Every operation resolves the teacher's roster first. Roster entries that
//! no longer name an account are skipped rather than reported.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::Store;
use crate::models::{ExerciseEntry, User, VerificationStatus, HOUSES};
use crate::services::health::user_age;
use crate::services::leaderboard::{rank_houses, HouseStanding};
use crate::services::napfa::{Component, MAX_TOTAL};
use crate::services::social::CLASS_CAPACITY;
use crate::time_utils::{format_date, parse_date};

/// Latest NAPFA totals below this are flagged for attention.
const LOW_NAPFA_TOTAL: u32 = 9;
const ATTENTION_LIMIT: usize = 5;
const TOP_PERFORMERS: usize = 5;
/// Average component grade below this marks a class weak area.
const WEAK_GRADE: f64 = 3.0;
const MAX_OVERRIDE_POINTS: i64 = 500;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TeacherError {
    #[error("Only teachers can manage a class")]
    NotTeacher,
    #[error("'{0}' is not in your class")]
    NotInClass(String),
    #[error("Unknown house '{0}'")]
    UnknownHouse(String),
    #[error("Workout {0} not found")]
    NoSuchWorkout(usize),
    #[error("Points must be between 0 and {MAX_OVERRIDE_POINTS}")]
    BadPoints(i64),
    #[error("Strictness must be 1, 2 or 3")]
    BadStrictness(u8),
    #[error("No students to export")]
    EmptyClass,
    #[error("Could not write report: {0}")]
    Report(String),
}

impl From<csv::Error> for TeacherError {
    fn from(err: csv::Error) -> Self {
        TeacherError::Report(err.to_string())
    }
}

fn teacher<'a>(store: &'a Store, username: &str) -> Result<&'a User, TeacherError> {
    store
        .user(username)
        .filter(|u| u.is_teacher())
        .ok_or(TeacherError::NotTeacher)
}

/// Resolve a teacher's roster, skipping usernames with no account.
pub fn roster<'a>(store: &'a Store, teacher_name: &str) -> Result<Vec<(&'a str, &'a User)>, TeacherError> {
    let t = teacher(store, teacher_name)?;
    Ok(t.students
        .iter()
        .filter_map(|s| store.users.get_key_value(s))
        .map(|(name, user)| (name.as_str(), user))
        .collect())
}

/// Mutable access to a student, checked against the teacher's roster.
fn class_member<'a>(
    store: &'a mut Store,
    teacher_name: &str,
    student: &str,
) -> Result<&'a mut User, TeacherError> {
    let enrolled = teacher(store, teacher_name)?.students.iter().any(|s| s == student);
    if !enrolled {
        return Err(TeacherError::NotInClass(student.to_string()));
    }
    store
        .user_mut(student)
        .ok_or_else(|| TeacherError::NotInClass(student.to_string()))
}

/// Workouts dated within the last seven days (today counts, the day a week ago does not).
fn workouts_this_week(user: &User, today: NaiveDate) -> usize {
    let cutoff = today - Duration::days(7);
    user.exercises
        .iter()
        .filter(|e| parse_date(&e.date).is_some_and(|d| d > cutoff))
        .count()
}

// ─── Overview ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MedalCounts {
    pub gold: usize,
    pub silver: usize,
    pub bronze: usize,
    pub no_medal: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopPerformer {
    pub username: String,
    pub name: String,
    pub score: u32,
    pub medal: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Attention {
    pub username: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassOverview {
    pub class_code: Option<String>,
    pub class_label: String,
    pub students: usize,
    pub capacity: usize,
    pub average_napfa: Option<f64>,
    pub max_napfa: u32,
    pub active_this_week: usize,
    pub workouts_this_week: usize,
    pub medals: MedalCounts,
    pub top_performers: Vec<TopPerformer>,
    pub needs_attention: Vec<Attention>,
}

pub fn class_overview(store: &Store, teacher_name: &str, today: NaiveDate) -> Result<ClassOverview, TeacherError> {
    let t = teacher(store, teacher_name)?;
    let members = roster(store, teacher_name)?;

    let mut medals = MedalCounts::default();
    let mut scored = Vec::new();
    for (username, student) in &members {
        let Some(latest) = student.latest_napfa() else {
            continue;
        };
        match latest.medal.as_str() {
            m if m.contains("Gold") => medals.gold += 1,
            m if m.contains("Silver") => medals.silver += 1,
            m if m.contains("Bronze") => medals.bronze += 1,
            _ => medals.no_medal += 1,
        }
        scored.push(TopPerformer {
            username: username.to_string(),
            name: student.name.clone(),
            score: latest.total,
            medal: latest.medal.clone(),
        });
    }

    let average_napfa = (!scored.is_empty())
        .then(|| scored.iter().map(|s| s.score as f64).sum::<f64>() / scored.len() as f64);

    let weekly: Vec<usize> = members.iter().map(|(_, s)| workouts_this_week(s, today)).collect();

    let needs_attention = members
        .iter()
        .filter_map(|(username, student)| {
            let reason = if student.exercises.is_empty() {
                "No workouts logged".to_string()
            } else {
                let latest = student.latest_napfa().filter(|n| n.total < LOW_NAPFA_TOTAL)?;
                format!("Low NAPFA score ({}/{MAX_TOTAL})", latest.total)
            };
            Some(Attention {
                username: username.to_string(),
                name: student.name.clone(),
                reason,
            })
        })
        .take(ATTENTION_LIMIT)
        .collect();

    // Stable sort keeps roster order among equal scores.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(TOP_PERFORMERS);

    Ok(ClassOverview {
        class_code: t.class_code.clone(),
        class_label: t.class_display_label(),
        students: members.len(),
        capacity: CLASS_CAPACITY,
        average_napfa,
        max_napfa: MAX_TOTAL,
        active_this_week: weekly.iter().filter(|&&n| n > 0).count(),
        workouts_this_week: weekly.iter().sum(),
        medals,
        top_performers: scored,
        needs_attention,
    })
}

// ─── Student list ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentRow {
    pub username: String,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub gender: String,
    pub napfa_total: Option<u32>,
    pub medal: Option<String>,
    pub workouts: usize,
    pub level: String,
    pub total_points: i64,
    pub login_streak: u32,
    pub house: Option<String>,
    pub house_points: f64,
}

fn gender_label(code: &str) -> &'static str {
    if code == "m" {
        "Male"
    } else {
        "Female"
    }
}

fn level_or_default(user: &User) -> String {
    if user.level.is_empty() {
        "Novice".to_string()
    } else {
        user.level.clone()
    }
}

/// Roster rows, optionally filtered by a case-insensitive match on name or username.
pub fn student_list(
    store: &Store,
    teacher_name: &str,
    search: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<StudentRow>, TeacherError> {
    let needle = search.map(str::trim).unwrap_or_default().to_lowercase();
    Ok(roster(store, teacher_name)?
        .into_iter()
        .filter(|(username, s)| {
            needle.is_empty()
                || s.name.to_lowercase().contains(&needle)
                || username.to_lowercase().contains(&needle)
        })
        .map(|(username, s)| {
            let latest = s.latest_napfa();
            StudentRow {
                username: username.to_string(),
                name: s.name.clone(),
                email: s.email.clone(),
                age: user_age(s, today),
                gender: gender_label(&s.gender).to_string(),
                napfa_total: latest.map(|n| n.total),
                medal: latest.map(|n| n.medal.clone()),
                workouts: s.exercises.len(),
                level: level_or_default(s),
                total_points: s.total_points,
                login_streak: s.login_streak,
                house: s.house.clone(),
                house_points: s.house_points_contributed,
            }
        })
        .collect())
}

pub fn assign_house(store: &mut Store, teacher_name: &str, student: &str, house: &str) -> Result<(), TeacherError> {
    let house = house.trim().to_lowercase();
    if !HOUSES.contains(&house.as_str()) {
        return Err(TeacherError::UnknownHouse(house));
    }
    class_member(store, teacher_name, student)?.house = Some(house);
    Ok(())
}

/// Drop a student from the roster. A dangling roster entry is simply removed.
pub fn remove_from_class(store: &mut Store, teacher_name: &str, student: &str) -> Result<(), TeacherError> {
    teacher(store, teacher_name)?;
    let Some(t) = store.user_mut(teacher_name) else {
        return Err(TeacherError::NotTeacher);
    };
    let before = t.students.len();
    t.students.retain(|s| s != student);
    if t.students.len() == before {
        return Err(TeacherError::NotInClass(student.to_string()));
    }
    if let Some(s) = store.user_mut(student) {
        if s.teacher_class.as_deref() == Some(teacher_name) {
            s.teacher_class = None;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassHouses {
    pub standings: Vec<HouseStanding>,
    /// Students without a house
    pub unassigned: Vec<String>,
}

pub fn class_houses(store: &Store, teacher_name: &str) -> Result<ClassHouses, TeacherError> {
    let members = roster(store, teacher_name)?;
    let users: Vec<&User> = members.iter().map(|(_, u)| *u).collect();
    Ok(ClassHouses {
        standings: rank_houses(&users),
        unassigned: members
            .iter()
            .filter(|(_, u)| u.house.is_none())
            .map(|(name, _)| name.to_string())
            .collect(),
    })
}

// ─── Workout reviews ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Verified and not overridden
    Verified,
    Failed,
    /// Unverified or mock
    Unverified,
    Overridden,
}

impl ReviewStatus {
    fn matches(&self, w: &ExerciseEntry) -> bool {
        match self {
            ReviewStatus::Verified => {
                w.verification_status == VerificationStatus::Verified && !w.teacher_override
            }
            ReviewStatus::Failed => w.verification_status == VerificationStatus::Failed,
            ReviewStatus::Unverified => matches!(
                w.verification_status,
                VerificationStatus::Unverified | VerificationStatus::Mock
            ),
            ReviewStatus::Overridden => w.teacher_override,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    NewestFirst,
    OldestFirst,
    FailedFirst,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewFilter {
    /// Student username
    pub student: Option<String>,
    pub status: Option<ReviewStatus>,
    #[serde(default)]
    pub sort: ReviewSort,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Review {
    pub student: String,
    pub student_name: String,
    /// Position in the student's workout list
    pub index: usize,
    pub workout: ExerciseEntry,
}

/// Photo submissions across the class.
pub fn workout_reviews(store: &Store, teacher_name: &str, filter: &ReviewFilter) -> Result<Vec<Review>, TeacherError> {
    let status = filter.status;
    let mut reviews: Vec<Review> = roster(store, teacher_name)?
        .into_iter()
        .filter(|(username, _)| filter.student.as_deref().is_none_or(|s| s == *username))
        .flat_map(|(username, student)| {
            student
                .exercises
                .iter()
                .enumerate()
                .filter(|(_, w)| w.has_photo && w.photo_b64.as_deref().is_some_and(|p| !p.is_empty()))
                .filter(move |(_, w)| status.is_none_or(|s| s.matches(w)))
                .map(move |(index, w)| Review {
                    student: username.to_string(),
                    student_name: student.name.clone(),
                    index,
                    workout: w.clone(),
                })
        })
        .collect();

    match filter.sort {
        ReviewSort::NewestFirst => reviews.sort_by_key(|r| std::cmp::Reverse(r.workout.sort_key())),
        ReviewSort::OldestFirst => reviews.sort_by_key(|r| r.workout.sort_key()),
        ReviewSort::FailedFirst => reviews.sort_by_key(|r| {
            (
                r.workout.verification_status != VerificationStatus::Failed,
                r.workout.sort_key(),
            )
        }),
    }
    Ok(reviews)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Override {
    pub points_earned: i64,
    pub difference: i64,
    pub total_points: i64,
}

/// Replace a workout's points, marking it verified by the teacher.
pub fn override_points(
    store: &mut Store,
    teacher_name: &str,
    student: &str,
    index: usize,
    points: i64,
) -> Result<Override, TeacherError> {
    if !(0..=MAX_OVERRIDE_POINTS).contains(&points) {
        return Err(TeacherError::BadPoints(points));
    }
    let user = class_member(store, teacher_name, student)?;
    let workout = user
        .exercises
        .get_mut(index)
        .ok_or(TeacherError::NoSuchWorkout(index))?;
    let difference = points - workout.points_earned;
    workout.points_earned = points;
    workout.teacher_override = true;
    workout.verification_status = VerificationStatus::Verified;
    user.total_points += difference;

    tracing::info!(teacher = %teacher_name, student = %student, index, difference, "Points overridden");
    Ok(Override {
        points_earned: points,
        difference,
        total_points: user.total_points,
    })
}

/// Clear the override flag. Points and status stay as the teacher left them.
pub fn reset_override(store: &mut Store, teacher_name: &str, student: &str, index: usize) -> Result<(), TeacherError> {
    class_member(store, teacher_name, student)?
        .exercises
        .get_mut(index)
        .ok_or(TeacherError::NoSuchWorkout(index))?
        .teacher_override = false;
    Ok(())
}

// ─── Performance analysis ────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComponentAverage {
    pub code: &'static str,
    pub label: &'static str,
    /// None when no student has a grade for it
    pub average: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekActivity {
    pub week: String,
    pub start: String,
    pub end: String,
    pub active_students: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Performance {
    pub components: Vec<ComponentAverage>,
    pub weak_components: Vec<&'static str>,
    /// Oldest week first
    pub participation: Vec<WeekActivity>,
}

pub fn performance(store: &Store, teacher_name: &str, today: NaiveDate) -> Result<Performance, TeacherError> {
    let members = roster(store, teacher_name)?;

    let components: Vec<ComponentAverage> = Component::ALL
        .iter()
        .map(|c| {
            let grades: Vec<f64> = members
                .iter()
                .filter_map(|(_, s)| s.latest_napfa()?.grades.get(c.code()).copied())
                .map(f64::from)
                .collect();
            ComponentAverage {
                code: c.code(),
                label: c.label(),
                average: (!grades.is_empty()).then(|| grades.iter().sum::<f64>() / grades.len() as f64),
                samples: grades.len(),
            }
        })
        .collect();

    let weak_components = components
        .iter()
        .filter(|c| c.average.is_some_and(|avg| avg < WEAK_GRADE))
        .map(|c| c.label)
        .collect();

    // Week n covers the seven days ending 7n days ago.
    let participation = (0..4i64)
        .rev()
        .map(|n| {
            let end = today - Duration::days(7 * n);
            let start = end - Duration::days(7);
            let active_students = members
                .iter()
                .filter(|(_, s)| {
                    s.exercises
                        .iter()
                        .filter_map(|e| parse_date(&e.date))
                        .any(|d| d > start && d <= end)
                })
                .count();
            WeekActivity {
                week: format!("Week {}", 4 - n),
                start: format_date(start + Duration::days(1)),
                end: format_date(end),
                active_students,
            }
        })
        .collect();

    Ok(Performance {
        components,
        weak_components,
        participation,
    })
}

// ─── Settings ────────────────────────────────────────────────

/// Rename the class. Returns the stored label.
pub fn set_class_label(store: &mut Store, teacher_name: &str, label: &str) -> Result<String, TeacherError> {
    teacher(store, teacher_name)?;
    let label = label.trim().to_string();
    if let Some(t) = store.user_mut(teacher_name) {
        t.class_label = Some(label.clone());
    }
    Ok(label)
}

pub fn strictness_description(level: u8) -> &'static str {
    match level {
        1 => "Lenient: any honest attempt is approved. Only the wrong exercise or a clear injury risk is rejected.",
        3 => "Strict: all key form criteria must be met. Partial or sloppy form is rejected with direct feedback.",
        _ => "Standard: clear effort and roughly correct form are required. Minor imperfections are accepted.",
    }
}

/// Set photo verification strictness for the teacher's students.
pub fn set_strictness(store: &mut Store, teacher_name: &str, level: u8) -> Result<u8, TeacherError> {
    if !(1..=3).contains(&level) {
        return Err(TeacherError::BadStrictness(level));
    }
    teacher(store, teacher_name)?;
    if let Some(t) = store.user_mut(teacher_name) {
        t.verification_strictness = Some(level);
    }
    Ok(level)
}

// ─── CSV report ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReportOptions {
    #[serde(default = "enabled")]
    pub napfa: bool,
    #[serde(default = "enabled")]
    pub workouts: bool,
    #[serde(default = "enabled")]
    pub attendance: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            napfa: true,
            workouts: true,
            attendance: true,
        }
    }
}

/// Suggested download name for a report generated on `today`.
pub fn report_filename(today: NaiveDate) -> String {
    format!("class_report_{}.csv", today.format("%Y%m%d"))
}

/// One row per student. Cells are blank where a student has no data.
pub fn class_report_csv(
    store: &Store,
    teacher_name: &str,
    options: ReportOptions,
    today: NaiveDate,
) -> Result<String, TeacherError> {
    let members = roster(store, teacher_name)?;
    if members.is_empty() {
        return Err(TeacherError::EmptyClass);
    }

    let mut header: Vec<String> = ["Name", "Email", "Age", "Gender"].map(String::from).to_vec();
    if options.napfa {
        header.extend(["NAPFA Total", "Medal"].map(String::from));
        header.extend(Component::ALL.iter().map(|c| c.label().to_string()));
    }
    if options.workouts {
        header.extend(["Total Workouts", "Workouts This Week"].map(String::from));
    }
    if options.attendance {
        header.extend(["Login Streak", "Level", "Total Points"].map(String::from));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for (_, s) in &members {
        let mut row = vec![
            s.name.clone(),
            s.email.clone(),
            user_age(s, today).to_string(),
            gender_label(&s.gender).to_string(),
        ];
        if options.napfa {
            match s.latest_napfa() {
                Some(n) => {
                    row.push(n.total.to_string());
                    row.push(n.medal.clone());
                    row.extend(Component::ALL.iter().map(|c| n.grade(c.code()).to_string()));
                }
                None => row.extend(std::iter::repeat_n(String::new(), 2 + Component::ALL.len())),
            }
        }
        if options.workouts {
            row.push(s.exercises.len().to_string());
            row.push(workouts_this_week(s, today).to_string());
        }
        if options.attendance {
            row.push(s.login_streak.to_string());
            row.push(level_or_default(s));
            row.push(s.total_points.to_string());
        }
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TeacherError::Report(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| TeacherError::Report(e.to_string()))
}
