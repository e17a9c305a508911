// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! House standings and leaderboards.
//!
//! Boards other than house standings only include students who opted in
//! with `show_on_leaderboards`. Group boards are the exception: they list
//! every member, and members whose account is gone show up as "Unknown".

use crate::db::Store;
use crate::models::{User, HOUSES};
use crate::services::napfa::{Component, Gender};
use crate::services::streak::user_workout_streak;
use crate::time_utils::parse_date;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const GLOBAL_LIMIT: usize = 20;
pub const HIGH_SCORE_LIMIT: usize = 15;
pub const TOP_CONTRIBUTORS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HousePoints,
    NapfaScore,
    WeeklyWorkouts,
    WorkoutStreak,
    TotalWorkouts,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankEntry {
    pub rank: usize,
    pub username: String,
    pub name: String,
    pub house: Option<String>,
    pub value: f64,
    pub display: String,
}

fn weekly_workouts(user: &User, today: NaiveDate) -> usize {
    let week_ago = today - Duration::days(7);
    user.exercises
        .iter()
        .filter(|e| parse_date(&e.date).is_some_and(|d| d > week_ago))
        .count()
}

/// Value and label for one user, or `None` when the user has nothing to
/// rank on (no NAPFA test, no workouts for workout-based metrics).
fn measure(user: &User, metric: Metric, today: NaiveDate) -> Option<(f64, String)> {
    match metric {
        Metric::HousePoints => Some((
            user.house_points_contributed,
            format!("{:.1} points", user.house_points_contributed),
        )),
        Metric::NapfaScore => user
            .latest_napfa()
            .map(|n| (f64::from(n.total), format!("{}/30", n.total))),
        Metric::WeeklyWorkouts => (!user.exercises.is_empty()).then(|| {
            let n = weekly_workouts(user, today);
            (n as f64, format!("{n} workouts"))
        }),
        Metric::WorkoutStreak => (!user.exercises.is_empty()).then(|| {
            let n = user_workout_streak(user);
            (f64::from(n), format!("{n} days"))
        }),
        Metric::TotalWorkouts => {
            let n = user.exercises.len();
            Some((n as f64, format!("{n} workouts")))
        }
    }
}

fn entry(username: &str, user: &User, value: f64, display: String) -> RankEntry {
    RankEntry {
        rank: 0,
        username: username.to_string(),
        name: user.name.clone(),
        house: user.house.clone(),
        value,
        display,
    }
}

/// Sort by value (descending unless `ascending`), keep `limit` and number
/// the ranks from 1. Ties keep their input order.
fn ranked(mut entries: Vec<RankEntry>, ascending: bool, limit: Option<usize>) -> Vec<RankEntry> {
    entries.sort_by(|a, b| {
        let ord = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i + 1;
    }
    entries
}

fn board<'a>(
    users: impl Iterator<Item = (&'a String, &'a User)>,
    metric: Metric,
    today: NaiveDate,
) -> Vec<RankEntry> {
    users
        .filter_map(|(username, user)| {
            measure(user, metric, today).map(|(value, display)| entry(username, user, value, display))
        })
        .collect()
}

/// Everyone who opted in. Users with a zero value are left off.
pub fn global_board(store: &Store, metric: Metric, today: NaiveDate) -> Vec<RankEntry> {
    let entries = board(store.leaderboard_students(), metric, today)
        .into_iter()
        .filter(|e| e.value > 0.0)
        .collect();
    ranked(entries, false, Some(GLOBAL_LIMIT))
}

pub fn house_board(store: &Store, house: &str, metric: Metric, today: NaiveDate) -> Vec<RankEntry> {
    let members = store
        .leaderboard_students()
        .filter(|(_, u)| u.house.as_deref() == Some(house));
    ranked(board(members, metric, today), false, None)
}

/// The caller plus every friend whose account still exists.
pub fn friends_board(store: &Store, username: &str, metric: Metric, today: NaiveDate) -> Vec<RankEntry> {
    let Some(me) = store.users.get_key_value(username) else {
        return Vec::new();
    };
    let friends = me
        .1
        .friends
        .iter()
        .filter(|f| f.as_str() != username)
        .filter_map(|f| store.users.get_key_value(f.as_str()));
    ranked(board(std::iter::once(me).chain(friends), metric, today), false, None)
}

pub fn group_board(store: &Store, group_id: &str, metric: Metric, today: NaiveDate) -> Option<Vec<RankEntry>> {
    let group = store.group(group_id)?;
    let unknown = User {
        name: "Unknown".to_string(),
        ..Default::default()
    };
    let entries = group
        .members
        .iter()
        .filter_map(|member| {
            let user = store.user(member).unwrap_or(&unknown);
            measure(user, metric, today).map(|(value, display)| entry(member, user, value, display))
        })
        .collect();
    Some(ranked(entries, false, None))
}

/// Opted-in classmates of the given teacher.
pub fn class_board(store: &Store, teacher: &str, metric: Metric, today: NaiveDate) -> Vec<RankEntry> {
    let classmates = store
        .leaderboard_students()
        .filter(|(_, u)| u.teacher_class.as_deref() == Some(teacher));
    ranked(board(classmates, metric, today), false, None)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HighScoreFilter {
    /// NAPFA component code; total score when absent
    pub component: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Best latest-test results. Shuttle run and 2.4km run rank fastest first.
pub fn high_scores(store: &Store, filter: &HighScoreFilter) -> Result<Vec<RankEntry>, String> {
    let component = match filter.component.as_deref() {
        None | Some("") | Some("total") => None,
        Some(code) => Some(Component::from_code(code).ok_or_else(|| format!("Unknown component: {code}"))?),
    };
    let gender = match filter.gender.as_deref() {
        None | Some("") | Some("all") => None,
        Some(g) => Some(Gender::parse(g).ok_or_else(|| format!("Unknown gender: {g}"))?),
    };

    let entries = store
        .leaderboard_students()
        .filter(|(_, u)| filter.age.is_none_or(|age| u.age == Some(age)))
        .filter(|(_, u)| gender.is_none_or(|g| Gender::parse(&u.gender) == Some(g)))
        .filter_map(|(username, user)| {
            let latest = user.latest_napfa()?;
            let (value, display) = match component {
                None => (f64::from(latest.total), format!("{}/30", latest.total)),
                Some(c) => {
                    let value = latest.score(c.code())?;
                    (value, display_score(c, value))
                }
            };
            Some(entry(username, user, value, display))
        })
        .collect();

    let ascending = component.is_some_and(|c| c.lower_is_better());
    Ok(ranked(entries, ascending, Some(HIGH_SCORE_LIMIT)))
}

fn display_score(component: Component, value: f64) -> String {
    match component {
        Component::SR => format!("{value:.2}s"),
        Component::RUN => {
            let minutes = value.trunc() as u32;
            let seconds = (value.fract() * 60.0) as u32;
            format!("{minutes}:{seconds:02}")
        }
        _ => format!("{value}"),
    }
}

// ─── Houses ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HouseStanding {
    pub rank: usize,
    pub house: &'static str,
    pub display: String,
    pub points: f64,
    pub members: usize,
    pub workouts: usize,
    pub points_per_member: f64,
}

pub fn house_display(house: &str) -> String {
    let mut chars = house.chars();
    match chars.next() {
        Some(first) => format!("{}{} House", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// Totals per house over every student that belongs to one.
pub fn house_standings(store: &Store) -> Vec<HouseStanding> {
    let students: Vec<&User> = store.students().map(|(_, u)| u).collect();
    rank_houses(&students)
}

/// Rank all five houses over the given students, highest points first.
pub fn rank_houses(students: &[&User]) -> Vec<HouseStanding> {
    let mut standings: Vec<HouseStanding> = HOUSES
        .iter()
        .map(|&house| {
            let members: Vec<&User> = students
                .iter()
                .copied()
                .filter(|u| u.house.as_deref() == Some(house))
                .collect();
            let points: f64 = members.iter().map(|u| u.house_points_contributed).sum();
            HouseStanding {
                rank: 0,
                house,
                display: house_display(house),
                points,
                members: members.len(),
                workouts: members.iter().map(|u| u.exercises.len()).sum(),
                points_per_member: if members.is_empty() {
                    0.0
                } else {
                    points / members.len() as f64
                },
            }
        })
        .collect();
    standings.sort_by(|a, b| b.points.partial_cmp(&a.points).unwrap_or(Ordering::Equal));
    for (i, s) in standings.iter_mut().enumerate() {
        s.rank = i + 1;
    }
    standings
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MyHouse {
    pub house: String,
    pub display: String,
    pub rank: usize,
    pub contribution: f64,
    pub workout_hours: f64,
    pub top_contributors: Vec<RankEntry>,
}

/// The caller's house, when they are a student with one.
pub fn my_house(store: &Store, username: &str) -> Option<MyHouse> {
    let user = store.user(username).filter(|u| u.is_student())?;
    let house = user.house.clone()?;
    let rank = house_standings(store)
        .iter()
        .find(|s| s.house == house)
        .map_or(0, |s| s.rank);
    let members = store
        .students()
        .filter(|(_, u)| u.house.as_deref() == Some(house.as_str()));
    let top_contributors = ranked(
        board(members, Metric::HousePoints, NaiveDate::MIN),
        false,
        Some(TOP_CONTRIBUTORS),
    );

    Some(MyHouse {
        display: house_display(&house),
        house,
        rank,
        contribution: user.house_points_contributed,
        workout_hours: user.total_workout_hours,
        top_contributors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseEntry, NapfaResult};

    fn student(name: &str, house: &str, points: f64, opted_in: bool) -> User {
        User {
            name: name.to_string(),
            house: Some(house.to_string()),
            house_points_contributed: points,
            show_on_leaderboards: opted_in,
            ..Default::default()
        }
    }

    fn sample() -> Store {
        let mut store = Store::default();
        store.users.insert("amy".into(), student("Amy", "red", 12.5, true));
        store.users.insert("ben".into(), student("Ben", "red", 3.0, false));
        store.users.insert("cat".into(), student("Cat", "blue", 7.0, true));
        store.users.insert("dan".into(), student("Dan", "blue", 0.0, true));
        store
    }

    #[test]
    fn test_house_standings() {
        let standings = house_standings(&sample());
        assert_eq!(standings[0].house, "red");
        assert_eq!(standings[0].points, 15.5);
        assert_eq!(standings[0].members, 2);
        assert_eq!(standings[1].house, "blue");
        assert_eq!(standings[1].points_per_member, 3.5);
        assert_eq!(standings.len(), 5);
        assert_eq!(standings[0].display, "Red House");
    }

    #[test]
    fn test_global_board_skips_hidden_and_zero() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let board = global_board(&sample(), Metric::HousePoints, today);
        let names: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["amy", "cat"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].display, "12.5 points");
    }

    #[test]
    fn test_high_scores_run_sorted_fastest_first() {
        let mut store = sample();
        for (name, run) in [("amy", 11.5), ("cat", 10.25)] {
            let user = store.users.get_mut(name).unwrap();
            user.napfa_history.push(NapfaResult {
                scores: [("RUN".to_string(), serde_json::Number::from_f64(run).unwrap())]
                    .into_iter()
                    .collect(),
                total: 20,
                ..Default::default()
            });
        }
        let filter = HighScoreFilter {
            component: Some("RUN".to_string()),
            ..Default::default()
        };
        let board = high_scores(&store, &filter).unwrap();
        assert_eq!(board[0].username, "cat");
        assert_eq!(board[0].display, "10:15");
        assert_eq!(board[1].display, "11:30");

        let bad = HighScoreFilter {
            component: Some("XYZ".to_string()),
            ..Default::default()
        };
        assert!(high_scores(&store, &bad).is_err());
    }

    #[test]
    fn test_group_board_tolerates_missing_members() {
        let mut store = sample();
        store.groups.insert(
            "g1".into(),
            crate::models::Group {
                id: "g1".into(),
                members: vec!["amy".into(), "ghost".into()],
                ..Default::default()
            },
        );
        store.users.get_mut("amy").unwrap().exercises.push(ExerciseEntry::default());
        let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let board = group_board(&store, "g1", Metric::TotalWorkouts, today).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[1].name, "Unknown");
        assert!(group_board(&store, "nope", Metric::TotalWorkouts, today).is_none());
    }

    #[test]
    fn test_my_house() {
        let store = sample();
        let mine = my_house(&store, "ben").unwrap();
        assert_eq!(mine.rank, 1);
        assert_eq!(mine.top_contributors[0].username, "amy");
        assert!(my_house(&store, "nobody").is_none());
    }
}
