// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge awarding and levels.
//!
//! Badges are a fixed, ordered rule list. A rule fires at most once per
//! user: names already present in the user's badge list are skipped.

use crate::models::{Badge, User};
use crate::services::streak::user_workout_streak;
use crate::time_utils::{format_date, parse_date};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

/// Facts the rules are evaluated against, computed once per check.
struct BadgeFacts<'a> {
    user: &'a User,
    workouts: usize,
    workout_streak: u32,
    distinct_workout_dates: usize,
    distinct_exercises: usize,
    recent_sleep: usize,
    recent_good_sleep: usize,
    completed_goals: usize,
}

impl<'a> BadgeFacts<'a> {
    fn new(user: &'a User, today: NaiveDate) -> Self {
        let week_ago = today - Duration::days(7);
        let recent: Vec<_> = user
            .sleep_history
            .iter()
            .filter(|s| parse_date(&s.date).is_some_and(|d| d > week_ago))
            .collect();

        Self {
            user,
            workouts: user.exercises.len(),
            workout_streak: user_workout_streak(user),
            distinct_workout_dates: user
                .exercises
                .iter()
                .map(|e| e.date.as_str())
                .collect::<HashSet<_>>()
                .len(),
            distinct_exercises: user
                .exercises
                .iter()
                .map(|e| e.name.as_str())
                .collect::<HashSet<_>>()
                .len(),
            recent_sleep: recent.len(),
            recent_good_sleep: recent.iter().filter(|s| s.hours >= 8).count(),
            completed_goals: user.goals.iter().filter(|g| g.progress >= 100).count(),
        }
    }

    fn house_points(&self) -> Option<f64> {
        (self.user.is_student() && self.user.house.is_some())
            .then_some(self.user.house_points_contributed)
    }

    fn streak(&self) -> u32 {
        if self.distinct_workout_dates >= 2 {
            self.workout_streak
        } else {
            0
        }
    }
}

struct BadgeRule {
    name: &'static str,
    description: &'static str,
    points: u32,
    earned: fn(&BadgeFacts) -> bool,
}

/// Rules in award order. Names match those stored by earlier versions.
const RULES: &[BadgeRule] = &[
    BadgeRule {
        name: "First Gold",
        description: "Earned your first NAPFA Gold medal!",
        points: 100,
        earned: |f| f.user.latest_napfa().is_some_and(|n| n.medal.contains("Gold")),
    },
    BadgeRule {
        name: "Perfect Score",
        description: "All Grade 5s on NAPFA test!",
        points: 200,
        earned: |f| {
            f.user
                .latest_napfa()
                .is_some_and(|n| n.grades.values().all(|&g| g == 5))
        },
    },
    BadgeRule {
        name: "Century Club",
        description: "Completed 100 total workouts!",
        points: 150,
        earned: |f| f.workouts >= 100,
    },
    BadgeRule {
        name: "Fifty Strong",
        description: "Completed 50 workouts!",
        points: 75,
        earned: |f| f.workouts >= 50,
    },
    BadgeRule {
        name: "Getting Started",
        description: "Completed 10 workouts!",
        points: 25,
        earned: |f| f.workouts >= 10,
    },
    BadgeRule {
        name: "Week Warrior",
        description: "7-day workout streak!",
        points: 50,
        earned: |f| f.streak() >= 7,
    },
    BadgeRule {
        name: "Month Master",
        description: "30-day workout streak!",
        points: 150,
        earned: |f| f.streak() >= 30,
    },
    BadgeRule {
        name: "Sleep Champion",
        description: "7 days of 8+ hours sleep!",
        points: 50,
        earned: |f| f.recent_sleep >= 7 && f.recent_good_sleep >= 7,
    },
    BadgeRule {
        name: "Goal Crusher",
        description: "Completed 5 fitness goals!",
        points: 100,
        earned: |f| f.completed_goals >= 5,
    },
    BadgeRule {
        name: "First Goal",
        description: "Completed your first goal!",
        points: 30,
        earned: |f| f.completed_goals >= 1,
    },
    BadgeRule {
        name: "Daily Visitor",
        description: "7-day login streak!",
        points: 40,
        earned: |f| f.user.login_streak >= 7,
    },
    BadgeRule {
        name: "House Hero",
        description: "100 points for your house!",
        points: 150,
        earned: |f| f.house_points().is_some_and(|p| p >= 100.0),
    },
    BadgeRule {
        name: "House Champion",
        description: "50 points for your house!",
        points: 75,
        earned: |f| f.house_points().is_some_and(|p| p >= 50.0),
    },
    BadgeRule {
        name: "House Starter",
        description: "10 points for your house!",
        points: 25,
        earned: |f| f.house_points().is_some_and(|p| p >= 10.0),
    },
    BadgeRule {
        name: "Social Butterfly",
        description: "10 friends added!",
        points: 50,
        earned: |f| f.user.friends.len() >= 10,
    },
    BadgeRule {
        name: "Friend Finder",
        description: "5 friends added!",
        points: 25,
        earned: |f| f.user.friends.len() >= 5,
    },
    BadgeRule {
        name: "Group Leader",
        description: "Member of 3 groups!",
        points: 40,
        earned: |f| f.user.groups.len() >= 3,
    },
    BadgeRule {
        name: " Variety Master",
        description: "10 different exercise types!",
        points: 60,
        earned: |f| f.distinct_exercises >= 10,
    },
    BadgeRule {
        name: "⏰ Time Champion",
        description: "100 hours of exercise!",
        points: 200,
        earned: |f| f.user.total_workout_hours >= 100.0,
    },
    BadgeRule {
        name: "⏰ Time Warrior",
        description: "50 hours of exercise!",
        points: 100,
        earned: |f| f.user.total_workout_hours >= 50.0,
    },
    BadgeRule {
        name: "⏰ Time Starter",
        description: "10 hours of exercise!",
        points: 30,
        earned: |f| f.user.total_workout_hours >= 10.0,
    },
];

/// Badges the user qualifies for but does not hold yet, and their point sum.
pub fn check_badges(user: &User, today: NaiveDate) -> (Vec<Badge>, u32) {
    let held: HashSet<&str> = user.badges.iter().map(|b| b.name.as_str()).collect();
    let facts = BadgeFacts::new(user, today);
    let date = format_date(today);

    let new_badges: Vec<Badge> = RULES
        .iter()
        .filter(|rule| !held.contains(rule.name) && (rule.earned)(&facts))
        .map(|rule| Badge {
            name: rule.name.to_string(),
            description: rule.description.to_string(),
            date: date.clone(),
            points: rule.points,
        })
        .collect();

    let points = new_badges.iter().map(|b| b.points).sum();
    (new_badges, points)
}

/// Award any newly earned badges, credit their points and refresh the level.
///
/// Callers run this inside a store update so the held-name check and the
/// append happen under one lock.
pub fn award_badges(user: &mut User, today: NaiveDate) -> Vec<Badge> {
    let (new_badges, points) = check_badges(user, today);
    if !new_badges.is_empty() {
        user.badges.extend(new_badges.iter().cloned());
        user.total_points += points as i64;
    }
    user.level = level_for(user.total_points).name.to_string();
    new_badges
}

/// Badges not yet earned, for the achievements page.
pub fn remaining_badges(user: &User) -> Vec<BadgeInfo> {
    RULES
        .iter()
        .filter(|rule| !user.has_badge(rule.name))
        .map(|rule| BadgeInfo {
            name: rule.name,
            description: rule.description,
            points: rule.points,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub points: u32,
}

// ─── Levels ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub name: &'static str,
    pub min_points: i64,
    pub max_points: i64,
}

const LEVELS: [Level; 7] = [
    Level { name: "Novice", min_points: 0, max_points: 50 },
    Level { name: "Beginner", min_points: 50, max_points: 150 },
    Level { name: "Intermediate", min_points: 150, max_points: 300 },
    Level { name: "Advanced", min_points: 300, max_points: 500 },
    Level { name: "Expert", min_points: 500, max_points: 800 },
    Level { name: "Master", min_points: 800, max_points: 1200 },
    Level { name: "Legend", min_points: 1200, max_points: 1200 },
];

pub fn level_for(total_points: i64) -> Level {
    LEVELS
        .iter()
        .copied()
        .find(|l| total_points < l.max_points)
        .unwrap_or(LEVELS[LEVELS.len() - 1])
}

/// Fraction of the way through the current level, 0.0..=1.0.
pub fn level_progress(total_points: i64) -> f64 {
    let level = level_for(total_points);
    if level.max_points == level.min_points {
        return 1.0;
    }
    let span = (level.max_points - level.min_points) as f64;
    ((total_points - level.min_points) as f64 / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseEntry, Goal, NapfaResult, SleepRecord};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn make_workout(name: &str, date: &str) -> ExerciseEntry {
        ExerciseEntry {
            name: name.to_string(),
            date: date.to_string(),
            duration: 30,
            ..Default::default()
        }
    }

    fn names(badges: &[Badge]) -> Vec<&str> {
        badges.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_gold_napfa_awards_first_gold() {
        let mut user = User::default();
        user.napfa_history.push(NapfaResult {
            medal: "Gold".to_string(),
            grades: [("SU".to_string(), 5), ("PU".to_string(), 3)].into_iter().collect(),
            ..Default::default()
        });

        let (badges, points) = check_badges(&user, today());
        assert_eq!(names(&badges), vec!["First Gold"]);
        assert_eq!(points, 100);
    }

    #[test]
    fn test_award_is_idempotent() {
        let mut user = User::default();
        // Three days apart, so no streak badge
        for i in 0..10 {
            user.exercises.push(make_workout("Push-Ups", &format!("2026-01-{:02}", 1 + 3 * i)));
        }

        let first = award_badges(&mut user, today());
        assert_eq!(names(&first), vec!["Getting Started"]);
        assert_eq!(user.total_points, 25);

        let second = award_badges(&mut user, today());
        assert!(second.is_empty());
        assert_eq!(user.total_points, 25);
        assert_eq!(user.badges.len(), 1);
    }

    #[test]
    fn test_week_warrior_needs_streak() {
        let mut user = User::default();
        for day in 3..=9 {
            user.exercises.push(make_workout("Squats", &format!("2026-03-{:02}", day)));
        }
        let (badges, _) = check_badges(&user, today());
        assert!(names(&badges).contains(&"Week Warrior"));
    }

    #[test]
    fn test_sleep_champion_counts_last_seven_days() {
        let mut user = User::default();
        for day in 4..=10 {
            user.sleep_history.push(SleepRecord {
                date: format!("2026-03-{:02}", day),
                hours: 8,
                ..Default::default()
            });
        }
        let (badges, _) = check_badges(&user, today());
        assert_eq!(names(&badges), vec!["Sleep Champion"]);

        // One of the seven is outside the window
        user.sleep_history[0].date = "2026-03-03".to_string();
        let (badges, _) = check_badges(&user, today());
        assert!(badges.is_empty());
    }

    #[test]
    fn test_house_badges_only_for_housed_students() {
        let mut user = User {
            house_points_contributed: 60.0,
            ..Default::default()
        };
        assert!(check_badges(&user, today()).0.is_empty());

        user.house = Some("blue".to_string());
        let (badges, points) = check_badges(&user, today());
        assert_eq!(names(&badges), vec!["House Champion", "House Starter"]);
        assert_eq!(points, 100);
    }

    #[test]
    fn test_goal_badges() {
        let mut user = User::default();
        user.goals.push(Goal {
            target: "Run 2.4km".to_string(),
            progress: 100,
            ..Default::default()
        });
        let (badges, _) = check_badges(&user, today());
        assert_eq!(names(&badges), vec!["First Goal"]);
    }

    #[test]
    fn test_levels() {
        assert_eq!(level_for(0).name, "Novice");
        assert_eq!(level_for(49).name, "Novice");
        assert_eq!(level_for(50).name, "Beginner");
        assert_eq!(level_for(1199).name, "Master");
        assert_eq!(level_for(5000).name, "Legend");
        assert_eq!(level_progress(100), 0.5);
        assert_eq!(level_progress(5000), 1.0);
    }
}
