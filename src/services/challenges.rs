// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly challenges.

use crate::models::{CompletedChallenge, User};
use crate::time_utils::{format_date, parse_date};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Workouts,
    Minutes,
    SleepLogs,
}

pub struct Challenge {
    pub name: &'static str,
    pub description: &'static str,
    pub target: u32,
    pub points: u32,
    measure: Measure,
}

pub const WEEKLY_CHALLENGES: [Challenge; 3] = [
    Challenge {
        name: "Workout Warrior",
        description: "Complete 5 workouts this week",
        target: 5,
        points: 50,
        measure: Measure::Workouts,
    },
    Challenge {
        name: "Cardio King",
        description: "Total 150 minutes of exercise this week",
        target: 150,
        points: 60,
        measure: Measure::Minutes,
    },
    Challenge {
        name: "Early Bird",
        description: "Log 7 days of sleep tracking",
        target: 7,
        points: 40,
        measure: Measure::SleepLogs,
    },
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChallengeProgress {
    pub name: &'static str,
    pub description: &'static str,
    pub target: u32,
    pub points: u32,
    pub progress: u32,
    pub completed: bool,
}

impl Challenge {
    fn progress(&self, user: &User, today: NaiveDate) -> u32 {
        let week_ago = today - Duration::days(7);
        let recent = |date: &str| parse_date(date).is_some_and(|d| d > week_ago);
        let count = match self.measure {
            Measure::Workouts => user.exercises.iter().filter(|e| recent(&e.date)).count(),
            Measure::Minutes => user
                .exercises
                .iter()
                .filter(|e| recent(&e.date))
                .map(|e| e.duration as usize)
                .sum(),
            Measure::SleepLogs => user.sleep_history.iter().filter(|s| recent(&s.date)).count(),
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

fn is_completed(user: &User, name: &str) -> bool {
    user.completed_challenges.iter().any(|c| c.name == name)
}

/// Progress of each weekly challenge over the last seven days.
pub fn challenge_progress(user: &User, today: NaiveDate) -> Vec<ChallengeProgress> {
    WEEKLY_CHALLENGES
        .iter()
        .map(|c| ChallengeProgress {
            name: c.name,
            description: c.description,
            target: c.target,
            points: c.points,
            progress: c.progress(user, today),
            completed: is_completed(user, c.name),
        })
        .collect()
}

/// Record every challenge whose target has been met and that was never
/// completed before. Returns the newly completed entries.
pub fn complete_challenges(user: &mut User, today: NaiveDate) -> Vec<CompletedChallenge> {
    let mut done = Vec::new();
    for challenge in &WEEKLY_CHALLENGES {
        if is_completed(user, challenge.name) || challenge.progress(user, today) < challenge.target {
            continue;
        }
        let entry = CompletedChallenge {
            name: challenge.name.to_string(),
            completed_date: format_date(today),
            points: challenge.points,
        };
        user.total_points += i64::from(challenge.points);
        user.completed_challenges.push(entry.clone());
        done.push(entry);
    }
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseEntry, SleepRecord};

    fn day(d: u32) -> String {
        format!("2026-04-{d:02}")
    }

    #[test]
    fn test_progress_counts_last_seven_days() {
        let today = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let mut user = User::default();
        for d in [3, 4, 9, 10] {
            user.exercises.push(ExerciseEntry {
                date: day(d),
                duration: 40,
                ..Default::default()
            });
        }
        let progress = challenge_progress(&user, today);
        assert_eq!(progress[0].progress, 3);
        assert_eq!(progress[1].progress, 120);
        assert_eq!(progress[2].progress, 0);
    }

    #[test]
    fn test_challenges_complete_once() {
        let today = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let mut user = User::default();
        for d in 4..=10 {
            user.sleep_history.push(SleepRecord {
                date: day(d),
                hours: 8,
                ..Default::default()
            });
        }

        let done = complete_challenges(&mut user, today);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].name, "Early Bird");
        assert_eq!(user.total_points, 40);

        assert!(complete_challenges(&mut user, today).is_empty());
        assert_eq!(user.total_points, 40);
        assert!(challenge_progress(&user, today)[2].completed);
    }
}
