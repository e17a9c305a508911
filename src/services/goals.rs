// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SMART goal creation with an achievability check and weekly milestones.

use crate::models::{Checkpoint, Goal, SmartGoal, User};
use crate::time_utils::{days_between, format_date, parse_date};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Milestones are listed for at most this many weeks.
const MAX_MILESTONE_WEEKS: i64 = 8;
/// Safe weight change per week (kg).
const SAFE_WEIGHT_RATE: f64 = 0.5;

/// Category-specific goal details.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "category")]
pub enum GoalPlan {
    #[serde(rename = "NAPFA Improvement")]
    Napfa {
        /// e.g. "Achieve NAPFA Gold Medal" or "Increase total NAPFA score by X points"
        specific: String,
        #[serde(default = "default_target_increase")]
        target_increase: u32,
    },
    #[serde(rename = "Weight Management")]
    Weight {
        current_weight: f64,
        target_weight: f64,
    },
    #[serde(rename = "Strength Building")]
    Strength {
        exercise: String,
        current_reps: u32,
        target_reps: u32,
    },
    #[serde(rename = "Endurance Training")]
    Endurance {
        distance: String,
        current_time: String,
        target_time: String,
    },
    #[serde(rename = "Flexibility")]
    Flexibility { current_reach: u32, target_reach: u32 },
    #[serde(rename = "Consistency/Habits")]
    Consistency { workouts_per_week: u32, weeks: u32 },
}

fn default_target_increase() -> u32 {
    3
}

impl GoalPlan {
    pub fn category(&self) -> &'static str {
        match self {
            GoalPlan::Napfa { .. } => "NAPFA Improvement",
            GoalPlan::Weight { .. } => "Weight Management",
            GoalPlan::Strength { .. } => "Strength Building",
            GoalPlan::Endurance { .. } => "Endurance Training",
            GoalPlan::Flexibility { .. } => "Flexibility",
            GoalPlan::Consistency { .. } => "Consistency/Habits",
        }
    }

    /// The "Specific" statement of the goal.
    pub fn specific(&self) -> String {
        match self {
            GoalPlan::Napfa { specific, .. } => specific.clone(),
            GoalPlan::Weight {
                current_weight,
                target_weight,
            } => format!("Change weight from {current_weight:.1}kg to {target_weight:.1}kg"),
            GoalPlan::Strength {
                exercise,
                current_reps,
                target_reps,
            } => format!("Increase {exercise} from {current_reps} to {target_reps} reps"),
            GoalPlan::Endurance {
                distance,
                current_time,
                target_time,
            } => format!("Run {distance} from {current_time} to {target_time}"),
            GoalPlan::Flexibility {
                current_reach,
                target_reach,
            } => format!("Improve flexibility from {current_reach}cm to {target_reach}cm"),
            GoalPlan::Consistency {
                workouts_per_week,
                weeks,
            } => format!("Workout {workouts_per_week} days/week for {weeks} weeks"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Assessment {
    pub rating: &'static str,
    pub feedback: String,
}

/// Judge whether the goal is realistic within `timeline_weeks`.
pub fn assess(plan: &GoalPlan, user: &User, timeline_weeks: u32) -> Assessment {
    match plan {
        GoalPlan::Napfa { specific, .. } => match user.latest_napfa() {
            Some(latest) if specific.contains("Gold") && latest.total < 15 && timeline_weeks < 12 => {
                Assessment {
                    rating: "Very Challenging",
                    feedback: "This is ambitious! Consider extending timeline to 16+ weeks."
                        .to_string(),
                }
            }
            Some(latest) if latest.total >= 18 => Assessment {
                rating: "Highly Achievable",
                feedback: "Great goal! You're close to Gold already.".to_string(),
            },
            Some(_) => Assessment {
                rating: "Achievable",
                feedback: "Realistic with consistent training!".to_string(),
            },
            None => Assessment {
                rating: "Achievable",
                feedback: String::new(),
            },
        },
        GoalPlan::Weight {
            current_weight,
            target_weight,
        } => {
            let change = (target_weight - current_weight).abs();
            let safe_weeks = change / SAFE_WEIGHT_RATE;
            if (timeline_weeks as f64) < safe_weeks * 0.7 {
                Assessment {
                    rating: "Too Aggressive",
                    feedback: format!(
                        "Recommended timeline: {} weeks for safe {change:.1}kg change",
                        safe_weeks as u32
                    ),
                }
            } else {
                Assessment {
                    rating: "Achievable",
                    feedback: "Safe and achievable rate!".to_string(),
                }
            }
        }
        _ => Assessment {
            rating: "Achievable",
            feedback: String::new(),
        },
    }
}

/// Weekly targets between now and the deadline (first eight weeks).
pub fn milestones(plan: &GoalPlan, user: &User, today: NaiveDate, target: NaiveDate) -> Vec<String> {
    let weeks = days_between(today, target).div_euclid(7);
    if weeks <= 0 {
        return Vec::new();
    }
    let shown = 1..=weeks.min(MAX_MILESTONE_WEEKS);
    let weeks = weeks as f64;

    match plan {
        GoalPlan::Napfa {
            specific,
            target_increase,
        } if specific.to_lowercase().contains("total") => {
            let Some(latest) = user.latest_napfa() else {
                return Vec::new();
            };
            let per_week = *target_increase as f64 / weeks;
            shown
                .map(|w| {
                    let score = latest.total as f64 + per_week * w as f64;
                    format!("Week {w}: Target score {score:.1}/30")
                })
                .collect()
        }
        GoalPlan::Weight {
            current_weight,
            target_weight,
        } => {
            let per_week = (target_weight - current_weight) / weeks;
            shown
                .map(|w| {
                    let weight = current_weight + per_week * w as f64;
                    format!("Week {w}: Target weight {weight:.1}kg")
                })
                .collect()
        }
        GoalPlan::Strength {
            exercise,
            current_reps,
            target_reps,
        } => {
            let per_week = (*target_reps as f64 - *current_reps as f64) / weeks;
            shown
                .map(|w| {
                    let reps = (*current_reps as f64 + per_week * w as f64) as i64;
                    format!("Week {w}: Target {reps} {exercise}")
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GoalError {
    #[error("Timeline must be between 1 and 52 weeks")]
    BadTimeline,
    #[error("Target date must be a YYYY-MM-DD date")]
    BadTargetDate,
    #[error("Progress must be between 0 and 100")]
    BadProgress,
    #[error("No SMART goal at index {0}")]
    NoSuchGoal(usize),
    #[error("Goal description is required")]
    MissingTarget,
    #[error("No goal at index {0}")]
    NoSuchSimpleGoal(usize),
}

/// Fields the student supplies besides the category details.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSmartGoal {
    #[serde(flatten)]
    pub plan: GoalPlan,
    #[serde(default)]
    pub measurable: Vec<String>,
    /// Motivation
    #[serde(default)]
    pub relevant: String,
    pub timeline_weeks: u32,
    /// Defaults to `timeline_weeks` from today
    #[serde(default)]
    pub target_date: Option<String>,
}

/// Build a SMART goal record and its assessment.
pub fn build_goal(
    request: &NewSmartGoal,
    user: &User,
    today: NaiveDate,
) -> Result<(SmartGoal, Assessment), GoalError> {
    if !(1..=52).contains(&request.timeline_weeks) {
        return Err(GoalError::BadTimeline);
    }
    let target = match request.target_date.as_deref() {
        Some(s) => parse_date(s).ok_or(GoalError::BadTargetDate)?,
        None => today + Duration::weeks(request.timeline_weeks as i64),
    };

    let assessment = assess(&request.plan, user, request.timeline_weeks);
    let goal = SmartGoal {
        category: request.plan.category().to_string(),
        specific: request.plan.specific(),
        measurable: request.measurable.clone(),
        achievable: assessment.rating.to_string(),
        relevant: request.relevant.clone(),
        time_bound: format_date(target),
        milestones: milestones(&request.plan, user, today, target),
        created_date: format_date(today),
        progress: 0,
        weekly_checkpoints: Vec::new(),
    };
    Ok((goal, assessment))
}

/// Record progress on a goal and append a checkpoint.
pub fn update_progress(
    user: &mut User,
    index: usize,
    progress: u32,
    today: NaiveDate,
) -> Result<(), GoalError> {
    if progress > 100 {
        return Err(GoalError::BadProgress);
    }
    let goal = user
        .smart_goals
        .get_mut(index)
        .ok_or(GoalError::NoSuchGoal(index))?;
    goal.progress = progress;
    goal.weekly_checkpoints.push(Checkpoint {
        date: format_date(today),
        progress,
    });
    Ok(())
}

pub fn delete_goal(user: &mut User, index: usize) -> Result<SmartGoal, GoalError> {
    if index >= user.smart_goals.len() {
        return Err(GoalError::NoSuchGoal(index));
    }
    Ok(user.smart_goals.remove(index))
}

// ─── Simple dated goals ──────────────────────────────────────

/// Add a plain "target by date" goal. Completed ones count towards the goal
/// badges.
pub fn add_simple_goal(user: &mut User, target: &str, date: &str) -> Result<Goal, GoalError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(GoalError::MissingTarget);
    }
    let date = parse_date(date.trim()).ok_or(GoalError::BadTargetDate)?;
    let goal = Goal {
        target: target.to_string(),
        date: format_date(date),
        progress: 0,
    };
    user.goals.push(goal.clone());
    Ok(goal)
}

pub fn set_simple_goal_progress(user: &mut User, index: usize, progress: u32) -> Result<(), GoalError> {
    if progress > 100 {
        return Err(GoalError::BadProgress);
    }
    user.goals
        .get_mut(index)
        .ok_or(GoalError::NoSuchSimpleGoal(index))?
        .progress = progress;
    Ok(())
}
