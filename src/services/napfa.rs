// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NAPFA grading.
//!
//! Each of the six stations is graded 0..=5 against age- and gender-specific
//! cutoff tables. The grade total plus the weakest station decide the medal.

use crate::models::NapfaResult;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;

/// NAPFA station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    /// Sit-ups in one minute
    SU,
    /// Standing broad jump (cm)
    SBJ,
    /// Sit and reach (cm)
    SAR,
    /// Pull-ups in 30 seconds
    PU,
    /// Shuttle run (seconds)
    SR,
    /// 2.4 km run (minutes)
    RUN,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::SU,
        Component::SBJ,
        Component::SAR,
        Component::PU,
        Component::SR,
        Component::RUN,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Component::SU => "SU",
            Component::SBJ => "SBJ",
            Component::SAR => "SAR",
            Component::PU => "PU",
            Component::SR => "SR",
            Component::RUN => "RUN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Component::SU => "Sit-Ups",
            Component::SBJ => "Standing Broad Jump",
            Component::SAR => "Sit and Reach",
            Component::PU => "Pull-Ups",
            Component::SR => "Shuttle Run",
            Component::RUN => "2.4km Run",
        }
    }

    /// Timed stations are graded with lower values being better.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Component::SR | Component::RUN)
    }

    /// Stored form of a raw score. Whole results on the counted and
    /// centimetre stations are kept as integers.
    pub fn recorded(&self, score: f64) -> Number {
        if !self.lower_is_better() && score.fract() == 0.0 {
            return Number::from(score as i64);
        }
        Number::from_f64(score).unwrap_or_else(|| Number::from(0))
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse the stored "m"/"f" code (also accepts "male"/"female").
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Some(Gender::Male),
            "f" | "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
    #[serde(rename = "No Medal")]
    NoMedal,
}

impl Medal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Gold => "Gold",
            Medal::Silver => "Silver",
            Medal::Bronze => "Bronze",
            Medal::NoMedal => "No Medal",
        }
    }
}

/// Grading errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NapfaError {
    #[error("No NAPFA standards for age {0} (supported: 12-20)")]
    UnsupportedAge(u32),

    #[error("Unknown gender: {0}")]
    UnknownGender(String),

    #[error("Run time must be in m:ss format, got {0:?}")]
    BadRunTime(String),
}

pub const MIN_AGE: u32 = 12;
pub const MAX_AGE: u32 = 20;
/// Total needed for gold, with every station at grade 3 or better.
pub const GOLD_TOTAL: u32 = 21;
pub const MAX_TOTAL: u32 = 30;

type Table = [[f64; 5]; 6];

/// Cutoffs per age: (male, female), stations in [`Component::ALL`] order.
/// Each row lists the minimum (or maximum, for timed stations) score for
/// grades 5, 4, 3, 2 and 1.
const STANDARDS: [(u32, Table, Table); 9] = [
    (
        12,
        [
            [41.0, 36.0, 32.0, 27.0, 22.0],
            [202.0, 189.0, 176.0, 163.0, 150.0],
            [39.0, 36.0, 32.0, 28.0, 23.0],
            [24.0, 21.0, 16.0, 11.0, 5.0],
            [10.4, 10.9, 11.3, 11.7, 12.2],
            [12.01, 13.10, 14.20, 15.30, 16.50],
        ],
        [
            [29.0, 25.0, 21.0, 17.0, 13.0],
            [167.0, 159.0, 150.0, 141.0, 132.0],
            [39.0, 37.0, 34.0, 30.0, 25.0],
            [15.0, 13.0, 10.0, 7.0, 3.0],
            [11.5, 11.9, 12.3, 12.7, 13.2],
            [14.41, 15.40, 16.40, 17.40, 18.40],
        ],
    ),
    (
        13,
        [
            [42.0, 38.0, 34.0, 29.0, 25.0],
            [214.0, 202.0, 189.0, 176.0, 164.0],
            [41.0, 38.0, 34.0, 30.0, 25.0],
            [25.0, 22.0, 17.0, 12.0, 7.0],
            [10.3, 10.7, 11.1, 11.5, 11.9],
            [11.31, 12.30, 13.40, 14.50, 16.00],
        ],
        [
            [30.0, 26.0, 22.0, 18.0, 14.0],
            [170.0, 162.0, 153.0, 144.0, 135.0],
            [41.0, 39.0, 36.0, 32.0, 27.0],
            [16.0, 13.0, 10.0, 7.0, 3.0],
            [11.3, 11.7, 12.2, 12.7, 13.2],
            [14.31, 15.30, 16.30, 17.30, 18.30],
        ],
    ),
    (
        14,
        [
            [42.0, 40.0, 37.0, 33.0, 29.0],
            [225.0, 216.0, 206.0, 196.0, 186.0],
            [43.0, 40.0, 36.0, 32.0, 27.0],
            [26.0, 23.0, 18.0, 13.0, 8.0],
            [10.2, 10.4, 10.8, 11.2, 11.6],
            [11.01, 12.00, 13.00, 14.10, 15.20],
        ],
        [
            [30.0, 28.0, 24.0, 20.0, 16.0],
            [177.0, 169.0, 160.0, 151.0, 142.0],
            [43.0, 41.0, 38.0, 34.0, 29.0],
            [16.0, 14.0, 10.0, 7.0, 3.0],
            [11.5, 11.8, 12.2, 12.6, 13.0],
            [14.21, 15.20, 16.20, 17.20, 18.20],
        ],
    ),
    (
        15,
        [
            [42.0, 40.0, 37.0, 34.0, 30.0],
            [237.0, 228.0, 218.0, 208.0, 198.0],
            [45.0, 42.0, 38.0, 34.0, 29.0],
            [7.0, 6.0, 5.0, 3.0, 1.0],
            [10.2, 10.3, 10.5, 10.9, 11.3],
            [10.41, 11.40, 12.40, 13.40, 14.40],
        ],
        [
            [30.0, 29.0, 25.0, 21.0, 17.0],
            [182.0, 174.0, 165.0, 156.0, 147.0],
            [45.0, 43.0, 39.0, 35.0, 30.0],
            [16.0, 14.0, 10.0, 7.0, 3.0],
            [11.3, 11.6, 12.0, 12.4, 12.8],
            [14.11, 15.10, 16.10, 17.10, 18.10],
        ],
    ),
    (
        16,
        [
            [42.0, 40.0, 37.0, 34.0, 31.0],
            [245.0, 236.0, 226.0, 216.0, 206.0],
            [47.0, 44.0, 40.0, 36.0, 31.0],
            [8.0, 7.0, 5.0, 3.0, 1.0],
            [10.2, 10.3, 10.5, 10.7, 11.1],
            [10.31, 11.30, 12.20, 13.20, 14.10],
        ],
        [
            [30.0, 29.0, 26.0, 22.0, 18.0],
            [186.0, 178.0, 169.0, 160.0, 151.0],
            [46.0, 44.0, 40.0, 36.0, 31.0],
            [17.0, 14.0, 11.0, 7.0, 3.0],
            [11.3, 11.5, 11.8, 12.2, 12.6],
            [14.01, 15.00, 16.00, 17.00, 17.50],
        ],
    ),
    (
        17,
        [
            [42.0, 40.0, 37.0, 34.0, 31.0],
            [249.0, 240.0, 230.0, 220.0, 210.0],
            [48.0, 45.0, 41.0, 37.0, 32.0],
            [9.0, 8.0, 6.0, 4.0, 2.0],
            [10.2, 10.3, 10.5, 10.7, 10.9],
            [10.21, 11.10, 12.00, 12.50, 13.40],
        ],
        [
            [30.0, 29.0, 27.0, 23.0, 19.0],
            [189.0, 181.0, 172.0, 163.0, 154.0],
            [46.0, 44.0, 40.0, 36.0, 32.0],
            [17.0, 14.0, 11.0, 7.0, 3.0],
            [11.3, 11.5, 11.8, 12.1, 12.5],
            [14.01, 14.50, 15.50, 16.40, 17.30],
        ],
    ),
    (
        18,
        [
            [42.0, 40.0, 37.0, 34.0, 31.0],
            [251.0, 242.0, 232.0, 222.0, 212.0],
            [48.0, 45.0, 41.0, 37.0, 32.0],
            [10.0, 9.0, 7.0, 5.0, 3.0],
            [10.2, 10.3, 10.5, 10.7, 10.9],
            [10.21, 11.10, 11.50, 12.40, 13.30],
        ],
        [
            [30.0, 29.0, 27.0, 24.0, 20.0],
            [192.0, 183.0, 174.0, 165.0, 156.0],
            [46.0, 44.0, 40.0, 36.0, 32.0],
            [17.0, 15.0, 11.0, 8.0, 4.0],
            [11.3, 11.5, 11.8, 12.1, 12.4],
            [14.01, 14.50, 15.40, 16.30, 17.20],
        ],
    ),
    (
        19,
        [
            [42.0, 40.0, 37.0, 34.0, 31.0],
            [251.0, 242.0, 232.0, 222.0, 212.0],
            [48.0, 45.0, 41.0, 37.0, 32.0],
            [10.0, 9.0, 7.0, 5.0, 3.0],
            [10.2, 10.3, 10.5, 10.7, 10.9],
            [10.21, 11.00, 11.40, 12.30, 13.20],
        ],
        [
            [30.0, 29.0, 27.0, 24.0, 21.0],
            [195.0, 185.0, 174.0, 165.0, 156.0],
            [45.0, 43.0, 39.0, 36.0, 32.0],
            [17.0, 15.0, 11.0, 8.0, 5.0],
            [11.3, 11.5, 11.8, 12.1, 12.4],
            [14.21, 14.50, 15.30, 16.20, 17.10],
        ],
    ),
    (
        20,
        [
            [39.0, 37.0, 34.0, 31.0, 28.0],
            [242.0, 234.0, 225.0, 216.0, 207.0],
            [47.0, 44.0, 40.0, 36.0, 32.0],
            [10.0, 9.0, 7.0, 5.0, 3.0],
            [10.4, 10.5, 10.7, 10.9, 11.1],
            [10.21, 11.00, 11.40, 12.20, 13.00],
        ],
        [
            [28.0, 27.0, 25.0, 23.0, 21.0],
            [197.0, 186.0, 174.0, 162.0, 150.0],
            [43.0, 41.0, 38.0, 35.0, 31.0],
            [17.0, 15.0, 11.0, 8.0, 5.0],
            [11.6, 11.8, 12.1, 12.4, 12.7],
            [15.01, 15.30, 16.00, 16.30, 17.00],
        ],
    ),
];

/// Cutoffs for one station, or `None` when the age is outside the table.
pub fn cutoffs(age: u32, gender: Gender, component: Component) -> Option<&'static [f64; 5]> {
    let (_, male, female) = STANDARDS.iter().find(|(a, _, _)| *a == age)?;
    let table = match gender {
        Gender::Male => male,
        Gender::Female => female,
    };
    Some(&table[component.index()])
}

/// Grade a score against five descending cutoffs.
///
/// The first cutoff the score reaches decides the grade (5 for the first,
/// 1 for the last). Scores that reach none of them grade 0.
pub fn calc_grade(score: f64, cutoffs: &[f64; 5], lower_is_better: bool) -> u8 {
    for (i, &cutoff) in cutoffs.iter().enumerate() {
        let reached = if lower_is_better {
            score <= cutoff
        } else {
            score >= cutoff
        };
        if reached {
            return 5 - i as u8;
        }
    }
    0
}

/// Medal for a grade total and the lowest single grade.
pub fn medal(total: u32, min_grade: u8) -> Medal {
    if total >= 21 && min_grade >= 3 {
        Medal::Gold
    } else if total >= 15 && min_grade >= 2 {
        Medal::Silver
    } else if total >= 9 && min_grade >= 1 {
        Medal::Bronze
    } else {
        Medal::NoMedal
    }
}

/// Convert an "m:ss" run time to decimal minutes.
pub fn parse_run_time(value: &str) -> Result<f64, NapfaError> {
    let bad = || NapfaError::BadRunTime(value.to_string());
    let (m, s) = value.trim().split_once(':').ok_or_else(bad)?;
    let minutes: u32 = m.trim().parse().map_err(|_| bad())?;
    let seconds: u32 = s.trim().parse().map_err(|_| bad())?;
    if seconds >= 60 {
        return Err(bad());
    }
    Ok(minutes as f64 + seconds as f64 / 60.0)
}

/// Raw scores for one sitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NapfaScores {
    pub sit_ups: f64,
    pub broad_jump_cm: f64,
    pub sit_reach_cm: f64,
    pub pull_ups: f64,
    pub shuttle_run_s: f64,
    /// Decimal minutes
    pub run_minutes: f64,
}

impl NapfaScores {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::SU => self.sit_ups,
            Component::SBJ => self.broad_jump_cm,
            Component::SAR => self.sit_reach_cm,
            Component::PU => self.pull_ups,
            Component::SR => self.shuttle_run_s,
            Component::RUN => self.run_minutes,
        }
    }
}

/// Grade every station and build the history record.
pub fn grade_test(
    age: u32,
    gender: Gender,
    scores: &NapfaScores,
    date: &str,
) -> Result<NapfaResult, NapfaError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(NapfaError::UnsupportedAge(age));
    }

    let mut score_map = BTreeMap::new();
    let mut grades = BTreeMap::new();
    let mut total = 0u32;
    let mut min_grade = 5u8;

    for component in Component::ALL {
        let table = cutoffs(age, gender, component).ok_or(NapfaError::UnsupportedAge(age))?;
        let score = scores.get(component);
        let grade = calc_grade(score, table, component.lower_is_better());

        score_map.insert(component.code().to_string(), component.recorded(score));
        grades.insert(component.code().to_string(), grade);
        total += grade as u32;
        min_grade = min_grade.min(grade);
    }

    Ok(NapfaResult {
        date: date.to_string(),
        age,
        gender: gender.code().to_string(),
        scores: score_map,
        grades,
        total,
        medal: medal(total, min_grade).as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_scores() -> NapfaScores {
        NapfaScores {
            sit_ups: 45.0,
            broad_jump_cm: 230.0,
            sit_reach_cm: 45.0,
            pull_ups: 27.0,
            shuttle_run_s: 10.0,
            run_minutes: 10.5,
        }
    }

    #[test]
    fn test_grade_at_or_above_lowest_cutoff_is_at_least_one() {
        for age in MIN_AGE..=MAX_AGE {
            for gender in [Gender::Male, Gender::Female] {
                for component in Component::ALL {
                    let table = cutoffs(age, gender, component).unwrap();
                    let lower = component.lower_is_better();
                    assert!(calc_grade(table[4], table, lower) >= 1);
                    let worse = if lower { table[4] + 0.5 } else { table[4] - 1.0 };
                    assert_eq!(calc_grade(worse, table, lower), 0);
                }
            }
        }
    }

    #[test]
    fn test_first_match_wins() {
        let table = [41.0, 36.0, 32.0, 27.0, 22.0];
        assert_eq!(calc_grade(50.0, &table, false), 5);
        assert_eq!(calc_grade(36.0, &table, false), 4);
        assert_eq!(calc_grade(35.0, &table, false), 3);

        let timed = [10.4, 10.9, 11.3, 11.7, 12.2];
        assert_eq!(calc_grade(10.0, &timed, true), 5);
        assert_eq!(calc_grade(11.0, &timed, true), 3);
        assert_eq!(calc_grade(12.5, &timed, true), 0);
    }

    #[test]
    fn test_medal_thresholds() {
        assert_eq!(medal(21, 3), Medal::Gold);
        assert_eq!(medal(20, 3), Medal::Silver);
        assert_eq!(medal(25, 2), Medal::Silver);
        assert_eq!(medal(14, 2), Medal::Bronze);
        assert_eq!(medal(8, 1), Medal::NoMedal);
        assert_eq!(medal(30, 0), Medal::NoMedal);
        assert_eq!(Medal::NoMedal.as_str(), "No Medal");
    }

    #[test]
    fn test_parse_run_time() {
        assert_eq!(parse_run_time("10:30").unwrap(), 10.5);
        assert_eq!(parse_run_time(" 9:00 ").unwrap(), 9.0);
        assert!(matches!(parse_run_time("10"), Err(NapfaError::BadRunTime(_))));
        assert!(parse_run_time("ten:30").is_err());
        assert!(parse_run_time("10:75").is_err());
    }

    #[test]
    fn test_grade_test_builds_record() {
        let result = grade_test(14, Gender::Male, &strong_scores(), "2026-03-01").unwrap();

        assert_eq!(result.grades["SU"], 5);
        assert_eq!(result.grades["PU"], 5);
        assert_eq!(result.grades["RUN"], 5);
        assert_eq!(result.total, 30);
        assert_eq!(result.medal, "Gold");
        assert_eq!(result.gender, "m");
        assert_eq!(result.score("RUN"), Some(10.5));

        let stored = serde_json::to_value(&result).unwrap();
        assert_eq!(stored["scores"]["SU"], serde_json::json!(45));
        assert!(stored["scores"]["SU"].is_u64());
        assert_eq!(stored["scores"]["SBJ"].to_string(), "230");
        assert_eq!(stored["scores"]["SR"].to_string(), "10.0");
        assert_eq!(stored["scores"]["RUN"].to_string(), "10.5");
    }

    #[test]
    fn test_grade_test_rejects_unknown_age() {
        let err = grade_test(11, Gender::Female, &strong_scores(), "2026-03-01").unwrap_err();
        assert_eq!(err, NapfaError::UnsupportedAge(11));
    }

    #[test]
    fn test_component_codes() {
        assert_eq!(Component::from_code("run"), Some(Component::RUN));
        assert_eq!(Component::from_code("XX"), None);
        assert!(Component::SR.lower_is_better());
        assert!(!Component::PU.lower_is_better());
    }
}
