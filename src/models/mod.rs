// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for storage and API.

pub mod badge;
pub mod exercise;
pub mod goal;
pub mod group;
pub mod records;
pub mod user;

pub use badge::Badge;
pub use exercise::{ExerciseEntry, Intensity, StepsEntry, VerificationStatus, WorkoutType};
pub use goal::{Checkpoint, Goal, SmartGoal};
pub use group::Group;
pub use records::{
    BmiRecord, BmrRecord, BodyCompRecord, CompletedChallenge, HeartRateRecord, NapfaResult,
    ScheduleEntry, SleepRecord,
};
pub use user::{Role, User, HOUSES};
