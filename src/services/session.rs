// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user workout session state: rep counter, simple timer and interval
//! timer.
//!
//! This state lives only in memory and is keyed by username. It is reset
//! after a workout is saved and dropped on logout or server restart.

use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};

// ─── Rep counter ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SetLog {
    pub set: u32,
    pub reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepCounter {
    pub exercise: String,
    pub reps: u32,
    /// Number of the set currently being counted
    pub set_number: u32,
    pub sets: Vec<SetLog>,
}

impl Default for RepCounter {
    fn default() -> Self {
        Self {
            exercise: String::new(),
            reps: 0,
            set_number: 1,
            sets: Vec::new(),
        }
    }
}

impl RepCounter {
    pub fn add(&mut self, n: u32) {
        self.reps = self.reps.saturating_add(n);
    }

    pub fn decrement(&mut self) {
        self.reps = self.reps.saturating_sub(1);
    }

    pub fn reset_reps(&mut self) {
        self.reps = 0;
    }

    /// Log the current reps as a set. Does nothing when no reps are counted.
    pub fn finish_set(&mut self) -> Option<SetLog> {
        if self.reps == 0 {
            return None;
        }
        let log = SetLog {
            set: self.set_number,
            reps: self.reps,
        };
        self.sets.push(log);
        self.set_number += 1;
        self.reps = 0;
        Some(log)
    }

    /// Switching exercise starts from a clean counter.
    pub fn select_exercise(&mut self, exercise: &str) {
        if self.exercise != exercise {
            *self = RepCounter {
                exercise: exercise.to_string(),
                ..Default::default()
            };
        }
    }

    /// Logged sets plus any pending reps as a final set.
    pub fn all_sets(&self) -> Vec<SetLog> {
        let mut sets = self.sets.clone();
        if self.reps > 0 {
            sets.push(SetLog {
                set: self.set_number,
                reps: self.reps,
            });
        }
        sets
    }
}

// ─── Timers ──────────────────────────────────────────────────

/// Start/pause bookkeeping shared by both timers.
#[derive(Debug, Clone, Copy, Default)]
struct Stopwatch {
    banked: Duration,
    started: Option<Instant>,
}

impl Stopwatch {
    fn elapsed(&self, now: Instant) -> Duration {
        self.banked + self.started.map_or(Duration::ZERO, |s| now.saturating_duration_since(s))
    }

    fn start(&mut self, now: Instant) {
        if self.started.is_none() {
            self.started = Some(now);
        }
    }

    fn pause(&mut self, now: Instant) {
        self.banked = self.elapsed(now);
        self.started = None;
    }

    fn running(&self) -> bool {
        self.started.is_some()
    }

    fn ever_started(&self, now: Instant) -> bool {
        self.running() || !self.elapsed(now).is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerStatus {
    pub running: bool,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub finished: bool,
    pub elapsed_minutes: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleTimer {
    total: Duration,
    watch: Stopwatch,
}

impl SimpleTimer {
    pub fn new(total_seconds: u64) -> Self {
        Self {
            total: Duration::from_secs(total_seconds),
            watch: Stopwatch::default(),
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.total.saturating_sub(self.watch.elapsed(now))
    }

    pub fn start(&mut self, now: Instant) {
        if !self.remaining(now).is_zero() {
            self.watch.start(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.watch.pause(now);
    }

    pub fn reset(&mut self) {
        self.watch = Stopwatch::default();
    }

    pub fn status(&mut self, now: Instant) -> TimerStatus {
        let remaining = self.remaining(now);
        if remaining.is_zero() && self.watch.running() {
            self.watch.pause(now);
        }
        let used = self.total - remaining;
        TimerStatus {
            running: self.watch.running(),
            total_seconds: self.total.as_secs(),
            remaining_seconds: remaining.as_secs(),
            finished: remaining.is_zero(),
            elapsed_minutes: used.as_secs() as f64 / 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalStatus {
    pub running: bool,
    pub phase: Phase,
    pub round: u32,
    pub rounds: u32,
    pub phase_remaining_seconds: u64,
    pub planned_minutes: f64,
}

/// HIIT timer: alternating work and rest phases. The last round ends
/// after its rest phase.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    work: u64,
    rest: u64,
    rounds: u32,
    watch: Stopwatch,
}

impl IntervalTimer {
    pub fn new(work_seconds: u64, rest_seconds: u64, rounds: u32) -> Self {
        Self {
            work: work_seconds.max(1),
            rest: rest_seconds,
            rounds: rounds.max(1),
            watch: Stopwatch::default(),
        }
    }

    pub fn planned_minutes(&self) -> f64 {
        f64::from(self.rounds) * (self.work + self.rest) as f64 / 60.0
    }

    fn total_seconds(&self) -> u64 {
        u64::from(self.rounds) * (self.work + self.rest)
    }

    pub fn start(&mut self, now: Instant) {
        if self.watch.elapsed(now).as_secs() < self.total_seconds() {
            self.watch.start(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.watch.pause(now);
    }

    pub fn reset(&mut self) {
        self.watch = Stopwatch::default();
    }

    /// Whether the intervals have been started since the last reset.
    pub fn started(&self, now: Instant) -> bool {
        self.watch.ever_started(now)
    }

    pub fn status(&mut self, now: Instant) -> IntervalStatus {
        let elapsed = self.watch.elapsed(now).as_secs();
        let cycle = self.work + self.rest;
        let (phase, round, left) = if elapsed >= self.total_seconds() {
            if self.watch.running() {
                self.watch.pause(now);
            }
            (Phase::Done, self.rounds, 0)
        } else {
            let round = (elapsed / cycle) as u32 + 1;
            let within = elapsed % cycle;
            if within < self.work {
                (Phase::Work, round, self.work - within)
            } else {
                (Phase::Rest, round, cycle - within)
            }
        };
        IntervalStatus {
            running: self.watch.running(),
            phase,
            round,
            rounds: self.rounds,
            phase_remaining_seconds: left,
            planned_minutes: self.planned_minutes(),
        }
    }
}

// ─── Session registry ────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct WorkoutSession {
    pub counter: RepCounter,
    pub timer: Option<SimpleTimer>,
    pub interval: Option<IntervalTimer>,
}

impl WorkoutSession {
    /// Minutes measured by whichever timer is in use. An interval session
    /// counts its planned length once it has been started.
    pub fn timer_minutes(&mut self, now: Instant) -> f64 {
        if let Some(interval) = self.interval.as_ref() {
            return if interval.started(now) {
                interval.planned_minutes()
            } else {
                0.0
            };
        }
        self.timer
            .as_mut()
            .map_or(0.0, |timer| timer.status(now).elapsed_minutes)
    }

    /// Drop both timers once their minutes have been saved.
    pub fn clear_timers(&mut self) {
        self.timer = None;
        self.interval = None;
    }
}

/// Session state for every logged-in user.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, WorkoutSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the user's session, creating it on first use.
    pub fn with<R>(&self, username: &str, f: impl FnOnce(&mut WorkoutSession) -> R) -> R {
        let mut entry = self.sessions.entry(username.to_string()).or_default();
        f(entry.value_mut())
    }

    pub fn clear(&self, username: &str) {
        if self.sessions.remove(username).is_some() {
            tracing::debug!(username, "Workout session cleared");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rep_counter() {
        let mut counter = RepCounter::default();
        counter.select_exercise("Push-Ups");
        counter.decrement();
        assert_eq!(counter.reps, 0);
        assert_eq!(counter.finish_set(), None);

        counter.add(5);
        counter.add(1);
        counter.decrement();
        assert_eq!(counter.finish_set(), Some(SetLog { set: 1, reps: 5 }));
        counter.add(3);
        assert_eq!(counter.all_sets(), [SetLog { set: 1, reps: 5 }, SetLog { set: 2, reps: 3 }]);

        counter.select_exercise("Squats");
        assert_eq!(counter.reps, 0);
        assert_eq!(counter.set_number, 1);
        assert!(counter.sets.is_empty());
    }

    #[test]
    fn test_simple_timer_pause_and_finish() {
        let t0 = Instant::now();
        let mut timer = SimpleTimer::new(120);
        timer.start(t0);
        timer.pause(t0 + Duration::from_secs(30));

        let status = timer.status(t0 + Duration::from_secs(500));
        assert!(!status.running);
        assert_eq!(status.remaining_seconds, 90);
        assert_eq!(status.elapsed_minutes, 0.5);

        timer.start(t0 + Duration::from_secs(500));
        let status = timer.status(t0 + Duration::from_secs(700));
        assert!(status.finished);
        assert!(!status.running);
        assert_eq!(status.remaining_seconds, 0);
        assert_eq!(status.elapsed_minutes, 2.0);

        timer.reset();
        assert_eq!(timer.status(t0).remaining_seconds, 120);
    }

    #[test]
    fn test_interval_phases() {
        let t0 = Instant::now();
        let mut hiit = IntervalTimer::new(30, 10, 2);
        assert_eq!(hiit.planned_minutes(), 80.0 / 60.0);
        hiit.start(t0);

        let s = hiit.status(t0 + Duration::from_secs(12));
        assert_eq!((s.phase, s.round, s.phase_remaining_seconds), (Phase::Work, 1, 18));

        let s = hiit.status(t0 + Duration::from_secs(35));
        assert_eq!((s.phase, s.round, s.phase_remaining_seconds), (Phase::Rest, 1, 5));

        let s = hiit.status(t0 + Duration::from_secs(41));
        assert_eq!((s.phase, s.round), (Phase::Work, 2));

        let s = hiit.status(t0 + Duration::from_secs(75));
        assert_eq!((s.phase, s.round), (Phase::Rest, 2));

        let s = hiit.status(t0 + Duration::from_secs(80));
        assert_eq!(s.phase, Phase::Done);
        assert!(!s.running);
    }

    #[test]
    fn test_interval_counts_only_once_started() {
        let t0 = Instant::now();
        let mut session = WorkoutSession {
            interval: Some(IntervalTimer::new(30, 30, 10)),
            ..Default::default()
        };
        assert_eq!(session.timer_minutes(t0), 0.0);

        session.interval.as_mut().unwrap().start(t0);
        assert_eq!(session.timer_minutes(t0 + Duration::from_secs(5)), 10.0);

        session.interval.as_mut().unwrap().pause(t0 + Duration::from_secs(5));
        assert_eq!(session.timer_minutes(t0 + Duration::from_secs(60)), 10.0);

        session.clear_timers();
        assert_eq!(session.timer_minutes(t0), 0.0);
        assert!(session.interval.is_none());
    }

    #[test]
    fn test_sessions_are_per_user() {
        let store = SessionStore::new();
        store.with("amy", |s| s.counter.add(4));
        store.with("ben", |s| s.counter.add(1));
        assert_eq!(store.with("amy", |s| s.counter.reps), 4);
        store.clear("amy");
        assert_eq!(store.with("amy", |s| s.counter.reps), 0);
        assert_eq!(store.len(), 2);
    }
}
