use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};
use fittrack::models::{ExerciseEntry, User};
use fittrack::services::badges::check_badges;
use fittrack::services::napfa::{grade_test, Gender, NapfaScores};
use std::hint::black_box;

fn benchmark_grade_test(c: &mut Criterion) {
    let scores = NapfaScores {
        sit_ups: 38.0,
        broad_jump_cm: 215.0,
        sit_reach_cm: 41.0,
        pull_ups: 9.0,
        shuttle_run_s: 10.2,
        run_minutes: 10.5,
    };

    let mut group = c.benchmark_group("napfa");
    group.bench_function("grade_male_14", |b| {
        b.iter(|| grade_test(black_box(14), Gender::Male, black_box(&scores), "2026-03-02"))
    });
    group.bench_function("grade_female_17", |b| {
        b.iter(|| grade_test(black_box(17), Gender::Female, black_box(&scores), "2026-03-02"))
    });
    group.finish();
}

/// A busy student: a year of daily workouts across a dozen exercises.
fn busy_student(today: NaiveDate) -> User {
    let names = [
        "Push-ups", "Sit-ups", "Squats", "Lunges", "Burpees", "Plank", "Jumping Jacks",
        "Mountain Climbers", "Walk", "Jog", "Run", "Sprint",
    ];
    let mut user = User {
        name: "Busy".to_string(),
        house: Some("red".to_string()),
        house_points_contributed: 120.0,
        total_workout_hours: 60.0,
        ..Default::default()
    };
    user.exercises = (0..365)
        .map(|i| ExerciseEntry {
            name: names[i % names.len()].to_string(),
            date: (today - chrono::Duration::days(i as i64))
                .format("%Y-%m-%d")
                .to_string(),
            duration: 20,
            ..Default::default()
        })
        .collect();
    user
}

fn benchmark_check_badges(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let fresh = User::default();
    let busy = busy_student(today);

    let mut group = c.benchmark_group("badges");
    group.bench_function("new_student", |b| {
        b.iter(|| check_badges(black_box(&fresh), today))
    });
    group.bench_function("year_of_workouts", |b| {
        b.iter(|| check_badges(black_box(&busy), today))
    });
    group.finish();
}

criterion_group!(benches, benchmark_grade_test, benchmark_check_badges);
criterion_main!(benches);
