// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, sign-in and password reset.
//!
//! Passwords are stored as entered; the data file format predates this
//! service and other tools read it.

use crate::db::Store;
use crate::models::{Role, User, HOUSES};
use crate::services::badges::level_for;
use crate::services::health::age_on;
use crate::services::napfa::Gender;
use crate::services::social::enroll;
use crate::services::streak::next_login_streak;
use crate::time_utils::{format_date, format_timestamp};
use chrono::{NaiveDate, NaiveDateTime};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MIN_PASSWORD_LEN: u64 = 6;
pub const DEFAULT_SCHOOL: &str = "School of Science and Technology";
const CLASS_CODE_LEN: usize = 6;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AccountError {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email not found")]
    UnknownEmail,
    #[error("Unknown house: {0}")]
    UnknownHouse(String),
    #[error("Unknown gender: {0}")]
    UnknownGender(String),
    #[error("Age {0} is outside the allowed range for this role")]
    AgeOutOfRange(u32),
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub role: Role,
    pub birthday: NaiveDate,
    /// "m"/"f" (or "male"/"female")
    pub gender: String,
    #[serde(default)]
    pub school: Option<String>,

    // Students
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub show_on_leaderboards: bool,
    #[serde(default)]
    pub class_code: Option<String>,

    // Teachers
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub class_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Registered {
    pub username: String,
    pub role: Role,
    /// Generated for teachers
    pub class_code: Option<String>,
    /// Label of the class joined at sign-up
    pub joined_class: Option<String>,
    /// Why a supplied class code was not used
    pub class_warning: Option<String>,
}

/// Username from the email's local part with dots replaced, plus a numeric
/// suffix when taken (`jo_tan`, `jo_tan1`, `jo_tan2`, ...).
pub fn derive_username(store: &Store, email: &str) -> String {
    let base = email.split('@').next().unwrap_or_default().replace('.', "_");
    let mut candidate = base.clone();
    let mut n = 1;
    while store.users.contains_key(&candidate) || candidate == crate::db::keys::GROUPS {
        candidate = format!("{base}{n}");
        n += 1;
    }
    candidate
}

/// Six upper-case letters or digits, unique among teachers.
pub fn generate_class_code(store: &Store) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .map(|b| (b as char).to_ascii_uppercase())
            .take(CLASS_CODE_LEN)
            .collect();
        if store.teacher_by_code(&code).is_none() {
            return code;
        }
    }
}

fn check_password(password: &str, confirm: &str) -> Result<(), AccountError> {
    if password != confirm {
        return Err(AccountError::PasswordMismatch);
    }
    if (password.chars().count() as u64) < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }
    Ok(())
}

pub fn register(store: &mut Store, req: RegisterRequest, now: NaiveDateTime) -> Result<Registered, AccountError> {
    if req.email.trim().is_empty() || req.name.trim().is_empty() || req.password.is_empty() {
        return Err(AccountError::MissingFields);
    }
    check_password(&req.password, &req.confirm_password)?;
    if store.username_by_email(&req.email).is_some() {
        return Err(AccountError::EmailTaken);
    }
    let gender = Gender::parse(&req.gender).ok_or_else(|| AccountError::UnknownGender(req.gender.clone()))?;
    let age = age_on(req.birthday, now.date());
    let allowed = match req.role {
        Role::Student => 12..=18,
        Role::Teacher => 18..=70,
    };
    if !allowed.contains(&age) {
        return Err(AccountError::AgeOutOfRange(age));
    }

    let username = derive_username(store, req.email.trim());
    let timestamp = format_timestamp(now);
    let mut user = User {
        email: req.email.trim().to_lowercase(),
        password: req.password,
        role: req.role,
        name: req.name.trim().to_string(),
        birthday: Some(format_date(req.birthday)),
        age: Some(age),
        gender: gender.code().to_string(),
        school: req
            .school
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCHOOL.to_string()),
        created: timestamp.clone(),
        last_login: Some(timestamp),
        level: level_for(0).name.to_string(),
        email_verified: true,
        ..Default::default()
    };

    let mut registered = Registered {
        username: username.clone(),
        role: req.role,
        class_code: None,
        joined_class: None,
        class_warning: None,
    };

    match req.role {
        Role::Student => {
            let house = req.house.unwrap_or_default().trim().to_lowercase();
            if !HOUSES.contains(&house.as_str()) {
                return Err(AccountError::UnknownHouse(house));
            }
            user.house = Some(house);
            user.show_on_leaderboards = req.show_on_leaderboards;
            store.users.insert(username.clone(), user);

            if let Some(code) = req.class_code.filter(|c| !c.trim().is_empty()) {
                match store.teacher_by_code(code.trim()).map(str::to_string) {
                    Some(teacher) => match enroll(store, &username, &teacher) {
                        Ok(()) => {
                            registered.joined_class = store.user(&teacher).map(User::class_display_label);
                        }
                        Err(e) => registered.class_warning = Some(e.to_string()),
                    },
                    None => {
                        registered.class_warning =
                            Some("Invalid class code. You can join a class later.".to_string());
                    }
                }
            }
        }
        Role::Teacher => {
            let code = generate_class_code(store);
            user.class_code = Some(code.clone());
            user.class_label = req.class_label.filter(|l| !l.trim().is_empty());
            user.department = req.department.filter(|d| !d.trim().is_empty());
            store.users.insert(username.clone(), user);
            registered.class_code = Some(code);
        }
    }

    tracing::info!(username = %username, role = ?req.role, "Account created");
    Ok(registered)
}

/// Check credentials and record the login. Students also get their login
/// streak updated. Returns the username.
pub fn login(store: &mut Store, email: &str, password: &str, now: NaiveDateTime) -> Result<String, AccountError> {
    let username = store
        .username_by_email(email.trim())
        .map(str::to_string)
        .ok_or(AccountError::InvalidCredentials)?;
    let user = store
        .user_mut(&username)
        .ok_or(AccountError::InvalidCredentials)?;
    if user.password != password {
        return Err(AccountError::InvalidCredentials);
    }

    if user.is_student() {
        user.login_streak = next_login_streak(user.last_login.as_deref(), user.login_streak, now.date());
    }
    user.last_login = Some(format_timestamp(now));
    Ok(username)
}

pub fn reset_password(store: &mut Store, email: &str, password: &str, confirm: &str) -> Result<String, AccountError> {
    check_password(password, confirm)?;
    let username = store
        .username_by_email(email.trim())
        .map(str::to_string)
        .ok_or(AccountError::UnknownEmail)?;
    if let Some(user) = store.user_mut(&username) {
        user.password = password.to_string();
    }
    tracing::info!(username = %username, "Password reset");
    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn student_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            name: "Jo Tan".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            role: Role::Student,
            birthday: NaiveDate::from_ymd_opt(2012, 3, 1).unwrap(),
            gender: "f".to_string(),
            school: None,
            house: Some("Blue".to_string()),
            show_on_leaderboards: true,
            class_code: None,
            department: None,
            class_label: None,
        }
    }

    fn teacher_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            role: Role::Teacher,
            birthday: NaiveDate::from_ymd_opt(1990, 6, 1).unwrap(),
            house: None,
            class_label: Some("3E2".to_string()),
            ..student_request(email)
        }
    }

    #[test]
    fn test_username_derivation() {
        let mut store = Store::default();
        let first = register(&mut store, student_request("jo.tan@school.sg"), now()).unwrap();
        assert_eq!(first.username, "jo_tan");
        let second = register(&mut store, student_request("jo.tan@other.sg"), now()).unwrap();
        assert_eq!(second.username, "jo_tan1");

        let user = store.user("jo_tan").unwrap();
        assert_eq!(user.age, Some(13));
        assert_eq!(user.house.as_deref(), Some("blue"));
        assert_eq!(user.school, DEFAULT_SCHOOL);
        assert!(user.email_verified);
    }

    #[test]
    fn test_registration_validation() {
        let mut store = Store::default();
        let mut req = student_request("a@b.sg");
        req.confirm_password = "other".to_string();
        assert_eq!(register(&mut store, req, now()), Err(AccountError::PasswordMismatch));

        let mut req = student_request("a@b.sg");
        req.password = "abc".to_string();
        req.confirm_password = "abc".to_string();
        assert_eq!(register(&mut store, req, now()), Err(AccountError::PasswordTooShort));

        let mut req = student_request("a@b.sg");
        req.house = Some("purple".to_string());
        assert!(matches!(register(&mut store, req, now()), Err(AccountError::UnknownHouse(_))));

        register(&mut store, student_request("a@b.sg"), now()).unwrap();
        assert_eq!(
            register(&mut store, student_request("A@B.SG"), now()),
            Err(AccountError::EmailTaken)
        );
    }

    #[test]
    fn test_teacher_gets_class_code_and_student_joins() {
        let mut store = Store::default();
        let teacher = register(&mut store, teacher_request("mr.lim@school.sg"), now()).unwrap();
        let code = teacher.class_code.unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

        let mut req = student_request("amy@school.sg");
        req.class_code = Some(code.to_lowercase());
        let student = register(&mut store, req, now()).unwrap();
        assert_eq!(student.joined_class.as_deref(), Some("3E2"));
        assert_eq!(store.user("mr_lim").unwrap().students, ["amy"]);

        let mut req = student_request("ben@school.sg");
        req.class_code = Some("NOPE00".to_string());
        let student = register(&mut store, req, now()).unwrap();
        assert!(student.class_warning.is_some());
    }

    #[test]
    fn test_login_updates_streak() {
        let mut store = Store::default();
        register(&mut store, student_request("jo@school.sg"), now()).unwrap();
        store.user_mut("jo").unwrap().login_streak = 3;
        store.user_mut("jo").unwrap().last_login = Some("2026-01-14T20:00:00".to_string());

        assert_eq!(login(&mut store, "JO@school.sg", "secret1", now()).unwrap(), "jo");
        assert_eq!(store.user("jo").unwrap().login_streak, 4);
        assert_eq!(
            login(&mut store, "jo@school.sg", "wrong", now()),
            Err(AccountError::InvalidCredentials)
        );
    }

    #[test]
    fn test_reset_password() {
        let mut store = Store::default();
        register(&mut store, student_request("jo@school.sg"), now()).unwrap();
        assert_eq!(
            reset_password(&mut store, "nobody@school.sg", "newpass", "newpass"),
            Err(AccountError::UnknownEmail)
        );
        reset_password(&mut store, "jo@school.sg", "newpass", "newpass").unwrap();
        assert!(login(&mut store, "jo@school.sg", "newpass", now()).is_ok());
    }
}
