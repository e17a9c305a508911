// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Friends, groups, classes and personal settings.
//!
//! Every operation takes the whole [`Store`] because most of them touch
//! two records (both friends, or a group and its members). Callers run
//! them inside [`crate::db::JsonStore::update`].

use crate::db::Store;
use crate::models::group::{DEFAULT_GROUP_SIZE, MAX_GROUP_SIZE, MIN_GROUP_SIZE};
use crate::models::{Group, User};
use crate::time_utils::{format_date, format_timestamp};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Students per class.
pub const CLASS_CAPACITY: usize = 30;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SocialError {
    #[error("User '{0}' not found")]
    UnknownUser(String),
    #[error("Group not found")]
    UnknownGroup,
    #[error("Invalid class code")]
    UnknownClass,
    #[error("{0}")]
    Rejected(&'static str),
    #[error("Only the group admin can do that")]
    NotAdmin,
}

fn user_mut<'a>(store: &'a mut Store, username: &str) -> Result<&'a mut User, SocialError> {
    store
        .user_mut(username)
        .ok_or_else(|| SocialError::UnknownUser(username.to_string()))
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn remove_value(list: &mut Vec<String>, value: &str) -> bool {
    let before = list.len();
    list.retain(|v| v != value);
    list.len() != before
}

// ─── Friends ─────────────────────────────────────────────────

pub fn send_friend_request(store: &mut Store, from: &str, to: &str) -> Result<(), SocialError> {
    let to = to.trim();
    if to.is_empty() {
        return Err(SocialError::Rejected("Please enter a username"));
    }
    if to == from {
        return Err(SocialError::Rejected("You can't add yourself"));
    }
    let already_friends = store.user(from).is_some_and(|u| u.friends.iter().any(|f| f == to));
    let target = user_mut(store, to)?;
    if already_friends {
        return Err(SocialError::Rejected("Already friends"));
    }
    if target.friend_requests.iter().any(|r| r == from) {
        return Err(SocialError::Rejected("Request already sent"));
    }
    target.friend_requests.push(from.to_string());
    Ok(())
}

/// Outcome of accepting a friend request. The request is consumed in both cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accepted {
    Friends,
    RequesterGone,
}

pub fn accept_friend_request(store: &mut Store, me: &str, requester: &str) -> Result<Accepted, SocialError> {
    let user = user_mut(store, me)?;
    if !remove_value(&mut user.friend_requests, requester) {
        return Err(SocialError::Rejected("No friend request from that user"));
    }
    if store.user(requester).is_none() {
        return Ok(Accepted::RequesterGone);
    }
    push_unique(&mut user_mut(store, me)?.friends, requester);
    push_unique(&mut user_mut(store, requester)?.friends, me);
    Ok(Accepted::Friends)
}

pub fn decline_friend_request(store: &mut Store, me: &str, requester: &str) -> Result<(), SocialError> {
    let user = user_mut(store, me)?;
    if !remove_value(&mut user.friend_requests, requester) {
        return Err(SocialError::Rejected("No friend request from that user"));
    }
    Ok(())
}

/// Unfriend both ways. A friend whose account is gone is simply dropped.
pub fn remove_friend(store: &mut Store, me: &str, friend: &str) -> Result<(), SocialError> {
    if !remove_value(&mut user_mut(store, me)?.friends, friend) {
        return Err(SocialError::Rejected("Not in your friends list"));
    }
    if let Some(other) = store.user_mut(friend) {
        remove_value(&mut other.friends, me);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FriendSummary {
    pub username: String,
    pub name: String,
    pub age: Option<u32>,
    pub school: Option<String>,
    pub level: String,
    pub napfa_total: Option<u32>,
    pub medal: Option<String>,
    pub workouts: usize,
    pub recent_badge: Option<String>,
}

fn summarize(username: &str, user: Option<&User>) -> FriendSummary {
    match user {
        Some(u) => FriendSummary {
            username: username.to_string(),
            name: u.name.clone(),
            age: u.age,
            school: Some(u.school.clone()),
            level: if u.level.is_empty() {
                "Novice".to_string()
            } else {
                u.level.clone()
            },
            napfa_total: u.latest_napfa().map(|n| n.total),
            medal: u.latest_napfa().map(|n| n.medal.clone()),
            workouts: u.exercises.len(),
            recent_badge: u.badges.last().map(|b| b.name.clone()),
        },
        None => FriendSummary {
            username: username.to_string(),
            name: "Unknown".to_string(),
            age: None,
            school: None,
            level: "Novice".to_string(),
            napfa_total: None,
            medal: None,
            workouts: 0,
            recent_badge: None,
        },
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FriendsOverview {
    pub friends: Vec<FriendSummary>,
    pub requests: Vec<FriendSummary>,
}

pub fn friends_overview(store: &Store, me: &str) -> Option<FriendsOverview> {
    let user = store.user(me)?;
    let resolve = |names: &[String]| {
        names
            .iter()
            .map(|n| summarize(n, store.user(n)))
            .collect::<Vec<_>>()
    };
    Some(FriendsOverview {
        friends: resolve(&user.friends),
        requests: resolve(&user.friend_requests),
    })
}

// ─── Groups ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct NewGroup {
    #[validate(length(min = 1, max = 60, message = "Group name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    #[serde(rename = "type", default = "default_group_kind")]
    pub kind: String,
    #[serde(default = "default_group_size")]
    #[validate(range(min = 2, max = 50))]
    pub max_members: u32,
}

fn default_group_kind() -> String {
    "General Fitness".to_string()
}

fn default_group_size() -> u32 {
    DEFAULT_GROUP_SIZE
}

pub fn create_group(
    store: &mut Store,
    admin: &str,
    new: NewGroup,
    now: NaiveDateTime,
) -> Result<Group, SocialError> {
    if new.name.trim().is_empty() {
        return Err(SocialError::Rejected("Please enter a group name"));
    }
    user_mut(store, admin)?;

    let base = format!("group_{admin}_{}", now.format("%Y%m%d%H%M%S"));
    let mut id = base.clone();
    let mut n = 1;
    while store.groups.contains_key(&id) {
        n += 1;
        id = format!("{base}_{n}");
    }

    let group = Group {
        id: id.clone(),
        name: new.name.trim().to_string(),
        description: new.description,
        kind: new.kind,
        admin: admin.to_string(),
        members: vec![admin.to_string()],
        max_members: new.max_members.clamp(MIN_GROUP_SIZE, MAX_GROUP_SIZE),
        created: format_date(now.date()),
        total_points: 0,
        extra: Default::default(),
    };
    store.groups.insert(id.clone(), group.clone());
    push_unique(&mut user_mut(store, admin)?.groups, &id);
    Ok(group)
}

/// Admin-only. The invitee must be one of the admin's friends.
pub fn invite_to_group(store: &mut Store, admin: &str, group_id: &str, friend: &str) -> Result<(), SocialError> {
    let group = store.group(group_id).ok_or(SocialError::UnknownGroup)?;
    if group.admin != admin {
        return Err(SocialError::NotAdmin);
    }
    if group.has_member(friend) {
        return Err(SocialError::Rejected("Already a member"));
    }
    if group.is_full() {
        return Err(SocialError::Rejected("Group is full"));
    }
    let is_friend = store.user(admin).is_some_and(|u| u.friends.iter().any(|f| f == friend));
    if !is_friend {
        return Err(SocialError::Rejected("You can only invite friends"));
    }
    push_unique(&mut user_mut(store, friend)?.group_invites, group_id);
    Ok(())
}

/// Outcome of answering a group invitation. The invitation is consumed in both cases.
#[derive(Debug, Clone, PartialEq)]
pub enum Joined {
    Member(Group),
    GroupGone,
}

pub fn join_group(store: &mut Store, me: &str, group_id: &str) -> Result<Joined, SocialError> {
    let invited = store
        .user(me)
        .ok_or_else(|| SocialError::UnknownUser(me.to_string()))?
        .group_invites
        .iter()
        .any(|g| g == group_id);
    if !invited {
        return Err(SocialError::Rejected("No invitation to that group"));
    }
    let Some(group) = store.group_mut(group_id) else {
        remove_value(&mut user_mut(store, me)?.group_invites, group_id);
        return Ok(Joined::GroupGone);
    };
    if group.is_full() {
        return Err(SocialError::Rejected("Group is full"));
    }
    push_unique(&mut group.members, me);
    let group = group.clone();

    let user = user_mut(store, me)?;
    remove_value(&mut user.group_invites, group_id);
    push_unique(&mut user.groups, group_id);
    Ok(Joined::Member(group))
}

pub fn decline_group_invite(store: &mut Store, me: &str, group_id: &str) -> Result<(), SocialError> {
    if !remove_value(&mut user_mut(store, me)?.group_invites, group_id) {
        return Err(SocialError::Rejected("No invitation to that group"));
    }
    Ok(())
}

pub fn leave_group(store: &mut Store, me: &str, group_id: &str) -> Result<(), SocialError> {
    if !remove_value(&mut user_mut(store, me)?.groups, group_id) {
        return Err(SocialError::Rejected("Not a member of that group"));
    }
    if let Some(group) = store.group_mut(group_id) {
        remove_value(&mut group.members, me);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupMember {
    pub username: String,
    pub name: String,
    pub is_admin: bool,
    pub house_points: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupSummary {
    pub group: Group,
    pub admin_name: String,
    pub members: Vec<GroupMember>,
    pub total_workouts: usize,
    pub total_house_points: f64,
}

fn group_summary(store: &Store, group: &Group) -> GroupSummary {
    let name_of = |u: &str| store.user(u).map_or_else(|| "Unknown".to_string(), |u| u.name.clone());
    let members: Vec<GroupMember> = group
        .members
        .iter()
        .map(|m| GroupMember {
            username: m.clone(),
            name: name_of(m),
            is_admin: *m == group.admin,
            house_points: store.user(m).map_or(0.0, |u| u.house_points_contributed),
        })
        .collect();
    GroupSummary {
        group: group.clone(),
        admin_name: name_of(&group.admin),
        total_workouts: group
            .members
            .iter()
            .filter_map(|m| store.user(m))
            .map(|u| u.exercises.len())
            .sum(),
        total_house_points: members.iter().map(|m| m.house_points).sum(),
        members,
    }
}

/// Groups the user belongs to plus pending invitations. Ids whose group no
/// longer exists are skipped.
pub fn my_groups(store: &Store, me: &str) -> Option<(Vec<GroupSummary>, Vec<Group>)> {
    let user = store.user(me)?;
    let groups = user
        .groups
        .iter()
        .filter_map(|id| store.group(id))
        .map(|g| group_summary(store, g))
        .collect();
    let invites = user
        .group_invites
        .iter()
        .filter_map(|id| store.group(id).cloned())
        .collect();
    Some((groups, invites))
}

// ─── Classes ─────────────────────────────────────────────────

/// Put a student on a teacher's roster. Roster entries stay unique.
pub fn enroll(store: &mut Store, student: &str, teacher: &str) -> Result<(), SocialError> {
    let roster = &user_mut(store, teacher)?.students;
    let already = roster.iter().any(|s| s == student);
    if !already && roster.len() >= CLASS_CAPACITY {
        return Err(SocialError::Rejected("This class is full (30/30 students)"));
    }
    push_unique(&mut user_mut(store, teacher)?.students, student);
    user_mut(store, student)?.teacher_class = Some(teacher.to_string());
    Ok(())
}

/// Join a class by its code. Returns the class label.
///
/// A student belongs to one class at a time. Rejoining the current class is
/// a no-op; joining another one requires leaving first. An enrollment whose
/// teacher no longer exists does not count.
pub fn join_class(store: &mut Store, me: &str, code: &str) -> Result<String, SocialError> {
    if code.trim().is_empty() {
        return Err(SocialError::Rejected("Please enter a class code"));
    }
    let teacher = store
        .teacher_by_code(code.trim())
        .ok_or(SocialError::UnknownClass)?
        .to_string();
    let enrolled = store
        .user(me)
        .ok_or_else(|| SocialError::UnknownUser(me.to_string()))?
        .teacher_class
        .as_deref()
        .filter(|t| store.user(t).is_some());
    if enrolled.is_some_and(|t| t != teacher) {
        return Err(SocialError::Rejected("You are already in a class. Leave it first"));
    }
    enroll(store, me, &teacher)?;
    Ok(store
        .user(&teacher)
        .map(User::class_display_label)
        .unwrap_or_default())
}

pub fn leave_class(store: &mut Store, me: &str) -> Result<(), SocialError> {
    let teacher = user_mut(store, me)?
        .teacher_class
        .take()
        .ok_or(SocialError::Rejected("You are not enrolled in any class"))?;
    if let Some(t) = store.user_mut(&teacher) {
        remove_value(&mut t.students, me);
    }
    Ok(())
}

// ─── Settings ────────────────────────────────────────────────

pub fn set_leaderboard_visibility(store: &mut Store, me: &str, visible: bool) -> Result<bool, SocialError> {
    let user = user_mut(store, me)?;
    user.show_on_leaderboards = visible;
    Ok(visible)
}

/// Personal data export.
pub fn export_user_data(user: &User, now: NaiveDateTime) -> Value {
    json!({
        "account_info": {
            "name": user.name,
            "email": user.email,
            "age": user.age,
            "gender": if user.gender == "m" { "Male" } else { "Female" },
            "school": user.school,
            "teacher_class": user.teacher_class,
            "house": user.house,
            "created": user.created,
            "role": user.role,
        },
        "fitness_data": {
            "bmi_history": user.bmi_history,
            "napfa_history": user.napfa_history,
            "sleep_history": user.sleep_history,
            "exercises": user.exercises,
            "total_workout_hours": user.total_workout_hours,
            "house_points_contributed": user.house_points_contributed,
        },
        "achievements": {
            "badges": user.badges,
            "level": user.level,
            "total_points": user.total_points,
            "login_streak": user.login_streak,
        },
        "social": {
            "friends": user.friends,
            "groups": user.groups,
        },
        "goals": user.smart_goals,
        "exported_date": format_timestamp(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(16, 30, 0)
            .unwrap()
    }

    fn store_with(names: &[&str]) -> Store {
        let mut store = Store::default();
        for n in names {
            store.users.insert(
                n.to_string(),
                User {
                    name: n.to_uppercase(),
                    ..Default::default()
                },
            );
        }
        store
    }

    fn befriend(store: &mut Store, a: &str, b: &str) {
        send_friend_request(store, a, b).unwrap();
        assert_eq!(accept_friend_request(store, b, a), Ok(Accepted::Friends));
    }

    #[test]
    fn test_friend_request_flow() {
        let mut store = store_with(&["amy", "ben"]);
        assert_eq!(
            send_friend_request(&mut store, "amy", "amy"),
            Err(SocialError::Rejected("You can't add yourself"))
        );
        assert_eq!(
            send_friend_request(&mut store, "amy", "zed"),
            Err(SocialError::UnknownUser("zed".to_string()))
        );
        send_friend_request(&mut store, "amy", "ben").unwrap();
        assert_eq!(
            send_friend_request(&mut store, "amy", "ben"),
            Err(SocialError::Rejected("Request already sent"))
        );
        assert_eq!(accept_friend_request(&mut store, "ben", "amy"), Ok(Accepted::Friends));
        assert_eq!(store.user("amy").unwrap().friends, ["ben"]);
        assert_eq!(store.user("ben").unwrap().friends, ["amy"]);
        assert!(store.user("ben").unwrap().friend_requests.is_empty());
        assert_eq!(
            send_friend_request(&mut store, "amy", "ben"),
            Err(SocialError::Rejected("Already friends"))
        );

        remove_friend(&mut store, "amy", "ben").unwrap();
        assert!(store.user("ben").unwrap().friends.is_empty());
    }

    #[test]
    fn test_accept_from_deleted_account() {
        let mut store = store_with(&["amy"]);
        store.user_mut("amy").unwrap().friend_requests.push("ghost".to_string());
        assert_eq!(
            accept_friend_request(&mut store, "amy", "ghost"),
            Ok(Accepted::RequesterGone)
        );
        let amy = store.user("amy").unwrap();
        assert!(amy.friend_requests.is_empty());
        assert!(amy.friends.is_empty());
    }

    #[test]
    fn test_join_deleted_group() {
        let mut store = store_with(&["amy"]);
        store.user_mut("amy").unwrap().group_invites.push("group_gone".to_string());
        assert_eq!(join_group(&mut store, "amy", "group_gone"), Ok(Joined::GroupGone));
        let amy = store.user("amy").unwrap();
        assert!(amy.group_invites.is_empty());
        assert!(amy.groups.is_empty());
        assert_eq!(
            join_group(&mut store, "amy", "group_gone"),
            Err(SocialError::Rejected("No invitation to that group"))
        );
    }

    #[test]
    fn test_remove_dangling_friend() {
        let mut store = store_with(&["amy"]);
        store.user_mut("amy").unwrap().friends.push("ghost".to_string());
        remove_friend(&mut store, "amy", "ghost").unwrap();
        let overview = friends_overview(&store, "amy").unwrap();
        assert!(overview.friends.is_empty());
    }

    #[test]
    fn test_group_lifecycle() {
        let mut store = store_with(&["amy", "ben", "cat"]);
        befriend(&mut store, "amy", "ben");

        let group = create_group(
            &mut store,
            "amy",
            NewGroup {
                name: "Running Club".to_string(),
                description: String::new(),
                kind: "Running Club".to_string(),
                max_members: 2,
            },
            now(),
        )
        .unwrap();
        assert_eq!(group.id, "group_amy_20260504163000");
        assert_eq!(group.members, ["amy"]);

        assert_eq!(
            invite_to_group(&mut store, "ben", &group.id, "amy"),
            Err(SocialError::NotAdmin)
        );
        assert_eq!(
            invite_to_group(&mut store, "amy", &group.id, "cat"),
            Err(SocialError::Rejected("You can only invite friends"))
        );
        invite_to_group(&mut store, "amy", &group.id, "ben").unwrap();
        let joined = join_group(&mut store, "ben", &group.id).unwrap();
        assert!(matches!(joined, Joined::Member(g) if g.members == ["amy", "ben"]));
        assert!(store.group(&group.id).unwrap().is_full());
        assert_eq!(store.user("ben").unwrap().groups, [group.id.clone()]);

        leave_group(&mut store, "ben", &group.id).unwrap();
        assert_eq!(store.group(&group.id).unwrap().members, ["amy"]);

        let (groups, invites) = my_groups(&store, "amy").unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].members[0].is_admin);
        assert!(invites.is_empty());
    }

    #[test]
    fn test_join_class_by_code() {
        let mut store = store_with(&["amy", "mrtan"]);
        let teacher = store.user_mut("mrtan").unwrap();
        teacher.role = Role::Teacher;
        teacher.class_code = Some("ABC123".to_string());
        teacher.class_label = Some("3E2".to_string());

        assert_eq!(join_class(&mut store, "amy", "zzz"), Err(SocialError::UnknownClass));
        assert_eq!(join_class(&mut store, "amy", "abc123").unwrap(), "3E2");
        join_class(&mut store, "amy", "ABC123").unwrap();
        assert_eq!(store.user("mrtan").unwrap().students, ["amy"]);
        assert_eq!(store.user("amy").unwrap().teacher_class.as_deref(), Some("mrtan"));

        leave_class(&mut store, "amy").unwrap();
        assert!(store.user("mrtan").unwrap().students.is_empty());
        assert!(store.user("amy").unwrap().teacher_class.is_none());
    }

    #[test]
    fn test_one_class_at_a_time() {
        let mut store = store_with(&["amy", "mrtan", "mslee"]);
        for (name, code) in [("mrtan", "ABC123"), ("mslee", "XYZ789")] {
            let teacher = store.user_mut(name).unwrap();
            teacher.role = Role::Teacher;
            teacher.class_code = Some(code.to_string());
        }

        join_class(&mut store, "amy", "ABC123").unwrap();
        assert_eq!(
            join_class(&mut store, "amy", "XYZ789"),
            Err(SocialError::Rejected("You are already in a class. Leave it first"))
        );
        assert_eq!(store.user("mrtan").unwrap().students, ["amy"]);
        assert!(store.user("mslee").unwrap().students.is_empty());

        // A class whose teacher is gone no longer holds the student
        store.users.remove("mrtan");
        join_class(&mut store, "amy", "XYZ789").unwrap();
        assert_eq!(store.user("amy").unwrap().teacher_class.as_deref(), Some("mslee"));
        assert_eq!(store.user("mslee").unwrap().students, ["amy"]);
    }

    #[test]
    fn test_class_capacity() {
        let mut store = store_with(&["amy", "mrtan"]);
        let teacher = store.user_mut("mrtan").unwrap();
        teacher.role = Role::Teacher;
        teacher.students = (0..30).map(|i| format!("s{i}")).collect();
        assert!(enroll(&mut store, "amy", "mrtan").is_err());
    }

    #[test]
    fn test_export_sections() {
        let user = User {
            name: "Amy".to_string(),
            gender: "f".to_string(),
            ..Default::default()
        };
        let export = export_user_data(&user, now());
        assert_eq!(export["account_info"]["gender"], "Female");
        assert_eq!(export["exported_date"], "2026-05-04T16:30:00");
        assert!(export["fitness_data"]["exercises"].as_array().unwrap().is_empty());
    }
}
