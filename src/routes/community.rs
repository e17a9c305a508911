// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Houses, leaderboards, friends, groups, classes, challenges and the
//! caller's own settings.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Badge, CompletedChallenge, Group};
use crate::routes::{current, current_mut, require_student, MessageResponse};
use crate::services::badges::award_badges;
use crate::services::challenges::{self, ChallengeProgress};
use crate::services::leaderboard::{
    self, HighScoreFilter, HouseStanding, Metric, MyHouse, RankEntry,
};
use crate::services::social::{self, Accepted, FriendsOverview, GroupSummary, Joined, NewGroup};
use crate::time_utils::{now_local, today};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/houses", get(get_house_standings))
        .route("/api/houses/mine", get(get_my_house))
        .route("/api/leaderboards/global", get(global_leaderboard))
        .route("/api/leaderboards/house", get(house_leaderboard))
        .route("/api/leaderboards/friends", get(friends_leaderboard))
        .route("/api/leaderboards/class", get(class_leaderboard))
        .route("/api/leaderboards/high-scores", get(high_scores))
        .route("/api/friends", get(get_friends))
        .route("/api/friends/requests", post(send_request))
        .route("/api/friends/requests/{username}/accept", post(accept_request))
        .route("/api/friends/requests/{username}/decline", post(decline_request))
        .route("/api/friends/{username}", delete(remove_friend))
        .route("/api/groups", get(get_groups).post(create_group))
        .route("/api/groups/{id}/invite", post(invite))
        .route("/api/groups/{id}/join", post(join_group))
        .route("/api/groups/{id}/decline", post(decline_invite))
        .route("/api/groups/{id}/leave", post(leave_group))
        .route("/api/groups/{id}/leaderboard", get(group_leaderboard))
        .route("/api/class/join", post(join_class))
        .route("/api/class/leave", post(leave_class))
        .route("/api/challenges", get(get_challenges))
        .route("/api/challenges/claim", post(claim_challenges))
        .route("/api/settings/leaderboard", put(set_visibility))
        .route("/api/export", get(export_data))
}

/// Award any badges a social change unlocked for the caller.
fn award(store: &mut Store, username: &str) -> Result<Vec<Badge>> {
    let today = today();
    Ok(award_badges(current_mut(store, username)?, today))
}

// ─── Houses ──────────────────────────────────────────────────

async fn get_house_standings(State(state): State<Arc<AppState>>) -> Json<Vec<HouseStanding>> {
    Json(state.store.read(leaderboard::house_standings).await)
}

async fn get_my_house(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MyHouse>> {
    state
        .store
        .read(|s| leaderboard::my_house(s, &user.username))
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("You have not been assigned to a house yet"))
}

// ─── Leaderboards ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    #[serde(default = "default_metric")]
    pub metric: Metric,
    /// House to show; the caller's own house when absent
    pub house: Option<String>,
}

fn default_metric() -> Metric {
    Metric::HousePoints
}

async fn global_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BoardQuery>,
) -> Json<Vec<RankEntry>> {
    let today = today();
    Json(state.store.read(|s| leaderboard::global_board(s, q.metric, today)).await)
}

async fn house_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<BoardQuery>,
) -> Result<Json<Vec<RankEntry>>> {
    let today = today();
    let board = state
        .store
        .read(|s| {
            let house = match q.house {
                Some(h) => h.trim().to_lowercase(),
                None => current(s, &user.username)?
                    .house
                    .clone()
                    .ok_or_else(|| AppError::bad_request("You have not been assigned to a house yet"))?,
            };
            Ok::<_, AppError>(leaderboard::house_board(s, &house, q.metric, today))
        })
        .await?;
    Ok(Json(board))
}

async fn friends_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<BoardQuery>,
) -> Json<Vec<RankEntry>> {
    let today = today();
    Json(
        state
            .store
            .read(|s| leaderboard::friends_board(s, &user.username, q.metric, today))
            .await,
    )
}

/// A student's class, or a teacher's own.
async fn class_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<BoardQuery>,
) -> Result<Json<Vec<RankEntry>>> {
    let today = today();
    let board = state
        .store
        .read(|s| {
            let me = current(s, &user.username)?;
            let teacher = if me.is_teacher() {
                user.username.clone()
            } else {
                me.teacher_class
                    .clone()
                    .ok_or_else(|| AppError::bad_request("You are not enrolled in any class"))?
            };
            Ok::<_, AppError>(leaderboard::class_board(s, &teacher, q.metric, today))
        })
        .await?;
    Ok(Json(board))
}

async fn high_scores(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<HighScoreFilter>,
) -> Result<Json<Vec<RankEntry>>> {
    state
        .store
        .read(|s| leaderboard::high_scores(s, &filter))
        .await
        .map(Json)
        .map_err(AppError::bad_request)
}

async fn group_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(q): Query<BoardQuery>,
) -> Result<Json<Vec<RankEntry>>> {
    let today = today();
    let board = state
        .store
        .read(|s| {
            let member = s.group(&id).is_some_and(|g| g.members.contains(&user.username));
            if !member {
                return Err(AppError::not_found("Group not found"));
            }
            leaderboard::group_board(s, &id, q.metric, today)
                .ok_or_else(|| AppError::not_found("Group not found"))
        })
        .await?;
    Ok(Json(board))
}

// ─── Friends ─────────────────────────────────────────────────

async fn get_friends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FriendsOverview>> {
    state
        .store
        .read(|s| social::friends_overview(s, &user.username))
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("User {} not found", user.username)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct FriendRequest {
    #[validate(length(min = 1, message = "Please enter a username"))]
    pub username: String,
}

async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<FriendRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;
    state
        .store
        .update(|s| social::send_friend_request(s, &user.username, &req.username).map_err(AppError::from))
        .await?;
    tracing::info!(from = %user.username, to = %req.username, "Friend request sent");
    Ok(MessageResponse::new(format!("Friend request sent to {}", req.username.trim())))
}

#[derive(Debug, Serialize)]
pub struct FriendAccepted {
    pub friend: String,
    pub new_badges: Vec<Badge>,
}

async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(requester): Path<String>,
) -> Result<Json<FriendAccepted>> {
    let new_badges = state
        .store
        .update(|s| match social::accept_friend_request(s, &user.username, &requester)? {
            Accepted::Friends => {
                if let Some(other) = s.user_mut(&requester) {
                    award_badges(other, today());
                }
                award(s, &user.username).map(Some)
            }
            Accepted::RequesterGone => Ok::<_, AppError>(None),
        })
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{requester}' not found")))?;
    Ok(Json(FriendAccepted {
        friend: requester,
        new_badges,
    }))
}

async fn decline_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(requester): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| social::decline_friend_request(s, &user.username, &requester).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new("Friend request declined"))
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(friend): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| social::remove_friend(s, &user.username, &friend).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new(format!("Removed {friend} from friends")))
}

// ─── Groups ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub groups: Vec<GroupSummary>,
    pub invites: Vec<Group>,
}

async fn get_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GroupsResponse>> {
    let (groups, invites) = state
        .store
        .read(|s| social::my_groups(s, &user.username))
        .await
        .ok_or_else(|| AppError::not_found(format!("User {} not found", user.username)))?;
    Ok(Json(GroupsResponse { groups, invites }))
}

#[derive(Debug, Serialize)]
pub struct GroupChange {
    pub group: Group,
    pub new_badges: Vec<Badge>,
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewGroup>,
) -> Result<Json<GroupChange>> {
    req.validate()?;
    let now = now_local();
    let change = state
        .store
        .update(|s| {
            let group = social::create_group(s, &user.username, req, now)?;
            let new_badges = award(s, &user.username)?;
            Ok::<_, AppError>(GroupChange { group, new_badges })
        })
        .await?;
    tracing::info!(group = %change.group.id, admin = %user.username, "Group created");
    Ok(Json(change))
}

async fn invite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<FriendRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;
    state
        .store
        .update(|s| social::invite_to_group(s, &user.username, &id, req.username.trim()).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new(format!("Invitation sent to {}", req.username.trim())))
}

async fn join_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<GroupChange>> {
    let change = state
        .store
        .update(|s| match social::join_group(s, &user.username, &id)? {
            Joined::Member(group) => {
                let new_badges = award(s, &user.username)?;
                Ok::<_, AppError>(Some(GroupChange { group, new_badges }))
            }
            Joined::GroupGone => Ok(None),
        })
        .await?
        .ok_or_else(|| AppError::not_found("Group not found"))?;
    Ok(Json(change))
}

async fn decline_invite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| social::decline_group_invite(s, &user.username, &id).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new("Invitation declined"))
}

async fn leave_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| social::leave_group(s, &user.username, &id).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new("Left the group"))
}

// ─── Classes ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JoinClassRequest {
    pub class_code: String,
}

async fn join_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<JoinClassRequest>,
) -> Result<Json<MessageResponse>> {
    let label = state
        .store
        .update(|s| {
            require_student(current(s, &user.username)?)?;
            Ok::<_, AppError>(social::join_class(s, &user.username, &req.class_code)?)
        })
        .await?;
    tracing::info!(username = %user.username, class = %label, "Joined class");
    Ok(MessageResponse::new(format!("Joined {label}")))
}

async fn leave_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>> {
    state
        .store
        .update(|s| social::leave_class(s, &user.username).map_err(AppError::from))
        .await?;
    Ok(MessageResponse::new("You have left your class"))
}

// ─── Challenges ──────────────────────────────────────────────

async fn get_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChallengeProgress>>> {
    let today = today();
    let progress = state
        .store
        .read(|s| current(s, &user.username).map(|u| challenges::challenge_progress(u, today)))
        .await?;
    Ok(Json(progress))
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub completed: Vec<CompletedChallenge>,
    pub total_points: i64,
}

/// Record every weekly challenge whose target is now met.
async fn claim_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ClaimResponse>> {
    let today = today();
    let response = state
        .store
        .update(|s| {
            let me = current_mut(s, &user.username)?;
            let completed = challenges::complete_challenges(me, today);
            Ok::<_, AppError>(ClaimResponse {
                completed,
                total_points: me.total_points,
            })
        })
        .await?;
    Ok(Json(response))
}

// ─── Settings and export ─────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Visibility {
    pub visible: bool,
}

async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<Visibility>,
) -> Result<Json<Visibility>> {
    let visible = state
        .store
        .update(|s| social::set_leaderboard_visibility(s, &user.username, req.visible).map_err(AppError::from))
        .await?;
    Ok(Json(Visibility { visible }))
}

async fn export_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>> {
    let now = now_local();
    let data = state
        .store
        .read(|s| current(s, &user.username).map(|u| social::export_user_data(u, now)))
        .await?;
    Ok(Json(data))
}
