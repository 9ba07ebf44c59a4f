// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community fitness challenges.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Challenge, Participant, Role, User};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/challenges",
            get(list_challenges).post(create_challenge),
        )
        .route(
            "/api/challenges/{id}",
            get(get_challenge).delete(delete_challenge),
        )
        .route("/api/challenges/{id}/join", post(join_challenge))
        .route("/api/challenges/{id}/leave", post(leave_challenge))
        .route("/api/challenges/{id}/progress", post(log_progress))
        .route("/api/challenges/{id}/leaderboard", get(leaderboard))
}

async fn load_challenge(state: &AppState, id: &str) -> Result<Challenge> {
    validate_id(id, "challenge")?;
    state.db.require(id, "Challenge").await
}

async fn list_challenges(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Challenge>>> {
    let mut challenges: Vec<Challenge> = state.db.list().await?;
    challenges.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Ok(Json(challenges))
}

async fn get_challenge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Challenge>> {
    Ok(Json(load_challenge(&state, &id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChallengeRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1))]
    pub goal: u32,
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<Challenge>)> {
    user.require_role(&[Role::Admin, Role::Trainer])?;
    body.validate()?;
    if body.end_date < body.start_date {
        return Err(AppError::BadRequest(
            "end_date must not be before start_date".to_string(),
        ));
    }

    let challenge = Challenge {
        id: new_id(),
        title: body.title.trim().to_string(),
        description: body.description,
        goal: body.goal,
        unit: body.unit.trim().to_string(),
        start_date: body.start_date,
        end_date: body.end_date,
        participants: Vec::new(),
        created_by: user.user_id.clone(),
    };
    state.db.put(&challenge).await?;

    tracing::info!(challenge_id = %challenge.id, created_by = %user.user_id, "Challenge created");
    Ok((StatusCode::CREATED, Json(challenge)))
}

async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin, Role::Trainer])?;
    let challenge = load_challenge(&state, &id).await?;
    if !user.is(Role::Admin) && challenge.created_by != user.user_id {
        return Err(AppError::Forbidden(
            "Only the creator or an admin can delete this challenge".to_string(),
        ));
    }

    state.db.delete::<Challenge>(&id).await?;
    tracing::info!(challenge_id = %id, deleted_by = %user.user_id, "Challenge deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Participation ───────────────────────────────────────────

/// Add `user_id` with zero progress. Ended challenges take no new members.
pub fn join(
    challenge: &mut Challenge,
    user_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<()> {
    if challenge.has_ended(today) {
        return Err(AppError::BadRequest("This challenge has ended".to_string()));
    }
    if challenge.is_participant(user_id) {
        return Err(AppError::Conflict("Already joined this challenge".to_string()));
    }

    challenge.participants.push(Participant {
        user_id: user_id.to_string(),
        progress: 0,
        joined_at: now,
    });
    Ok(())
}

pub fn leave(challenge: &mut Challenge, user_id: &str) -> Result<()> {
    if !challenge.is_participant(user_id) {
        return Err(AppError::BadRequest(
            "You have not joined this challenge".to_string(),
        ));
    }
    challenge.participants.retain(|p| p.user_id != user_id);
    Ok(())
}

/// Add `amount` to a participant's progress while the challenge runs.
/// Returns the new total.
pub fn add_progress(
    challenge: &mut Challenge,
    user_id: &str,
    amount: u32,
    today: NaiveDate,
) -> Result<u32> {
    if !challenge.is_running(today) {
        return Err(AppError::BadRequest(
            "Progress can only be logged while the challenge is running".to_string(),
        ));
    }
    let participant = challenge
        .participant_mut(user_id)
        .ok_or_else(|| AppError::BadRequest("You have not joined this challenge".to_string()))?;
    participant.progress = participant.progress.saturating_add(amount);
    Ok(participant.progress)
}

async fn join_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Challenge>> {
    user.require_role(&[Role::Client])?;
    validate_id(&id, "challenge")?;

    let today = today();
    let user_id = user.user_id.clone();
    let challenge: Challenge = state
        .db
        .modify(&id, "Challenge", move |c: &mut Challenge| {
            join(c, &user_id, today, Utc::now())
        })
        .await?;

    tracing::info!(challenge_id = %challenge.id, user_id = %user.user_id, "Joined challenge");
    Ok(Json(challenge))
}

async fn leave_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Challenge>> {
    user.require_role(&[Role::Client])?;
    validate_id(&id, "challenge")?;

    let user_id = user.user_id.clone();
    let challenge: Challenge = state
        .db
        .modify(&id, "Challenge", move |c: &mut Challenge| leave(c, &user_id))
        .await?;

    tracing::info!(challenge_id = %challenge.id, user_id = %user.user_id, "Left challenge");
    Ok(Json(challenge))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProgressRequest {
    #[validate(range(min = 1, max = 100000))]
    pub amount: u32,
}

async fn log_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<ProgressRequest>,
) -> Result<Json<Challenge>> {
    user.require_role(&[Role::Client])?;
    body.validate()?;
    validate_id(&id, "challenge")?;

    let today = today();
    let user_id = user.user_id.clone();
    let amount = body.amount;
    let mut challenge: Challenge = state
        .db
        .modify(&id, "Challenge", move |c: &mut Challenge| {
            add_progress(c, &user_id, amount, today).map(|_| ())
        })
        .await?;

    let progress = challenge
        .participant_mut(&user.user_id)
        .map(|p| p.progress)
        .unwrap_or_default();
    tracing::info!(
        challenge_id = %challenge.id,
        user_id = %user.user_id,
        progress,
        "Challenge progress logged"
    );
    Ok(Json(challenge))
}

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub name: String,
    pub progress: u32,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub challenge_id: String,
    pub goal: u32,
    pub unit: String,
    pub entries: Vec<LeaderboardEntry>,
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeaderboardResponse>> {
    let challenge = load_challenge(&state, &id).await?;
    let standings = challenge.leaderboard();

    let ids: Vec<String> = standings.iter().map(|s| s.user_id.clone()).collect();
    let names: HashMap<String, String> = state
        .db
        .get_many::<User>(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let entries = standings
        .into_iter()
        .map(|s| LeaderboardEntry {
            rank: s.rank,
            name: names.get(&s.user_id).cloned().unwrap_or_default(),
            user_id: s.user_id,
            progress: s.progress,
            completed: s.completed,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        challenge_id: challenge.id,
        goal: challenge.goal,
        unit: challenge.unit,
        entries,
    }))
}
