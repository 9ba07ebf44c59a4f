// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI-assisted content drafting.
//!
//! Drafts are returned to the caller and never stored; the caller decides
//! whether to publish them.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Role, User};
use crate::services::generative::{AnnouncementDraft, WorkoutPlan, WorkoutRequest};
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::validate_id;

const DEFAULT_TONE: &str = "friendly and motivating";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ai/workout-plan", post(workout_plan))
        .route("/api/ai/announcement", post(announcement))
        .route("/api/ai/class-description", post(class_description))
}

fn require_enabled(state: &AppState) -> Result<()> {
    if state.generative.is_enabled() {
        Ok(())
    } else {
        Err(AppError::AiUnavailable)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct WorkoutPlanRequest {
    /// Defaults to the caller for clients; required for staff
    pub client_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub goal: String,
    #[validate(range(min = 1, max = 7))]
    pub days_per_week: u32,
    #[validate(length(min = 1, max = 50))]
    pub experience: String,
}

async fn workout_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<WorkoutPlanRequest>,
) -> Result<Json<WorkoutPlan>> {
    user.require_role(&[Role::Admin, Role::Trainer, Role::Client])?;
    body.validate()?;

    let client_id = match (user.role, body.client_id) {
        (Role::Client, Some(id)) if id != user.user_id => {
            return Err(AppError::Forbidden(
                "Clients can only request their own plan".to_string(),
            ))
        }
        (Role::Client, _) => user.user_id.clone(),
        (_, Some(id)) => id,
        (_, None) => return Err(AppError::BadRequest("client_id is required".to_string())),
    };
    validate_id(&client_id, "client")?;
    require_enabled(&state)?;

    let client: User = state.db.require(&client_id, "Client").await?;
    if client.role != Role::Client {
        return Err(AppError::BadRequest(format!("{} is not a client", client_id)));
    }

    let request = WorkoutRequest {
        client_name: &client.name,
        goal: body.goal.trim(),
        days_per_week: body.days_per_week,
        experience: body.experience.trim(),
    };
    let plan = state
        .generative
        .workout_plan(&user.user_id, &request)
        .await?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementDraftRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    #[validate(length(max = 50))]
    pub tone: Option<String>,
}

async fn announcement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AnnouncementDraftRequest>,
) -> Result<Json<AnnouncementDraft>> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;
    require_enabled(&state)?;

    let tone = body
        .tone
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TONE);
    let draft = state
        .generative
        .announcement(&user.user_id, body.topic.trim(), tone)
        .await?;
    Ok(Json(draft))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClassDescriptionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 200))]
    pub focus: Option<String>,
}

#[derive(Serialize)]
pub struct ClassDescriptionResponse {
    pub description: String,
}

async fn class_description(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ClassDescriptionRequest>,
) -> Result<Json<ClassDescriptionResponse>> {
    user.require_role(&[Role::Admin, Role::Trainer])?;
    body.validate()?;
    require_enabled(&state)?;

    let focus = body.focus.as_deref().map(str::trim).filter(|f| !f.is_empty());
    let description = state
        .generative
        .class_description(&user.user_id, body.name.trim(), focus)
        .await?;
    Ok(Json(ClassDescriptionResponse { description }))
}
