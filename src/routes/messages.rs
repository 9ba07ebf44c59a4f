// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct messages and announcements.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{conversation_id, Announcement, Audience, Message, Role, User};
use crate::services::messaging::{
    announcement_feed, mark_unread_as_read, summarize_conversations, ConversationSummary,
    MAX_MESSAGE_CHARS,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/messages", post(send_message))
        .route("/api/messages/conversations", get(list_conversations))
        .route("/api/messages/{other_id}", get(get_conversation))
        .route("/api/messages/{other_id}/read", post(mark_read))
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/api/announcements/{id}", delete(delete_announcement))
}

// ─── Direct Messages ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    pub body: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message is longer than {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    validate_id(&req.recipient_id, "recipient")?;
    if req.recipient_id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot message yourself".to_string(),
        ));
    }

    let _: User = state.db.require(&req.recipient_id, "Recipient").await?;

    let message = Message {
        id: new_id(),
        conversation_id: conversation_id(&user.user_id, &req.recipient_id),
        sender_id: user.user_id.clone(),
        recipient_id: req.recipient_id,
        body: body.to_string(),
        sent_at: chrono::Utc::now(),
        read: false,
    };
    state.db.put(&message).await?;

    tracing::debug!(
        message_id = %message.id,
        conversation_id = %message.conversation_id,
        "Message sent"
    );
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ConversationSummary>>> {
    let messages = state.db.list_messages_involving(&user.user_id).await?;
    let mut summaries = summarize_conversations(&user.user_id, messages);

    let other_ids: Vec<String> = summaries.iter().map(|s| s.other_user_id.clone()).collect();
    let names: HashMap<String, String> = state
        .db
        .get_many::<User>(&other_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    for summary in &mut summaries {
        if let Some(name) = names.get(&summary.other_user_id) {
            summary.other_user_name = name.clone();
        }
    }

    Ok(Json(summaries))
}

/// Messages between the caller and another user, oldest first.
async fn load_conversation(state: &AppState, me: &str, other_id: &str) -> Result<Vec<Message>> {
    validate_id(other_id, "user")?;
    let mut messages: Vec<Message> = state
        .db
        .list_where("conversation_id", &conversation_id(me, other_id))
        .await?;
    messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));
    Ok(messages)
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    Ok(Json(
        load_conversation(&state, &user.user_id, &other_id).await?,
    ))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub marked: usize,
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<String>,
) -> Result<Json<MarkReadResponse>> {
    let unread = mark_unread_as_read(
        load_conversation(&state, &user.user_id, &other_id).await?,
        &user.user_id,
    );

    if !unread.is_empty() {
        state.db.put_all(&unread).await?;
    }

    tracing::debug!(user_id = %user.user_id, marked = unread.len(), "Messages marked read");
    Ok(Json(MarkReadResponse {
        marked: unread.len(),
    }))
}

// ─── Announcements ───────────────────────────────────────────

async fn list_announcements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Announcement>>> {
    let announcements: Vec<Announcement> = state.db.list().await?;
    Ok(Json(announcement_feed(user.role, announcements)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    #[serde(default = "default_audience")]
    pub audience: Audience,
    #[serde(default)]
    pub pinned: bool,
}

fn default_audience() -> Audience {
    Audience::All
}

async fn create_announcement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>)> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;

    let announcement = Announcement {
        id: new_id(),
        title: body.title.trim().to_string(),
        body: body.body,
        audience: body.audience,
        pinned: body.pinned,
        author_id: user.user_id.clone(),
        created_at: chrono::Utc::now(),
    };
    state.db.put(&announcement).await?;

    tracing::info!(
        announcement_id = %announcement.id,
        audience = ?announcement.audience,
        "Announcement published"
    );
    Ok((StatusCode::CREATED, Json(announcement)))
}

async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    validate_id(&id, "announcement")?;
    state.db.delete::<Announcement>(&id).await?;
    tracing::info!(announcement_id = %id, "Announcement deleted");
    Ok(StatusCode::NO_CONTENT)
}
