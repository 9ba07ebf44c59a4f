// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Direct messages and announcements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::Role;

/// Conversation key shared by both participants: the two user ids sorted
/// and joined with `_`.
pub fn conversation_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}_{}", a, b)
    } else {
        format!("{}_{}", b, a)
    }
}

/// Direct message (`messages/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// Who an announcement is shown to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    All,
    Staff,
    Clients,
}

impl Audience {
    pub fn includes(self, role: Role) -> bool {
        match (self, role) {
            (_, Role::Admin) | (Audience::All, _) => true,
            (Audience::Staff, role) => role.is_staff(),
            (Audience::Clients, role) => role == Role::Client,
        }
    }
}

/// Gym-wide notice (`announcements/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub pinned: bool,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}
