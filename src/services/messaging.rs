// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inbox summaries and the announcement feed.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Announcement, Message, Role};

pub const MAX_MESSAGE_CHARS: usize = 2000;

/// One row of a user's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub other_user_id: String,
    /// Filled in by the caller; empty if the other user no longer exists
    pub other_user_name: String,
    pub last_message: Message,
    /// Messages to the viewer not yet read
    pub unread_count: u32,
}

/// Group `messages` (all involving `viewer_id`) into conversations, newest
/// activity first.
pub fn summarize_conversations(viewer_id: &str, messages: Vec<Message>) -> Vec<ConversationSummary> {
    let mut by_conversation: HashMap<String, ConversationSummary> = HashMap::new();

    for message in messages {
        let unread = u32::from(message.recipient_id == viewer_id && !message.read);
        let other = if message.sender_id == viewer_id {
            message.recipient_id.clone()
        } else {
            message.sender_id.clone()
        };

        match by_conversation.get_mut(&message.conversation_id) {
            Some(summary) => {
                summary.unread_count += unread;
                if message.sent_at > summary.last_message.sent_at {
                    summary.last_message = message;
                }
            }
            None => {
                by_conversation.insert(
                    message.conversation_id.clone(),
                    ConversationSummary {
                        conversation_id: message.conversation_id.clone(),
                        other_user_id: other,
                        other_user_name: String::new(),
                        last_message: message,
                        unread_count: unread,
                    },
                );
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = by_conversation.into_values().collect();
    summaries.sort_by(|a, b| {
        b.last_message
            .sent_at
            .cmp(&a.last_message.sent_at)
            .then_with(|| a.conversation_id.cmp(&b.conversation_id))
    });
    summaries
}

/// Mark the messages addressed to `reader_id` as read and return them.
/// Messages the reader sent, or has already read, are left out.
pub fn mark_unread_as_read(messages: Vec<Message>, reader_id: &str) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|m| m.recipient_id == reader_id && !m.read)
        .map(|mut m| {
            m.read = true;
            m
        })
        .collect()
}

/// Announcements visible to `role`: pinned first, then newest.
pub fn announcement_feed(role: Role, announcements: Vec<Announcement>) -> Vec<Announcement> {
    let mut feed: Vec<Announcement> = announcements
        .into_iter()
        .filter(|a| a.audience.includes(role))
        .collect();
    feed.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{conversation_id, Audience};
    use chrono::{TimeZone, Utc};

    fn message(id: &str, from: &str, to: &str, minute: u32, read: bool) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: conversation_id(from, to),
            sender_id: from.to_string(),
            recipient_id: to.to_string(),
            body: format!("message {}", id),
            sent_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap(),
            read,
        }
    }

    fn announcement(id: &str, audience: Audience, pinned: bool, day: u32) -> Announcement {
        Announcement {
            id: id.to_string(),
            title: id.to_string(),
            body: String::new(),
            audience,
            pinned,
            author_id: "admin".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_summarize_conversations() {
        let messages = vec![
            message("1", "bob", "me", 1, true),
            message("2", "me", "bob", 2, false),
            message("3", "carol", "me", 3, false),
            message("4", "carol", "me", 4, false),
            message("5", "bob", "me", 5, false),
        ];

        let summaries = summarize_conversations("me", messages);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].other_user_id, "bob");
        assert_eq!(summaries[0].last_message.id, "5");
        // Message 2 was sent by the viewer and does not count as unread
        assert_eq!(summaries[0].unread_count, 1);

        assert_eq!(summaries[1].other_user_id, "carol");
        assert_eq!(summaries[1].unread_count, 2);
    }

    #[test]
    fn test_mark_read_counts_only_unread_incoming() {
        let messages = vec![
            message("1", "bob", "me", 1, true),
            message("2", "me", "bob", 2, false),
            message("3", "bob", "me", 3, false),
            message("4", "bob", "me", 4, false),
        ];

        let marked = mark_unread_as_read(messages, "me");
        let ids: Vec<&str> = marked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4"]);
        assert!(marked.iter().all(|m| m.read));

        // Nothing left to mark on a second pass
        assert!(mark_unread_as_read(marked, "me").is_empty());
        // Bob has not read message 2 but it is not the caller's to mark
        assert!(mark_unread_as_read(vec![message("2", "me", "bob", 2, false)], "me").is_empty());
    }

    #[test]
    fn test_announcement_feed_filters_and_orders() {
        let all = vec![
            announcement("old-all", Audience::All, false, 1),
            announcement("new-all", Audience::All, false, 5),
            announcement("staff", Audience::Staff, true, 2),
            announcement("clients-pinned", Audience::Clients, true, 3),
        ];

        let client: Vec<String> = announcement_feed(Role::Client, all.clone())
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(client, vec!["clients-pinned", "new-all", "old-all"]);

        let trainer: Vec<String> = announcement_feed(Role::Trainer, all.clone())
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(trainer, vec!["staff", "new-all", "old-all"]);

        assert_eq!(announcement_feed(Role::Admin, all).len(), 4);
    }
}
