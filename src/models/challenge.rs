// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member fitness challenges.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub progress: u32,
    pub joined_at: DateTime<Utc>,
}

/// Challenge with embedded participants (`challenges/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Target amount, in `unit`
    pub goal: u32,
    /// e.g. "km", "workouts"
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub participants: Vec<Participant>,
    pub created_by: String,
}

/// Leaderboard row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Standing {
    pub rank: u32,
    pub user_id: String,
    pub progress: u32,
    pub completed: bool,
}

impl Challenge {
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }

    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Participants by progress (descending); earlier joiners win ties.
    pub fn leaderboard(&self) -> Vec<Standing> {
        let mut sorted: Vec<&Participant> = self.participants.iter().collect();
        sorted.sort_by(|a, b| {
            b.progress
                .cmp(&a.progress)
                .then_with(|| a.joined_at.cmp(&b.joined_at))
        });

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, p)| Standing {
                rank: i as u32 + 1,
                user_id: p.user_id.clone(),
                progress: p.progress,
                completed: p.progress >= self.goal,
            })
            .collect()
    }
}
