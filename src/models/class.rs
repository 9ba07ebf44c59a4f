// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group class model.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// When a class takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassSchedule {
    /// Every week on the given day
    Weekly { weekday: Weekday },
    /// A single session
    Once { date: NaiveDate },
}

impl ClassSchedule {
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        match self {
            ClassSchedule::Weekly { weekday } => date.weekday() == *weekday,
            ClassSchedule::Once { date: once } => *once == date,
        }
    }
}

/// Group class stored in Firestore (`classes/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymClass {
    pub id: String,
    pub name: String,
    pub description: String,
    pub schedule: ClassSchedule,
    /// Local start time
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub trainer_ids: Vec<String>,
    pub booked_client_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl GymClass {
    pub fn is_full(&self) -> bool {
        self.booked_client_ids.len() as u32 >= self.capacity
    }

    pub fn is_booked_by(&self, client_id: &str) -> bool {
        self.booked_client_ids.iter().any(|id| id == client_id)
    }

    pub fn is_taught_by(&self, trainer_id: &str) -> bool {
        self.trainer_ids.iter().any(|id| id == trainer_id)
    }

    /// Take `user_id` off the trainer list, the roster, or both. Returns
    /// whether the class changed.
    pub fn remove_member(&mut self, user_id: &str, as_trainer: bool, as_client: bool) -> bool {
        let before = (self.trainer_ids.len(), self.booked_client_ids.len());
        if as_trainer {
            self.trainer_ids.retain(|id| id != user_id);
        }
        if as_client {
            self.booked_client_ids.retain(|id| id != user_id);
        }
        before != (self.trainer_ids.len(), self.booked_client_ids.len())
    }

    pub fn spots_left(&self) -> u32 {
        self.capacity
            .saturating_sub(self.booked_client_ids.len() as u32)
    }
}
