// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment inventory and staff tasks.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Operational,
    NeedsMaintenance,
    OutOfOrder,
}

/// Gym floor equipment (`equipment/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub status: EquipmentStatus,
    pub last_maintenance: Option<NaiveDate>,
    pub maintenance_interval_days: u32,
    pub notes: String,
}

impl EquipmentItem {
    /// Next scheduled service date, if the item has ever been serviced.
    pub fn next_maintenance(&self) -> Option<NaiveDate> {
        self.last_maintenance.and_then(|last| {
            last.checked_add_days(Days::new(u64::from(self.maintenance_interval_days)))
        })
    }

    /// Never serviced, or the service interval has elapsed.
    pub fn maintenance_due(&self, today: NaiveDate) -> bool {
        match self.next_maintenance() {
            Some(next) => next <= today,
            None => true,
        }
    }

    /// Needs attention: broken, flagged, or service overdue.
    pub fn needs_attention(&self, today: NaiveDate) -> bool {
        self.status != EquipmentStatus::Operational || self.maintenance_due(today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// Task assigned to a staff member (`tasks/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assignee_id: String,
    pub created_by: String,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl StaffTask {
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Done
    }
}
