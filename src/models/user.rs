// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, role and membership models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::add_months;

/// Access role. Each role gets its own dashboard and permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Trainer,
    Receptionist,
    Client,
}

impl Role {
    /// Admin, trainer and receptionist.
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Client)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Trainer => "trainer",
            Role::Receptionist => "receptionist",
            Role::Client => "client",
        }
    }
}

/// User document stored in Firestore (`users/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Lowercased, unique across users
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// PBKDF2 hash, never returned by the API
    pub password_hash: String,
    pub membership: Option<Membership>,
    /// Assigned trainer (clients only)
    pub trainer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Effective membership status, if the user has a membership.
    pub fn membership_status(&self, today: NaiveDate) -> Option<MembershipStatus> {
        self.membership.as_ref().map(|m| m.effective_status(today))
    }

    /// True only inside a paid period: not before it starts, not after it ends.
    pub fn has_active_membership(&self, today: NaiveDate) -> bool {
        self.membership_status(today) == Some(MembershipStatus::Active)
    }
}

/// Membership plan with a fixed length and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MembershipPlan {
    Monthly,
    Quarterly,
    Annual,
}

impl MembershipPlan {
    pub fn duration_months(self) -> u32 {
        match self {
            MembershipPlan::Monthly => 1,
            MembershipPlan::Quarterly => 3,
            MembershipPlan::Annual => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MembershipPlan::Monthly => "monthly",
            MembershipPlan::Quarterly => "quarterly",
            MembershipPlan::Annual => "annual",
        }
    }

    pub fn price_cents(self) -> i64 {
        match self {
            MembershipPlan::Monthly => 4_000,
            MembershipPlan::Quarterly => 11_000,
            MembershipPlan::Annual => 40_000,
        }
    }
}

/// Membership status. Stored value; see [`Membership::effective_status`].
///
/// `Pending` is never stored: it is how an active membership whose period
/// has not started yet reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Active,
    Frozen,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Membership {
    pub plan: MembershipPlan,
    pub status: MembershipStatus,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_date: NaiveDate,
    /// Last day covered by the membership (inclusive)
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end_date: NaiveDate,
}

impl Membership {
    /// Start a new membership on `start`.
    pub fn start(plan: MembershipPlan, start: NaiveDate) -> Self {
        Self {
            plan,
            status: MembershipStatus::Active,
            start_date: start,
            end_date: end_of_period(start, plan),
        }
    }

    /// Renew with `plan`.
    ///
    /// The new period begins the day after the current end date, or today if
    /// the membership has already lapsed. Renewing reactivates the membership.
    pub fn renew(&self, plan: MembershipPlan, today: NaiveDate) -> Self {
        let next_day = self.end_date.succ_opt().unwrap_or(self.end_date);
        let period_start = if next_day > today { next_day } else { today };

        let current = matches!(
            self.effective_status(today),
            MembershipStatus::Active | MembershipStatus::Pending
        );

        Self {
            plan,
            status: MembershipStatus::Active,
            start_date: if current { self.start_date } else { period_start },
            end_date: end_of_period(period_start, plan),
        }
    }

    /// Status as seen on `today`: an active membership reads as pending
    /// before its start date and as expired after its end date.
    pub fn effective_status(&self, today: NaiveDate) -> MembershipStatus {
        match self.status {
            MembershipStatus::Active if today < self.start_date => MembershipStatus::Pending,
            MembershipStatus::Active if self.end_date < today => MembershipStatus::Expired,
            status => status,
        }
    }

    /// Days left including today, or 0 once lapsed.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        ((self.end_date - today).num_days() + 1).max(0)
    }
}

fn end_of_period(start: NaiveDate, plan: MembershipPlan) -> NaiveDate {
    let end = add_months(start, plan.duration_months());
    end.pred_opt().unwrap_or(end)
}

/// User as returned by the API (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub membership: Option<Membership>,
    /// Effective status computed for today
    pub membership_status: Option<MembershipStatus>,
    pub trainer_id: Option<String>,
    pub created_at: String,
}

impl UserProfile {
    pub fn from_user(user: User, today: NaiveDate) -> Self {
        let membership_status = user.membership_status(today);
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            role: user.role,
            membership: user.membership,
            membership_status,
            trainer_id: user.trainer_id,
            created_at: crate::time_utils::format_utc_rfc3339(user.created_at),
        }
    }
}

/// A front-desk check-in (`check_ins/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    /// Day of the visit (for daily queries)
    pub date: NaiveDate,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: String,
}
