// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-specific dashboard summaries.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{
    Challenge, CheckIn, ClassSchedule, EquipmentItem, Expense, GymClass, Membership,
    MembershipStatus, Message, Payment, Role, StaffTask, User,
};
use crate::services::finance::build_ledger;
use crate::time_utils::{today, YearMonth};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

/// Memberships ending within this many days count as expiring.
const EXPIRING_WITHIN_DAYS: i64 = 7;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct MembershipCounts {
    /// Paid for, starting later
    pub pending: u32,
    pub active: u32,
    pub frozen: u32,
    pub expired: u32,
    pub cancelled: u32,
    /// Clients who never bought a membership
    pub none: u32,
}

#[derive(Debug, Serialize)]
pub struct ExpiringMembership {
    pub user_id: String,
    pub name: String,
    pub end_date: NaiveDate,
    pub days_remaining: i64,
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Admin {
        members: MembershipCounts,
        staff_count: u32,
        month: String,
        income_cents: i64,
        expense_cents: i64,
        net_cents: i64,
        equipment_needing_attention: Vec<EquipmentItem>,
        open_tasks: u32,
    },
    Trainer {
        classes: Vec<GymClass>,
        assigned_clients: u32,
        open_tasks: Vec<StaffTask>,
    },
    Receptionist {
        check_ins_today: u32,
        expiring_memberships: Vec<ExpiringMembership>,
        open_tasks: Vec<StaffTask>,
    },
    Client {
        membership: Option<Membership>,
        membership_status: Option<MembershipStatus>,
        days_remaining: Option<i64>,
        booked_classes: Vec<GymClass>,
        unread_messages: u32,
        active_challenges: Vec<Challenge>,
    },
}

/// Count clients by effective membership status.
pub fn membership_counts(users: &[User], today: NaiveDate) -> MembershipCounts {
    let mut counts = MembershipCounts::default();
    for user in users.iter().filter(|u| u.role == Role::Client) {
        match user.membership_status(today) {
            Some(MembershipStatus::Pending) => counts.pending += 1,
            Some(MembershipStatus::Active) => counts.active += 1,
            Some(MembershipStatus::Frozen) => counts.frozen += 1,
            Some(MembershipStatus::Expired) => counts.expired += 1,
            Some(MembershipStatus::Cancelled) => counts.cancelled += 1,
            None => counts.none += 1,
        }
    }
    counts
}

/// Active memberships ending within `within_days`, soonest first.
pub fn expiring_memberships(
    users: &[User],
    today: NaiveDate,
    within_days: i64,
) -> Vec<ExpiringMembership> {
    let mut expiring: Vec<ExpiringMembership> = users
        .iter()
        .filter_map(|u| {
            let m = u.membership.as_ref()?;
            if m.effective_status(today) != MembershipStatus::Active {
                return None;
            }
            let days_remaining = m.days_remaining(today);
            (days_remaining <= within_days).then(|| ExpiringMembership {
                user_id: u.id.clone(),
                name: u.name.clone(),
                end_date: m.end_date,
                days_remaining,
            })
        })
        .collect();
    expiring.sort_by(|a, b| a.end_date.cmp(&b.end_date).then_with(|| a.name.cmp(&b.name)));
    expiring
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Dashboard>> {
    let today = today();
    let dashboard = match user.role {
        Role::Admin => admin_dashboard(&state, today).await?,
        Role::Trainer => trainer_dashboard(&state, &user, today).await?,
        Role::Receptionist => receptionist_dashboard(&state, &user, today).await?,
        Role::Client => client_dashboard(&state, &user, today).await?,
    };
    Ok(Json(dashboard))
}

async fn open_tasks_for(state: &AppState, user_id: &str) -> Result<Vec<StaffTask>> {
    Ok(state
        .db
        .list_where::<StaffTask>("assignee_id", user_id)
        .await?
        .into_iter()
        .filter(StaffTask::is_open)
        .collect())
}

async fn admin_dashboard(state: &AppState, today: NaiveDate) -> Result<Dashboard> {
    let month = YearMonth::of(today);
    let (users, payments, expenses, equipment, tasks) = tokio::try_join!(
        state.db.list::<User>(),
        state.db.list_in_month::<Payment>("date", month),
        state.db.list_in_month::<Expense>("date", month),
        state.db.list::<EquipmentItem>(),
        state.db.list::<StaffTask>(),
    )?;

    let ledger = build_ledger(&payments, &expenses);
    Ok(Dashboard::Admin {
        members: membership_counts(&users, today),
        staff_count: users.iter().filter(|u| u.role.is_staff()).count() as u32,
        month: month.to_string(),
        income_cents: ledger.total_income_cents,
        expense_cents: ledger.total_expense_cents,
        net_cents: ledger.net_cents,
        equipment_needing_attention: equipment
            .into_iter()
            .filter(|e| e.needs_attention(today))
            .collect(),
        open_tasks: tasks.iter().filter(|t| t.is_open()).count() as u32,
    })
}

async fn trainer_dashboard(
    state: &AppState,
    user: &AuthUser,
    today: NaiveDate,
) -> Result<Dashboard> {
    let (classes, clients, open_tasks) = tokio::try_join!(
        state.db.list::<GymClass>(),
        state.db.list_where::<User>("trainer_id", &user.user_id),
        open_tasks_for(state, &user.user_id),
    )?;

    let classes = classes
        .into_iter()
        .filter(|c| c.is_taught_by(&user.user_id))
        .filter(|c| upcoming(c, today))
        .collect();

    Ok(Dashboard::Trainer {
        classes,
        assigned_clients: clients.iter().filter(|c| c.role == Role::Client).count() as u32,
        open_tasks,
    })
}

async fn receptionist_dashboard(
    state: &AppState,
    user: &AuthUser,
    today: NaiveDate,
) -> Result<Dashboard> {
    let today_str = today.to_string();
    let (check_ins, clients, open_tasks) = tokio::try_join!(
        state.db.list_where::<CheckIn>("date", &today_str),
        state.db.list_where::<User>("role", Role::Client.as_str()),
        open_tasks_for(state, &user.user_id),
    )?;

    Ok(Dashboard::Receptionist {
        check_ins_today: check_ins.len() as u32,
        expiring_memberships: expiring_memberships(&clients, today, EXPIRING_WITHIN_DAYS),
        open_tasks,
    })
}

async fn client_dashboard(
    state: &AppState,
    user: &AuthUser,
    today: NaiveDate,
) -> Result<Dashboard> {
    let (me, classes, inbox, challenges) = tokio::try_join!(
        state.db.require::<User>(&user.user_id, "User"),
        state.db.list::<GymClass>(),
        state.db.list_where::<Message>("recipient_id", &user.user_id),
        state.db.list::<Challenge>(),
    )?;

    let membership_status = me.membership_status(today);
    let days_remaining = me.membership.as_ref().map(|m| m.days_remaining(today));

    Ok(Dashboard::Client {
        membership: me.membership,
        membership_status,
        days_remaining,
        booked_classes: classes
            .into_iter()
            .filter(|c| c.is_booked_by(&user.user_id) && upcoming(c, today))
            .collect(),
        unread_messages: inbox.iter().filter(|m| !m.read).count() as u32,
        active_challenges: challenges
            .into_iter()
            .filter(|c| c.is_participant(&user.user_id) && !c.has_ended(today))
            .collect(),
    })
}

/// Weekly classes always recur; one-off classes only until their date.
fn upcoming(class: &GymClass, today: NaiveDate) -> bool {
    match class.schedule {
        ClassSchedule::Weekly { .. } => true,
        ClassSchedule::Once { date } => date >= today,
    }
}
