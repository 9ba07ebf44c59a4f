// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User accounts, memberships and front-desk check-ins.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    CheckIn, Membership, MembershipPlan, MembershipStatus, Payment, PaymentKind, PaymentMethod,
    Role, User, UserProfile,
};
use crate::services::password::{
    hash_password_blocking, validate_password_strength, verify_password_blocking,
};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/me/password", put(change_password))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/membership", post(start_membership))
        .route("/api/users/{id}/membership/freeze", post(freeze_membership))
        .route(
            "/api/users/{id}/membership/unfreeze",
            post(unfreeze_membership),
        )
        .route("/api/users/{id}/membership/cancel", post(cancel_membership))
        .route("/api/check-ins", get(list_check_ins).post(check_in))
}

/// Whether `caller` may see `target`'s record.
fn can_view(caller: &AuthUser, target: &User) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::Receptionist => target.role == Role::Client || target.id == caller.user_id,
        Role::Trainer => {
            target.id == caller.user_id
                || (target.role == Role::Client
                    && target.trainer_id.as_deref() == Some(caller.user_id.as_str()))
        }
        Role::Client => target.id == caller.user_id,
    }
}

/// Whether `caller` may edit `target`'s account and membership.
fn can_manage(caller: &AuthUser, target: &User) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::Receptionist => target.role == Role::Client,
        Role::Trainer | Role::Client => false,
    }
}

/// Load a user and check that `caller` may manage them.
async fn load_managed_user(state: &AppState, caller: &AuthUser, id: &str) -> Result<User> {
    validate_id(id, "user")?;
    let user: User = state.db.require(id, "User").await?;
    if !can_manage(caller, &user) {
        return Err(AppError::Forbidden(
            "You cannot manage this account".to_string(),
        ));
    }
    Ok(user)
}

/// Trainer assignment must point at an existing trainer.
async fn check_trainer(state: &AppState, trainer_id: &str) -> Result<()> {
    validate_id(trainer_id, "trainer")?;
    match state.db.get::<User>(trainer_id).await? {
        Some(u) if u.role == Role::Trainer => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "{} is not a trainer",
            trainer_id
        ))),
    }
}

// ─── Own Profile ─────────────────────────────────────────────

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let me: User = state.db.require(&user.user_id, "User").await?;
    Ok(Json(UserProfile::from_user(me, today())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserProfile>> {
    body.validate()?;

    let mut me: User = state.db.require(&user.user_id, "User").await?;
    if let Some(name) = body.name {
        me.name = name.trim().to_string();
    }
    if let Some(phone) = body.phone {
        let phone = phone.trim();
        me.phone = (!phone.is_empty()).then(|| phone.to_string());
    }
    state.db.put(&me).await?;

    tracing::info!(user_id = %me.id, "Profile updated");
    Ok(Json(UserProfile::from_user(me, today())))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Change own password. Nothing is written unless every check passes.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    if body.new_password != body.confirm_password {
        return Err(AppError::BadRequest(
            "New password and confirmation do not match".to_string(),
        ));
    }
    validate_password_strength(&body.new_password)?;

    let mut me: User = state.db.require(&user.user_id, "User").await?;
    if !verify_password_blocking(body.current_password, me.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    me.password_hash = hash_password_blocking(body.new_password).await?;
    state.db.put(&me).await?;

    tracing::info!(user_id = %me.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ─── User Management ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
}

/// List users visible to the caller.
///
/// Admins see everyone, receptionists see clients and trainers see the
/// clients assigned to them.
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<UsersQuery>,
) -> Result<Json<Vec<UserProfile>>> {
    let users: Vec<User> = match (user.role, params.role) {
        (Role::Admin, None) => state.db.list().await?,
        (Role::Admin, Some(role)) => state.db.list_where("role", role.as_str()).await?,
        (Role::Receptionist, None | Some(Role::Client)) => {
            state.db.list_where("role", Role::Client.as_str()).await?
        }
        (Role::Trainer, None | Some(Role::Client)) => state
            .db
            .list_where::<User>("trainer_id", &user.user_id)
            .await?
            .into_iter()
            .filter(|u| u.role == Role::Client)
            .collect(),
        _ => {
            return Err(AppError::Forbidden(
                "You cannot list these users".to_string(),
            ))
        }
    };

    let today = today();
    let mut profiles: Vec<UserProfile> = users
        .into_iter()
        .map(|u| UserProfile::from_user(u, today))
        .collect();
    profiles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Json(profiles))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub role: Role,
    pub password: String,
    pub trainer_id: Option<String>,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    match user.role {
        Role::Admin => {}
        Role::Receptionist if body.role == Role::Client => {}
        Role::Receptionist => {
            return Err(AppError::Forbidden(
                "Receptionists can only register clients".to_string(),
            ))
        }
        Role::Trainer | Role::Client => {
            return Err(AppError::Forbidden(
                "You cannot create accounts".to_string(),
            ))
        }
    }
    body.validate()?;
    validate_password_strength(&body.password)?;
    if body.trainer_id.is_some() && body.role != Role::Client {
        return Err(AppError::BadRequest(
            "Only clients can be assigned a trainer".to_string(),
        ));
    }

    let email = body.email.trim().to_lowercase();
    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "An account with email {} already exists",
            email
        )));
    }
    if let Some(trainer_id) = &body.trainer_id {
        check_trainer(&state, trainer_id).await?;
    }

    let new_user = User {
        id: new_id(),
        email,
        name: body.name.trim().to_string(),
        phone: body.phone.filter(|p| !p.trim().is_empty()),
        role: body.role,
        password_hash: hash_password_blocking(body.password).await?,
        membership: None,
        trainer_id: body.trainer_id,
        created_at: chrono::Utc::now(),
    };
    state.db.put(&new_user).await?;

    tracing::info!(
        user_id = %new_user.id,
        role = new_user.role.as_str(),
        created_by = %user.user_id,
        "User created"
    );
    Ok((
        StatusCode::CREATED,
        Json(UserProfile::from_user(new_user, today())),
    ))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    validate_id(&id, "user")?;
    if user.role == Role::Client && id != user.user_id {
        return Err(AppError::Forbidden(
            "Clients can only view their own account".to_string(),
        ));
    }

    let target: User = state.db.require(&id, "User").await?;
    if !can_view(&user, &target) {
        return Err(AppError::Forbidden("You cannot view this account".to_string()));
    }
    Ok(Json(UserProfile::from_user(target, today())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    /// Admin only
    pub role: Option<Role>,
    /// Empty string clears the assignment
    pub trainer_id: Option<String>,
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    if body.role.is_some() && !user.is(Role::Admin) {
        return Err(AppError::Forbidden("Only admins can change roles".to_string()));
    }
    body.validate()?;

    let mut target = load_managed_user(&state, &user, &id).await?;
    let previous_role = target.role;

    if let Some(email) = body.email {
        let email = email.trim().to_lowercase();
        if email != target.email {
            if state.db.find_user_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict(format!(
                    "An account with email {} already exists",
                    email
                )));
            }
            target.email = email;
        }
    }
    if let Some(name) = body.name {
        target.name = name.trim().to_string();
    }
    if let Some(phone) = body.phone {
        let phone = phone.trim();
        target.phone = (!phone.is_empty()).then(|| phone.to_string());
    }
    if let Some(role) = body.role {
        if target.id == user.user_id && role != Role::Admin {
            return Err(AppError::BadRequest(
                "You cannot remove your own admin role".to_string(),
            ));
        }
        target.role = role;
    }
    if let Some(trainer_id) = body.trainer_id {
        if trainer_id.is_empty() {
            target.trainer_id = None;
        } else {
            check_trainer(&state, &trainer_id).await?;
            target.trainer_id = Some(trainer_id);
        }
    }
    if target.role != Role::Client {
        target.trainer_id = None;
    }

    if target.role == previous_role {
        state.db.put(&target).await?;
    } else {
        state.db.save_role_change(&target, previous_role).await?;
    }
    tracing::info!(user_id = %target.id, updated_by = %user.user_id, "User updated");
    Ok(Json(UserProfile::from_user(target, today())))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    validate_id(&id, "user")?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    // 404 for unknown ids rather than a silent no-op
    let _: User = state.db.require(&id, "User").await?;
    let classes_updated = state.db.delete_user(&id).await?;

    tracing::info!(
        user_id = %id,
        deleted_by = %user.user_id,
        classes_updated,
        "User deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

// ─── Memberships ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub plan: MembershipPlan,
    /// Start of a new membership; ignored when renewing an active one
    pub start_date: Option<NaiveDate>,
    pub method: PaymentMethod,
}

/// Next membership state for a purchase of `plan`.
///
/// Active and pending memberships are extended; missing, lapsed or cancelled
/// ones start fresh on `start_date` (default today, never earlier). Frozen
/// memberships must be unfrozen first.
pub fn next_membership(
    current: Option<&Membership>,
    plan: MembershipPlan,
    start_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Membership> {
    match current.map(|m| (m, m.effective_status(today))) {
        Some((m, MembershipStatus::Active | MembershipStatus::Pending)) => {
            Ok(m.renew(plan, today))
        }
        Some((_, MembershipStatus::Frozen)) => Err(AppError::BadRequest(
            "Membership is frozen; unfreeze it before renewing".to_string(),
        )),
        _ => {
            let start = start_date.unwrap_or(today);
            if start < today {
                return Err(AppError::BadRequest(
                    "start_date cannot be in the past".to_string(),
                ));
            }
            Ok(Membership::start(plan, start))
        }
    }
}

/// Move a membership from `from` to `to`, judged by its status on `today`.
pub fn apply_transition(
    membership: Option<&mut Membership>,
    from: MembershipStatus,
    to: MembershipStatus,
    today: NaiveDate,
) -> Result<()> {
    let membership =
        membership.ok_or_else(|| AppError::BadRequest("User has no membership".to_string()))?;
    let current = membership.effective_status(today);
    if current != from {
        return Err(AppError::BadRequest(format!(
            "Membership is {:?}, expected {:?}",
            current, from
        )));
    }
    membership.status = to;
    Ok(())
}

/// Start or renew a client's membership and record the payment.
async fn start_membership(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<MembershipRequest>,
) -> Result<Json<UserProfile>> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    let mut client = load_managed_user(&state, &user, &id).await?;
    if client.role != Role::Client {
        return Err(AppError::BadRequest(
            "Memberships are only sold to clients".to_string(),
        ));
    }

    let today = today();
    let membership = next_membership(client.membership.as_ref(), body.plan, body.start_date, today)?;
    client.membership = Some(membership);

    let payment = Payment {
        id: new_id(),
        user_id: Some(client.id.clone()),
        amount_cents: body.plan.price_cents(),
        method: body.method,
        kind: PaymentKind::Membership,
        description: format!("{} membership", body.plan.as_str()),
        date: today,
        recorded_by: user.user_id.clone(),
    };
    state.db.save_membership_payment(&client, &payment).await?;

    Ok(Json(UserProfile::from_user(client, today)))
}

/// Apply a status transition to a user's membership.
async fn transition_membership(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    from: MembershipStatus,
    to: MembershipStatus,
) -> Result<Json<UserProfile>> {
    let mut client = load_managed_user(state, user, id).await?;
    let today = today();
    apply_transition(client.membership.as_mut(), from, to, today)?;

    state.db.put(&client).await?;
    tracing::info!(
        user_id = %client.id,
        status = ?to,
        changed_by = %user.user_id,
        "Membership status changed"
    );
    Ok(Json(UserProfile::from_user(client, today)))
}

async fn freeze_membership(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    transition_membership(
        &state,
        &user,
        &id,
        MembershipStatus::Active,
        MembershipStatus::Frozen,
    )
    .await
}

async fn unfreeze_membership(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    transition_membership(
        &state,
        &user,
        &id,
        MembershipStatus::Frozen,
        MembershipStatus::Active,
    )
    .await
}

async fn cancel_membership(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    user.require_role(&[Role::Admin])?;
    let mut client = load_managed_user(&state, &user, &id).await?;

    let membership = client
        .membership
        .as_mut()
        .filter(|m| m.status != MembershipStatus::Cancelled)
        .ok_or_else(|| AppError::BadRequest("No membership to cancel".to_string()))?;
    membership.status = MembershipStatus::Cancelled;

    state.db.put(&client).await?;
    tracing::info!(user_id = %client.id, cancelled_by = %user.user_id, "Membership cancelled");
    Ok(Json(UserProfile::from_user(client, today())))
}

// ─── Check-ins ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub user_id: String,
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<CheckIn>)> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    validate_id(&body.user_id, "user")?;

    let client: User = state.db.require(&body.user_id, "User").await?;
    let today = today();
    if !client.has_active_membership(today) {
        return Err(AppError::BadRequest(format!(
            "{} has no active membership",
            client.name
        )));
    }

    let check_in = CheckIn {
        id: new_id(),
        user_id: client.id,
        user_name: client.name,
        date: today,
        checked_in_at: chrono::Utc::now(),
        checked_in_by: user.user_id.clone(),
    };
    state.db.put(&check_in).await?;

    tracing::info!(user_id = %check_in.user_id, "Client checked in");
    Ok((StatusCode::CREATED, Json(check_in)))
}

#[derive(Debug, Deserialize)]
pub struct CheckInsQuery {
    pub date: Option<String>,
}

async fn list_check_ins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CheckInsQuery>,
) -> Result<Json<Vec<CheckIn>>> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    let date = match params.date.as_deref() {
        None => today(),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::BadRequest("Invalid 'date' parameter: expected YYYY-MM-DD".to_string())
        })?,
    };

    let mut check_ins: Vec<CheckIn> = state.db.list_where("date", &date.to_string()).await?;
    check_ins.sort_by(|a, b| b.checked_in_at.cmp(&a.checked_in_at));
    Ok(Json(check_ins))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: "caller".to_string(),
            role,
        }
    }

    fn user(id: &str, role: Role, trainer: Option<&str>) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: id.to_string(),
            phone: None,
            role,
            password_hash: String::new(),
            membership: None,
            trainer_id: trainer.map(str::to_string),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_visibility_rules() {
        let assigned = user("c1", Role::Client, Some("caller"));
        let other = user("c2", Role::Client, Some("t9"));
        let trainer = user("t9", Role::Trainer, None);

        assert!(can_view(&caller(Role::Trainer), &assigned));
        assert!(!can_view(&caller(Role::Trainer), &other));
        assert!(can_view(&caller(Role::Receptionist), &other));
        assert!(!can_view(&caller(Role::Receptionist), &trainer));
        assert!(can_view(&caller(Role::Admin), &trainer));
        assert!(!can_view(&caller(Role::Client), &other));
    }

    #[test]
    fn test_receptionist_manages_clients_only() {
        assert!(can_manage(
            &caller(Role::Receptionist),
            &user("c1", Role::Client, None)
        ));
        assert!(!can_manage(
            &caller(Role::Receptionist),
            &user("t1", Role::Trainer, None)
        ));
        assert!(!can_manage(
            &caller(Role::Trainer),
            &user("c1", Role::Client, Some("caller"))
        ));
    }

    #[test]
    fn test_next_membership() {
        let today = date(2025, 5, 10);

        let fresh = next_membership(None, MembershipPlan::Monthly, None, today).unwrap();
        assert_eq!(fresh.start_date, today);

        let scheduled = next_membership(
            None,
            MembershipPlan::Monthly,
            Some(date(2025, 6, 1)),
            today,
        )
        .unwrap();
        assert_eq!(scheduled.end_date, date(2025, 6, 30));
        assert_eq!(scheduled.effective_status(today), MembershipStatus::Pending);

        let renewed_early =
            next_membership(Some(&scheduled), MembershipPlan::Monthly, None, today).unwrap();
        assert_eq!(renewed_early.start_date, date(2025, 6, 1));
        assert_eq!(renewed_early.end_date, date(2025, 7, 31));

        let active = Membership::start(MembershipPlan::Monthly, date(2025, 5, 1));
        let renewed =
            next_membership(Some(&active), MembershipPlan::Monthly, None, today).unwrap();
        assert_eq!(renewed.start_date, date(2025, 5, 1));
        assert_eq!(renewed.end_date, date(2025, 6, 30));

        let mut frozen = active.clone();
        frozen.status = MembershipStatus::Frozen;
        assert!(next_membership(Some(&frozen), MembershipPlan::Monthly, None, today).is_err());

        let mut cancelled = active;
        cancelled.status = MembershipStatus::Cancelled;
        let restarted =
            next_membership(Some(&cancelled), MembershipPlan::Annual, None, today).unwrap();
        assert_eq!(restarted.start_date, today);
        assert_eq!(restarted.status, MembershipStatus::Active);
    }

    #[test]
    fn test_next_membership_rejects_past_start() {
        let today = date(2025, 5, 10);
        let err = next_membership(
            None,
            MembershipPlan::Monthly,
            Some(date(2020, 1, 1)),
            today,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let yesterday = next_membership(
            None,
            MembershipPlan::Monthly,
            Some(date(2025, 5, 9)),
            today,
        );
        assert!(yesterday.is_err());

        // Renewing an active membership ignores start_date
        let active = Membership::start(MembershipPlan::Monthly, date(2025, 5, 1));
        assert!(next_membership(
            Some(&active),
            MembershipPlan::Monthly,
            Some(date(2020, 1, 1)),
            today
        )
        .is_ok());
    }

    #[test]
    fn test_freeze_and_unfreeze_transitions() {
        let today = date(2025, 5, 10);
        let mut m = Membership::start(MembershipPlan::Monthly, date(2025, 5, 1));

        apply_transition(
            Some(&mut m),
            MembershipStatus::Active,
            MembershipStatus::Frozen,
            today,
        )
        .unwrap();
        assert_eq!(m.status, MembershipStatus::Frozen);

        // Freezing twice is refused
        let err = apply_transition(
            Some(&mut m),
            MembershipStatus::Active,
            MembershipStatus::Frozen,
            today,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        apply_transition(
            Some(&mut m),
            MembershipStatus::Frozen,
            MembershipStatus::Active,
            today,
        )
        .unwrap();
        assert_eq!(m.status, MembershipStatus::Active);

        // Unfreeze requires a frozen membership
        assert!(apply_transition(
            Some(&mut m),
            MembershipStatus::Frozen,
            MembershipStatus::Active,
            today
        )
        .is_err());
    }

    #[test]
    fn test_transition_judges_effective_status() {
        let today = date(2025, 5, 10);

        // Stored active but lapsed in February
        let mut lapsed = Membership::start(MembershipPlan::Monthly, date(2025, 1, 1));
        assert!(apply_transition(
            Some(&mut lapsed),
            MembershipStatus::Active,
            MembershipStatus::Frozen,
            today
        )
        .is_err());
        assert_eq!(lapsed.status, MembershipStatus::Active);

        let mut pending = Membership::start(MembershipPlan::Monthly, date(2025, 6, 1));
        assert!(apply_transition(
            Some(&mut pending),
            MembershipStatus::Active,
            MembershipStatus::Frozen,
            today
        )
        .is_err());

        assert!(apply_transition(
            None,
            MembershipStatus::Active,
            MembershipStatus::Frozen,
            today
        )
        .is_err());
    }
}
