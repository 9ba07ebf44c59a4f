// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group classes, bookings and the month calendar.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ClassSchedule, GymClass, Role, User};
use crate::services::booking;
use crate::services::calendar::{build_month, CalendarMonth};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveTime;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id, MonthQuery};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/classes", get(list_classes).post(create_class))
        .route(
            "/api/classes/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
        .route("/api/classes/{id}/book", post(book_class))
        .route("/api/classes/{id}/cancel", post(cancel_booking))
        .route("/api/calendar", get(get_calendar))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
fn parse_start_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::BadRequest("Invalid start_time: expected HH:MM".to_string()))
}

/// Every id must belong to a trainer.
async fn check_trainers(state: &AppState, trainer_ids: &[String]) -> Result<()> {
    for id in trainer_ids {
        validate_id(id, "trainer")?;
    }
    let trainers: Vec<User> = state.db.get_many(trainer_ids).await?;
    if trainers.len() != trainer_ids.len() || trainers.iter().any(|t| t.role != Role::Trainer) {
        return Err(AppError::BadRequest(
            "trainer_ids must reference trainers".to_string(),
        ));
    }
    Ok(())
}

async fn list_classes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GymClass>>> {
    let mut classes: Vec<GymClass> = state.db.list().await?;
    classes.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(Json(classes))
}

async fn get_class(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GymClass>> {
    validate_id(&id, "class")?;
    Ok(Json(state.db.require(&id, "Class").await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub schedule: ClassSchedule,
    pub start_time: String,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: u32,
    #[validate(range(min = 1, max = 500))]
    pub capacity: u32,
    #[serde(default)]
    pub trainer_ids: Vec<String>,
}

/// Create a class. A trainer creating a class always teaches it.
async fn create_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<GymClass>)> {
    user.require_role(&[Role::Admin, Role::Trainer])?;
    body.validate()?;
    let start_time = parse_start_time(&body.start_time)?;

    let mut trainer_ids = body.trainer_ids;
    if user.is(Role::Trainer) && !trainer_ids.contains(&user.user_id) {
        trainer_ids.push(user.user_id.clone());
    }
    trainer_ids.sort();
    trainer_ids.dedup();
    check_trainers(&state, &trainer_ids).await?;

    let class = GymClass {
        id: new_id(),
        name: body.name.trim().to_string(),
        description: body.description.unwrap_or_default(),
        schedule: body.schedule,
        start_time,
        duration_minutes: body.duration_minutes,
        capacity: body.capacity,
        trainer_ids,
        booked_client_ids: Vec::new(),
        created_at: chrono::Utc::now(),
    };
    state.db.put(&class).await?;

    tracing::info!(class_id = %class.id, created_by = %user.user_id, "Class created");
    Ok((StatusCode::CREATED, Json(class)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub schedule: Option<ClassSchedule>,
    pub start_time: Option<String>,
    #[validate(range(min = 5, max = 480))]
    pub duration_minutes: Option<u32>,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<u32>,
    /// Admin only
    pub trainer_ids: Option<Vec<String>>,
}

async fn update_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateClassRequest>,
) -> Result<Json<GymClass>> {
    user.require_role(&[Role::Admin, Role::Trainer])?;
    if body.trainer_ids.is_some() && !user.is(Role::Admin) {
        return Err(AppError::Forbidden(
            "Only admins can reassign trainers".to_string(),
        ));
    }
    body.validate()?;
    validate_id(&id, "class")?;
    let start_time = body.start_time.as_deref().map(parse_start_time).transpose()?;

    let mut class: GymClass = state.db.require(&id, "Class").await?;
    if user.is(Role::Trainer) && !class.is_taught_by(&user.user_id) {
        return Err(AppError::Forbidden(
            "You can only edit classes you teach".to_string(),
        ));
    }

    if let Some(name) = body.name {
        class.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        class.description = description;
    }
    if let Some(schedule) = body.schedule {
        class.schedule = schedule;
    }
    if let Some(start_time) = start_time {
        class.start_time = start_time;
    }
    if let Some(duration) = body.duration_minutes {
        class.duration_minutes = duration;
    }
    if let Some(capacity) = body.capacity {
        if (capacity as usize) < class.booked_client_ids.len() {
            return Err(AppError::BadRequest(format!(
                "Capacity {} is below the {} existing bookings",
                capacity,
                class.booked_client_ids.len()
            )));
        }
        class.capacity = capacity;
    }
    if let Some(mut trainer_ids) = body.trainer_ids {
        trainer_ids.sort();
        trainer_ids.dedup();
        check_trainers(&state, &trainer_ids).await?;
        class.trainer_ids = trainer_ids;
    }

    state.db.put(&class).await?;
    tracing::info!(class_id = %class.id, updated_by = %user.user_id, "Class updated");
    Ok(Json(class))
}

async fn delete_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    validate_id(&id, "class")?;
    state.db.delete::<GymClass>(&id).await?;
    tracing::info!(class_id = %id, deleted_by = %user.user_id, "Class deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Bookings ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BookingRequest {
    /// Required for front-desk bookings; clients book themselves
    pub client_id: Option<String>,
}

/// Resolve whose booking this is.
///
/// Clients act for themselves; admins and receptionists must name a client.
fn booking_client(user: &AuthUser, requested: Option<String>) -> Result<String> {
    match user.role {
        Role::Client => match requested {
            Some(id) if id != user.user_id => Err(AppError::Forbidden(
                "Clients can only book for themselves".to_string(),
            )),
            _ => Ok(user.user_id.clone()),
        },
        Role::Admin | Role::Receptionist => {
            let id = requested.ok_or_else(|| {
                AppError::BadRequest("client_id is required".to_string())
            })?;
            validate_id(&id, "client")?;
            Ok(id)
        }
        Role::Trainer => Err(AppError::Forbidden(
            "Trainers cannot manage bookings".to_string(),
        )),
    }
}

async fn book_class(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<BookingRequest>>,
) -> Result<Json<GymClass>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let client_id = booking_client(&user, body.client_id)?;
    validate_id(&id, "class")?;

    let client: User = state.db.require(&client_id, "Client").await?;
    let today = today();
    booking::check_client_can_book(&client, today)?;

    let booked_id = client_id.clone();
    let class: GymClass = state
        .db
        .modify(&id, "Class", move |class: &mut GymClass| {
            booking::book(class, &booked_id, today)
        })
        .await?;

    tracing::info!(
        class_id = %class.id,
        client_id = %client_id,
        booked = class.booked_client_ids.len(),
        capacity = class.capacity,
        "Class booked"
    );
    Ok(Json(class))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Option<Json<BookingRequest>>,
) -> Result<Json<GymClass>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let client_id = booking_client(&user, body.client_id)?;
    validate_id(&id, "class")?;

    let cancelled_id = client_id.clone();
    let class: GymClass = state
        .db
        .modify(&id, "Class", move |class: &mut GymClass| {
            booking::cancel(class, &cancelled_id)
        })
        .await?;

    tracing::info!(class_id = %class.id, client_id = %client_id, "Booking cancelled");
    Ok(Json(class))
}

// ─── Calendar ────────────────────────────────────────────────

async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<CalendarMonth>> {
    let month = params.resolve(today())?;
    let classes: Vec<GymClass> = state.db.list().await?;
    Ok(Json(build_month(month, &classes)))
}
