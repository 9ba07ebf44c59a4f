// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment inventory and staff task board.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{EquipmentItem, EquipmentStatus, Role, StaffTask, TaskStatus, User};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id};

const DEFAULT_MAINTENANCE_INTERVAL_DAYS: u32 = 90;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/equipment", get(list_equipment).post(create_equipment))
        .route(
            "/api/equipment/{id}",
            put(update_equipment).delete(delete_equipment),
        )
        .route("/api/equipment/{id}/status", post(report_status))
        .route("/api/equipment/{id}/maintenance", post(record_maintenance))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", delete(delete_task))
        .route("/api/tasks/{id}/status", put(update_task_status))
}

// ─── Equipment ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct EquipmentView {
    #[serde(flatten)]
    pub item: EquipmentItem,
    pub next_maintenance: Option<NaiveDate>,
    pub maintenance_due: bool,
}

impl EquipmentView {
    fn new(item: EquipmentItem, today: NaiveDate) -> Self {
        Self {
            next_maintenance: item.next_maintenance(),
            maintenance_due: item.maintenance_due(today),
            item,
        }
    }
}

async fn load_equipment(state: &AppState, id: &str) -> Result<EquipmentItem> {
    validate_id(id, "equipment")?;
    state.db.require(id, "Equipment").await
}

/// All equipment, items needing attention first.
async fn list_equipment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<EquipmentView>>> {
    user.require_staff()?;
    let today = today();

    let mut items: Vec<EquipmentItem> = state.db.list().await?;
    items.sort_by(|a, b| {
        b.needs_attention(today)
            .cmp(&a.needs_attention(today))
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(Json(
        items
            .into_iter()
            .map(|i| EquipmentView::new(i, today))
            .collect(),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEquipmentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    pub last_maintenance: Option<NaiveDate>,
    #[validate(range(min = 1, max = 3650))]
    pub maintenance_interval_days: Option<u32>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub notes: String,
}

async fn create_equipment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateEquipmentRequest>,
) -> Result<(StatusCode, Json<EquipmentView>)> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;

    let item = EquipmentItem {
        id: new_id(),
        name: body.name.trim().to_string(),
        category: body.category.trim().to_lowercase(),
        status: EquipmentStatus::Operational,
        last_maintenance: body.last_maintenance,
        maintenance_interval_days: body
            .maintenance_interval_days
            .unwrap_or(DEFAULT_MAINTENANCE_INTERVAL_DAYS),
        notes: body.notes,
    };
    state.db.put(&item).await?;

    tracing::info!(equipment_id = %item.id, "Equipment added");
    Ok((StatusCode::CREATED, Json(EquipmentView::new(item, today()))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEquipmentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    pub status: Option<EquipmentStatus>,
    #[validate(range(min = 1, max = 3650))]
    pub maintenance_interval_days: Option<u32>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

async fn update_equipment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEquipmentRequest>,
) -> Result<Json<EquipmentView>> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;
    let mut item = load_equipment(&state, &id).await?;

    if let Some(name) = body.name {
        item.name = name.trim().to_string();
    }
    if let Some(category) = body.category {
        item.category = category.trim().to_lowercase();
    }
    if let Some(status) = body.status {
        item.status = status;
    }
    if let Some(interval) = body.maintenance_interval_days {
        item.maintenance_interval_days = interval;
    }
    if let Some(notes) = body.notes {
        item.notes = notes;
    }
    state.db.put(&item).await?;

    tracing::info!(equipment_id = %item.id, "Equipment updated");
    Ok(Json(EquipmentView::new(item, today())))
}

async fn delete_equipment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    validate_id(&id, "equipment")?;
    state.db.delete::<EquipmentItem>(&id).await?;
    tracing::info!(equipment_id = %id, "Equipment removed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusReport {
    pub status: EquipmentStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Any staff member can flag equipment from the floor.
async fn report_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<StatusReport>,
) -> Result<Json<EquipmentView>> {
    user.require_staff()?;
    body.validate()?;
    let mut item = load_equipment(&state, &id).await?;

    item.status = body.status;
    if let Some(notes) = body.notes {
        item.notes = notes;
    }
    state.db.put(&item).await?;

    tracing::info!(
        equipment_id = %item.id,
        status = ?item.status,
        reported_by = %user.user_id,
        "Equipment status reported"
    );
    Ok(Json(EquipmentView::new(item, today())))
}

async fn record_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<EquipmentView>> {
    user.require_role(&[Role::Admin, Role::Trainer])?;
    let mut item = load_equipment(&state, &id).await?;
    let today = today();

    item.last_maintenance = Some(today);
    item.status = EquipmentStatus::Operational;
    state.db.put(&item).await?;

    tracing::info!(equipment_id = %item.id, serviced_by = %user.user_id, "Maintenance recorded");
    Ok(Json(EquipmentView::new(item, today)))
}

// ─── Staff Tasks ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    pub assignee_id: String,
    pub due_date: Option<NaiveDate>,
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<StaffTask>)> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;
    validate_id(&body.assignee_id, "assignee")?;

    let assignee: User = state.db.require(&body.assignee_id, "Assignee").await?;
    if !assignee.role.is_staff() {
        return Err(AppError::BadRequest(
            "Tasks can only be assigned to staff".to_string(),
        ));
    }

    let task = StaffTask {
        id: new_id(),
        title: body.title.trim().to_string(),
        description: body.description,
        assignee_id: assignee.id,
        created_by: user.user_id.clone(),
        due_date: body.due_date,
        status: TaskStatus::Todo,
        created_at: chrono::Utc::now(),
    };
    state.db.put(&task).await?;

    tracing::info!(task_id = %task.id, assignee_id = %task.assignee_id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Open tasks first, by due date (undated last), then newest.
fn sort_tasks(tasks: &mut [StaffTask]) {
    tasks.sort_by(|a, b| {
        b.is_open()
            .cmp(&a.is_open())
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<StaffTask>>> {
    user.require_staff()?;
    let mut tasks: Vec<StaffTask> = if user.is(Role::Admin) {
        state.db.list().await?
    } else {
        state.db.list_where("assignee_id", &user.user_id).await?
    };
    sort_tasks(&mut tasks);
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}

async fn update_task_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<TaskStatusRequest>,
) -> Result<Json<StaffTask>> {
    user.require_staff()?;
    validate_id(&id, "task")?;

    let mut task: StaffTask = state.db.require(&id, "Task").await?;
    if !user.is(Role::Admin) && task.assignee_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the assignee can update this task".to_string(),
        ));
    }
    task.status = body.status;
    state.db.put(&task).await?;

    tracing::info!(task_id = %task.id, status = ?task.status, "Task status updated");
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    validate_id(&id, "task")?;
    state.db.delete::<StaffTask>(&id).await?;
    tracing::info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
