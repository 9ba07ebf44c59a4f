// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payments, expenses, budgets and the finance reports.

use crate::db::firestore::budget_doc_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Budget, Expense, Payment, PaymentKind, PaymentMethod, Role, User};
use crate::services::finance::{build_ledger, project_budgets, BudgetReport, Ledger};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id, MonthQuery};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/payments", get(list_payments).post(record_payment))
        .route("/api/me/payments", get(my_payments))
        .route("/api/expenses", get(list_expenses).post(record_expense))
        .route("/api/expenses/{id}", delete(delete_expense))
        .route("/api/budgets", get(list_budgets))
        .route(
            "/api/budgets/{category}",
            put(set_budget).delete(delete_budget),
        )
        .route("/api/finance/ledger", get(get_ledger))
        .route("/api/finance/budget", get(get_budget_report))
}

/// Categories double as budget document ids, so names Firestore reserves
/// (`.`, `..`, `__name__`) are refused.
fn normalize_category(raw: &str) -> Result<String> {
    let category = raw.trim().to_lowercase();
    if category.is_empty() || category.chars().count() > 50 {
        return Err(AppError::BadRequest(
            "Category must be 1-50 characters".to_string(),
        ));
    }
    let reserved = category == "."
        || category == ".."
        || (category.len() >= 4 && category.starts_with("__") && category.ends_with("__"));
    if reserved {
        return Err(AppError::BadRequest(format!(
            "'{}' is not a valid category name",
            category
        )));
    }
    Ok(category)
}

// ─── Payments ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub user_id: Option<String>,
    #[validate(range(min = 1, max = 1000000000))]
    pub amount_cents: i64,
    pub method: PaymentMethod,
    #[serde(default = "default_kind")]
    pub kind: PaymentKind,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub description: String,
    pub date: Option<NaiveDate>,
}

fn default_kind() -> PaymentKind {
    PaymentKind::Other
}

async fn record_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    body.validate()?;
    if let Some(payer) = &body.user_id {
        validate_id(payer, "user")?;
        let _: User = state.db.require(payer, "User").await?;
    }

    let payment = Payment {
        id: new_id(),
        user_id: body.user_id,
        amount_cents: body.amount_cents,
        method: body.method,
        kind: body.kind,
        description: body.description.trim().to_string(),
        date: body.date.unwrap_or_else(today),
        recorded_by: user.user_id.clone(),
    };
    state.db.put(&payment).await?;

    tracing::info!(
        payment_id = %payment.id,
        amount_cents = payment.amount_cents,
        kind = payment.kind.as_str(),
        "Payment recorded"
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

fn newest_first(payments: &mut [Payment]) {
    payments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}

async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<Payment>>> {
    user.require_role(&[Role::Admin, Role::Receptionist])?;
    let month = params.resolve(today())?;

    let mut payments: Vec<Payment> = state.db.list_in_month("date", month).await?;
    newest_first(&mut payments);
    Ok(Json(payments))
}

async fn my_payments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Payment>>> {
    let mut payments: Vec<Payment> = state.db.list_where("user_id", &user.user_id).await?;
    newest_first(&mut payments);
    Ok(Json(payments))
}

// ─── Expenses ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RecordExpenseRequest {
    pub category: String,
    #[validate(range(min = 1, max = 1000000000))]
    pub amount_cents: i64,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub description: String,
    pub date: Option<NaiveDate>,
}

async fn record_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RecordExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>)> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;

    let expense = Expense {
        id: new_id(),
        category: normalize_category(&body.category)?,
        amount_cents: body.amount_cents,
        description: body.description.trim().to_string(),
        date: body.date.unwrap_or_else(today),
        recorded_by: user.user_id.clone(),
    };
    state.db.put(&expense).await?;

    tracing::info!(
        expense_id = %expense.id,
        category = %expense.category,
        amount_cents = expense.amount_cents,
        "Expense recorded"
    );
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<Expense>>> {
    user.require_role(&[Role::Admin])?;
    let month = params.resolve(today())?;

    let mut expenses: Vec<Expense> = state.db.list_in_month("date", month).await?;
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(expenses))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    validate_id(&id, "expense")?;
    state.db.delete::<Expense>(&id).await?;
    tracing::info!(expense_id = %id, "Expense deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Budgets ─────────────────────────────────────────────────

async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Budget>>> {
    user.require_role(&[Role::Admin])?;
    let mut budgets: Vec<Budget> = state.db.list().await?;
    budgets.sort_by(|a, b| a.category.cmp(&b.category));
    Ok(Json(budgets))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetBudgetRequest {
    #[validate(range(min = 0, max = 1000000000))]
    pub monthly_limit_cents: i64,
}

async fn set_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(category): Path<String>,
    Json(body): Json<SetBudgetRequest>,
) -> Result<Json<Budget>> {
    user.require_role(&[Role::Admin])?;
    body.validate()?;

    let budget = Budget {
        category: normalize_category(&category)?,
        monthly_limit_cents: body.monthly_limit_cents,
    };
    state.db.put(&budget).await?;

    tracing::info!(
        category = %budget.category,
        monthly_limit_cents = budget.monthly_limit_cents,
        "Budget set"
    );
    Ok(Json(budget))
}

async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(category): Path<String>,
) -> Result<StatusCode> {
    user.require_role(&[Role::Admin])?;
    let category = normalize_category(&category)?;
    state.db.delete::<Budget>(&budget_doc_id(&category)).await?;
    tracing::info!(category = %category, "Budget removed");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LedgerResponse {
    pub month: String,
    #[serde(flatten)]
    pub ledger: Ledger,
}

/// Payments and expenses for the month merged into one running ledger.
async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<LedgerResponse>> {
    user.require_role(&[Role::Admin])?;
    let month = params.resolve(today())?;

    let (payments, expenses) = tokio::try_join!(
        state.db.list_in_month::<Payment>("date", month),
        state.db.list_in_month::<Expense>("date", month),
    )?;

    Ok(Json(LedgerResponse {
        month: month.to_string(),
        ledger: build_ledger(&payments, &expenses),
    }))
}

async fn get_budget_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<BudgetReport>> {
    user.require_role(&[Role::Admin])?;
    let today = today();
    let month = params.resolve(today)?;

    let (budgets, expenses) = tokio::try_join!(
        state.db.list::<Budget>(),
        state.db.list_in_month::<Expense>("date", month),
    )?;

    Ok(Json(project_budgets(month, today, &budgets, &expenses)))
}
