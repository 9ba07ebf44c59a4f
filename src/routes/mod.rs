// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod ai;
pub mod auth;
pub mod challenges;
pub mod classes;
pub mod dashboard;
pub mod finance;
pub mod messages;
pub mod operations;
pub mod pos;
pub mod users;

use crate::error::{AppError, Result};
use crate::middleware::auth::require_auth;
use crate::time_utils::YearMonth;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted document id in a path or body.
const MAX_ID_LEN: usize = 128;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(classes::routes())
        .merge(pos::routes())
        .merge(messages::routes())
        .merge(finance::routes())
        .merge(challenges::routes())
        .merge(operations::routes())
        .merge(ai::routes())
        .merge(dashboard::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Shared request helpers ──────────────────────────────────

/// Optional `?month=YYYY-MM`; defaults to the current month.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

impl MonthQuery {
    pub fn resolve(&self, today: NaiveDate) -> Result<YearMonth> {
        match self.month.as_deref() {
            None => Ok(YearMonth::of(today)),
            Some(raw) => YearMonth::parse(raw).ok_or_else(|| {
                AppError::BadRequest("Invalid 'month' parameter: expected YYYY-MM".to_string())
            }),
        }
    }
}

/// Reject ids that cannot name a Firestore document.
pub fn validate_id(id: &str, what: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN || id.contains('/') || id.starts_with("__") {
        return Err(AppError::BadRequest(format!("Invalid {} id", what)));
    }
    Ok(())
}

/// Fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
