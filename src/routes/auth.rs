// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password session routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{Role, User, UserProfile};
use crate::services::password::{hash_password_blocking, validate_password_strength, verify_login};
use crate::time_utils::today;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Exchange credentials for a session token.
///
/// The token is returned in the body and also set as an http-only cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    let found = state.db.find_user_by_email(&email).await?;
    let stored = found.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_login(body.password, stored).await?;

    let user = found.filter(|_| verified).ok_or_else(|| {
        tracing::info!("Rejected login attempt");
        AppError::InvalidCredentials
    })?;

    let token = create_jwt(&user.id, user.role, &state.config.jwt_signing_key)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

    let jar = jar.add(session_cookie(&state.config.frontend_url, token.clone()));
    Ok((
        jar,
        Json(LoginResponse {
            token,
            user: UserProfile::from_user(user, today()),
        }),
    ))
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = session_cookie(&state.config.frontend_url, String::new());
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

fn session_cookie(frontend_url: &str, value: String) -> Cookie<'static> {
    let local = frontend_url.starts_with("http://localhost")
        || frontend_url.starts_with("http://127.0.0.1");

    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(!local)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Create the configured admin account if no user has that email yet.
pub async fn ensure_bootstrap_admin(db: &FirestoreDb, email: &str, password: &str) -> Result<()> {
    let email = email.trim().to_lowercase();
    if db.find_user_by_email(&email).await?.is_some() {
        tracing::debug!("Bootstrap admin already exists");
        return Ok(());
    }

    validate_password_strength(password)?;
    let admin = User {
        id: super::new_id(),
        email,
        name: "Administrator".to_string(),
        phone: None,
        role: Role::Admin,
        password_hash: hash_password_blocking(password.to_string()).await?,
        membership: None,
        trainer_id: None,
        created_at: chrono::Utc::now(),
    };
    db.put(&admin).await?;

    tracing::info!(user_id = %admin.id, "Bootstrap admin created");
    Ok(())
}
