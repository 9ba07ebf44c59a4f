// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::{Role, User};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "gym_token";

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role at the time of login, for clients. Requests are authorized
    /// against the stored user instead.
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    /// Fail with `Forbidden` unless the caller has one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "This action is not available to the {} role",
                self.role.as_str()
            )))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin, Role::Trainer, Role::Receptionist])
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Middleware that requires valid JWT authentication.
///
/// The token must name a user that still exists; the role attached to the
/// request is the one stored on that user now.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) => t.to_string(),
            None => return Err(AppError::Unauthorized),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(&token, &key, &validation)
        .map_err(|_| AppError::InvalidToken)?
        .claims;

    if claims.sub.is_empty() {
        return Err(AppError::InvalidToken);
    }

    let user: User = state.db.get(&claims.sub).await?.ok_or_else(|| {
        tracing::info!(user_id = %claims.sub, "Session for a deleted user rejected");
        AppError::InvalidToken
    })?;
    if user.role != claims.role {
        tracing::debug!(
            user_id = %user.id,
            token_role = claims.role.as_str(),
            role = user.role.as_str(),
            "Role changed since login"
        );
    }

    let auth_user = AuthUser {
        user_id: user.id,
        role: user.role,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
