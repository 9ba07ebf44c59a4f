// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use gym_desk::config::Config;
use gym_desk::db::FirestoreDb;
use gym_desk::middleware::auth::create_jwt;
use gym_desk::models::{Role, User};
use gym_desk::routes::create_router;
use gym_desk::services::{GenerativeClient, GenerativeService};
use gym_desk::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_generative(GenerativeService::new(None, Duration::ZERO))
}

/// Create a test app whose generative client talks to `base_url`.
#[allow(dead_code)]
pub fn create_test_app_with_ai(base_url: &str, cooldown: Duration) -> (axum::Router, Arc<AppState>) {
    let client = GenerativeClient::new(base_url, "test-model", "test-key");
    create_test_app_with_generative(GenerativeService::new(Some(client), cooldown))
}

fn create_test_app_with_generative(generative: GenerativeService) -> (axum::Router, Arc<AppState>) {
    let db = test_db_offline();
    for role in [Role::Admin, Role::Trainer, Role::Receptionist, Role::Client] {
        db.seed(&test_user(&test_user_id(role), role))
            .expect("Failed to seed test user");
    }

    let state = Arc::new(AppState {
        config: Config::test_default(),
        db,
        generative,
    });

    (create_router(state.clone()), state)
}

/// Id of the seeded user that `send_as` signs in as for `role`.
#[allow(dead_code)]
pub fn test_user_id(role: Role) -> String {
    format!("test-{}", role.as_str())
}

#[allow(dead_code)]
pub fn test_user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: format!("Test {}", role.as_str()),
        phone: None,
        role,
        password_hash: String::new(),
        membership: None,
        trainer_id: None,
        created_at: chrono::Utc::now(),
    }
}

/// Session token for a user with the given role.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, role: Role, signing_key: &[u8]) -> String {
    create_jwt(user_id, role, signing_key).expect("Failed to create JWT")
}

/// Send a request as `role`, with an optional JSON body.
#[allow(dead_code)]
pub async fn send_as(
    app: axum::Router,
    state: &AppState,
    role: Role,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let token = create_test_jwt(&test_user_id(role), role, &state.config.jwt_signing_key);
    send_with_token(app, &token, method, uri, body).await
}

/// Send a request with a bearer token, with an optional JSON body.
#[allow(dead_code)]
pub async fn send_with_token(
    app: axum::Router,
    token: &str,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Status of a request sent as `role`.
#[allow(dead_code)]
pub async fn status_as(
    role: Role,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> StatusCode {
    let (app, state) = create_test_app();
    send_as(app, &state, role, method, uri, body).await.status()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
