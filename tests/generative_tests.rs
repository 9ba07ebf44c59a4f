// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI drafting tests against a local stand-in for the generative API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json, Router,
};
use gym_desk::models::Role;
use gym_desk::services::GenerativeClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;

#[derive(Clone)]
struct MockApi {
    status: StatusCode,
    reply: Value,
    requests: Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>,
}

async fn mock_generate(
    State(api): State<MockApi>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    api.requests.lock().unwrap().push((query, body));
    (api.status, Json(api.reply.clone()))
}

/// Serve `reply` for every request; returns the base URL and a request log.
async fn spawn_mock(status: StatusCode, reply: Value) -> (String, MockApi) {
    let api = MockApi {
        status,
        reply,
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .fallback(mock_generate)
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), api)
}

fn text_reply(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
}

#[tokio::test]
async fn test_client_parses_fenced_json() {
    let (base_url, api) = spawn_mock(
        StatusCode::OK,
        text_reply("```json\n{\"title\": \"Pool closed\", \"body\": \"Back Monday.\"}\n```"),
    )
    .await;
    let client = GenerativeClient::new(&base_url, "test-model", "test-key");

    let draft: gym_desk::services::generative::AnnouncementDraft =
        client.generate_json("prompt").await.unwrap();
    assert_eq!(draft.title, "Pool closed");
    assert_eq!(draft.body, "Back Monday.");

    let requests = api.requests.lock().unwrap();
    let (query, body) = &requests[0];
    assert_eq!(query.get("key").map(String::as_str), Some("test-key"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
}

#[tokio::test]
async fn test_announcement_route_end_to_end() {
    let (base_url, api) = spawn_mock(
        StatusCode::OK,
        text_reply("{\"title\": \"New sauna\", \"body\": \"Opening next week.\"}"),
    )
    .await;
    let (app, state) = common::create_test_app_with_ai(&base_url, Duration::ZERO);

    let response = common::send_as(
        app,
        &state,
        Role::Admin,
        "POST",
        "/api/ai/announcement",
        Some(json!({"topic": "New sauna", "tone": "  "})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["title"], "New sauna");
    assert_eq!(body["body"], "Opening next week.");

    // Blank tone falls back to the default
    let requests = api.requests.lock().unwrap();
    let prompt = requests[0].1["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains("New sauna"));
    assert!(prompt.contains("friendly and motivating"));
}

#[tokio::test]
async fn test_class_description_is_plain_text() {
    let (base_url, api) = spawn_mock(
        StatusCode::OK,
        text_reply("  High-energy intervals on the bike.\n"),
    )
    .await;
    let (app, state) = common::create_test_app_with_ai(&base_url, Duration::ZERO);

    let response = common::send_as(
        app,
        &state,
        Role::Trainer,
        "POST",
        "/api/ai/class-description",
        Some(json!({"name": "Spin", "focus": "endurance"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["description"], "High-energy intervals on the bike.");

    let requests = api.requests.lock().unwrap();
    assert!(requests[0].1["generationConfig"]
        .get("responseMimeType")
        .is_none());
}

#[tokio::test]
async fn test_upstream_failure_returns_fallback() {
    let (base_url, _api) = spawn_mock(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {"message": "quota exceeded for project 1234"}}),
    )
    .await;
    let (app, state) = common::create_test_app_with_ai(&base_url, Duration::ZERO);

    let response = common::send_as(
        app,
        &state,
        Role::Admin,
        "POST",
        "/api/ai/announcement",
        Some(json!({"topic": "Holiday hours"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "ai_error");
    assert!(!body.to_string().contains("quota"));
}

#[tokio::test]
async fn test_malformed_reply_is_gateway_error() {
    let (base_url, _api) = spawn_mock(StatusCode::OK, text_reply("Sure! Here is a draft.")).await;
    let (app, state) = common::create_test_app_with_ai(&base_url, Duration::ZERO);

    let response = common::send_as(
        app,
        &state,
        Role::Admin,
        "POST",
        "/api/ai/announcement",
        Some(json!({"topic": "Holiday hours"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_cooldown_limits_repeat_requests() {
    let (base_url, api) = spawn_mock(StatusCode::OK, text_reply("A fun class.")).await;
    let (app, state) = common::create_test_app_with_ai(&base_url, Duration::from_secs(60));
    let body = json!({"name": "Spin"});

    let first = common::send_as(
        app.clone(),
        &state,
        Role::Admin,
        "POST",
        "/api/ai/class-description",
        Some(body.clone()),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = common::send_as(
        app,
        &state,
        Role::Admin,
        "POST",
        "/api/ai/class-description",
        Some(body),
    )
    .await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // The limited request never reached the upstream API
    assert_eq!(api.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_trainer_plans_for_any_client() {
    let (base_url, api) = spawn_mock(
        StatusCode::OK,
        text_reply(
            r#"{"title": "Strength base", "days": [{"day": "Monday", "focus": "Legs",
                "exercises": [{"name": "Squat", "sets": 5, "reps": "5"}]}]}"#,
        ),
    )
    .await;
    let (app, state) = common::create_test_app_with_ai(&base_url, Duration::ZERO);

    // Assigned to a different trainer
    let mut client = common::test_user("someone-elses-client", Role::Client);
    client.trainer_id = Some("other-trainer".to_string());
    state.db.seed(&client).unwrap();

    let response = common::send_as(
        app,
        &state,
        Role::Trainer,
        "POST",
        "/api/ai/workout-plan",
        Some(json!({
            "client_id": "someone-elses-client",
            "goal": "strength",
            "days_per_week": 3,
            "experience": "beginner",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["title"], "Strength base");
    assert_eq!(api.requests.lock().unwrap().len(), 1);
}
