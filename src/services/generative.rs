// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generative AI client for drafting workout plans, announcements and class
//! descriptions.
//!
//! Talks to the Gemini `generateContent` REST endpoint. Calls are made once;
//! there is no retry or backoff. Any failure surfaces as
//! [`AppError::Generative`], which the API reports with a generic message.

use crate::config::Config;
use crate::error::AppError;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Low-level Gemini API client.
#[derive(Clone)]
pub struct GenerativeClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerativeClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Generate free-form text for a prompt.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AppError> {
        self.generate(prompt, None).await
    }

    /// Generate a JSON document and parse it into `T`.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, AppError> {
        let text = self.generate(prompt, Some("application/json")).await?;
        parse_json_reply(&text)
    }

    async fn generate(
        &self,
        prompt: &str,
        response_mime_type: Option<&'static str>,
    ) -> Result<String, AppError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                response_mime_type,
            },
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generative(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generative(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generative(format!("JSON parse error: {}", e)))?;

        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, AppError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::Generative("Empty response".to_string()));
    }
    Ok(text)
}

/// Parse a JSON reply, tolerating a surrounding markdown code fence.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, AppError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::Generative(format!("Malformed JSON reply: {}", e)))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

// ─────────────────────────────────────────────────────────────────────────────
// Content types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    /// Free text, e.g. "8-10" or "30s"
    pub reps: String,
    #[serde(default)]
    pub rest_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDay {
    pub day: String,
    pub focus: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub title: String,
    pub days: Vec<WorkoutDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub body: String,
}

/// Inputs for a workout plan.
#[derive(Debug, Clone)]
pub struct WorkoutRequest<'a> {
    pub client_name: &'a str,
    pub goal: &'a str,
    pub days_per_week: u32,
    pub experience: &'a str,
}

fn workout_prompt(req: &WorkoutRequest<'_>) -> String {
    format!(
        "You are an experienced personal trainer. Create a weekly workout plan for {name}.\n\
         Goal: {goal}\n\
         Experience level: {experience}\n\
         Training days per week: {days}\n\n\
         Respond with JSON only, matching this shape:\n\
         {{\"title\": string, \"days\": [{{\"day\": string, \"focus\": string, \
         \"exercises\": [{{\"name\": string, \"sets\": number, \"reps\": string, \
         \"rest_seconds\": number}}]}}]}}\n\
         Include exactly {days} entries in \"days\".",
        name = req.client_name,
        goal = req.goal,
        experience = req.experience,
        days = req.days_per_week,
    )
}

fn announcement_prompt(topic: &str, tone: &str) -> String {
    format!(
        "Write a short announcement for the members of a gym.\n\
         Topic: {topic}\n\
         Tone: {tone}\n\
         Keep the body under 120 words. Respond with JSON only: \
         {{\"title\": string, \"body\": string}}"
    )
}

fn class_description_prompt(name: &str, focus: Option<&str>) -> String {
    let focus = focus
        .map(|f| format!(" The class focuses on {}.", f))
        .unwrap_or_default();
    format!(
        "Write an engaging two or three sentence description for a group fitness \
         class called \"{name}\".{focus} Reply with the description text only."
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// GenerativeService - per-user cooldown on top of the client
// ─────────────────────────────────────────────────────────────────────────────

/// Last request time per user.
pub type CooldownMap = Arc<DashMap<String, Instant>>;

/// High-level content generation with a per-user cooldown.
#[derive(Clone)]
pub struct GenerativeService {
    /// `None` when no API key is configured
    client: Option<GenerativeClient>,
    cooldown: Duration,
    last_request: CooldownMap,
}

impl GenerativeService {
    pub fn new(client: Option<GenerativeClient>, cooldown: Duration) -> Self {
        Self {
            client,
            cooldown,
            last_request: Arc::new(DashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = config.gemini_api_key.as_deref().map(|key| {
            GenerativeClient::new(&config.gemini_base_url, &config.gemini_model, key)
        });
        Self::new(client, Duration::from_secs(config.ai_cooldown_secs))
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Check availability and the caller's cooldown, then claim the slot.
    fn acquire(&self, user_id: &str) -> Result<&GenerativeClient, AppError> {
        let client = self.client.as_ref().ok_or(AppError::AiUnavailable)?;

        let now = Instant::now();
        match self.last_request.entry(user_id.to_string()) {
            Entry::Occupied(mut last) => {
                if now.duration_since(*last.get()) < self.cooldown {
                    tracing::debug!(user_id, "AI request inside cooldown window");
                    return Err(AppError::RateLimited);
                }
                last.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }

        Ok(client)
    }

    pub async fn workout_plan(
        &self,
        user_id: &str,
        request: &WorkoutRequest<'_>,
    ) -> Result<WorkoutPlan, AppError> {
        let client = self.acquire(user_id)?;
        let plan: WorkoutPlan = client.generate_json(&workout_prompt(request)).await?;
        if plan.days.is_empty() {
            return Err(AppError::Generative("Workout plan has no days".to_string()));
        }
        tracing::info!(user_id, days = plan.days.len(), "Generated workout plan");
        Ok(plan)
    }

    pub async fn announcement(
        &self,
        user_id: &str,
        topic: &str,
        tone: &str,
    ) -> Result<AnnouncementDraft, AppError> {
        let client = self.acquire(user_id)?;
        let draft: AnnouncementDraft = client
            .generate_json(&announcement_prompt(topic, tone))
            .await?;
        tracing::info!(user_id, "Generated announcement draft");
        Ok(draft)
    }

    pub async fn class_description(
        &self,
        user_id: &str,
        name: &str,
        focus: Option<&str>,
    ) -> Result<String, AppError> {
        let client = self.acquire(user_id)?;
        let text = client
            .generate_text(&class_description_prompt(name, focus))
            .await?;
        tracing::info!(user_id, "Generated class description");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```\n{\"a\":1}```  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_json_reply() {
        let draft: AnnouncementDraft =
            parse_json_reply("```json\n{\"title\":\"Pool closed\",\"body\":\"Sorry!\"}\n```")
                .unwrap();
        assert_eq!(draft.title, "Pool closed");

        let err = parse_json_reply::<AnnouncementDraft>("not json").unwrap_err();
        assert!(matches!(err, AppError::Generative(_)));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "gym!"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello, gym!");

        let empty: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            extract_text(empty).unwrap_err(),
            AppError::Generative(_)
        ));
    }

    #[test]
    fn test_request_wire_format() {
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                response_mime_type: Some("application/json"),
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "contents": [{"parts": [{"text": "hi"}]}],
                "generationConfig": {"temperature": 0.5, "responseMimeType": "application/json"}
            })
        );
    }

    #[test]
    fn test_disabled_service_reports_unavailable() {
        let service = GenerativeService::new(None, Duration::from_secs(10));
        assert!(!service.is_enabled());
        assert!(matches!(
            service.acquire("u1").err(),
            Some(AppError::AiUnavailable)
        ));
    }

    #[test]
    fn test_cooldown_blocks_second_request() {
        let client = GenerativeClient::new("http://127.0.0.1:9", "test-model", "key");
        let service = GenerativeService::new(Some(client), Duration::from_secs(60));

        assert!(service.acquire("u1").is_ok());
        assert!(matches!(
            service.acquire("u1").err(),
            Some(AppError::RateLimited)
        ));
        // Other users are unaffected
        assert!(service.acquire("u2").is_ok());
    }

    #[test]
    fn test_prompts_mention_inputs() {
        let prompt = workout_prompt(&WorkoutRequest {
            client_name: "Dana",
            goal: "build strength",
            days_per_week: 3,
            experience: "beginner",
        });
        assert!(prompt.contains("Dana"));
        assert!(prompt.contains("exactly 3 entries"));
        assert!(class_description_prompt("Spin", Some("endurance")).contains("endurance"));
    }
}
