// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_AI_COOLDOWN_SECS: u64 = 10;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Generative model name
    pub gemini_model: String,
    /// Generative API base URL
    pub gemini_base_url: String,
    /// Minimum seconds between AI requests from the same user
    pub ai_cooldown_secs: u64,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Generative API key. AI endpoints are disabled when absent.
    pub gemini_api_key: Option<String>,
    /// Admin account created at startup if missing: (email, password)
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            ai_cooldown_secs: 0,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            gemini_api_key: None,
            bootstrap_admin: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() => {
                Some((email.trim().to_lowercase(), password))
            }
            _ => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            ai_cooldown_secs: env::var("AI_COOLDOWN_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_AI_COOLDOWN_SECS),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            bootstrap_admin,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
