// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym-Desk API Server
//!
//! Serves the gym management API for all four roles.

use gym_desk::{
    config::Config, db::FirestoreDb, routes::auth::ensure_bootstrap_admin,
    services::GenerativeService, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Gym-Desk API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    if let Some((email, password)) = &config.bootstrap_admin {
        ensure_bootstrap_admin(&db, email, password).await?;
    }

    let generative = GenerativeService::from_config(&config);
    if generative.is_enabled() {
        tracing::info!(model = %config.gemini_model, "Generative API enabled");
    } else {
        tracing::warn!("GEMINI_API_KEY not set, AI endpoints disabled");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        generative,
    });

    // Build router
    let app = gym_desk::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gym_desk=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
