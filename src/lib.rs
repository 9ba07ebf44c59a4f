// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym-Desk: backend for a multi-role gym management app
//!
//! Admins, trainers, receptionists and clients share one JSON API covering
//! memberships, class scheduling, point-of-sale, messaging, finance and
//! AI-assisted content generation.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::GenerativeService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub generative: GenerativeService,
}
