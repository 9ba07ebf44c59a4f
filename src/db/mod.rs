// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{Document, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHECK_INS: &str = "check_ins";
    pub const CLASSES: &str = "classes";
    pub const PRODUCTS: &str = "products";
    pub const SALES: &str = "sales";
    pub const PAYMENTS: &str = "payments";
    pub const EXPENSES: &str = "expenses";
    /// Keyed by url-encoded category name
    pub const BUDGETS: &str = "budgets";
    pub const MESSAGES: &str = "messages";
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const CHALLENGES: &str = "challenges";
    pub const EQUIPMENT: &str = "equipment";
    pub const TASKS: &str = "tasks";
}
