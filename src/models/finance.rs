// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment, expense and budget records.
//!
//! Money is stored as integer cents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// What a payment was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Membership,
    Retail,
    PersonalTraining,
    Other,
}

impl PaymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentKind::Membership => "membership",
            PaymentKind::Retail => "retail",
            PaymentKind::PersonalTraining => "personal_training",
            PaymentKind::Other => "other",
        }
    }
}

/// Income record (`payments/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Paying member, if known
    pub user_id: Option<String>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub kind: PaymentKind,
    pub description: String,
    pub date: NaiveDate,
    pub recorded_by: String,
}

/// Outflow record (`expenses/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub category: String,
    pub amount_cents: i64,
    pub description: String,
    pub date: NaiveDate,
    pub recorded_by: String,
}

/// Monthly spending limit for an expense category (`budgets/{category}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub monthly_limit_cents: i64,
}
