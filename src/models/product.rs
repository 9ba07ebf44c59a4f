// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point-of-sale catalogue and sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finance::PaymentMethod;

/// Item sold at the front desk (`products/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: u32,
    /// Inactive products stay in history but cannot be sold
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    /// Product name at time of sale
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Completed checkout (`sales/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub lines: Vec<SaleLine>,
    pub total_cents: i64,
    pub client_id: Option<String>,
    pub cashier_id: String,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}
