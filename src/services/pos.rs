// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout pricing and stock checks for the point-of-sale.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{Product, SaleLine};

/// Largest quantity of one product a single sale may carry.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// Requested quantity of one product.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Priced cart plus the stock levels to write back.
#[derive(Debug)]
pub struct PricedCart {
    pub lines: Vec<SaleLine>,
    pub total_cents: i64,
    pub updated_products: Vec<Product>,
}

/// Merge duplicate lines while keeping first-seen order.
pub fn merge_cart(items: &[CartItem]) -> Vec<CartItem> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => merged.push(item.clone()),
        }
    }
    merged
}

/// Checks that need no product data: a non-empty cart with quantities in
/// `1..=MAX_LINE_QUANTITY`.
pub fn validate_cart(items: &[CartItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }
    if let Some(item) = items.iter().find(|i| i.quantity == 0) {
        return Err(AppError::BadRequest(format!(
            "Quantity for product {} must be at least 1",
            item.product_id
        )));
    }
    if let Some(item) = merge_cart(items)
        .iter()
        .find(|i| i.quantity > MAX_LINE_QUANTITY)
    {
        return Err(AppError::BadRequest(format!(
            "Quantity for product {} must be at most {}",
            item.product_id, MAX_LINE_QUANTITY
        )));
    }
    Ok(())
}

/// Price a cart against current products.
///
/// Fails without side effects on an invalid cart, an unknown or inactive
/// product, insufficient stock, or a total that does not fit in `i64`.
pub fn price_cart(items: &[CartItem], products: &[Product]) -> Result<PricedCart, AppError> {
    validate_cart(items)?;

    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut lines = Vec::new();
    let mut updated_products = Vec::new();
    let mut total_cents = 0i64;

    for item in merge_cart(items) {
        let product = by_id
            .get(item.product_id.as_str())
            .filter(|p| p.active)
            .ok_or_else(|| {
                AppError::BadRequest(format!("Product {} is not available", item.product_id))
            })?;

        if product.stock < item.quantity {
            return Err(AppError::Conflict(format!(
                "Only {} of {} left in stock",
                product.stock, product.name
            )));
        }

        let line_total_cents = product
            .price_cents
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| amount_too_large(&product.name))?;
        total_cents = total_cents
            .checked_add(line_total_cents)
            .ok_or_else(|| amount_too_large(&product.name))?;

        lines.push(SaleLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: item.quantity,
            unit_price_cents: product.price_cents,
            line_total_cents,
        });

        let mut updated = (*product).clone();
        updated.stock -= item.quantity;
        updated_products.push(updated);
    }

    Ok(PricedCart {
        lines,
        total_cents,
        updated_products,
    })
}

fn amount_too_large(product: &str) -> AppError {
    AppError::BadRequest(format!("Sale total is too large at {}", product))
}
