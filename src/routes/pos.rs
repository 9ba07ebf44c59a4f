// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product catalogue and front-desk checkout.

use crate::db::firestore::CheckoutWrites;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Payment, PaymentKind, PaymentMethod, Product, Role, Sale, User};
use crate::services::pos::{merge_cart, price_cart, validate_cart, CartItem, PricedCart};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{new_id, validate_id, MonthQuery};

const SELLERS: &[Role] = &[Role::Admin, Role::Receptionist];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/api/pos/checkout", post(checkout))
        .route("/api/pos/sales", get(list_sales))
}

// ─── Products ────────────────────────────────────────────────

async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Product>>> {
    user.require_staff()?;
    let mut products: Vec<Product> = state.db.list().await?;
    products.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
    Ok(Json(products))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(range(min = 0, max = 100000000))]
    pub price_cents: i64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    user.require_role(SELLERS)?;
    body.validate()?;

    let product = Product {
        id: new_id(),
        name: body.name.trim().to_string(),
        category: body.category.trim().to_lowercase(),
        price_cents: body.price_cents,
        stock: body.stock,
        active: body.active,
    };
    state.db.put(&product).await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(range(min = 0, max = 100000000))]
    pub price_cents: Option<i64>,
    /// Absolute stock level (restock or correction)
    pub stock: Option<u32>,
    pub active: Option<bool>,
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    user.require_role(SELLERS)?;
    body.validate()?;
    validate_id(&id, "product")?;

    let mut product: Product = state.db.require(&id, "Product").await?;
    if let Some(name) = body.name {
        product.name = name.trim().to_string();
    }
    if let Some(category) = body.category {
        product.category = category.trim().to_lowercase();
    }
    if let Some(price) = body.price_cents {
        product.price_cents = price;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }
    if let Some(active) = body.active {
        product.active = active;
    }
    state.db.put(&product).await?;

    tracing::info!(product_id = %product.id, stock = product.stock, "Product updated");
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(SELLERS)?;
    validate_id(&id, "product")?;
    state.db.delete::<Product>(&id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Checkout ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub client_id: Option<String>,
    pub method: PaymentMethod,
}

/// Sell a cart: decrement stock and record the sale and its payment together.
async fn checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Sale>)> {
    user.require_role(SELLERS)?;
    validate_cart(&body.items)?;
    for item in &body.items {
        validate_id(&item.product_id, "product")?;
    }
    if let Some(client_id) = &body.client_id {
        validate_id(client_id, "client")?;
        let client: User = state.db.require(client_id, "Client").await?;
        if client.role != Role::Client {
            return Err(AppError::BadRequest(format!("{} is not a client", client_id)));
        }
    }

    let product_ids: Vec<String> = merge_cart(&body.items)
        .into_iter()
        .map(|i| i.product_id)
        .collect();

    // Priced against stock as read inside the checkout transaction
    let items = body.items;
    let client_id = body.client_id;
    let cashier_id = user.user_id.clone();
    let method = body.method;
    let sale = state
        .db
        .checkout(&product_ids, move |products: &[Product]| {
            let cart = price_cart(&items, products)?;
            Ok(sale_writes(cart, client_id.clone(), &cashier_id, method))
        })
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

/// The sale, its payment and the new stock levels for a priced cart.
fn sale_writes(
    cart: PricedCart,
    client_id: Option<String>,
    cashier_id: &str,
    method: PaymentMethod,
) -> CheckoutWrites {
    let sale = Sale {
        id: new_id(),
        lines: cart.lines,
        total_cents: cart.total_cents,
        client_id: client_id.clone(),
        cashier_id: cashier_id.to_string(),
        method,
        created_at: chrono::Utc::now(),
    };
    let item_count: u64 = sale.lines.iter().map(|l| u64::from(l.quantity)).sum();
    let payment = Payment {
        id: new_id(),
        user_id: client_id,
        amount_cents: sale.total_cents,
        method,
        kind: PaymentKind::Retail,
        description: format!("Sale {} ({} items)", sale.id, item_count),
        date: today(),
        recorded_by: cashier_id.to_string(),
    };

    CheckoutWrites {
        products: cart.updated_products,
        sale,
        payment,
    }
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<Sale>>> {
    user.require_role(SELLERS)?;
    let month = params.resolve(today())?;

    let mut sales: Vec<Sale> = state.db.list_in_month("created_at", month).await?;
    sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(sales))
}
