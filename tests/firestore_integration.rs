// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore emulator tests.
//!
//! Run with `FIRESTORE_EMULATOR_HOST=localhost:8081 cargo test`; skipped
//! otherwise.

use chrono::{NaiveDate, NaiveTime, Utc};
use gym_desk::models::{
    ClassSchedule, GymClass, Membership, MembershipPlan, Message, Payment, PaymentKind,
    PaymentMethod, Product, Role, Sale, User,
};
use gym_desk::db::firestore::CheckoutWrites;
use gym_desk::error::AppError;
use gym_desk::services::booking;
use gym_desk::services::pos::{price_cart, CartItem};
use gym_desk::time_utils::YearMonth;

mod common;

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn user(role: Role) -> User {
    let id = unique("user");
    User {
        email: format!("{}@example.com", id),
        id,
        name: "Test User".to_string(),
        phone: None,
        role,
        password_hash: String::new(),
        membership: None,
        trainer_id: None,
        created_at: Utc::now(),
    }
}

fn payment(user_id: Option<&str>, cents: i64, date: NaiveDate) -> Payment {
    Payment {
        id: unique("payment"),
        user_id: user_id.map(str::to_string),
        amount_cents: cents,
        method: PaymentMethod::Card,
        kind: PaymentKind::Membership,
        description: "test".to_string(),
        date,
        recorded_by: "front-desk".to_string(),
    }
}

fn class(trainer: &str, clients: &[&str]) -> GymClass {
    GymClass {
        id: unique("class"),
        name: "Spin".to_string(),
        description: String::new(),
        schedule: ClassSchedule::Weekly {
            weekday: chrono::Weekday::Mon,
        },
        start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        duration_minutes: 45,
        capacity: 10,
        trainer_ids: vec![trainer.to_string()],
        booked_client_ids: clients.iter().map(|c| c.to_string()).collect(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_user_roundtrip_and_email_lookup() {
    require_emulator!();
    let db = common::test_db().await;

    let client = user(Role::Client);
    db.put(&client).await.unwrap();

    let fetched: User = db.require(&client.id, "User").await.unwrap();
    assert_eq!(fetched.email, client.email);
    assert_eq!(fetched.role, Role::Client);

    let found = db.find_user_by_email(&client.email).await.unwrap().unwrap();
    assert_eq!(found.id, client.id);

    assert!(db
        .find_user_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    require_emulator!();
    let db = common::test_db().await;

    let missing: Option<User> = db.get(&unique("ghost")).await.unwrap();
    assert!(missing.is_none());

    let err = db.require::<User>(&unique("ghost"), "User").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_membership_and_payment_saved_together() {
    require_emulator!();
    let db = common::test_db().await;
    let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

    let mut client = user(Role::Client);
    client.membership = Some(Membership::start(MembershipPlan::Quarterly, today));
    let pay = payment(Some(&client.id), MembershipPlan::Quarterly.price_cents(), today);

    db.save_membership_payment(&client, &pay).await.unwrap();

    let stored: User = db.require(&client.id, "User").await.unwrap();
    assert_eq!(stored.membership.unwrap().plan, MembershipPlan::Quarterly);
    let stored_payment: Payment = db.require(&pay.id, "Payment").await.unwrap();
    assert_eq!(stored_payment.user_id.as_deref(), Some(client.id.as_str()));
}

#[tokio::test]
async fn test_checkout_writes_stock_sale_and_payment() {
    require_emulator!();
    let db = common::test_db().await;

    let product = Product {
        id: unique("product"),
        name: "Protein bar".to_string(),
        category: "snacks".to_string(),
        price_cents: 250,
        stock: 7,
        active: true,
    };
    db.put(&product).await.unwrap();

    let items = vec![CartItem {
        product_id: product.id.clone(),
        quantity: 3,
    }];
    let payment_id = unique("payment");
    let sale = db
        .checkout(std::slice::from_ref(&product.id), {
            let payment_id = payment_id.clone();
            move |products: &[Product]| {
                let cart = price_cart(&items, products)?;
                let sale = Sale {
                    id: unique("sale"),
                    lines: cart.lines,
                    total_cents: cart.total_cents,
                    client_id: None,
                    cashier_id: "front-desk".to_string(),
                    method: PaymentMethod::Cash,
                    created_at: Utc::now(),
                };
                let mut pay = payment(None, sale.total_cents, Utc::now().date_naive());
                pay.id = payment_id.clone();
                pay.kind = PaymentKind::Retail;
                Ok(CheckoutWrites {
                    products: cart.updated_products,
                    sale,
                    payment: pay,
                })
            }
        })
        .await
        .unwrap();

    let stored: Product = db.require(&product.id, "Product").await.unwrap();
    assert_eq!(stored.stock, 4);
    let stored_sale: Sale = db.require(&sale.id, "Sale").await.unwrap();
    assert_eq!(stored_sale.total_cents, 750);
    assert!(db.get::<Payment>(&payment_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rejected_checkout_writes_nothing() {
    require_emulator!();
    let db = common::test_db().await;

    let product = Product {
        id: unique("product"),
        name: "Shaker".to_string(),
        category: "gear".to_string(),
        price_cents: 900,
        stock: 1,
        active: true,
    };
    db.put(&product).await.unwrap();

    let items = vec![CartItem {
        product_id: product.id.clone(),
        quantity: 2,
    }];
    let err = db
        .checkout(std::slice::from_ref(&product.id), move |products: &[Product]| {
            price_cart(&items, products)?;
            unreachable!("cart should not price")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored: Product = db.require(&product.id, "Product").await.unwrap();
    assert_eq!(stored.stock, 1);
}

#[tokio::test]
async fn test_concurrent_bookings_respect_capacity() {
    require_emulator!();
    let db = common::test_db().await;

    let mut spin = class("trainer", &[]);
    spin.capacity = 1;
    db.put(&spin).await.unwrap();

    let today = Utc::now().date_naive();
    let attempt = |client: &'static str| {
        let db = db.clone();
        let id = spin.id.clone();
        async move {
            db.modify(&id, "Class", move |c: &mut GymClass| {
                booking::book(c, client, today)
            })
            .await
        }
    };
    let (first, second) = tokio::join!(attempt("client-a"), attempt("client-b"));

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));

    let stored: GymClass = db.require(&spin.id, "Class").await.unwrap();
    assert_eq!(stored.booked_client_ids.len(), 1);
}

#[tokio::test]
async fn test_modify_missing_document_is_not_found() {
    require_emulator!();
    let db = common::test_db().await;

    let err = db
        .modify(&unique("ghost"), "Class", |_: &mut GymClass| Ok(()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_user_cleans_up_rosters() {
    require_emulator!();
    let db = common::test_db().await;

    let trainer = user(Role::Trainer);
    let client = user(Role::Client);
    let other = user(Role::Client);
    db.put_all(&[trainer.clone(), client.clone(), other.clone()])
        .await
        .unwrap();

    let booked = class(&trainer.id, &[&client.id, &other.id]);
    let untouched = class(&trainer.id, &[&other.id]);
    db.put_all(&[booked.clone(), untouched.clone()]).await.unwrap();

    let updated = db.delete_user(&client.id).await.unwrap();
    assert_eq!(updated, 1);

    assert!(db.get::<User>(&client.id).await.unwrap().is_none());
    let after: GymClass = db.require(&booked.id, "Class").await.unwrap();
    assert_eq!(after.booked_client_ids, vec![other.id.clone()]);
    assert_eq!(after.trainer_ids, vec![trainer.id.clone()]);
}

#[tokio::test]
async fn test_role_change_leaves_old_rosters() {
    require_emulator!();
    let db = common::test_db().await;

    let mut coach = user(Role::Trainer);
    let client = user(Role::Client);
    db.put_all(&[coach.clone(), client.clone()]).await.unwrap();
    let taught = class(&coach.id, &[&client.id]);
    db.put(&taught).await.unwrap();

    coach.role = Role::Receptionist;
    let updated = db.save_role_change(&coach, Role::Trainer).await.unwrap();
    assert_eq!(updated, 1);

    let stored: User = db.require(&coach.id, "User").await.unwrap();
    assert_eq!(stored.role, Role::Receptionist);
    let after: GymClass = db.require(&taught.id, "Class").await.unwrap();
    assert!(after.trainer_ids.is_empty());
    assert_eq!(after.booked_client_ids, vec![client.id.clone()]);
}

#[tokio::test]
async fn test_list_in_month_filters_by_date() {
    require_emulator!();
    let db = common::test_db().await;

    // A far-off year keeps other tests' documents out of range
    let payer = unique("payer");
    let inside = payment(Some(&payer), 1000, NaiveDate::from_ymd_opt(2091, 2, 28).unwrap());
    let before = payment(Some(&payer), 2000, NaiveDate::from_ymd_opt(2091, 1, 31).unwrap());
    let after = payment(Some(&payer), 3000, NaiveDate::from_ymd_opt(2091, 3, 1).unwrap());
    db.put_all(&[inside.clone(), before, after]).await.unwrap();

    let month = YearMonth::parse("2091-02").unwrap();
    let payments: Vec<Payment> = db.list_in_month("date", month).await.unwrap();
    let ids: Vec<&str> = payments
        .iter()
        .filter(|p| p.user_id.as_deref() == Some(payer.as_str()))
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec![inside.id.as_str()]);
}

#[tokio::test]
async fn test_messages_involving_both_directions() {
    require_emulator!();
    let db = common::test_db().await;

    let me = unique("me");
    let coach = unique("coach");
    let stranger = unique("stranger");
    let message = |from: &str, to: &str| Message {
        id: unique("msg"),
        conversation_id: gym_desk::models::conversation_id(from, to),
        sender_id: from.to_string(),
        recipient_id: to.to_string(),
        body: "hi".to_string(),
        sent_at: Utc::now(),
        read: false,
    };

    db.put_all(&[
        message(&me, &coach),
        message(&coach, &me),
        message(&coach, &stranger),
    ])
    .await
    .unwrap();

    let mine = db.list_messages_involving(&me).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|m| m.sender_id == me || m.recipient_id == me));
}
