// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Every stored record implements [`Document`], which names its collection
//! and document id. Generic helpers cover plain CRUD; operations that must
//! write several documents together use Firestore transactions:
//! - Membership renewal (user + payment)
//! - Checkout (stock levels + sale + payment)
//! - User deletion (user + class rosters)
//!
//! Checks that guard a write (class capacity, stock levels) read inside the
//! same transaction, so Firestore retries them when the data changes.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Announcement, Budget, Challenge, CheckIn, EquipmentItem, Expense, GymClass, Message, Payment,
    Product, Role, Sale, StaffTask, User,
};
use crate::time_utils::YearMonth;
use dashmap::DashMap;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreResult;
use futures_util::{stream, FutureExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// A record stored as one Firestore document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn doc_id(&self) -> String;
}

macro_rules! document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: &'static str = $collection;

            fn doc_id(&self) -> String {
                self.id.clone()
            }
        }
    };
}

document!(User, collections::USERS);
document!(CheckIn, collections::CHECK_INS);
document!(GymClass, collections::CLASSES);
document!(Product, collections::PRODUCTS);
document!(Sale, collections::SALES);
document!(Payment, collections::PAYMENTS);
document!(Expense, collections::EXPENSES);
document!(Message, collections::MESSAGES);
document!(Announcement, collections::ANNOUNCEMENTS);
document!(Challenge, collections::CHALLENGES);
document!(EquipmentItem, collections::EQUIPMENT);
document!(StaffTask, collections::TASKS);

impl Document for Budget {
    const COLLECTION: &'static str = collections::BUDGETS;

    fn doc_id(&self) -> String {
        budget_doc_id(&self.category)
    }
}

/// Budget documents are keyed by category name.
pub fn budget_doc_id(category: &str) -> String {
    urlencoding::encode(category).into_owned()
}

fn fixture_key(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, id)
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    /// Documents `get` serves in offline mode, keyed `collection/id`
    fixtures: Arc<DashMap<String, serde_json::Value>>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::connected(client))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::connected(client))
    }

    fn connected(client: firestore::FirestoreDb) -> Self {
        Self {
            client: Some(client),
            fixtures: Arc::new(DashMap::new()),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// `get` answers from documents added with [`FirestoreDb::seed`]; every
    /// other operation returns a database error.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            fixtures: Arc::new(DashMap::new()),
        }
    }

    /// Make `doc` readable through `get` on an offline client.
    pub fn seed<T: Document>(&self, doc: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(doc)
            .map_err(|e| AppError::Database(format!("Failed to encode fixture: {}", e)))?;
        self.fixtures
            .insert(fixture_key(T::COLLECTION, &doc.doc_id()), value);
        Ok(())
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Operations ─────────────────────────────

    /// Get a document by id.
    pub async fn get<T: Document>(&self, id: &str) -> Result<Option<T>, AppError> {
        if self.client.is_none() {
            return self.get_fixture(id);
        }
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(T::COLLECTION)
            .obj::<T>()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn get_fixture<T: Document>(&self, id: &str) -> Result<Option<T>, AppError> {
        self.fixtures
            .get(&fixture_key(T::COLLECTION, id))
            .map(|entry| serde_json::from_value(entry.value().clone()))
            .transpose()
            .map_err(|e| AppError::Database(format!("Failed to decode fixture: {}", e)))
    }

    /// Get a document by id, or `NotFound` naming `what`.
    pub async fn require<T: Document>(&self, id: &str, what: &str) -> Result<T, AppError> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
    }

    /// Fetch several documents concurrently. Missing ids are skipped.
    pub async fn get_many<T: Document>(&self, ids: &[String]) -> Result<Vec<T>, AppError> {
        let results = stream::iter(ids.to_vec())
            .map(|id| async move { self.get::<T>(&id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<T>, AppError>>>()
            .await;

        let mut docs = Vec::with_capacity(results.len());
        for result in results {
            if let Some(doc) = result? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// List every document in a collection.
    pub async fn list<T: Document>(&self) -> Result<Vec<T>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(T::COLLECTION)
            .obj::<T>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List documents whose string field equals `value`.
    pub async fn list_where<T: Document>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(T::COLLECTION)
            .filter(|q| q.for_all([q.field(field).eq(value.to_string())]))
            .obj::<T>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List documents whose `YYYY-MM-DD` date field falls inside `month`.
    pub async fn list_in_month<T: Document>(
        &self,
        date_field: &str,
        month: YearMonth,
    ) -> Result<Vec<T>, AppError> {
        let start = month.first_day().to_string();
        let end = month.next_first_day().to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(T::COLLECTION)
            .filter(|q| {
                q.for_all([
                    q.field(date_field).greater_than_or_equal(start.clone()),
                    q.field(date_field).less_than(end.clone()),
                ])
            })
            .obj::<T>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a document.
    pub async fn put<T: Document>(&self, doc: &T) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(T::COLLECTION)
            .document_id(doc.doc_id())
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a document. Deleting a missing document is not an error.
    pub async fn delete<T: Document>(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(T::COLLECTION)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write many documents of one type, one transaction per chunk.
    pub async fn put_all<T: Document>(&self, docs: &[T]) -> Result<(), AppError> {
        for chunk in docs.chunks(BATCH_SIZE) {
            let mut transaction = self.begin().await?;
            for doc in chunk {
                self.add_put(&mut transaction, doc)?;
            }
            self.commit(transaction, T::COLLECTION).await?;
        }
        Ok(())
    }

    // ─── Transaction Helpers ─────────────────────────────────────

    async fn begin(&self) -> Result<firestore::FirestoreTransaction<'_>, AppError> {
        self.get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    fn add_put<T: Document>(
        &self,
        transaction: &mut firestore::FirestoreTransaction<'_>,
        doc: &T,
    ) -> Result<(), AppError> {
        stage_put(self.get_client()?, transaction, doc).map_err(|e| {
            AppError::Database(format!(
                "Failed to add {} write to transaction: {}",
                T::COLLECTION,
                e
            ))
        })
    }

    async fn commit(
        &self,
        transaction: firestore::FirestoreTransaction<'_>,
        what: &str,
    ) -> Result<(), AppError> {
        transaction.commit().await.map_err(|e| {
            AppError::Database(format!("Transaction commit failed ({}): {}", what, e))
        })?;
        Ok(())
    }

    /// Read-modify-write one document in a Firestore transaction.
    ///
    /// `apply` sees the document as read inside the transaction; if another
    /// request writes it first, Firestore retries with fresh data. Nothing
    /// is written when `apply` fails, and its error is returned as is.
    pub async fn modify<T, F>(&self, id: &str, what: &str, apply: F) -> Result<T, AppError>
    where
        T: Document + 'static,
        F: Fn(&mut T) -> Result<(), AppError> + Clone + Send + Sync + 'static,
    {
        let id = id.to_string();
        let what = what.to_string();
        self.get_client()?
            .run_transaction(|db, transaction| {
                modify_in_transaction(db, transaction, id.clone(), what.clone(), apply.clone())
                    .boxed()
            })
            .await
            .map_err(|e| {
                AppError::Database(format!("Transaction failed ({}): {}", T::COLLECTION, e))
            })?
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Find a user by (lowercased) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let mut users: Vec<User> = self.list_where("email", email).await?;
        if users.len() > 1 {
            tracing::warn!(count = users.len(), "Multiple users share an email");
        }
        Ok(users.pop())
    }

    /// Atomically store a membership change and the payment for it.
    pub async fn save_membership_payment(
        &self,
        user: &User,
        payment: &Payment,
    ) -> Result<(), AppError> {
        let mut transaction = self.begin().await?;
        self.add_put(&mut transaction, user)?;
        self.add_put(&mut transaction, payment)?;
        self.commit(transaction, "membership").await?;

        tracing::info!(
            user_id = %user.id,
            payment_id = %payment.id,
            amount_cents = payment.amount_cents,
            "Membership payment stored atomically"
        );
        Ok(())
    }

    /// Delete a user and remove them from every class roster.
    ///
    /// Messages, payments and check-ins are kept for the records.
    pub async fn delete_user(&self, user_id: &str) -> Result<usize, AppError> {
        let affected = without_member(self.list().await?, user_id, true, true);

        let mut transaction = self.begin().await?;
        for class in &affected {
            self.add_put(&mut transaction, class)?;
        }
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user deletion to transaction: {}", e))
            })?;
        self.commit(transaction, "user deletion").await?;

        tracing::info!(
            user_id,
            classes_updated = affected.len(),
            "User deleted"
        );
        Ok(affected.len())
    }

    /// Store `user` after a role change and take them off the class lists
    /// their old role put them on. Classes are read inside the transaction
    /// so a booking made meanwhile is not overwritten.
    pub async fn save_role_change(
        &self,
        user: &User,
        previous: Role,
    ) -> Result<usize, AppError> {
        let as_trainer = previous == Role::Trainer && user.role != Role::Trainer;
        let as_client = previous == Role::Client && user.role != Role::Client;
        let user = user.clone();
        let updated = self
            .get_client()?
            .run_transaction(|db, transaction| {
                role_change_in_transaction(db, transaction, user.clone(), as_trainer, as_client)
                    .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Transaction failed (role change): {}", e)))?;

        tracing::info!(
            user_id = %user.id,
            from = previous.as_str(),
            to = user.role.as_str(),
            classes_updated = updated,
            "Role changed"
        );
        Ok(updated)
    }

    // ─── Point of Sale ───────────────────────────────────────────

    /// Sell products in one Firestore transaction.
    ///
    /// The products are read inside the transaction and handed to `sell`,
    /// which returns the new stock levels, the sale and its payment. Two
    /// checkouts racing for the same stock are serialized by Firestore
    /// retrying the later one. Nothing is written when `sell` fails.
    pub async fn checkout<F>(&self, product_ids: &[String], sell: F) -> Result<Sale, AppError>
    where
        F: Fn(&[Product]) -> Result<CheckoutWrites, AppError> + Clone + Send + Sync + 'static,
    {
        let product_ids = product_ids.to_vec();
        let sale = self
            .get_client()?
            .run_transaction(|db, transaction| {
                checkout_in_transaction(db, transaction, product_ids.clone(), sell.clone()).boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Transaction failed (checkout): {}", e)))??;

        tracing::info!(
            sale_id = %sale.id,
            lines = sale.lines.len(),
            total_cents = sale.total_cents,
            "Checkout stored atomically"
        );
        Ok(sale)
    }

    // ─── Messaging ───────────────────────────────────────────────

    /// All messages sent or received by a user.
    pub async fn list_messages_involving(&self, user_id: &str) -> Result<Vec<Message>, AppError> {
        let (sent, received) = tokio::try_join!(
            self.list_where::<Message>("sender_id", user_id),
            self.list_where::<Message>("recipient_id", user_id),
        )?;

        let mut messages = sent;
        // A message to oneself is rejected on send, so the two sets are disjoint
        messages.extend(received);
        Ok(messages)
    }
}

/// Documents a checkout writes together.
pub struct CheckoutWrites {
    pub products: Vec<Product>,
    pub sale: Sale,
    pub payment: Payment,
}

fn stage_put<T: Document>(
    client: &firestore::FirestoreDb,
    transaction: &mut firestore::FirestoreTransaction<'_>,
    doc: &T,
) -> FirestoreResult<()> {
    client
        .fluent()
        .update()
        .in_col(T::COLLECTION)
        .document_id(doc.doc_id())
        .object(doc)
        .add_to_transaction(transaction)?;
    Ok(())
}

// A rejection from the caller's closure is the transaction's value rather
// than its error: the transaction commits with no writes and the caller
// gets the domain error back unchanged.
type TransactionOutcome<T> = Result<Result<T, AppError>, BackoffError<FirestoreError>>;

async fn modify_in_transaction<T, F>(
    db: firestore::FirestoreDb,
    transaction: &mut firestore::FirestoreTransaction<'_>,
    id: String,
    what: String,
    apply: F,
) -> TransactionOutcome<T>
where
    T: Document,
    F: Fn(&mut T) -> Result<(), AppError>,
{
    let current = db
        .fluent()
        .select()
        .by_id_in(T::COLLECTION)
        .obj::<T>()
        .one(&id)
        .await?;
    let Some(mut doc) = current else {
        return Ok(Err(AppError::NotFound(format!("{} {} not found", what, id))));
    };
    if let Err(rejected) = apply(&mut doc) {
        return Ok(Err(rejected));
    }

    stage_put(&db, transaction, &doc)?;
    Ok(Ok(doc))
}

async fn checkout_in_transaction<F>(
    db: firestore::FirestoreDb,
    transaction: &mut firestore::FirestoreTransaction<'_>,
    product_ids: Vec<String>,
    sell: F,
) -> TransactionOutcome<Sale>
where
    F: Fn(&[Product]) -> Result<CheckoutWrites, AppError>,
{
    let mut products = Vec::with_capacity(product_ids.len());
    for id in &product_ids {
        let product = db
            .fluent()
            .select()
            .by_id_in(collections::PRODUCTS)
            .obj::<Product>()
            .one(id)
            .await?;
        products.extend(product);
    }

    let writes = match sell(&products) {
        Ok(writes) => writes,
        Err(rejected) => return Ok(Err(rejected)),
    };
    for product in &writes.products {
        stage_put(&db, transaction, product)?;
    }
    stage_put(&db, transaction, &writes.sale)?;
    stage_put(&db, transaction, &writes.payment)?;
    Ok(Ok(writes.sale))
}

/// The classes that listed `user_id`, with the requested lists cleaned.
fn without_member(
    classes: Vec<GymClass>,
    user_id: &str,
    as_trainer: bool,
    as_client: bool,
) -> Vec<GymClass> {
    classes
        .into_iter()
        .filter_map(|mut c| c.remove_member(user_id, as_trainer, as_client).then_some(c))
        .collect()
}

async fn role_change_in_transaction(
    db: firestore::FirestoreDb,
    transaction: &mut firestore::FirestoreTransaction<'_>,
    user: User,
    as_trainer: bool,
    as_client: bool,
) -> Result<usize, BackoffError<FirestoreError>> {
    let mut affected = Vec::new();
    if as_trainer || as_client {
        let classes: Vec<GymClass> = db
            .fluent()
            .select()
            .from(collections::CLASSES)
            .obj::<GymClass>()
            .query()
            .await?;
        affected = without_member(classes, &user.id, as_trainer, as_client);
    }

    for class in &affected {
        stage_put(&db, transaction, class)?;
    }
    stage_put(&db, transaction, &user)?;
    Ok(affected.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_doc_id_is_path_safe() {
        assert_eq!(budget_doc_id("utilities"), "utilities");
        assert_eq!(budget_doc_id("rent/lease"), "rent%2Flease");
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: id.to_string(),
            phone: None,
            role: crate::models::Role::Trainer,
            password_hash: String::new(),
            membership: None,
            trainer_id: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_offline_db_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.list::<User>().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        let err = db.put(&user("u1")).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_offline_get_reads_seeded_documents() {
        let db = FirestoreDb::new_mock();
        db.seed(&user("u1")).unwrap();

        let found: User = db.require("u1", "User").await.unwrap();
        assert_eq!(found.role, crate::models::Role::Trainer);
        assert!(db.get::<User>("u2").await.unwrap().is_none());
        // Same id in another collection is a different document
        assert!(db.get::<GymClass>("u1").await.unwrap().is_none());

        // Clones share the fixtures
        let clone = db.clone();
        clone.seed(&user("u2")).unwrap();
        assert!(db.get::<User>("u2").await.unwrap().is_some());
    }

    #[test]
    fn test_without_member_keeps_only_changed_classes() {
        let class = |id: &str, trainers: &[&str], clients: &[&str]| GymClass {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            schedule: crate::models::ClassSchedule::Weekly {
                weekday: chrono::Weekday::Fri,
            },
            start_time: chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            duration_minutes: 30,
            capacity: 8,
            trainer_ids: trainers.iter().map(|t| t.to_string()).collect(),
            booked_client_ids: clients.iter().map(|c| c.to_string()).collect(),
            created_at: chrono::Utc::now(),
        };
        let classes = vec![
            class("taught", &["pat", "t2"], &["c1"]),
            class("booked", &["t2"], &["pat"]),
            class("other", &["t2"], &["c1"]),
        ];

        // A trainer demoted to receptionist stays on client rosters
        let demoted = without_member(classes.clone(), "pat", true, false);
        assert_eq!(demoted.len(), 1);
        assert_eq!(demoted[0].id, "taught");
        assert_eq!(demoted[0].trainer_ids, vec!["t2"]);

        let deleted = without_member(classes, "pat", true, true);
        let ids: Vec<&str> = deleted.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["taught", "booked"]);
        assert!(deleted[1].booked_client_ids.is_empty());
    }
}
