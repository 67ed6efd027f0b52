//! Storage boundary for products, movements and purchase requests.
//!
//! Services receive a store handle by injection and never hold a connection
//! across calls. Every mutating method is one atomic transaction: it either
//! commits fully or leaves no trace.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use stockroom_core::{DomainError, ProductId, PurchaseRequestId};
use stockroom_inventory::{Movement, NewMovement};
use stockroom_products::{Category, NewProduct, Product};
use stockroom_purchasing::{Decision, NewPurchaseRequest, PurchaseRequest};

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation was rejected by a domain rule (nothing was written).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

/// Transactional inventory store.
///
/// ## Implementation requirements
///
/// - `insert_product` rejects a name already in use with `DuplicateProduct`
///   and an unknown category with `NotFound`.
/// - `apply_movement` updates the product quantity and appends the movement
///   in one transaction. It fails with `NotFound` for an unknown product and
///   `InsufficientStock` when an outbound movement exceeds the level read
///   inside that same transaction. An inbound movement that would overflow
///   the level is a `Validation` error.
/// - `decide_purchase_request` moves a pending request exactly once; a
///   concurrent second decision observes the first and fails with
///   `InvalidState`.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Products whose quantity is strictly below `threshold`, ordered by name.
    async fn products_below(&self, threshold: i64) -> Result<Vec<Product>, StoreError>;

    /// Apply a movement's quantity delta and append it to the log.
    ///
    /// Returns the product as it stands after the movement, and the stored movement.
    async fn apply_movement(
        &self,
        movement: NewMovement,
    ) -> Result<(Product, Movement), StoreError>;

    /// Movement history for one product, oldest first.
    async fn movements_for(&self, product_id: ProductId) -> Result<Vec<Movement>, StoreError>;

    /// Movements dated within `[start, end]`, ordered by date then id.
    async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, StoreError>;

    async fn insert_purchase_request(
        &self,
        request: NewPurchaseRequest,
    ) -> Result<PurchaseRequest, StoreError>;

    async fn get_purchase_request(
        &self,
        id: PurchaseRequestId,
    ) -> Result<Option<PurchaseRequest>, StoreError>;

    async fn decide_purchase_request(
        &self,
        id: PurchaseRequestId,
        decision: Decision,
    ) -> Result<PurchaseRequest, StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        (**self).insert_category(name).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        (**self).list_categories().await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        (**self).insert_product(product).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get_product(id).await
    }

    async fn products_below(&self, threshold: i64) -> Result<Vec<Product>, StoreError> {
        (**self).products_below(threshold).await
    }

    async fn apply_movement(
        &self,
        movement: NewMovement,
    ) -> Result<(Product, Movement), StoreError> {
        (**self).apply_movement(movement).await
    }

    async fn movements_for(&self, product_id: ProductId) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for(product_id).await
    }

    async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_between(start, end).await
    }

    async fn insert_purchase_request(
        &self,
        request: NewPurchaseRequest,
    ) -> Result<PurchaseRequest, StoreError> {
        (**self).insert_purchase_request(request).await
    }

    async fn get_purchase_request(
        &self,
        id: PurchaseRequestId,
    ) -> Result<Option<PurchaseRequest>, StoreError> {
        (**self).get_purchase_request(id).await
    }

    async fn decide_purchase_request(
        &self,
        id: PurchaseRequestId,
        decision: Decision,
    ) -> Result<PurchaseRequest, StoreError> {
        (**self).decide_purchase_request(id, decision).await
    }
}
