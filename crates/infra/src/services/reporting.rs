use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::instrument;

use stockroom_auth::{Actor, Operation, require_for};
use stockroom_core::{DomainError, ProductId};
use stockroom_inventory::{Movement, MovementKind};
use stockroom_products::Product;

use super::{ServiceError, reject};
use crate::store::{InventoryStore, StoreError};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockEntry {
    pub name: String,
    pub quantity: i64,
}

impl From<Product> for LowStockEntry {
    fn from(product: Product) -> Self {
        Self {
            quantity: product.quantity(),
            name: product.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementEntry {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub date: NaiveDate,
}

impl From<Movement> for MovementEntry {
    fn from(movement: Movement) -> Self {
        Self {
            product_id: movement.product_id,
            kind: movement.kind,
            quantity: movement.quantity,
            date: movement.date,
        }
    }
}

/// Read-only stock reports. Viewer only.
pub struct ReportingReader<S> {
    store: Arc<S>,
}

impl<S> Clone for ReportingReader<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: InventoryStore> ReportingReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Products with quantity strictly below `threshold`, by name.
    #[instrument(skip(self, actor), fields(actor = %actor.name))]
    pub async fn low_stock_products(
        &self,
        actor: &Actor,
        threshold: i64,
    ) -> Result<Vec<LowStockEntry>, ServiceError> {
        let operation = Operation::LowStockReport;
        let result: Result<Vec<Product>, StoreError> = async {
            require_for(actor, operation)?;
            self.store.products_below(threshold).await
        }
        .await;

        let products = result.map_err(|e| reject(Some(actor), operation, e))?;
        Ok(products.into_iter().map(LowStockEntry::from).collect())
    }

    /// Movements dated within `[start, end]`, by date then id.
    #[instrument(skip(self, actor), fields(actor = %actor.name))]
    pub async fn movements_in_range(
        &self,
        actor: &Actor,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MovementEntry>, ServiceError> {
        let operation = Operation::MovementReport;
        let result: Result<Vec<Movement>, StoreError> = async {
            require_for(actor, operation)?;
            if start > end {
                return Err(DomainError::validation(format!(
                    "range start {start} is after end {end}"
                ))
                .into());
            }
            self.store.movements_between(start, end).await
        }
        .await;

        let movements = result.map_err(|e| reject(Some(actor), operation, e))?;
        Ok(movements.into_iter().map(MovementEntry::from).collect())
    }
}
