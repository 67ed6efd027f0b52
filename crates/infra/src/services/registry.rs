use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use stockroom_auth::{Actor, Operation, require_for};
use stockroom_core::{CategoryId, DomainError, Entity, ProductId};
use stockroom_products::{NewProduct, Price, Product};

use super::{ServiceError, reject};
use crate::store::{InventoryStore, StoreError};

/// Product registration and lookup.
pub struct ProductRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for ProductRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: InventoryStore> ProductRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a new product. Stocker only.
    #[instrument(skip(self, actor, price, location), fields(actor = %actor.name))]
    pub async fn register(
        &self,
        actor: &Actor,
        name: &str,
        category_id: Option<CategoryId>,
        initial_quantity: i64,
        price: Decimal,
        location: Option<&str>,
    ) -> Result<Product, ServiceError> {
        let operation = Operation::RegisterProduct;
        let result: Result<Product, StoreError> = async {
            require_for(actor, operation)?;
            let command = NewProduct::new(
                name,
                category_id,
                initial_quantity,
                Price::new(price)?,
                location.map(str::to_string),
            )?;
            self.store.insert_product(command).await
        }
        .await;

        let product = result.map_err(|e| reject(Some(actor), operation, e))?;
        tracing::info!(
            product_id = %product.id(),
            quantity = product.quantity(),
            "product registered"
        );
        Ok(product)
    }

    /// Storage location of a product; `None` when unset. Open to everyone.
    pub async fn locate(&self, product_id: ProductId) -> Result<Option<String>, ServiceError> {
        let product = self.fetch(product_id, Operation::LocateProduct).await?;
        Ok(product.location().map(str::to_string))
    }

    pub async fn get(&self, product_id: ProductId) -> Result<Product, ServiceError> {
        self.fetch(product_id, Operation::GetProduct).await
    }

    async fn fetch(
        &self,
        product_id: ProductId,
        operation: Operation,
    ) -> Result<Product, ServiceError> {
        match self.store.get_product(product_id).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(reject(
                None,
                operation,
                DomainError::not_found("product", product_id.get()),
            )),
            Err(e) => Err(reject(None, operation, e)),
        }
    }
}
