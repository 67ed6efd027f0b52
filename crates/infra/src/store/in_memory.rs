use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use stockroom_core::{CategoryId, DomainError, Entity, MovementId, ProductId, PurchaseRequestId};
use stockroom_inventory::{Movement, NewMovement, StockLevel};
use stockroom_products::{Category, NewProduct, Product};
use stockroom_purchasing::{Decision, NewPurchaseRequest, PurchaseRequest};

use super::{InventoryStore, StoreError};

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    movements: Vec<Movement>,
    requests: BTreeMap<PurchaseRequestId, PurchaseRequest>,
    last_category_id: i64,
    last_product_id: i64,
    last_movement_id: i64,
    last_request_id: i64,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Each operation holds the write lock for its whole
/// read-modify-write, which serializes concurrent callers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.name == name) {
            return Err(DomainError::validation(format!("category '{name}' already exists")).into());
        }

        state.last_category_id += 1;
        let category = Category {
            id: CategoryId::new(state.last_category_id),
            name: name.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let state = self.read()?;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut state = self.write()?;

        if state.products.values().any(|p| p.name() == product.name()) {
            return Err(DomainError::duplicate_product(product.name()).into());
        }
        if let Some(category_id) = product.category_id() {
            if !state.categories.contains_key(&category_id) {
                return Err(DomainError::not_found("category", category_id.get()).into());
            }
        }

        state.last_product_id += 1;
        let product = product.into_product(ProductId::new(state.last_product_id));
        state.products.insert(product.id(), product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn products_below(&self, threshold: i64) -> Result<Vec<Product>, StoreError> {
        let state = self.read()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.quantity() < threshold)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(products)
    }

    async fn apply_movement(
        &self,
        movement: NewMovement,
    ) -> Result<(Product, Movement), StoreError> {
        let mut state = self.write()?;

        let current = state
            .products
            .get(&movement.product_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("product", movement.product_id.get()))?;

        // Decide before touching state: a rejected movement leaves no trace.
        let level = StockLevel::new(current.quantity())?.apply(&movement)?;

        let updated = Product::restore(
            current.id(),
            current.name().to_string(),
            current.category_id(),
            level.get(),
            current.price(),
            current.location().map(str::to_string),
        );

        state.last_movement_id += 1;
        let stored = movement.into_movement(MovementId::new(state.last_movement_id));
        state.products.insert(updated.id(), updated.clone());
        state.movements.push(stored.clone());

        Ok((updated, stored))
    }

    async fn movements_for(&self, product_id: ProductId) -> Result<Vec<Movement>, StoreError> {
        let state = self.read()?;
        Ok(state
            .movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, StoreError> {
        let state = self.read()?;
        let mut movements: Vec<Movement> = state
            .movements
            .iter()
            .filter(|m| m.date >= start && m.date <= end)
            .cloned()
            .collect();
        movements.sort_by_key(|m| (m.date, m.id));
        Ok(movements)
    }

    async fn insert_purchase_request(
        &self,
        request: NewPurchaseRequest,
    ) -> Result<PurchaseRequest, StoreError> {
        let mut state = self.write()?;

        if !state.products.contains_key(&request.product_id()) {
            return Err(DomainError::not_found("product", request.product_id().get()).into());
        }

        state.last_request_id += 1;
        let request = request.into_request(PurchaseRequestId::new(state.last_request_id));
        state.requests.insert(request.id(), request.clone());
        Ok(request)
    }

    async fn get_purchase_request(
        &self,
        id: PurchaseRequestId,
    ) -> Result<Option<PurchaseRequest>, StoreError> {
        Ok(self.read()?.requests.get(&id).cloned())
    }

    async fn decide_purchase_request(
        &self,
        id: PurchaseRequestId,
        decision: Decision,
    ) -> Result<PurchaseRequest, StoreError> {
        let mut state = self.write()?;

        let current = state
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("purchase request", id.get()))?;

        let decided = current.decide(decision)?;
        state.requests.insert(id, decided.clone());
        Ok(decided)
    }
}
