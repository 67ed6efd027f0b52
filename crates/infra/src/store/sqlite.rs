//! SQLite-backed inventory store.
//!
//! ## Atomicity
//!
//! Each mutating method runs in its own transaction and opens it with a
//! guarded write (`UPDATE ... WHERE <precondition>`), so the write lock is
//! taken before any decision is made. When the guard matches no row the
//! transaction re-reads the row and lets the domain rule name the failure;
//! dropping the uncommitted transaction rolls it back.
//!
//! ## Error mapping
//!
//! | SQLite failure | Result |
//! |----------------|--------|
//! | unique violation on `products.name` | `DuplicateProduct` |
//! | foreign key violation on insert | `NotFound` (category / product) |
//! | anything else | `StoreError::Database` |

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, FromRow, Sqlite};
use tracing::instrument;

use stockroom_auth::Role;
use stockroom_core::{CategoryId, DomainError, MovementId, ProductId, PurchaseRequestId};
use stockroom_inventory::{Movement, MovementKind, NewMovement, StockLevel};
use stockroom_products::{Category, NewProduct, Price, Product};
use stockroom_purchasing::{Decision, NewPurchaseRequest, PurchaseRequest, PurchaseStatus};

use super::{InventoryStore, StoreError};
use crate::config::StoreConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        category_id INTEGER NULL REFERENCES categories (id),
        quantity    INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
        price       TEXT NOT NULL,
        location    TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movements (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products (id),
        date       TEXT NOT NULL,
        quantity   INTEGER NOT NULL CHECK (quantity > 0),
        kind       TEXT NOT NULL CHECK (kind IN ('entrada', 'saida'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS movements_date_idx ON movements (date)",
    "CREATE INDEX IF NOT EXISTS movements_product_idx ON movements (product_id)",
    r#"
    CREATE TABLE IF NOT EXISTS purchase_requests (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products (id),
        quantity   INTEGER NOT NULL CHECK (quantity > 0),
        status     TEXT NOT NULL DEFAULT 'pendente'
                   CHECK (status IN ('pendente', 'autorizado', 'cancelado'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        role        TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL
    )
    "#,
];

const PRODUCT_COLUMNS: &str = "id, name, category_id, quantity, price, location";
const MOVEMENT_COLUMNS: &str = "id, product_id, date, quantity, kind";

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    category_id: Option<i64>,
    quantity: i64,
    price: String,
    location: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::from_str(&row.price)
            .map_err(|e| StoreError::corrupt(format!("product {}: {e}", row.id)))?;
        Ok(Product::restore(
            ProductId::new(row.id),
            row.name,
            row.category_id.map(CategoryId::new),
            row.quantity,
            price,
            row.location,
        ))
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: i64,
    product_id: i64,
    date: NaiveDate,
    quantity: i64,
    kind: String,
}

impl TryFrom<MovementRow> for Movement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind = MovementKind::from_str(&row.kind)
            .map_err(|e| StoreError::corrupt(format!("movement {}: {e}", row.id)))?;
        Ok(Movement {
            id: MovementId::new(row.id),
            product_id: ProductId::new(row.product_id),
            date: row.date,
            quantity: row.quantity,
            kind,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRequestRow {
    id: i64,
    product_id: i64,
    quantity: i64,
    status: String,
}

impl TryFrom<PurchaseRequestRow> for PurchaseRequest {
    type Error = StoreError;

    fn try_from(row: PurchaseRequestRow) -> Result<Self, Self::Error> {
        let status = PurchaseStatus::from_str(&row.status)
            .map_err(|e| StoreError::corrupt(format!("purchase request {}: {e}", row.id)))?;
        Ok(PurchaseRequest::restore(
            PurchaseRequestId::new(row.id),
            ProductId::new(row.product_id),
            row.quantity,
            status,
        ))
    }
}

/// Map constraint violations raised by an INSERT to domain failures.
fn map_insert_error(
    err: sqlx::Error,
    on_unique: impl FnOnce() -> DomainError,
    on_foreign_key: impl FnOnce() -> DomainError,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return on_unique().into();
        }
        if db_err.is_foreign_key_violation() {
            return on_foreign_key().into();
        }
    }
    StoreError::Database(err)
}

async fn fetch_product<'e, E>(executor: E, id: ProductId) -> Result<Option<Product>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id.get())
        .fetch_optional(executor)
        .await?
        .map(Product::try_from)
        .transpose()
}

async fn fetch_request<'e, E>(
    executor: E,
    id: PurchaseRequestId,
) -> Result<Option<PurchaseRequest>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PurchaseRequestRow>(
        "SELECT id, product_id, quantity, status FROM purchase_requests WHERE id = ?1",
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await?
    .map(PurchaseRequest::try_from)
    .transpose()
}

/// SQLite-backed inventory store.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `config`. Does not create tables; see [`SqliteStore::migrate`].
    #[instrument(skip(config), fields(database_url = %config.database_url), err)]
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        // Every connection to `:memory:` is a separate database, so keep
        // exactly one alive for the lifetime of the pool.
        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        tracing::debug!("sqlite pool ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the tables if missing and seed the role catalog. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        for descriptor in Role::ALL.map(|role| role.descriptor()) {
            sqlx::query("INSERT OR IGNORE INTO user_roles (role, description) VALUES (?1, ?2)")
                .bind(descriptor.role.as_str())
                .bind(descriptor.description)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!("schema ready");
        Ok(())
    }

    /// Seeded `(role, description)` pairs, ordered by id.
    pub async fn roles(&self) -> Result<Vec<(String, String)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT role, description FROM user_roles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    #[instrument(skip(self), err)]
    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let result = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_insert_error(
                    e,
                    || DomainError::validation(format!("category '{name}' already exists")),
                    || DomainError::validation("category references a missing row"),
                )
            })?;

        Ok(Category {
            id: CategoryId::new(result.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self, product), fields(name = %product.name()), err)]
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, category_id, quantity, price, location)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(product.name())
        .bind(product.category_id().map(CategoryId::get))
        .bind(product.initial_quantity())
        .bind(product.price().amount().to_string())
        .bind(product.location())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                || DomainError::duplicate_product(product.name()),
                || {
                    let category_id = product.category_id().map_or(0, CategoryId::get);
                    DomainError::not_found("category", category_id)
                },
            )
        })?;

        Ok(product.into_product(ProductId::new(result.last_insert_rowid())))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        fetch_product(&self.pool, id).await
    }

    async fn products_below(&self, threshold: i64) -> Result<Vec<Product>, StoreError> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE quantity < ?1 ORDER BY name");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    #[instrument(
        skip(self, movement),
        fields(
            product_id = %movement.product_id,
            kind = %movement.kind,
            quantity = movement.quantity
        ),
        err
    )]
    async fn apply_movement(
        &self,
        movement: NewMovement,
    ) -> Result<(Product, Movement), StoreError> {
        let product_id = movement.product_id;
        let mut tx = self.pool.begin().await?;

        // Overflow is checked before the addition; SQLite would widen the sum to REAL.
        let updated = sqlx::query(
            r#"
            UPDATE products SET quantity = quantity + ?1
            WHERE id = ?2
              AND quantity + ?1 >= 0
              AND (?1 <= 0 OR quantity <= ?3 - ?1)
            "#,
        )
        .bind(movement.delta())
        .bind(product_id.get())
        .bind(i64::MAX)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let current = fetch_product(&mut *tx, product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("product", product_id.get()))?;
            StockLevel::new(current.quantity())?.apply(&movement)?;
            return Err(StoreError::corrupt(format!(
                "stock update for product {product_id} matched no row"
            )));
        }

        let inserted = sqlx::query(
            "INSERT INTO movements (product_id, date, quantity, kind) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(product_id.get())
        .bind(movement.date)
        .bind(movement.quantity)
        .bind(movement.kind.as_str())
        .execute(&mut *tx)
        .await?;

        let product = fetch_product(&mut *tx, product_id)
            .await?
            .ok_or_else(|| {
                StoreError::corrupt(format!("product {product_id} vanished mid-transaction"))
            })?;

        tx.commit().await?;

        let stored = movement.into_movement(MovementId::new(inserted.last_insert_rowid()));
        Ok((product, stored))
    }

    async fn movements_for(&self, product_id: ProductId) -> Result<Vec<Movement>, StoreError> {
        let sql =
            format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE product_id = ?1 ORDER BY id");
        sqlx::query_as::<_, MovementRow>(&sql)
            .bind(product_id.get())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Movement::try_from)
            .collect()
    }

    async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, StoreError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements \
             WHERE date BETWEEN ?1 AND ?2 ORDER BY date, id"
        );
        sqlx::query_as::<_, MovementRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Movement::try_from)
            .collect()
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id()), err)]
    async fn insert_purchase_request(
        &self,
        request: NewPurchaseRequest,
    ) -> Result<PurchaseRequest, StoreError> {
        let result = sqlx::query(
            "INSERT INTO purchase_requests (product_id, quantity, status) VALUES (?1, ?2, ?3)",
        )
        .bind(request.product_id().get())
        .bind(request.quantity())
        .bind(PurchaseStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                || DomainError::validation("duplicate purchase request id"),
                || DomainError::not_found("product", request.product_id().get()),
            )
        })?;

        Ok(request.into_request(PurchaseRequestId::new(result.last_insert_rowid())))
    }

    async fn get_purchase_request(
        &self,
        id: PurchaseRequestId,
    ) -> Result<Option<PurchaseRequest>, StoreError> {
        fetch_request(&self.pool, id).await
    }

    #[instrument(skip(self), err)]
    async fn decide_purchase_request(
        &self,
        id: PurchaseRequestId,
        decision: Decision,
    ) -> Result<PurchaseRequest, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE purchase_requests SET status = ?1 WHERE id = ?2 AND status = ?3",
        )
        .bind(decision.target().as_str())
        .bind(id.get())
        .bind(PurchaseStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let current = fetch_request(&mut *tx, id)
                .await?
                .ok_or_else(|| DomainError::not_found("purchase request", id.get()))?;
            current.transition(decision)?;
            return Err(StoreError::corrupt(format!(
                "status update for purchase request {id} matched no row"
            )));
        }

        let request = fetch_request(&mut *tx, id)
            .await?
            .ok_or_else(|| {
                StoreError::corrupt(format!("purchase request {id} vanished mid-transaction"))
            })?;

        tx.commit().await?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::Entity;
    use stockroom_inventory::RecordMovement;

    async fn store() -> SqliteStore {
        let store = SqliteStore::connect(&StoreConfig::in_memory()).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn new_product(name: &str, qty: i64, category: Option<CategoryId>) -> NewProduct {
        NewProduct::new(name, category, qty, "150.0".parse().unwrap(), Some("A1".into())).unwrap()
    }

    #[tokio::test]
    async fn migrate_is_idempotent_and_seeds_roles() {
        let store = store().await;
        store.migrate().await.unwrap();

        let roles = store.roles().await.unwrap();
        assert_eq!(
            roles,
            vec![
                ("stocker".to_string(), "can register and move products".to_string()),
                ("viewer".to_string(), "can query stock reports".to_string()),
                ("manager".to_string(), "can authorize purchase requests".to_string()),
            ]
        );

        let descriptors: Vec<_> = Role::ALL
            .map(|role| role.descriptor())
            .iter()
            .map(|d| (d.role.to_string(), d.description.to_string()))
            .collect();
        assert_eq!(roles, descriptors);
    }

    #[tokio::test]
    async fn product_round_trips_through_storage() {
        let store = store().await;
        let category = store.insert_category("Peripherals").await.unwrap();
        let product = store
            .insert_product(new_product("Keyboard", 10, Some(category.id)))
            .await
            .unwrap();

        let loaded = store.get_product(product.id()).await.unwrap().unwrap();
        assert_eq!(loaded, product);
        assert_eq!(loaded.price().to_string(), "150.0");
    }

    #[tokio::test]
    async fn duplicate_name_maps_to_domain_error() {
        let store = store().await;
        store.insert_product(new_product("Keyboard", 10, None)).await.unwrap();
        let err = store
            .insert_product(new_product("Keyboard", 99, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::DuplicateProduct(name)) if name == "Keyboard"
        ));
    }

    #[tokio::test]
    async fn missing_category_maps_to_not_found() {
        let store = store().await;
        let err = store
            .insert_product(new_product("Keyboard", 10, Some(CategoryId::new(42))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotFound { entity: "category", id: 42 })
        ));
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back() {
        let store = store().await;
        let product = store.insert_product(new_product("Keyboard", 12, None)).await.unwrap();

        let movement = RecordMovement::outbound(product.id(), 1000).validate(day(1)).unwrap();
        let err = store.apply_movement(movement).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InsufficientStock {
                available: 12,
                requested: 1000,
                ..
            })
        ));

        let reloaded = store.get_product(product.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.quantity(), 12);
        assert!(store.movements_for(product.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inbound_overflow_is_a_validation_error() {
        let store = store().await;
        let product = store.insert_product(new_product("Keyboard", 1, None)).await.unwrap();

        let movement = RecordMovement::inbound(product.id(), i64::MAX, "NF1")
            .validate(day(1))
            .unwrap();
        let err = store.apply_movement(movement).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));

        let reloaded = store.get_product(product.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.quantity(), 1);
        assert!(store.movements_for(product.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn movement_on_unknown_product_is_not_found() {
        let store = store().await;
        let movement = RecordMovement::inbound(ProductId::new(9), 1, "NF9")
            .validate(day(1))
            .unwrap();
        let err = store.apply_movement(movement).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotFound { entity: "product", id: 9 })
        ));
    }

    #[tokio::test]
    async fn movements_between_is_inclusive_and_ordered() {
        let store = store().await;
        let product = store.insert_product(new_product("Keyboard", 0, None)).await.unwrap();

        for (d, qty) in [(3, 1), (1, 2), (5, 3), (7, 4)] {
            let movement = RecordMovement::inbound(product.id(), qty, "NF")
                .validate(day(d))
                .unwrap();
            store.apply_movement(movement).await.unwrap();
        }

        let found = store.movements_between(day(1), day(5)).await.unwrap();
        let dates: Vec<NaiveDate> = found.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![day(1), day(3), day(5)]);
    }

    #[tokio::test]
    async fn purchase_request_for_unknown_product_is_not_found() {
        let store = store().await;
        let err = store
            .insert_purchase_request(NewPurchaseRequest::new(ProductId::new(5), 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotFound { entity: "product", id: 5 })
        ));
    }

    #[tokio::test]
    async fn second_decision_reports_invalid_state() {
        let store = store().await;
        let product = store.insert_product(new_product("Keyboard", 10, None)).await.unwrap();
        let request = store
            .insert_purchase_request(NewPurchaseRequest::new(product.id(), 20).unwrap())
            .await
            .unwrap();

        let authorized = store
            .decide_purchase_request(request.id(), Decision::Authorize)
            .await
            .unwrap();
        assert_eq!(authorized.status(), PurchaseStatus::Authorized);

        let err = store
            .decide_purchase_request(request.id(), Decision::Cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::InvalidState { .. })));

        let missing = store
            .decide_purchase_request(PurchaseRequestId::new(77), Decision::Authorize)
            .await
            .unwrap_err();
        assert!(matches!(
            missing,
            StoreError::Domain(DomainError::NotFound { entity: "purchase request", id: 77 })
        ));
    }
}
