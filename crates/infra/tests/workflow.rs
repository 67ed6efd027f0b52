//! End-to-end warehouse workflows, run against every store backend.
//!
//! Walkthrough: Keyboard (qty 10, price 150.0) → inbound 5 with "NF1" → 15 →
//! outbound 3 → 12 → outbound 1000 fails → request 20 by a viewer →
//! authorize → second authorize fails.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use stockroom_auth::Actor;
use stockroom_core::{DomainError, Entity, FixedClock, ProductId, PurchaseRequestId};
use stockroom_infra::config::StoreConfig;
use stockroom_infra::services::{LowStockEntry, Stockroom};
use stockroom_infra::store::{InMemoryStore, InventoryStore, SqliteStore};
use stockroom_inventory::MovementKind;
use stockroom_purchasing::PurchaseStatus;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
}

fn stocker() -> Actor {
    Actor::stocker("João")
}

fn viewer() -> Actor {
    Actor::viewer("Maria")
}

fn manager() -> Actor {
    Actor::manager("Carlos")
}

async fn sqlite_memory() -> Arc<SqliteStore> {
    stockroom_observability::tracing::init_for_tests();
    let store = SqliteStore::connect(&StoreConfig::in_memory()).await.unwrap();
    store.migrate().await.unwrap();
    Arc::new(store)
}

fn in_memory() -> Arc<InMemoryStore> {
    stockroom_observability::tracing::init_for_tests();
    Arc::new(InMemoryStore::new())
}

/// A database file of its own under the temp dir, removed on drop.
struct TempDb(PathBuf);

impl TempDb {
    fn new(tag: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let path = std::env::temp_dir().join(format!(
            "stockroom-{tag}-{}-{nanos}.db",
            std::process::id()
        ));
        Self(path)
    }

    fn config(&self) -> StoreConfig {
        StoreConfig {
            database_url: format!("sqlite://{}", self.0.display()),
            max_connections: 4,
            ..StoreConfig::default()
        }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

async fn register_keyboard<S: InventoryStore>(app: &Stockroom<S>) -> ProductId {
    app.products
        .register(&stocker(), "Keyboard", None, 10, Decimal::new(1500, 1), Some("A1"))
        .await
        .unwrap()
        .id()
}

async fn walkthrough<S: InventoryStore>(store: Arc<S>) {
    let app = Stockroom::with_clock(store, FixedClock(today()));

    // 1. Register.
    let keyboard = register_keyboard(&app).await;
    let product = app.products.get(keyboard).await.unwrap();
    assert_eq!(product.quantity(), 10);
    assert_eq!(product.price().amount(), Decimal::new(1500, 1));
    assert_eq!(app.products.locate(keyboard).await.unwrap().as_deref(), Some("A1"));

    // 2. Inbound with invoice.
    let inbound = app
        .ledger
        .record_inbound(&stocker(), keyboard, 5, "NF1")
        .await
        .unwrap();
    assert_eq!(inbound.kind, MovementKind::Inbound);
    assert_eq!(inbound.date, today());
    assert_eq!(app.products.get(keyboard).await.unwrap().quantity(), 15);

    // 3. Outbound.
    app.ledger.record_outbound(&stocker(), keyboard, 3).await.unwrap();
    assert_eq!(app.products.get(keyboard).await.unwrap().quantity(), 12);

    // 4. Oversized outbound leaves everything as it was.
    let err = app
        .ledger
        .record_outbound(&stocker(), keyboard, 1000)
        .await
        .unwrap_err();
    assert_eq!(
        err.domain(),
        Some(&DomainError::InsufficientStock {
            product_id: keyboard,
            available: 12,
            requested: 1000,
        })
    );
    assert_eq!(app.products.get(keyboard).await.unwrap().quantity(), 12);

    let history = app.ledger.movements(keyboard).await.unwrap();
    let kinds: Vec<(MovementKind, i64)> = history.iter().map(|m| (m.kind, m.quantity)).collect();
    assert_eq!(kinds, vec![(MovementKind::Inbound, 5), (MovementKind::Outbound, 3)]);

    // 5. Request, authorize, authorize again.
    let request = app.purchasing.request(&viewer(), keyboard, 20).await.unwrap();
    assert_eq!(request.status(), PurchaseStatus::Pending);

    let authorized = app.purchasing.authorize(&manager(), request.id()).await.unwrap();
    assert_eq!(authorized.status(), PurchaseStatus::Authorized);

    let err = app
        .purchasing
        .authorize(&manager(), request.id())
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::InvalidState { .. })));
    assert_eq!(
        app.purchasing.get(request.id()).await.unwrap().status(),
        PurchaseStatus::Authorized
    );

    // Authorization does not move stock.
    assert_eq!(app.products.get(keyboard).await.unwrap().quantity(), 12);

    // Reports.
    let movements = app
        .reports
        .movements_in_range(&viewer(), today(), today())
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert!(
        app.reports
            .low_stock_products(&viewer(), 10)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        app.reports.low_stock_products(&viewer(), 13).await.unwrap(),
        vec![LowStockEntry { name: "Keyboard".into(), quantity: 12 }]
    );
}

async fn duplicate_and_permissions<S: InventoryStore>(store: Arc<S>) {
    let app = Stockroom::new(store);
    let keyboard = register_keyboard(&app).await;

    let err = app
        .products
        .register(&stocker(), "Keyboard", None, 99, Decimal::ONE, Some("Z9"))
        .await
        .unwrap_err();
    assert_eq!(err.domain(), Some(&DomainError::DuplicateProduct("Keyboard".into())));
    let first = app.products.get(keyboard).await.unwrap();
    assert_eq!(first.quantity(), 10);
    assert_eq!(first.location(), Some("A1"));

    // Names are case-sensitive.
    app.products
        .register(&stocker(), "keyboard", None, 1, Decimal::ONE, None)
        .await
        .unwrap();

    // A manager cannot run stocker operations.
    let err = app
        .ledger
        .record_inbound(&manager(), keyboard, 5, "NF2")
        .await
        .unwrap_err();
    assert!(matches!(err.domain(), Some(DomainError::PermissionDenied { .. })));
    let expected = "Carlos cannot record inbound stock: \
                    permission denied: Carlos (role: manager) requires role stocker";
    assert_eq!(err.to_string(), expected);
    assert!(app.ledger.movements(keyboard).await.unwrap().is_empty());
}

async fn categories_are_enforced<S: InventoryStore>(store: Arc<S>) {
    let category = store.insert_category("Peripherals").await.unwrap();
    let app = Stockroom::new(store.clone());

    let product = app
        .products
        .register(&stocker(), "Mouse", Some(category.id), 4, Decimal::ONE, None)
        .await
        .unwrap();
    assert_eq!(product.category_id(), Some(category.id));

    let err = app
        .products
        .register(
            &stocker(),
            "Trackball",
            Some(stockroom_core::CategoryId::new(category.id.get() + 1)),
            4,
            Decimal::ONE,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.domain(),
        Some(DomainError::NotFound { entity: "category", .. })
    ));
    assert_eq!(store.list_categories().await.unwrap(), vec![category]);
}

async fn overflow_is_rejected<S: InventoryStore>(store: Arc<S>) {
    let app = Stockroom::new(store);
    let cable = app
        .products
        .register(&stocker(), "Cable", None, 1, Decimal::ONE, None)
        .await
        .unwrap()
        .id();

    let err = app
        .ledger
        .record_inbound(&stocker(), cable, i64::MAX, "NF1")
        .await
        .unwrap_err();
    assert!(!err.is_storage(), "unexpected storage failure: {err}");
    assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
    assert_eq!(app.products.get(cable).await.unwrap().quantity(), 1);
    assert!(app.ledger.movements(cable).await.unwrap().is_empty());
}

async fn lookups_name_their_operation<S: InventoryStore>(store: Arc<S>) {
    let app = Stockroom::new(store);

    let err = app.products.get(ProductId::new(9)).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot look up product: product 9 not found");

    let err = app.products.locate(ProductId::new(9)).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot locate product: product 9 not found");

    let err = app.ledger.movements(ProductId::new(9)).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot read product history: product 9 not found");

    let err = app.purchasing.get(PurchaseRequestId::new(9)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot look up purchase request: purchase request 9 not found"
    );
}

#[tokio::test]
async fn walkthrough_in_memory() {
    walkthrough(in_memory()).await;
}

#[tokio::test]
async fn walkthrough_sqlite() {
    walkthrough(sqlite_memory().await).await;
}

#[tokio::test]
async fn duplicates_and_permissions_in_memory() {
    duplicate_and_permissions(in_memory()).await;
}

#[tokio::test]
async fn duplicates_and_permissions_sqlite() {
    duplicate_and_permissions(sqlite_memory().await).await;
}

#[tokio::test]
async fn categories_in_memory() {
    categories_are_enforced(in_memory()).await;
}

#[tokio::test]
async fn overflow_in_memory() {
    overflow_is_rejected(in_memory()).await;
}

#[tokio::test]
async fn overflow_sqlite() {
    overflow_is_rejected(sqlite_memory().await).await;
}

#[tokio::test]
async fn lookups_in_memory() {
    lookups_name_their_operation(in_memory()).await;
}

#[tokio::test]
async fn lookups_sqlite() {
    lookups_name_their_operation(sqlite_memory().await).await;
}

#[tokio::test]
async fn categories_sqlite() {
    categories_are_enforced(sqlite_memory().await).await;
}

#[tokio::test]
async fn sqlite_state_survives_reconnect() {
    let db = TempDb::new("reconnect");
    let keyboard = {
        let store = SqliteStore::connect(&db.config()).await.unwrap();
        store.migrate().await.unwrap();
        let app = Stockroom::with_clock(Arc::new(store.clone()), FixedClock(today()));
        let keyboard = register_keyboard(&app).await;
        app.ledger.record_inbound(&stocker(), keyboard, 5, "NF1").await.unwrap();
        store.pool().close().await;
        keyboard
    };

    let store = SqliteStore::connect(&db.config()).await.unwrap();
    store.migrate().await.unwrap();
    let app = Stockroom::new(Arc::new(store));
    assert_eq!(app.products.get(keyboard).await.unwrap().quantity(), 15);
    assert_eq!(app.ledger.movements(keyboard).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_outbound_never_oversells() {
    let db = TempDb::new("oversell");
    let store = SqliteStore::connect(&db.config()).await.unwrap();
    store.migrate().await.unwrap();
    let app = Arc::new(Stockroom::new(Arc::new(store)));
    let keyboard = register_keyboard(app.as_ref()).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.ledger.record_outbound(&stocker(), keyboard, 1).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(
                matches!(err.domain(), Some(DomainError::InsufficientStock { .. })),
                "unexpected error: {err}"
            ),
        }
    }

    assert_eq!(accepted, 10);
    assert_eq!(app.products.get(keyboard).await.unwrap().quantity(), 0);
    assert_eq!(app.ledger.movements(keyboard).await.unwrap().len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decisions_apply_once() {
    let db = TempDb::new("decide");
    let store = SqliteStore::connect(&db.config()).await.unwrap();
    store.migrate().await.unwrap();
    let app = Arc::new(Stockroom::new(Arc::new(store)));
    let keyboard = register_keyboard(app.as_ref()).await;
    let request = app.purchasing.request(&viewer(), keyboard, 20).await.unwrap();
    let request_id = request.id();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    app.purchasing.authorize(&manager(), request_id).await
                } else {
                    app.purchasing.cancel(&manager(), request_id).await
                }
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(decided) => winners.push(decided.status()),
            Err(err) => assert!(matches!(err.domain(), Some(DomainError::InvalidState { .. }))),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(app.purchasing.get(request_id).await.unwrap().status(), winners[0]);
}
