//! Scripted warehouse session against the configured database.
//!
//! Registers two products, moves stock, runs both reports and takes a
//! purchase request through authorization. Set `STOCKROOM_DATABASE_URL` to
//! point it elsewhere, and `RUST_LOG` to change verbosity.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use stockroom_auth::Actor;
use stockroom_core::{DomainError, Entity};
use stockroom_infra::{InventoryStore, SqliteStore, Stockroom, StoreConfig};

const CATEGORY: &str = "Periféricos";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = StoreConfig::from_env();
    tracing::info!(database_url = %config.database_url, "opening store");

    let store = SqliteStore::connect(&config)
        .await
        .context("failed to open the stock database")?;
    store.migrate().await.context("failed to prepare the schema")?;

    for (role, description) in store.roles().await? {
        tracing::info!(role = %role, description = %description, "role available");
    }

    let store = Arc::new(store);
    let category = match store
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.name == CATEGORY)
    {
        Some(existing) => existing,
        None => store.insert_category(CATEGORY).await?,
    };

    let app = Stockroom::new(store);
    let stocker = Actor::stocker("João");
    let viewer = Actor::viewer("Maria");
    let manager = Actor::manager("Carlos");

    let keyboard = match app
        .products
        .register(&stocker, "Teclado", Some(category.id), 10, Decimal::new(1500, 1), Some("A1"))
        .await
    {
        Ok(product) => product,
        Err(err) if matches!(err.domain(), Some(DomainError::DuplicateProduct(_))) => {
            tracing::warn!(
                "demo data already present; \
                 point STOCKROOM_DATABASE_URL at a fresh database"
            );
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    app.products
        .register(&stocker, "Mouse", Some(category.id), 5, Decimal::new(800, 1), Some("A2"))
        .await?;

    let location = app.products.locate(keyboard.id()).await?;
    tracing::info!(product_id = %keyboard.id(), location = ?location, "product located");

    app.ledger
        .record_inbound(&stocker, keyboard.id(), 5, "NF12345")
        .await?;
    app.ledger.record_outbound(&stocker, keyboard.id(), 3).await?;

    // Rejected: more than is on hand. Logged by the service.
    if let Err(err) = app.ledger.record_outbound(&stocker, keyboard.id(), 1000).await {
        tracing::info!(error = %err, "oversized outbound refused");
    }

    let low = app.reports.low_stock_products(&viewer, 5).await?;
    tracing::info!(report = %serde_json::to_string(&low)?, "low stock");

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;
    let end = chrono::Utc::now().date_naive();
    let movements = app.reports.movements_in_range(&viewer, start, end).await?;
    tracing::info!(report = %serde_json::to_string(&movements)?, "movements");

    let request = app.purchasing.request(&viewer, keyboard.id(), 20).await?;
    let request = app.purchasing.authorize(&manager, request.id()).await?;
    tracing::info!(request_id = %request.id(), status = %request.status(), "purchase decided");

    let stock = app.products.get(keyboard.id()).await?;
    tracing::info!(product = stock.name(), quantity = stock.quantity(), "final level");

    Ok(())
}
