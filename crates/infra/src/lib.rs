//! Infrastructure layer: storage backends, configuration and the
//! application services that compose them.

pub mod config;
pub mod services;
pub mod store;

pub use config::StoreConfig;
pub use services::{ServiceError, Stockroom};
pub use store::{InMemoryStore, InventoryStore, SqliteStore, StoreError};
