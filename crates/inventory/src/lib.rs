//! Stock ledger domain module.
//!
//! Business rules for stock movements, implemented as deterministic domain
//! logic (no IO, no storage). The store applies the resulting quantity delta
//! and appends the movement in one transaction.

pub mod movement;
pub mod stock;

pub use movement::{Movement, MovementKind, NewMovement, RecordMovement};
pub use stock::StockLevel;
