//! Purchasing domain module (purchase requests).
//!
//! Business rules for the purchase-request lifecycle, implemented as
//! deterministic domain logic (no IO, no storage).

pub mod request;

pub use request::{Decision, NewPurchaseRequest, PurchaseRequest, PurchaseStatus};
