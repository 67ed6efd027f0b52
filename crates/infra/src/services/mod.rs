//! Application services: permission gate, then domain validation, then one
//! store transaction.
//!
//! ```text
//! actor + arguments
//!   ↓
//! 1. require_for(actor, operation)      -> PermissionDenied
//!   ↓
//! 2. build the domain command           -> Validation / MissingInvoiceReference
//!   ↓
//! 3. store transaction (commit or none) -> NotFound / DuplicateProduct / ...
//! ```
//!
//! Every failure is wrapped in a [`ServiceError`] naming the actor and the
//! operation, and logged once: permission denials by the gate, everything
//! else at the service boundary.

pub mod ledger;
pub mod purchasing;
pub mod registry;
pub mod reporting;

use std::fmt;
use std::sync::Arc;

use stockroom_auth::{Actor, Operation};
use stockroom_core::{Clock, DomainError};

use crate::store::{InventoryStore, StoreError};

pub use ledger::StockLedger;
pub use purchasing::PurchaseWorkflow;
pub use registry::ProductRegistry;
pub use reporting::{DEFAULT_LOW_STOCK_THRESHOLD, LowStockEntry, MovementEntry, ReportingReader};

/// Why a service call failed.
#[derive(Debug)]
pub enum ErrorKind {
    /// Rejected by a permission or domain rule. Nothing was written.
    Domain(DomainError),
    /// The store could not complete the transaction.
    Storage(StoreError),
}

impl From<DomainError> for ErrorKind {
    fn from(value: DomainError) -> Self {
        ErrorKind::Domain(value)
    }
}

impl From<StoreError> for ErrorKind {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(err) => ErrorKind::Domain(err),
            other => ErrorKind::Storage(other),
        }
    }
}

/// A failed service call: who tried what, and why it failed.
#[derive(Debug)]
pub struct ServiceError {
    actor: Option<String>,
    operation: Operation,
    kind: ErrorKind,
}

impl ServiceError {
    pub fn new(actor: Option<&Actor>, operation: Operation, kind: impl Into<ErrorKind>) -> Self {
        Self {
            actor: actor.map(|a| a.name.clone()),
            operation,
            kind: kind.into(),
        }
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The domain rule that rejected the call, if that is why it failed.
    pub fn domain(&self) -> Option<&DomainError> {
        match &self.kind {
            ErrorKind::Domain(err) => Some(err),
            ErrorKind::Storage(_) => None,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.kind, ErrorKind::Storage(_))
    }

    /// Denials are already reported by [`stockroom_auth::authorize`].
    fn logged_by_gate(&self) -> bool {
        matches!(self.kind, ErrorKind::Domain(DomainError::PermissionDenied { .. }))
    }

    fn log(&self) {
        if self.logged_by_gate() {
            return;
        }
        let actor = self.actor().unwrap_or("-");
        match &self.kind {
            ErrorKind::Domain(err) => tracing::warn!(
                actor,
                operation = %self.operation,
                code = err.code(),
                error = %err,
                "operation rejected"
            ),
            ErrorKind::Storage(err) => tracing::error!(
                actor,
                operation = %self.operation,
                error = %err,
                "storage failure"
            ),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(actor) = &self.actor {
            write!(f, "{actor} ")?;
        }
        write!(f, "cannot {}: ", self.operation)?;
        match &self.kind {
            ErrorKind::Domain(err) => write!(f, "{err}"),
            ErrorKind::Storage(_) => f.write_str("storage unavailable"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Domain(err) => Some(err),
            ErrorKind::Storage(err) => Some(err),
        }
    }
}

/// Wrap and log a failure at the service boundary.
pub(crate) fn reject(
    actor: Option<&Actor>,
    operation: Operation,
    kind: impl Into<ErrorKind>,
) -> ServiceError {
    let err = ServiceError::new(actor, operation, kind);
    err.log();
    err
}

/// All four services over one shared store.
pub struct Stockroom<S> {
    pub products: ProductRegistry<S>,
    pub ledger: StockLedger<S>,
    pub purchasing: PurchaseWorkflow<S>,
    pub reports: ReportingReader<S>,
}

impl<S: InventoryStore> Stockroom<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            products: ProductRegistry::new(store.clone()),
            ledger: StockLedger::new(store.clone()),
            purchasing: PurchaseWorkflow::new(store.clone()),
            reports: ReportingReader::new(store),
        }
    }

    /// Like [`Stockroom::new`], with movements dated by `clock`.
    pub fn with_clock(store: Arc<S>, clock: impl Clock + 'static) -> Self {
        Self {
            ledger: StockLedger::with_clock(store.clone(), clock),
            ..Self::new(store)
        }
    }
}
