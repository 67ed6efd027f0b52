//! Domain error model.

use thiserror::Error;

use crate::id::{ProductId, PurchaseRequestId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (permissions,
/// invariants, lifecycle violations). Storage concerns belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The acting user's role does not match the role the operation requires.
    #[error("permission denied: {actor} (role: {role}) requires role {required}")]
    PermissionDenied {
        actor: String,
        role: String,
        required: String,
    },

    /// A product with the same (case-sensitive) name is already registered.
    #[error("product '{0}' is already registered")]
    DuplicateProduct(String),

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Inbound movements must carry an invoice reference.
    #[error("an invoice reference is required to record inbound stock")]
    MissingInvoiceReference,

    /// An outbound movement would take stock below zero.
    #[error(
        "insufficient stock for product {product_id}: \
         {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// A purchase request is no longer pending.
    #[error("purchase request {request_id} is already {status}")]
    InvalidState {
        request_id: PurchaseRequestId,
        status: String,
    },

    /// A value failed validation (e.g. non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn duplicate_product(name: impl Into<String>) -> Self {
        Self::DuplicateProduct(name.into())
    }

    pub fn invalid_state(request_id: PurchaseRequestId, status: impl Into<String>) -> Self {
        Self::InvalidState {
            request_id,
            status: status.into(),
        }
    }

    /// Short, stable identifier for the failure class (useful for logs/metrics).
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "permission_denied",
            Self::DuplicateProduct(_) => "duplicate_product",
            Self::NotFound { .. } => "not_found",
            Self::MissingInvoiceReference => "missing_invoice_reference",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidState { .. } => "invalid_state",
            Self::Validation(_) => "validation",
        }
    }
}
