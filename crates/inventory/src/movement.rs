use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, MovementId, ProductId};

/// Direction of a stock movement. Wire names match the `movements.kind` column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    #[serde(rename = "entrada")]
    Inbound,
    #[serde(rename = "saida")]
    Outbound,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "entrada",
            MovementKind::Outbound => "saida",
        }
    }

    /// Signed quantity change this movement applies to stock.
    pub fn delta(&self, quantity: i64) -> i64 {
        match self {
            MovementKind::Inbound => quantity,
            MovementKind::Outbound => -quantity,
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrada" => Ok(MovementKind::Inbound),
            "saida" => Ok(MovementKind::Outbound),
            other => Err(DomainError::validation(format!(
                "unknown movement kind '{other}'"
            ))),
        }
    }
}

/// Command: record a stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    /// Invoice backing an inbound movement. Ignored for outbound.
    pub invoice_reference: Option<String>,
}

impl RecordMovement {
    pub fn inbound(
        product_id: ProductId,
        quantity: i64,
        invoice_reference: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            kind: MovementKind::Inbound,
            quantity,
            invoice_reference: Some(invoice_reference.into()),
        }
    }

    pub fn outbound(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            kind: MovementKind::Outbound,
            quantity,
            invoice_reference: None,
        }
    }

    /// Validate the command and stamp it with the movement date.
    ///
    /// Stock sufficiency is not checked here; it depends on the current level
    /// and is decided by [`crate::StockLevel::apply`] inside the transaction.
    pub fn validate(&self, date: NaiveDate) -> DomainResult<NewMovement> {
        if self.kind == MovementKind::Inbound {
            let has_invoice = self
                .invoice_reference
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty());
            if !has_invoice {
                return Err(DomainError::MissingInvoiceReference);
            }
        }

        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive (got {})",
                self.quantity
            )));
        }

        Ok(NewMovement {
            product_id: self.product_id,
            kind: self.kind,
            quantity: self.quantity,
            date,
        })
    }
}

/// A validated movement, not yet persisted (no id assigned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub date: NaiveDate,
}

impl NewMovement {
    pub fn delta(&self) -> i64 {
        self.kind.delta(self.quantity)
    }

    pub fn into_movement(self, id: MovementId) -> Movement {
        Movement {
            id,
            product_id: self.product_id,
            date: self.date,
            quantity: self.quantity,
            kind: self.kind,
        }
    }
}

/// An entry in the append-only movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub quantity: i64,
    pub kind: MovementKind,
}

impl Movement {
    pub fn delta(&self) -> i64 {
        self.kind.delta(self.quantity)
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> MovementId {
        self.id
    }
}
