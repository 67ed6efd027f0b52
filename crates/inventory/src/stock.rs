use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

use crate::{MovementKind, NewMovement};

/// On-hand quantity of one product. Never negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevel(i64);

impl StockLevel {
    pub fn new(quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation(format!(
                "stock level cannot be negative (got {quantity})"
            )));
        }
        Ok(Self(quantity))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Decide the level after `movement`.
    ///
    /// Outbound movements larger than the current level fail with
    /// `InsufficientStock`; the level itself is left untouched.
    pub fn apply(self, movement: &NewMovement) -> DomainResult<StockLevel> {
        if movement.kind == MovementKind::Outbound && movement.quantity > self.0 {
            return Err(DomainError::InsufficientStock {
                product_id: movement.product_id,
                available: self.0,
                requested: movement.quantity,
            });
        }

        let next = self
            .0
            .checked_add(movement.delta())
            .ok_or_else(|| DomainError::validation("stock level overflow"))?;
        Ok(StockLevel(next))
    }
}
