use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity, ProductId, ValueObject};

/// Unit price of a product. Always strictly positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price must be positive (got {amount})"
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Price {}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid price '{s}': {e}")))?;
        Self::new(amount)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Command: register a product.
///
/// Construction validates everything that can be checked without storage;
/// name uniqueness is the store's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    name: String,
    category_id: Option<CategoryId>,
    initial_quantity: i64,
    price: Price,
    location: Option<String>,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        category_id: Option<CategoryId>,
        initial_quantity: i64,
        price: Price,
        location: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if initial_quantity < 0 {
            return Err(DomainError::validation(format!(
                "initial quantity cannot be negative (got {initial_quantity})"
            )));
        }

        Ok(Self {
            name,
            category_id,
            initial_quantity,
            price,
            location: location.filter(|l| !l.trim().is_empty()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn initial_quantity(&self) -> i64 {
        self.initial_quantity
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Materialize the product once the store has assigned its id.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            category_id: self.category_id,
            quantity: self.initial_quantity,
            price: self.price,
            location: self.location,
        }
    }
}

/// A registered product.
///
/// `quantity` is only ever changed by the stock ledger; this type exposes no
/// setter for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category_id: Option<CategoryId>,
    quantity: i64,
    price: Price,
    location: Option<String>,
}

impl Product {
    /// Rebuild a product from persisted state.
    pub fn restore(
        id: ProductId,
        name: String,
        category_id: Option<CategoryId>,
        quantity: i64,
        price: Price,
        location: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            category_id,
            quantity,
            price,
            location,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}
