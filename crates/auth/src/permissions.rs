use serde::{Deserialize, Serialize};

use crate::Role;

/// Gated operations exposed by the core.
///
/// Each operation maps to exactly one required role (static policy table).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    RegisterProduct,
    LocateProduct,
    GetProduct,
    ProductHistory,
    RecordInbound,
    RecordOutbound,
    RequestPurchase,
    AuthorizePurchase,
    CancelPurchase,
    GetPurchaseRequest,
    LowStockReport,
    MovementReport,
}

impl Operation {
    /// Role an actor must hold to run this operation, if any.
    ///
    /// Lookups (`LocateProduct`, `GetProduct`, `ProductHistory`,
    /// `GetPurchaseRequest`) are ungated.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Operation::RegisterProduct | Operation::RecordInbound | Operation::RecordOutbound => {
                Some(Role::Stocker)
            }
            Operation::RequestPurchase
            | Operation::LowStockReport
            | Operation::MovementReport => Some(Role::Viewer),
            Operation::AuthorizePurchase | Operation::CancelPurchase => Some(Role::Manager),
            Operation::LocateProduct
            | Operation::GetProduct
            | Operation::ProductHistory
            | Operation::GetPurchaseRequest => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::RegisterProduct => "register product",
            Operation::LocateProduct => "locate product",
            Operation::GetProduct => "look up product",
            Operation::ProductHistory => "read product history",
            Operation::RecordInbound => "record inbound stock",
            Operation::RecordOutbound => "record outbound stock",
            Operation::RequestPurchase => "request purchase",
            Operation::AuthorizePurchase => "authorize purchase request",
            Operation::CancelPurchase => "cancel purchase request",
            Operation::GetPurchaseRequest => "look up purchase request",
            Operation::LowStockReport => "query low stock",
            Operation::MovementReport => "query stock movements",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
