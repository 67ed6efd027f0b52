use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId, PurchaseRequestId};

/// Purchase request status lifecycle.
///
/// `Pending` is the only non-terminal state. Wire names match the
/// `purchase_requests.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "autorizado")]
    Authorized,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pendente",
            PurchaseStatus::Authorized => "autorizado",
            PurchaseStatus::Cancelled => "cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PurchaseStatus::Pending)
    }
}

impl core::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Authorized => "authorized",
            PurchaseStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for PurchaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(PurchaseStatus::Pending),
            "autorizado" => Ok(PurchaseStatus::Authorized),
            "cancelado" => Ok(PurchaseStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown purchase status '{other}'"
            ))),
        }
    }
}

/// A manager's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Authorize,
    Cancel,
}

impl Decision {
    pub fn target(&self) -> PurchaseStatus {
        match self {
            Decision::Authorize => PurchaseStatus::Authorized,
            Decision::Cancel => PurchaseStatus::Cancelled,
        }
    }
}

/// Command: file a purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseRequest {
    product_id: ProductId,
    quantity: i64,
}

impl NewPurchaseRequest {
    /// Product existence is checked by the store inside the insert transaction.
    pub fn new(product_id: ProductId, quantity: i64) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive (got {quantity})"
            )));
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn into_request(self, id: PurchaseRequestId) -> PurchaseRequest {
        PurchaseRequest {
            id,
            product_id: self.product_id,
            quantity: self.quantity,
            status: PurchaseStatus::Pending,
        }
    }
}

/// A purchase request as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    id: PurchaseRequestId,
    product_id: ProductId,
    quantity: i64,
    status: PurchaseStatus,
}

impl PurchaseRequest {
    /// Rebuild a request from persisted state.
    pub fn restore(
        id: PurchaseRequestId,
        product_id: ProductId,
        quantity: i64,
        status: PurchaseStatus,
    ) -> Self {
        Self {
            id,
            product_id,
            quantity,
            status,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    /// Decide the status a decision leads to. Only pending requests move.
    ///
    /// This must not mutate state; see [`PurchaseRequest::decide`].
    pub fn transition(&self, decision: Decision) -> DomainResult<PurchaseStatus> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(self.id, self.status.to_string()));
        }
        Ok(decision.target())
    }

    /// Apply a decision, returning the updated request.
    pub fn decide(mut self, decision: Decision) -> DomainResult<PurchaseRequest> {
        self.status = self.transition(decision)?;
        Ok(self)
    }
}

impl Entity for PurchaseRequest {
    type Id = PurchaseRequestId;

    fn id(&self) -> PurchaseRequestId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PurchaseRequest {
        NewPurchaseRequest::new(ProductId::new(1), 20)
            .unwrap()
            .into_request(PurchaseRequestId::new(1))
    }

    #[test]
    fn new_requests_start_pending() {
        let request = pending();
        assert_eq!(request.status(), PurchaseStatus::Pending);
        assert_eq!(request.quantity(), 20);
        assert_eq!(request.product_id(), ProductId::new(1));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        assert!(NewPurchaseRequest::new(ProductId::new(1), 0).is_err());
        assert!(NewPurchaseRequest::new(ProductId::new(1), -5).is_err());
    }

    #[test]
    fn authorize_moves_pending_to_authorized() {
        let request = pending().decide(Decision::Authorize).unwrap();
        assert_eq!(request.status(), PurchaseStatus::Authorized);
    }

    #[test]
    fn second_authorization_is_invalid_state() {
        let request = pending().decide(Decision::Authorize).unwrap();
        let err = request.transition(Decision::Authorize).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidState {
                request_id: PurchaseRequestId::new(1),
                status: "authorized".to_string(),
            }
        );
        assert_eq!(request.status(), PurchaseStatus::Authorized);
    }

    #[test]
    fn cancelled_requests_cannot_be_authorized() {
        let request = pending().decide(Decision::Cancel).unwrap();
        assert_eq!(request.status(), PurchaseStatus::Cancelled);
        assert!(matches!(
            request.decide(Decision::Authorize),
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[test]
    fn status_round_trips_storage_names() {
        for status in [
            PurchaseStatus::Pending,
            PurchaseStatus::Authorized,
            PurchaseStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<PurchaseStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Authorized).unwrap(),
            "\"autorizado\""
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn decision() -> impl Strategy<Value = Decision> {
            prop_oneof![Just(Decision::Authorize), Just(Decision::Cancel)]
        }

        proptest! {
            /// Property: only the first decision on a request takes effect.
            #[test]
            fn first_decision_is_final(decisions in proptest::collection::vec(decision(), 1..10)) {
                let mut request = pending();
                let first = decisions[0];

                for (idx, d) in decisions.iter().enumerate() {
                    match request.clone().decide(*d) {
                        Ok(next) => {
                            prop_assert_eq!(idx, 0);
                            request = next;
                        }
                        Err(DomainError::InvalidState { .. }) => prop_assert!(idx > 0),
                        Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                    }
                }

                prop_assert_eq!(request.status(), first.target());
            }
        }
    }
}
