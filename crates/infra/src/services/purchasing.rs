use std::sync::Arc;

use tracing::instrument;

use stockroom_auth::{Actor, Operation, require_for};
use stockroom_core::{DomainError, Entity, ProductId, PurchaseRequestId};
use stockroom_purchasing::{Decision, NewPurchaseRequest, PurchaseRequest};

use super::{ServiceError, reject};
use crate::store::{InventoryStore, StoreError};

/// Purchase request lifecycle: viewers file, managers decide.
///
/// Decisions never touch stock; receiving the goods is a separate inbound
/// movement.
pub struct PurchaseWorkflow<S> {
    store: Arc<S>,
}

impl<S> Clone for PurchaseWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: InventoryStore> PurchaseWorkflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.name))]
    pub async fn request(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<PurchaseRequest, ServiceError> {
        let operation = Operation::RequestPurchase;
        let result: Result<PurchaseRequest, StoreError> = async {
            require_for(actor, operation)?;
            let command = NewPurchaseRequest::new(product_id, quantity)?;
            self.store.insert_purchase_request(command).await
        }
        .await;

        let request = result.map_err(|e| reject(Some(actor), operation, e))?;
        tracing::info!(request_id = %request.id(), "purchase request filed");
        Ok(request)
    }

    /// Approve a pending request. Manager only.
    #[instrument(skip(self, actor), fields(actor = %actor.name))]
    pub async fn authorize(
        &self,
        actor: &Actor,
        request_id: PurchaseRequestId,
    ) -> Result<PurchaseRequest, ServiceError> {
        self.decide(actor, Operation::AuthorizePurchase, request_id, Decision::Authorize)
            .await
    }

    /// Withdraw a pending request. Manager only.
    #[instrument(skip(self, actor), fields(actor = %actor.name))]
    pub async fn cancel(
        &self,
        actor: &Actor,
        request_id: PurchaseRequestId,
    ) -> Result<PurchaseRequest, ServiceError> {
        self.decide(actor, Operation::CancelPurchase, request_id, Decision::Cancel)
            .await
    }

    pub async fn get(
        &self,
        request_id: PurchaseRequestId,
    ) -> Result<PurchaseRequest, ServiceError> {
        let operation = Operation::GetPurchaseRequest;
        match self.store.get_purchase_request(request_id).await {
            Ok(Some(request)) => Ok(request),
            Ok(None) => Err(reject(
                None,
                operation,
                DomainError::not_found("purchase request", request_id.get()),
            )),
            Err(e) => Err(reject(None, operation, e)),
        }
    }

    async fn decide(
        &self,
        actor: &Actor,
        operation: Operation,
        request_id: PurchaseRequestId,
        decision: Decision,
    ) -> Result<PurchaseRequest, ServiceError> {
        let result: Result<PurchaseRequest, StoreError> = async {
            require_for(actor, operation)?;
            self.store.decide_purchase_request(request_id, decision).await
        }
        .await;

        let request = result.map_err(|e| reject(Some(actor), operation, e))?;
        tracing::info!(
            request_id = %request.id(),
            status = %request.status(),
            "purchase request decided"
        );
        Ok(request)
    }
}
