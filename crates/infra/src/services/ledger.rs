use std::sync::Arc;

use tracing::instrument;

use stockroom_auth::{Actor, Operation, require_for};
use stockroom_core::{Clock, DomainError, ProductId, SystemClock};
use stockroom_inventory::{Movement, RecordMovement};

use super::{ServiceError, reject};
use crate::store::{InventoryStore, StoreError};

/// Records inbound and outbound stock movements.
///
/// The only writer of `Product::quantity` after registration. Each call is
/// one store transaction: the quantity changes iff the movement is logged.
pub struct StockLedger<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for StockLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: InventoryStore> StockLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock)
    }

    pub fn with_clock(store: Arc<S>, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Arc::new(clock),
        }
    }

    /// Receive stock against an invoice. Stocker only.
    #[instrument(skip(self, actor, invoice_reference), fields(actor = %actor.name))]
    pub async fn record_inbound(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
        invoice_reference: &str,
    ) -> Result<Movement, ServiceError> {
        self.record(
            actor,
            Operation::RecordInbound,
            RecordMovement::inbound(product_id, quantity, invoice_reference),
        )
        .await
    }

    /// Ship stock out. Stocker only; never takes the level below zero.
    #[instrument(skip(self, actor), fields(actor = %actor.name))]
    pub async fn record_outbound(
        &self,
        actor: &Actor,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Movement, ServiceError> {
        self.record(
            actor,
            Operation::RecordOutbound,
            RecordMovement::outbound(product_id, quantity),
        )
        .await
    }

    /// Movement history of one product, oldest first.
    pub async fn movements(&self, product_id: ProductId) -> Result<Vec<Movement>, ServiceError> {
        let operation = Operation::ProductHistory;
        match self.store.get_product(product_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(reject(
                    None,
                    operation,
                    DomainError::not_found("product", product_id.get()),
                ))
            }
            Err(e) => return Err(reject(None, operation, e)),
        }

        self.store
            .movements_for(product_id)
            .await
            .map_err(|e| reject(None, operation, e))
    }

    async fn record(
        &self,
        actor: &Actor,
        operation: Operation,
        command: RecordMovement,
    ) -> Result<Movement, ServiceError> {
        let result: Result<_, StoreError> = async {
            require_for(actor, operation)?;
            let movement = command.validate(self.clock.today())?;
            self.store.apply_movement(movement).await
        }
        .await;

        let (product, movement) = result.map_err(|e| reject(Some(actor), operation, e))?;
        tracing::info!(
            product_id = %movement.product_id,
            kind = %movement.kind,
            quantity = movement.quantity,
            level = product.quantity(),
            "stock movement recorded"
        );
        Ok(movement)
    }
}
