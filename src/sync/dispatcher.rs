//! User actions: call the API, then refresh

use std::sync::Arc;

use uuid::Uuid;

use super::{RentalCommands, SyncHandle};
use crate::client::{ActionOutcome, ClientError};
use crate::rental::{
    ApproveWithRejectionResponse, CreateRentalRequest, DeliveryStatus, DeliveryStatusUpdate,
    ExtendRentalResponse, InitiateReturnRequest, Rental, RentalStatus, UpdateStatusRequest,
};

/// Runs mutations on behalf of the user. A successful mutation triggers a
/// refresh burst; a failed one is reported once and never retried.
pub struct ActionDispatcher<C: RentalCommands> {
    commands: Arc<C>,
    sync: SyncHandle,
}

impl<C: RentalCommands> Clone for ActionDispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            sync: self.sync.clone(),
        }
    }
}

impl<C: RentalCommands> ActionDispatcher<C> {
    pub fn new(commands: Arc<C>, sync: SyncHandle) -> Self {
        Self { commands, sync }
    }

    async fn finish<T>(&self, action: &'static str, result: Result<T, ClientError>) -> ActionOutcome<T> {
        match &result {
            Ok(_) => {
                tracing::debug!(action, "Action succeeded");
                self.sync.trigger_refresh().await;
            }
            Err(e) => tracing::warn!(action, error = %e, "Action failed"),
        }
        result.into()
    }

    pub async fn create_rental(&self, request: CreateRentalRequest) -> ActionOutcome<Rental> {
        let result = self.commands.create_rental(&request).await;
        self.finish("create_rental", result).await
    }

    pub async fn approve(&self, rental_id: Uuid) -> ActionOutcome<ApproveWithRejectionResponse> {
        let result = self.commands.approve_with_rejection(rental_id).await;
        self.finish("approve", result).await
    }

    pub async fn reject(&self, rental_id: Uuid, reason: Option<String>) -> ActionOutcome<Rental> {
        let request = UpdateStatusRequest {
            status: RentalStatus::Rejected,
            rejection_reason: reason,
            damage_deduction: None,
        };
        let result = self.commands.update_status(rental_id, &request).await;
        self.finish("reject", result).await
    }

    pub async fn update_status(
        &self,
        rental_id: Uuid,
        status: RentalStatus,
    ) -> ActionOutcome<Rental> {
        let request = UpdateStatusRequest {
            status,
            rejection_reason: None,
            damage_deduction: None,
        };
        let result = self.commands.update_status(rental_id, &request).await;
        self.finish("update_status", result).await
    }

    pub async fn extend(&self, rental_id: Uuid, additional_hours: i64) -> ActionOutcome<ExtendRentalResponse> {
        let result = self.commands.extend_rental(rental_id, additional_hours).await;
        self.finish("extend", result).await
    }

    pub async fn initiate_return(
        &self,
        rental_id: Uuid,
        pickup_address: String,
        pickup_notes: Option<String>,
    ) -> ActionOutcome<Rental> {
        let request = InitiateReturnRequest {
            pickup_address,
            pickup_notes,
        };
        let result = self.commands.initiate_return(rental_id, &request).await;
        self.finish("initiate_return", result).await
    }

    pub async fn update_delivery_status(
        &self,
        rental_id: Uuid,
        delivery_status: DeliveryStatus,
        notes: Option<String>,
    ) -> ActionOutcome<Rental> {
        let update = DeliveryStatusUpdate {
            delivery_status,
            notes,
        };
        let result = self.commands.update_delivery_status(rental_id, &update).await;
        self.finish("update_delivery_status", result).await
    }

    pub async fn assign_delivery(&self, rental_id: Uuid, partner_id: Uuid) -> ActionOutcome<Rental> {
        let result = self.commands.assign_delivery(rental_id, partner_id).await;
        self.finish("assign_delivery", result).await
    }
}
