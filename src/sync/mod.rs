//! Client synchronization
//!
//! A background task keeps the signed-in user's rental lists fresh. It polls
//! slowly by default, switches to fast polling for a while after every
//! successful mutation, stops all network traffic while the view is hidden,
//! and never lets an older response overwrite a newer one.

mod cadence;
mod controller;
mod dispatcher;

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::client::{ClientError, Session};
use crate::rental::{
    ApproveWithRejectionResponse, CreateRentalRequest, DeliveryStatusUpdate, ExtendRentalResponse,
    InitiateReturnRequest, Rental, UpdateStatusRequest,
};

pub use cadence::{Cadence, BURST_WINDOW, FAST_INTERVAL, SLOW_INTERVAL};
pub use controller::{SyncController, SyncHandle};
pub use dispatcher::ActionDispatcher;

/// Whose rentals are kept in sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncScope {
    pub user_id: Uuid,
    /// Set for sellers: their products' rentals are synced too
    pub owner_username: Option<String>,
}

impl From<&Session> for SyncScope {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            owner_username: session.is_seller.then(|| session.username.clone()),
        }
    }
}

/// Rental lists as of one fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RentalLists {
    pub as_renter: Vec<Rental>,
    pub as_owner: Vec<Rental>,
}

/// Latest applied state published by the controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Sequence number of the fetch that produced this state; 0 before the
    /// first successful fetch
    pub seq: u64,
    pub lists: RentalLists,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Read side of the rental API
pub trait RentalFeed: Send + Sync + 'static {
    fn renter_rentals(
        &self,
        renter_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Rental>, ClientError>> + Send;

    fn owner_rentals(
        &self,
        owner_username: &str,
    ) -> impl Future<Output = Result<Vec<Rental>, ClientError>> + Send;
}

/// Mutating side of the rental API
pub trait RentalCommands: Send + Sync + 'static {
    fn create_rental(
        &self,
        request: &CreateRentalRequest,
    ) -> impl Future<Output = Result<Rental, ClientError>> + Send;

    fn approve_with_rejection(
        &self,
        rental_id: Uuid,
    ) -> impl Future<Output = Result<ApproveWithRejectionResponse, ClientError>> + Send;

    fn update_status(
        &self,
        rental_id: Uuid,
        request: &UpdateStatusRequest,
    ) -> impl Future<Output = Result<Rental, ClientError>> + Send;

    fn extend_rental(
        &self,
        rental_id: Uuid,
        additional_hours: i64,
    ) -> impl Future<Output = Result<ExtendRentalResponse, ClientError>> + Send;

    fn initiate_return(
        &self,
        rental_id: Uuid,
        request: &InitiateReturnRequest,
    ) -> impl Future<Output = Result<Rental, ClientError>> + Send;

    fn update_delivery_status(
        &self,
        rental_id: Uuid,
        update: &DeliveryStatusUpdate,
    ) -> impl Future<Output = Result<Rental, ClientError>> + Send;

    fn assign_delivery(
        &self,
        rental_id: Uuid,
        partner_id: Uuid,
    ) -> impl Future<Output = Result<Rental, ClientError>> + Send;
}
