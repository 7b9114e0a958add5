//! Rental models and data structures

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Rental agreement between a renter and a product owner
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: Uuid,
    pub product_id: Uuid,
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_hours: i64,
    /// Hourly price snapshot taken when the request was placed
    pub hourly_price: f64,
    pub total_rent: f64,
    pub service_fee: f64,
    pub security_deposit: f64,
    pub total_amount: f64,
    pub refund_amount: Option<f64>,
    pub status: RentalStatus,
    pub delivery_status: DeliveryStatus,
    pub delivery_partner_id: Option<Uuid>,
    pub pickup_requested: bool,
    pub payment_status: PaymentStatus,
    pub delivery_address: String,
    pub pickup_address: Option<String>,
    pub pickup_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Primary lifecycle state.
///
/// `confirmed`, `pending` and `picked_up` are accepted on input as aliases
/// for older clients; output always uses the canonical names.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "rental_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    #[serde(alias = "pending")]
    Requested,
    #[serde(alias = "confirmed")]
    Approved,
    #[serde(alias = "picked_up")]
    Active,
    Returned,
    Completed,
    Rejected,
    Cancelled,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Requested => "requested",
            RentalStatus::Approved => "approved",
            RentalStatus::Active => "active",
            RentalStatus::Returned => "returned",
            RentalStatus::Completed => "completed",
            RentalStatus::Rejected => "rejected",
            RentalStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" | "pending" => Ok(RentalStatus::Requested),
            "approved" | "confirmed" => Ok(RentalStatus::Approved),
            "active" | "picked_up" => Ok(RentalStatus::Active),
            "returned" => Ok(RentalStatus::Returned),
            "completed" => Ok(RentalStatus::Completed),
            "rejected" => Ok(RentalStatus::Rejected),
            "cancelled" => Ok(RentalStatus::Cancelled),
            other => Err(format!("Unknown rental status: '{}'", other)),
        }
    }
}

/// Physical logistics state, independent of [`RentalStatus`]
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    NotAssigned,
    Assigned,
    PickedFromSeller,
    InTransitToBuyer,
    DeliveredToBuyer,
    PickedFromBuyer,
    InTransitToSeller,
    ReturnedToSeller,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::NotAssigned => "not_assigned",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::PickedFromSeller => "picked_from_seller",
            DeliveryStatus::InTransitToBuyer => "in_transit_to_buyer",
            DeliveryStatus::DeliveredToBuyer => "delivered_to_buyer",
            DeliveryStatus::PickedFromBuyer => "picked_from_buyer",
            DeliveryStatus::InTransitToSeller => "in_transit_to_seller",
            DeliveryStatus::ReturnedToSeller => "returned_to_seller",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment capture state (gateway is mocked: checkout captures immediately)
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Request DTO for placing a rental request (buyer checkout)
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalRequest {
    pub product_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 500, message = "Delivery address is required"))]
    pub delivery_address: String,
    /// Total the client previewed; rejected when it differs from the quote
    pub expected_total: Option<f64>,
}

/// Request DTO for a price preview
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Request DTO for reject / generic status updates
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: RentalStatus,
    #[validate(length(max = 1000))]
    pub rejection_reason: Option<String>,
    /// Deducted from the deposit on completion
    #[validate(range(min = 0.0))]
    pub damage_deduction: Option<f64>,
}

/// Request DTO for extending an active rental
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRentalRequest {
    #[validate(range(min = 1, max = 720, message = "Additional hours must be between 1 and 720"))]
    pub additional_hours: i64,
}

/// Response DTO for an extension
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRentalResponse {
    pub additional_cost: f64,
    pub end_date: DateTime<Utc>,
    pub total_amount: f64,
}

/// Request DTO for a renter-initiated return
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitiateReturnRequest {
    #[validate(length(min = 1, max = 500, message = "Pickup address is required"))]
    pub pickup_address: String,
    #[validate(length(max = 1000))]
    pub pickup_notes: Option<String>,
}

/// Request DTO for a delivery partner status update
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatusUpdate {
    pub delivery_status: DeliveryStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Request DTO for assigning a delivery partner
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AssignDeliveryRequest {
    pub delivery_partner_id: Uuid,
}

/// Response DTO for approve-with-rejection
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApproveWithRejectionResponse {
    pub rental_id: Uuid,
    pub rejected_count: usize,
    pub delivery_partner_id: Option<Uuid>,
}

/// A pending request together with the other pending requests of the same
/// product whose dates intersect it. Display only.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    #[serde(flatten)]
    pub rental: Rental,
    pub overlaps_with: Vec<Uuid>,
}

/// Recorded delivery transition
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEvent {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub from_status: DeliveryStatus,
    pub to_status: DeliveryStatus,
    pub notes: Option<String>,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Rental event for real-time updates
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RentalEvent {
    pub rental_id: Uuid,
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    #[serde(flatten)]
    pub kind: RentalEventKind,
}

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RentalEventKind {
    Created,
    Approved { rejected_count: usize },
    StatusUpdated { status: RentalStatus },
    DeliveryUpdated { delivery_status: DeliveryStatus },
    Extended { end_date: DateTime<Utc> },
    ReturnRequested,
    Deleted,
}

impl RentalEvent {
    pub fn new(rental: &Rental, kind: RentalEventKind) -> Self {
        Self {
            rental_id: rental.id,
            renter_id: rental.renter_id,
            owner_id: rental.owner_id,
            kind,
        }
    }

    /// Whether the given user is a party to this rental
    pub fn concerns(&self, user_id: Uuid) -> bool {
        self.renter_id == user_id || self.owner_id == user_id
    }
}
