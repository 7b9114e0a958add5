//! Data models for the Rentwear backend
//!
//! Users and products as seen by the rental logic, plus the shared API
//! response wrapper.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
    pub is_seller: bool,
    pub seller_status: SellerStatus,
    pub aadhaar_verification_status: AadhaarStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Seller onboarding status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "seller_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SellerStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

/// Aadhaar identity verification status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "aadhaar_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AadhaarStatus {
    NotSubmitted,
    Pending,
    Verified,
    Rejected,
}

/// Eligibility failure carrying the fields a client inspects to show a
/// targeted message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Ineligible {
    pub message: String,
    pub verification_status: Option<AadhaarStatus>,
    pub seller_status: Option<SellerStatus>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Renting requires a verified Aadhaar.
    pub fn ensure_can_rent(&self) -> Result<(), Ineligible> {
        if self.aadhaar_verification_status != AadhaarStatus::Verified {
            return Err(Ineligible {
                message: "Aadhaar verification is required before renting".to_string(),
                verification_status: Some(self.aadhaar_verification_status),
                seller_status: None,
            });
        }
        Ok(())
    }

    /// Listing products (and acting on requests for them) requires an
    /// approved seller with a verified Aadhaar.
    pub fn ensure_can_list(&self) -> Result<(), Ineligible> {
        if !self.is_seller || self.seller_status != SellerStatus::Approved {
            return Err(Ineligible {
                message: "Seller account is not approved".to_string(),
                verification_status: Some(self.aadhaar_verification_status),
                seller_status: Some(self.seller_status),
            });
        }
        if self.aadhaar_verification_status != AadhaarStatus::Verified {
            return Err(Ineligible {
                message: "Aadhaar verification is required before listing".to_string(),
                verification_status: Some(self.aadhaar_verification_status),
                seller_status: Some(self.seller_status),
            });
        }
        Ok(())
    }
}

/// Product as consumed by the rental logic
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    /// Hourly price
    pub price: f64,
    pub rent_price_per_day: Option<f64>,
    pub retail_price: f64,
    /// Explicit deposit override; derived from category when absent or zero
    pub security_deposit: Option<f64>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product listing status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "product_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Draft,
    PendingAdminApproval,
    Active,
    OnRent,
    Disabled,
}

impl ProductStatus {
    /// Whether new rental requests may be placed against the product
    pub fn accepts_requests(&self) -> bool {
        matches!(self, ProductStatus::Active | ProductStatus::OnRent)
    }
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}
