//! HTTP client for the rental API

use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{ClientError, Session};
use crate::models::ApiResponse;
use crate::rental::{
    ApproveWithRejectionResponse, AssignDeliveryRequest, CreateRentalRequest, DeliveryEvent,
    DeliveryStatusUpdate, ExtendRentalRequest, ExtendRentalResponse, InitiateReturnRequest,
    PendingRequestView, PriceQuote, QuoteRequest, Rental, UpdateStatusRequest,
};
use crate::sync::{RentalCommands, RentalFeed};
use crate::wallet::{LedgerTransaction, WalletSummary};

/// Typed wrapper over the REST endpoints under `/api`
#[derive(Clone)]
pub struct RentalApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl RentalApiClient {
    /// `base_url` includes the `/api` prefix
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url.as_ref(), e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn for_session(base_url: impl AsRef<str>, session: &Session) -> Result<Self, ClientError> {
        Ok(Self::new(base_url)?.with_token(session.token.clone()))
    }

    /// Endpoint URL with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`: the base can carry path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, segments: &[&str]) -> RequestBuilder {
        self.authorize(self.http.get(self.url(segments)))
    }

    fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> RequestBuilder {
        self.authorize(self.http.post(self.url(segments)).json(body))
    }

    fn put<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> RequestBuilder {
        self.authorize(self.http.put(self.url(segments)).json(body))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and unwrap the `{ success, data, error }` envelope
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        match envelope {
            ApiResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiResponse { error, .. } => Err(ClientError::Rejected {
                status: status.as_u16(),
                code: "UNSUCCESSFUL".to_string(),
                message: error.unwrap_or_else(|| "Request was not successful".to_string()),
            }),
        }
    }

    // ===== Reads =====

    pub async fn renter_rentals(&self, renter_id: Uuid) -> Result<Vec<Rental>, ClientError> {
        self.send(self.get(&["rentals", "renter", &renter_id.to_string()]))
            .await
    }

    pub async fn owner_rentals(&self, owner_username: &str) -> Result<Vec<Rental>, ClientError> {
        self.send(self.get(&["rentals", "owner", owner_username]))
            .await
    }

    pub async fn product_requests(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<PendingRequestView>, ClientError> {
        self.send(self.get(&["rentals", "product", &product_id.to_string(), "requests"]))
            .await
    }

    pub async fn get_rental(&self, rental_id: Uuid) -> Result<Rental, ClientError> {
        self.send(self.get(&["rentals", &rental_id.to_string()])).await
    }

    pub async fn delivery_events(&self, rental_id: Uuid) -> Result<Vec<DeliveryEvent>, ClientError> {
        self.send(self.get(&["rentals", &rental_id.to_string(), "delivery-events"]))
            .await
    }

    pub async fn quote(&self, request: &QuoteRequest) -> Result<PriceQuote, ClientError> {
        self.send(self.post(&["rentals", "quote"], request)).await
    }

    pub async fn wallet_summary(&self, owner_id: Uuid) -> Result<WalletSummary, ClientError> {
        self.send(self.get(&["wallet", &owner_id.to_string()])).await
    }

    pub async fn wallet_transactions(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<LedgerTransaction>, ClientError> {
        self.send(self.get(&["wallet", &owner_id.to_string(), "transactions"]))
            .await
    }

    // ===== Mutations =====

    pub async fn create_rental(&self, request: &CreateRentalRequest) -> Result<Rental, ClientError> {
        self.send(self.post(&["rentals"], request)).await
    }

    pub async fn approve_with_rejection(
        &self,
        rental_id: Uuid,
    ) -> Result<ApproveWithRejectionResponse, ClientError> {
        let url = self.url(&["rentals", &rental_id.to_string(), "approve-with-rejection"]);
        self.send(self.authorize(self.http.post(url))).await
    }

    pub async fn update_status(
        &self,
        rental_id: Uuid,
        request: &UpdateStatusRequest,
    ) -> Result<Rental, ClientError> {
        self.send(self.put(&["rentals", &rental_id.to_string(), "status"], request))
            .await
    }

    pub async fn extend_rental(
        &self,
        rental_id: Uuid,
        additional_hours: i64,
    ) -> Result<ExtendRentalResponse, ClientError> {
        let body = ExtendRentalRequest { additional_hours };
        self.send(self.post(&["rentals", &rental_id.to_string(), "extend"], &body))
            .await
    }

    pub async fn initiate_return(
        &self,
        rental_id: Uuid,
        request: &InitiateReturnRequest,
    ) -> Result<Rental, ClientError> {
        self.send(self.post(&["rentals", &rental_id.to_string(), "initiate-return"], request))
            .await
    }

    pub async fn update_delivery_status(
        &self,
        rental_id: Uuid,
        update: &DeliveryStatusUpdate,
    ) -> Result<Rental, ClientError> {
        self.send(self.put(&["rentals", &rental_id.to_string(), "delivery-status"], update))
            .await
    }

    pub async fn assign_delivery(
        &self,
        rental_id: Uuid,
        partner_id: Uuid,
    ) -> Result<Rental, ClientError> {
        let body = AssignDeliveryRequest {
            delivery_partner_id: partner_id,
        };
        self.send(self.post(&["rentals", &rental_id.to_string(), "assign-delivery"], &body))
            .await
    }
}

impl RentalFeed for RentalApiClient {
    async fn renter_rentals(&self, renter_id: Uuid) -> Result<Vec<Rental>, ClientError> {
        RentalApiClient::renter_rentals(self, renter_id).await
    }

    async fn owner_rentals(&self, owner_username: &str) -> Result<Vec<Rental>, ClientError> {
        RentalApiClient::owner_rentals(self, owner_username).await
    }
}

impl RentalCommands for RentalApiClient {
    async fn create_rental(&self, request: &CreateRentalRequest) -> Result<Rental, ClientError> {
        RentalApiClient::create_rental(self, request).await
    }

    async fn approve_with_rejection(
        &self,
        rental_id: Uuid,
    ) -> Result<ApproveWithRejectionResponse, ClientError> {
        RentalApiClient::approve_with_rejection(self, rental_id).await
    }

    async fn update_status(
        &self,
        rental_id: Uuid,
        request: &UpdateStatusRequest,
    ) -> Result<Rental, ClientError> {
        RentalApiClient::update_status(self, rental_id, request).await
    }

    async fn extend_rental(
        &self,
        rental_id: Uuid,
        additional_hours: i64,
    ) -> Result<ExtendRentalResponse, ClientError> {
        RentalApiClient::extend_rental(self, rental_id, additional_hours).await
    }

    async fn initiate_return(
        &self,
        rental_id: Uuid,
        request: &InitiateReturnRequest,
    ) -> Result<Rental, ClientError> {
        RentalApiClient::initiate_return(self, rental_id, request).await
    }

    async fn update_delivery_status(
        &self,
        rental_id: Uuid,
        update: &DeliveryStatusUpdate,
    ) -> Result<Rental, ClientError> {
        RentalApiClient::update_delivery_status(self, rental_id, update).await
    }

    async fn assign_delivery(&self, rental_id: Uuid, partner_id: Uuid) -> Result<Rental, ClientError> {
        RentalApiClient::assign_delivery(self, rental_id, partner_id).await
    }
}
