//! Rental API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{AdminUser, AuthenticatedUser};
use crate::models::ApiResponse;
use crate::rental::{
    ApproveWithRejectionResponse, AssignDeliveryRequest, CreateRentalRequest, DeliveryEvent,
    DeliveryStatusUpdate, ExtendRentalRequest, ExtendRentalResponse, InitiateReturnRequest,
    PendingRequestView, PriceQuote, QuoteRequest, Rental, RentalEvent, RentalEventKind,
    UpdateStatusRequest,
};
use crate::state::AppState;

// ===== Reads =====

/// GET /api/rentals/renter/:userId
pub async fn list_renter_rentals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(renter_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Rental>>>> {
    if renter_id != user.user_id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only view your own rentals".to_string(),
        ));
    }

    let rentals = state.rental_service.list_for_renter(renter_id).await?;
    Ok(Json(ApiResponse::ok(rentals)))
}

/// GET /api/rentals/owner/:username
pub async fn list_owner_rentals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(username): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<Rental>>>> {
    if username != user.username && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only view rentals of your own products".to_string(),
        ));
    }

    let rentals = state.rental_service.list_for_owner(&username).await?;
    Ok(Json(ApiResponse::ok(rentals)))
}

/// GET /api/rentals/product/:productId/requests
pub async fn list_product_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<PendingRequestView>>>> {
    let pending = state
        .rental_service
        .pending_for_product(product_id, user.actor())
        .await?;
    Ok(Json(ApiResponse::ok(pending)))
}

/// GET /api/rentals/:id
pub async fn get_rental(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Rental>>> {
    let rental = state.rental_service.get_rental_for(id, user.actor()).await?;
    Ok(Json(ApiResponse::ok(rental)))
}

/// GET /api/rentals/:id/delivery-events
pub async fn list_delivery_events(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<DeliveryEvent>>>> {
    state.rental_service.get_rental_for(id, user.actor()).await?;
    let events = state.rental_service.delivery_events(id).await?;
    Ok(Json(ApiResponse::ok(events)))
}

/// POST /api/rentals/quote
pub async fn quote_rental(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<Json<ApiResponse<PriceQuote>>> {
    let quote = state.rental_service.quote(&request).await?;
    Ok(Json(ApiResponse::ok(quote)))
}

// ===== Mutations =====

/// POST /api/rentals
pub async fn create_rental(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateRentalRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Rental>>)> {
    request.validate()?;

    let rental = state
        .rental_service
        .create_rental(user.user_id, request)
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(&rental, RentalEventKind::Created))
        .await;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(rental))))
}

/// POST /api/rentals/:id/approve-with-rejection
pub async fn approve_with_rejection(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ApproveWithRejectionResponse>>> {
    let approval = state
        .rental_service
        .approve_with_rejection(id, user.actor())
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(
            &approval.approved,
            RentalEventKind::Approved {
                rejected_count: approval.response.rejected_count,
            },
        ))
        .await;
    for rejected in &approval.rejected {
        state
            .ws_state
            .broadcast_event(RentalEvent::new(
                rejected,
                RentalEventKind::StatusUpdated {
                    status: rejected.status,
                },
            ))
            .await;
    }

    Ok(Json(ApiResponse::ok(approval.response)))
}

/// PUT /api/rentals/:id/status
pub async fn update_rental_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<Rental>>> {
    let rental = state
        .rental_service
        .update_status(id, user.actor(), request)
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(
            &rental,
            RentalEventKind::StatusUpdated {
                status: rental.status,
            },
        ))
        .await;

    Ok(Json(ApiResponse::ok(rental)))
}

/// POST /api/rentals/:id/extend
pub async fn extend_rental(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ExtendRentalRequest>,
) -> ApiResult<Json<ApiResponse<ExtendRentalResponse>>> {
    request.validate()?;

    let (response, rental) = state
        .rental_service
        .extend(id, user.actor(), request.additional_hours)
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(
            &rental,
            RentalEventKind::Extended {
                end_date: rental.end_date,
            },
        ))
        .await;

    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/rentals/:id/initiate-return
pub async fn initiate_return(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<InitiateReturnRequest>,
) -> ApiResult<Json<ApiResponse<Rental>>> {
    let rental = state
        .rental_service
        .initiate_return(id, user.actor(), request)
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(&rental, RentalEventKind::ReturnRequested))
        .await;

    Ok(Json(ApiResponse::ok(rental)))
}

/// PUT /api/rentals/:id/delivery-status
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(update): Json<DeliveryStatusUpdate>,
) -> ApiResult<Json<ApiResponse<Rental>>> {
    let rental = state
        .rental_service
        .update_delivery_status(id, user.actor(), update)
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(
            &rental,
            RentalEventKind::DeliveryUpdated {
                delivery_status: rental.delivery_status,
            },
        ))
        .await;

    Ok(Json(ApiResponse::ok(rental)))
}

/// POST /api/rentals/:id/assign-delivery
pub async fn assign_delivery(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDeliveryRequest>,
) -> ApiResult<Json<ApiResponse<Rental>>> {
    let rental = state
        .rental_service
        .assign_delivery(id, user.actor(), request.delivery_partner_id)
        .await?;

    state
        .ws_state
        .broadcast_event(RentalEvent::new(
            &rental,
            RentalEventKind::DeliveryUpdated {
                delivery_status: rental.delivery_status,
            },
        ))
        .await;

    Ok(Json(ApiResponse::ok(rental)))
}

// ===== Admin =====

/// DELETE /api/admin/rentals/:id
pub async fn force_delete_rental(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Rental>>> {
    let rental = state.rental_service.force_delete(id).await?;
    tracing::warn!(rental_id = %id, admin_id = %admin.user_id, "Admin deleted rental");

    state
        .ws_state
        .broadcast_event(RentalEvent::new(&rental, RentalEventKind::Deleted))
        .await;

    Ok(Json(ApiResponse::ok(rental)))
}
