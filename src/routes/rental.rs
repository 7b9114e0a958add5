//! Rental route definitions

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn rental_routes() -> Router<AppState> {
    Router::new()
        .route("/api/rentals", post(create_rental))
        .route("/api/rentals/quote", post(quote_rental))
        .route("/api/rentals/renter/:user_id", get(list_renter_rentals))
        .route("/api/rentals/owner/:username", get(list_owner_rentals))
        .route(
            "/api/rentals/product/:product_id/requests",
            get(list_product_requests),
        )
        .route("/api/rentals/:id", get(get_rental))
        .route(
            "/api/rentals/:id/approve-with-rejection",
            post(approve_with_rejection),
        )
        .route("/api/rentals/:id/status", put(update_rental_status))
        .route("/api/rentals/:id/extend", post(extend_rental))
        .route("/api/rentals/:id/initiate-return", post(initiate_return))
        .route(
            "/api/rentals/:id/delivery-status",
            put(update_delivery_status),
        )
        .route("/api/rentals/:id/assign-delivery", post(assign_delivery))
        .route(
            "/api/rentals/:id/delivery-events",
            get(list_delivery_events),
        )
}
