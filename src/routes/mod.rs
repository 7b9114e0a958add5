//! Route definitions for the Rentwear API

mod admin;
mod rental;
mod wallet;

use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;

pub use admin::admin_routes;
pub use rental::rental_routes;
pub use wallet::wallet_routes;

use crate::handlers::health_check;
use crate::middleware::{rate_limit, request_tracing, security_headers, RateLimiter};
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Every route with the shared middleware stack. CORS is left to the caller.
pub fn app_router(state: AppState, rate_limiter: RateLimiter) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .merge(rental_routes())
        .merge(wallet_routes())
        .merge(admin_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_tracing))
                .layer(middleware::from_fn_with_state(rate_limiter, rate_limit))
                .layer(middleware::from_fn(security_headers)),
        )
}
