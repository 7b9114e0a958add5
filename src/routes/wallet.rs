//! Wallet route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallet/:owner_id", get(get_wallet_summary))
        .route(
            "/api/wallet/:owner_id/transactions",
            get(list_wallet_transactions),
        )
}
