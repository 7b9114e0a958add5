//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthKeys;
use crate::rental::RentalService;
use crate::wallet::WalletService;
use crate::websocket::WsState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub rental_service: Arc<RentalService>,
    pub wallet_service: Arc<WalletService>,
    pub auth_keys: Arc<AuthKeys>,
    pub ws_state: WsState,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        rental_service: Arc<RentalService>,
        wallet_service: Arc<WalletService>,
        auth_keys: Arc<AuthKeys>,
        ws_state: WsState,
    ) -> Self {
        Self {
            db_pool,
            rental_service,
            wallet_service,
            auth_keys,
            ws_state,
        }
    }
}

impl FromRef<AppState> for WsState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ws_state.clone()
    }
}

impl FromRef<AppState> for Arc<RentalService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rental_service.clone()
    }
}

impl FromRef<AppState> for Arc<WalletService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.wallet_service.clone()
    }
}

impl FromRef<AppState> for Arc<AuthKeys> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_keys.clone()
    }
}
