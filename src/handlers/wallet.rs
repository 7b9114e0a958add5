//! Seller wallet HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::handlers::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::wallet::{LedgerTransaction, WalletSummary};
use crate::state::AppState;

fn ensure_own_wallet(user: &AuthenticatedUser, owner_id: Uuid) -> ApiResult<()> {
    if owner_id == user.user_id || user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You can only view your own wallet".to_string(),
        ))
    }
}

/// GET /api/wallet/:ownerId
pub async fn get_wallet_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(owner_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<WalletSummary>>> {
    ensure_own_wallet(&user, owner_id)?;
    let summary = state.wallet_service.get_summary(owner_id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/wallet/:ownerId/transactions
pub async fn list_wallet_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(owner_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<LedgerTransaction>>>> {
    ensure_own_wallet(&user, owner_id)?;
    let transactions = state.wallet_service.list_transactions(owner_id).await?;
    Ok(Json(ApiResponse::ok(transactions)))
}
