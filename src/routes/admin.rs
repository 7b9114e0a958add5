//! Admin route definitions

use axum::{routing::delete, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/admin/rentals/:id", delete(force_delete_rental))
}
