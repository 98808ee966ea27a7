//! Route definitions for the `/account` resource.

use axum::routing::{delete, put};
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// Routes mounted at `/account`.
///
/// ```text
/// PUT    /password  -> change_password
/// DELETE /          -> delete_account
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/password", put(account::change_password))
        .route("/", delete(account::delete_account))
}
