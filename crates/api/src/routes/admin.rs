//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users              -> list_users
/// POST   /users/{id}/ban     -> ban_user
/// POST   /users/{id}/unban   -> unban_user
/// PUT    /users/{id}/role    -> set_role
/// PUT    /users/{id}         -> update_user
/// DELETE /users/{id}         -> delete_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/users/{id}/ban", post(admin::ban_user))
        .route("/users/{id}/unban", post(admin::unban_user))
        .route("/users/{id}/role", put(admin::set_role))
}
