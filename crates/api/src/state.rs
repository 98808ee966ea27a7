use std::sync::Arc;

use gotta_listen_db::DbPool;

use crate::auth::service::AuthService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service over the configured stores.
    pub auth: Arc<AuthService>,
    /// Database connection pool; `None` on the memory backend.
    pub pool: Option<DbPool>,
}
