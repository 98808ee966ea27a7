//! Handlers for the `/admin/users` resource.
//!
//! All handlers require the caller to be an admin via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use gotta_listen_core::types::DbId;
use gotta_listen_db::models::user::UserResponse;
use serde::Deserialize;

use crate::auth::accounts::AdminUserUpdate;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users/{id}/ban`.
#[derive(Debug, Deserialize)]
pub struct BanRequest {
    /// Days until the ban lifts; `0` bans permanently.
    #[serde(default)]
    pub duration_days: u32,
    /// Also record the user's last login IP as banned.
    #[serde(default)]
    pub ip_ban: bool,
}

/// Request body for `PUT /admin/users/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub is_admin: bool,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = state.auth.list_users(&admin.user).await?;
    let data = users.iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/users/{id}/ban
pub async fn ban_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<BanRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state
        .auth
        .ban_user(&admin.user, id, input.duration_days, input.ip_ban)
        .await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// POST /api/v1/admin/users/{id}/unban
pub async fn unban_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state.auth.unban_user(&admin.user, id).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/admin/users/{id}/role
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<SetRoleRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state.auth.set_admin(&admin.user, id, input.is_admin).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<AdminUserUpdate>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = state.auth.update_user_by_admin(&admin.user, id, input).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.auth.delete_user(&admin.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
