//! Handlers for the signed-in user's own `/account`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::with_cookies;
use crate::auth::accounts::ChangePasswordInput;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `DELETE /account`.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub password: String,
}

/// PUT /api/v1/account/password
///
/// Revokes every other session and re-issues the caller's cookies.
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser { user, mut cookies }: AuthUser,
    Json(input): Json<ChangePasswordInput>,
) -> Response {
    let result = state
        .auth
        .change_password(&user, input, &mut cookies)
        .await
        .map(|()| StatusCode::NO_CONTENT);
    with_cookies(cookies, result)
}

/// DELETE /api/v1/account
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser { user, mut cookies }: AuthUser,
    Json(input): Json<DeleteAccountRequest>,
) -> Response {
    let result = state
        .auth
        .delete_account(&user, input.password, &mut cookies)
        .await
        .map(|()| StatusCode::NO_CONTENT);
    with_cookies(cookies, result)
}
