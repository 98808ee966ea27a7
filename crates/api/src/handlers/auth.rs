//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gotta_listen_db::models::user::UserResponse;
use serde::Serialize;

use super::with_cookies;
use crate::auth::service::{AuthSuccess, LoginInput, RegisterInput};
use crate::middleware::auth::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Body of a successful register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Where the frontend should navigate next.
    pub redirect: &'static str,
    pub user: UserResponse,
}

impl From<AuthSuccess> for AuthResponse {
    fn from(success: AuthSuccess) -> Self {
        Self {
            redirect: success.redirect,
            user: UserResponse::from(&success.user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    /// Number of sessions revoked.
    pub revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Whether the session expiry moved.
    pub refreshed: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterInput>,
) -> Response {
    let mut cookies = state.auth.cookies().read(&headers);
    let result = state.auth.register(input, &mut cookies).await.map(|success| {
        (
            StatusCode::CREATED,
            Json(DataResponse {
                data: AuthResponse::from(success),
            }),
        )
    });
    with_cookies(cookies, result)
}

/// POST /api/v1/auth/login
///
/// The client address is taken from `X-Forwarded-For` (first hop) or
/// `X-Real-IP` when a proxy supplies them.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginInput>,
) -> Response {
    let mut cookies = state.auth.cookies().read(&headers);
    let ip = client_ip(&headers);
    let result = state
        .auth
        .login(input, ip.as_deref(), &mut cookies)
        .await
        .map(|success| {
            Json(DataResponse {
                data: AuthResponse::from(success),
            })
        });
    with_cookies(cookies, result)
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut cookies = state.auth.cookies().read(&headers);
    let result = state
        .auth
        .logout(&mut cookies)
        .await
        .map(|()| StatusCode::NO_CONTENT);
    with_cookies(cookies, result)
}

/// POST /api/v1/auth/logout-all
pub async fn logout_all(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut cookies = state.auth.cookies().read(&headers);
    let result = state
        .auth
        .logout_all_devices(&mut cookies)
        .await
        .map(|revoked| {
            Json(DataResponse {
                data: LogoutAllResponse { revoked },
            })
        });
    with_cookies(cookies, result)
}

/// POST /api/v1/auth/refresh
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut cookies = state.auth.cookies().read(&headers);
    let result = state.auth.refresh(&mut cookies).await.map(|refreshed| {
        Json(DataResponse {
            data: RefreshResponse { refreshed },
        })
    });
    with_cookies(cookies, result)
}

/// GET /api/v1/auth/session
///
/// The signed-in user, or `null`.
pub async fn session(current: CurrentUser) -> Response {
    let data = current.user.as_ref().map(UserResponse::from);
    (current.cookies, Json(DataResponse { data })).into_response()
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = || headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    forwarded
        .or_else(real_ip)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
}
