//! Session-cookie authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use gotta_listen_db::models::user::User;

use crate::auth::cookies::SessionCookies;
use crate::error::AppError;
use crate::state::AppState;

/// The signed-in user if there is one.
///
/// Never rejects for a missing or stale session; `cookies` carries the
/// clearing headers in that case and should be returned with the response.
///
/// ```ignore
/// async fn whoami(current: CurrentUser) -> impl IntoResponse {
///     (current.cookies, Json(current.user.map(|u| u.username)))
/// }
/// ```
pub struct CurrentUser {
    pub user: Option<User>,
    pub cookies: SessionCookies,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut cookies = state.auth.cookies().read(&parts.headers);
        match state.auth.current_user(&mut cookies).await {
            Ok(user) => Ok(CurrentUser { user, cookies }),
            Err(e) => Err(AuthRejection::new(cookies, e)),
        }
    }
}

/// A signed-in user. Rejects with 401 otherwise.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
pub struct AuthUser {
    pub user: User,
    pub cookies: SessionCookies,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut cookies = state.auth.cookies().read(&parts.headers);
        match state.auth.require_auth(&mut cookies).await {
            Ok(user) => Ok(AuthUser { user, cookies }),
            Err(e) => Err(AuthRejection::new(cookies, e)),
        }
    }
}

/// An error response that still carries the cookie jar, so a stale session
/// cookie is cleared on the way out.
#[derive(Debug)]
pub struct AuthRejection {
    cookies: SessionCookies,
    error: AppError,
}

impl AuthRejection {
    pub fn new(cookies: SessionCookies, error: impl Into<AppError>) -> Self {
        Self {
            cookies,
            error: error.into(),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.cookies, self.error).into_response()
    }
}
