pub mod account;
pub mod admin;
pub mod auth;

use axum::response::{IntoResponse, Response};

use crate::auth::cookies::SessionCookies;
use crate::auth::error::AuthError;
use crate::middleware::auth::AuthRejection;

/// Attach the cookie jar to the outcome of an operation, success or failure.
pub(crate) fn with_cookies<T: IntoResponse>(
    cookies: SessionCookies,
    result: Result<T, AuthError>,
) -> Response {
    match result {
        Ok(body) => (cookies, body).into_response(),
        Err(e) => AuthRejection::new(cookies, e).into_response(),
    }
}
