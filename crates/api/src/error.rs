use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gotta_listen_core::ban::ban_message;
use gotta_listen_core::error::CoreError;
use gotta_listen_db::store::StoreError;
use serde_json::json;

use crate::auth::error::AuthError;

/// Message returned for every 500; details only go to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Where the frontend should send an anonymous user.
pub const LOGIN_REDIRECT: &str = "/login";
/// Where the frontend should send a signed-in user who lacks access.
pub const FORBIDDEN_REDIRECT: &str = "/feed";

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A failure from the authentication service.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Parts of a JSON error body.
struct ErrorBody {
    status: StatusCode,
    code: &'static str,
    message: String,
    field: Option<&'static str>,
    redirect: Option<&'static str>,
}

impl ErrorBody {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field: None,
            redirect: None,
        }
    }

    fn field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    fn redirect(mut self, to: &'static str) -> Self {
        self.redirect = Some(to);
        self
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            INTERNAL_ERROR_MESSAGE,
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Auth(auth) => classify_auth_error(auth),
        };

        let mut json = json!({
            "error": body.message,
            "code": body.code,
        });
        if let Some(field) = body.field {
            json["field"] = json!(field);
        }
        if let Some(redirect) = body.redirect {
            json["redirect"] = json!(redirect);
        }

        (body.status, axum::Json(json)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> ErrorBody {
    match err {
        CoreError::NotFound { entity, id } => ErrorBody::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation { field, message } => {
            ErrorBody::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone())
                .field(field)
        }
        CoreError::Conflict { field, message } => {
            ErrorBody::new(StatusCode::CONFLICT, "CONFLICT", message.clone()).field(field)
        }
        CoreError::Forbidden(msg) => {
            ErrorBody::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
                .redirect(FORBIDDEN_REDIRECT)
        }
    }
}

fn classify_auth_error(err: &AuthError) -> ErrorBody {
    match err {
        AuthError::Core(core) => classify_core_error(core),
        AuthError::InvalidCredentials => ErrorBody::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            err.to_string(),
        ),
        AuthError::Banned { until } => {
            ErrorBody::new(StatusCode::FORBIDDEN, "BANNED", ban_message(*until))
        }
        AuthError::Unauthenticated => ErrorBody::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "Please log in to continue",
        )
        .redirect(LOGIN_REDIRECT),
        AuthError::Store(store) => classify_store_error(store),
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal auth error");
            ErrorBody::internal()
        }
    }
}

/// Uniqueness violations surface as 409; everything else is a sanitized 500.
fn classify_store_error(err: &StoreError) -> ErrorBody {
    match err {
        StoreError::Conflict { constraint } => {
            tracing::debug!(%constraint, "Unique constraint violation");
            ErrorBody::new(StatusCode::CONFLICT, "CONFLICT", "Duplicate value")
        }
        StoreError::Database(db_err) => {
            tracing::error!(error = %db_err, "Database error");
            ErrorBody::internal()
        }
    }
}
