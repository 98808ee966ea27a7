//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::{AuthRejection, AuthUser};
use crate::state::AppState;

/// Requires an admin. Rejects with 401 when signed out and 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     // admin.user.is_admin is guaranteed here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut cookies = state.auth.cookies().read(&parts.headers);
        match state.auth.require_admin(&mut cookies).await {
            Ok(user) => Ok(RequireAdmin(AuthUser { user, cookies })),
            Err(e) => Err(AuthRejection::new(cookies, e)),
        }
    }
}
