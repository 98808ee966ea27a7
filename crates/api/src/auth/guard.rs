//! Resolving the session cookie to a user.

use gotta_listen_core::error::CoreError;
use gotta_listen_db::models::user::User;

use super::cookies::SessionCookies;
use super::error::AuthError;
use super::service::AuthService;

impl AuthService {
    /// The signed-in user, or `None`.
    ///
    /// A cookie that no longer leads to a usable account (bad signature,
    /// revoked or expired row, deleted user, active ban) is cleared.
    pub async fn current_user(&self, jar: &mut SessionCookies) -> Result<Option<User>, AuthError> {
        let Some(token) = jar.token() else {
            return Ok(None);
        };

        let now = self.clock.now();
        let Some(user_id) = self.resolve_token(token, now).await? else {
            tracing::debug!("Stale session cookie");
            self.cookies.clear(jar);
            return Ok(None);
        };

        let Some(user) = self.users.find_user_by_id(user_id).await? else {
            tracing::debug!(user_id, "Session outlived its user");
            self.cookies.clear(jar);
            return Ok(None);
        };

        if user.is_banned_at(now) {
            tracing::debug!(user_id, "Session belongs to a banned user");
            self.cookies.clear(jar);
            return Ok(None);
        }

        Ok(Some(user))
    }

    pub async fn require_auth(&self, jar: &mut SessionCookies) -> Result<User, AuthError> {
        self.current_user(jar)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    pub async fn require_admin(&self, jar: &mut SessionCookies) -> Result<User, AuthError> {
        let user = self.require_auth(jar).await?;
        if !user.is_admin {
            tracing::info!(user_id = user.id, "Admin access denied");
            return Err(CoreError::Forbidden("Admin access required".into()).into());
        }
        Ok(user)
    }
}
