//! Account lifecycle: admin moderation and self-service settings.
//!
//! Admin actions take the acting user explicitly and refuse to let an admin
//! ban, demote or delete their own account.

use gotta_listen_core::ban::ban_until_from_days;
use gotta_listen_core::error::CoreError;
use gotta_listen_core::registration::{validate_new_password, validate_profile_update};
use gotta_listen_core::types::DbId;
use gotta_listen_db::models::user::{BanUpdate, UpdateUserProfile, User};
use serde::Deserialize;

use super::cookies::SessionCookies;
use super::error::AuthError;
use super::service::{
    non_blank, uniqueness_conflict, AuthService, EMAIL_TAKEN_MESSAGE, USERNAME_TAKEN_MESSAGE,
};

pub const WRONG_CURRENT_PASSWORD_MESSAGE: &str = "Current password is incorrect";
pub const WRONG_PASSWORD_MESSAGE: &str = "Password is incorrect";

/// Settings form for a password change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePasswordInput {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Admin edit form for a user's identity. An empty `new_password` keeps the
/// current one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserUpdate {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state_region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub new_password: String,
}

impl AuthService {
    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, AuthError> {
        ensure_admin(actor)?;
        Ok(self.users.list_users().await?)
    }

    /// Ban `target_id` for `duration_days` (`0` = permanently) and revoke
    /// every session it holds.
    ///
    /// With `ip_ban`, the target's last login address is recorded as banned.
    pub async fn ban_user(
        &self,
        actor: &User,
        target_id: DbId,
        duration_days: u32,
        ip_ban: bool,
    ) -> Result<User, AuthError> {
        ensure_admin(actor)?;
        ensure_not_self(actor, target_id, "ban")?;
        let target = self.load_user(target_id).await?;

        let banned_ip = if ip_ban {
            if target.last_login_ip.is_none() {
                tracing::warn!(user_id = target_id, "IP ban requested but no login IP is known");
            }
            target.last_login_ip.clone()
        } else {
            None
        };
        let ban = BanUpdate {
            banned_until: ban_until_from_days(duration_days, self.clock.now()),
            banned_ip,
        };

        if !self.users.set_ban(target_id, &ban).await? {
            return Err(not_found(target_id));
        }
        let revoked = self.sessions.delete_sessions_for_user(target_id).await?;

        tracing::info!(
            admin_id = actor.id,
            user_id = target_id,
            duration_days,
            ip_ban,
            revoked,
            "User banned"
        );
        self.load_user(target_id).await
    }

    pub async fn unban_user(&self, actor: &User, target_id: DbId) -> Result<User, AuthError> {
        ensure_admin(actor)?;
        if !self.users.clear_ban(target_id).await? {
            return Err(not_found(target_id));
        }
        tracing::info!(admin_id = actor.id, user_id = target_id, "User unbanned");
        self.load_user(target_id).await
    }

    pub async fn set_admin(
        &self,
        actor: &User,
        target_id: DbId,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        ensure_admin(actor)?;
        if !is_admin {
            ensure_not_self(actor, target_id, "demote")?;
        }
        if !self.users.set_admin(target_id, is_admin).await? {
            return Err(not_found(target_id));
        }
        tracing::info!(admin_id = actor.id, user_id = target_id, is_admin, "User role changed");
        self.load_user(target_id).await
    }

    /// Rewrite a user's identity fields and optionally reset their password.
    ///
    /// A password reset revokes every session the target holds.
    pub async fn update_user_by_admin(
        &self,
        actor: &User,
        target_id: DbId,
        input: AdminUserUpdate,
    ) -> Result<User, AuthError> {
        ensure_admin(actor)?;
        validate_profile_update(
            &input.email,
            &input.username,
            &input.display_name,
            &input.new_password,
        )?;

        let taken_by_other = |found: Option<User>| found.is_some_and(|u| u.id != target_id);
        if taken_by_other(self.users.find_user_by_email(&input.email).await?) {
            return Err(CoreError::conflict("email", EMAIL_TAKEN_MESSAGE).into());
        }
        if taken_by_other(self.users.find_user_by_username(&input.username).await?) {
            return Err(CoreError::conflict("username", USERNAME_TAKEN_MESSAGE).into());
        }

        let password_hash = if input.new_password.is_empty() {
            None
        } else {
            Some(self.hash_password(input.new_password).await?)
        };

        let profile = UpdateUserProfile {
            email: input.email,
            username: input.username,
            display_name: input.display_name,
            country: non_blank(input.country),
            state_region: non_blank(input.state_region),
            city: non_blank(input.city),
        };
        let Some(updated) = self
            .users
            .update_profile(target_id, &profile)
            .await
            .map_err(uniqueness_conflict)?
        else {
            return Err(not_found(target_id));
        };

        let Some(password_hash) = password_hash else {
            tracing::info!(admin_id = actor.id, user_id = target_id, "User updated by admin");
            return Ok(updated);
        };

        if !self.users.update_password(target_id, &password_hash).await? {
            return Err(not_found(target_id));
        }
        let revoked = self.sessions.delete_sessions_for_user(target_id).await?;
        tracing::info!(
            admin_id = actor.id,
            user_id = target_id,
            revoked,
            "User updated by admin with password reset"
        );
        self.load_user(target_id).await
    }

    /// Delete a user; their sessions go with them.
    pub async fn delete_user(&self, actor: &User, target_id: DbId) -> Result<(), AuthError> {
        ensure_admin(actor)?;
        ensure_not_self(actor, target_id, "delete")?;
        if !self.users.delete_user(target_id).await? {
            return Err(not_found(target_id));
        }
        tracing::info!(admin_id = actor.id, user_id = target_id, "User deleted");
        Ok(())
    }

    /// Replace the password of the signed-in `user`.
    ///
    /// Every existing session is revoked; the calling device gets a fresh one.
    pub async fn change_password(
        &self,
        user: &User,
        input: ChangePasswordInput,
        jar: &mut SessionCookies,
    ) -> Result<(), AuthError> {
        validate_new_password(&input.new_password, &input.confirm_password)?;

        if !self
            .verify_password(input.current_password, user.password_hash.clone())
            .await?
        {
            return Err(
                CoreError::validation("current_password", WRONG_CURRENT_PASSWORD_MESSAGE).into(),
            );
        }

        let password_hash = self.hash_password(input.new_password).await?;
        if !self.users.update_password(user.id, &password_hash).await? {
            return Err(not_found(user.id));
        }

        let persistent = self.is_persistent(jar);
        let revoked = self.sessions.delete_sessions_for_user(user.id).await?;
        self.start_session(user.id, persistent, jar).await?;

        tracing::info!(user_id = user.id, revoked, "Password changed");
        Ok(())
    }

    /// Delete the signed-in `user`'s own account after re-checking the password.
    pub async fn delete_account(
        &self,
        user: &User,
        password: String,
        jar: &mut SessionCookies,
    ) -> Result<(), AuthError> {
        if !self
            .verify_password(password, user.password_hash.clone())
            .await?
        {
            return Err(CoreError::validation("password", WRONG_PASSWORD_MESSAGE).into());
        }

        self.users.delete_user(user.id).await?;
        self.cookies.clear(jar);
        tracing::info!(user_id = user.id, "Account deleted by owner");
        Ok(())
    }

    async fn load_user(&self, id: DbId) -> Result<User, AuthError> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn ensure_admin(actor: &User) -> Result<(), AuthError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Admin access required".into()).into())
    }
}

fn ensure_not_self(actor: &User, target_id: DbId, action: &str) -> Result<(), AuthError> {
    if actor.id == target_id {
        tracing::info!(user_id = actor.id, action, "Admin attempted to act on own account");
        return Err(CoreError::Forbidden(format!("You cannot {action} your own account")).into());
    }
    Ok(())
}

fn not_found(id: DbId) -> AuthError {
    CoreError::NotFound { entity: "User", id }.into()
}
