//! PostgreSQL backend for the store traits.

use async_trait::async_trait;
use gotta_listen_core::types::{DbId, Timestamp};

use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{BanUpdate, CreateUser, UpdateUserProfile, User};
use crate::repositories::{SessionRepo, UserRepo};
use crate::store::{CredentialStore, SessionStore, StoreResult};
use crate::DbPool;

/// Store backed by a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_username(&self.pool, username).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(UserRepo::list(&self.pool).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> StoreResult<Option<User>> {
        Ok(UserRepo::update_profile(&self.pool, id, input).await?)
    }

    async fn record_login_ip(&self, id: DbId, ip: &str) -> StoreResult<()> {
        Ok(UserRepo::record_login_ip(&self.pool, id, ip).await?)
    }

    async fn set_ban(&self, id: DbId, ban: &BanUpdate) -> StoreResult<bool> {
        Ok(UserRepo::set_ban(&self.pool, id, ban).await?)
    }

    async fn clear_ban(&self, id: DbId) -> StoreResult<bool> {
        Ok(UserRepo::clear_ban(&self.pool, id).await?)
    }

    async fn set_admin(&self, id: DbId, is_admin: bool) -> StoreResult<bool> {
        Ok(UserRepo::set_admin(&self.pool, id, is_admin).await?)
    }

    async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
        Ok(UserRepo::update_password(&self.pool, id, password_hash).await?)
    }

    async fn delete_user(&self, id: DbId) -> StoreResult<bool> {
        // `sessions.user_id` cascades, so the user's sessions go in the same statement.
        Ok(UserRepo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession> {
        Ok(SessionRepo::create(&self.pool, input).await?)
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<UserSession>> {
        Ok(SessionRepo::find_by_token(&self.pool, token_hash).await?)
    }

    async fn find_active_session(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> StoreResult<Option<DbId>> {
        Ok(SessionRepo::find_active_user_id(&self.pool, token_hash, now).await?)
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        Ok(SessionRepo::delete_by_token(&self.pool, token_hash).await?)
    }

    async fn delete_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(SessionRepo::delete_all_for_user(&self.pool, user_id).await?)
    }

    async fn extend_session(
        &self,
        token_hash: &str,
        new_expires_at: Timestamp,
    ) -> StoreResult<bool> {
        Ok(SessionRepo::extend(&self.pool, token_hash, new_expires_at).await?)
    }

    async fn purge_expired_sessions(&self, now: Timestamp) -> StoreResult<u64> {
        Ok(SessionRepo::purge_expired(&self.pool, now).await?)
    }
}
