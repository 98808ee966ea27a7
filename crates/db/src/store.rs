//! Storage capabilities the authentication service depends on.
//!
//! The service only ever sees `Arc<dyn CredentialStore>` and
//! `Arc<dyn SessionStore>`; which backend sits behind them is decided once at
//! startup.

use async_trait::async_trait;
use gotta_listen_core::types::{DbId, Timestamp};

use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{BanUpdate, CreateUser, UpdateUserProfile, User};

/// Unique constraint on `users.email`.
pub const UQ_USERS_EMAIL: &str = "uq_users_email";
/// Unique constraint on `users.username`.
pub const UQ_USERS_USERNAME: &str = "uq_users_username";
/// Unique constraint on `sessions.session_token`.
pub const UQ_SESSIONS_TOKEN: &str = "uq_sessions_session_token";

/// PostgreSQL SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate value violates unique constraint: {constraint}")]
    Conflict { constraint: String },

    /// Any other storage failure (unreachable, timeout, malformed row).
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::Conflict { constraint };
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User records: identity, password hash, role and ban flags.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Insert a user. Duplicate email/username yields [`StoreError::Conflict`].
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;

    /// Rewrite a user's identity fields. `None` if the user is gone; an email
    /// or username held by another user yields [`StoreError::Conflict`].
    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> StoreResult<Option<User>>;

    async fn record_login_ip(&self, id: DbId, ip: &str) -> StoreResult<()>;

    async fn set_ban(&self, id: DbId, ban: &BanUpdate) -> StoreResult<bool>;

    async fn clear_ban(&self, id: DbId) -> StoreResult<bool>;

    async fn set_admin(&self, id: DbId, is_admin: bool) -> StoreResult<bool>;

    async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool>;

    /// Delete a user and, with it, every session the user owns.
    async fn delete_user(&self, id: DbId) -> StoreResult<bool>;
}

/// Server-side session records keyed by token digest.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session. A token collision yields [`StoreError::Conflict`].
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession>;

    /// Look up a session row regardless of expiry.
    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<UserSession>>;

    /// The owning user of a session that exists and has not expired at `now`.
    async fn find_active_session(&self, token_hash: &str, now: Timestamp)
        -> StoreResult<Option<DbId>>;

    /// Idempotent: deleting a missing token is not an error.
    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool>;

    /// Idempotent bulk delete of every session of a user.
    async fn delete_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64>;

    /// Move the expiry forward. No-op if the row is gone or the new expiry
    /// would not be later than the current one.
    async fn extend_session(&self, token_hash: &str, new_expires_at: Timestamp)
        -> StoreResult<bool>;

    /// Delete every session whose expiry is at or before `now`.
    async fn purge_expired_sessions(&self, now: Timestamp) -> StoreResult<u64>;
}
