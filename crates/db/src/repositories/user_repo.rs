//! Repository for the `users` table.

use gotta_listen_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{BanUpdate, CreateUser, UpdateUserProfile, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, username, display_name, password_hash, is_admin, \
                        is_banned, banned_until, banned_ip, last_login_ip, \
                        country, state_region, city, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Duplicate emails or usernames fail with a unique violation on
    /// `uq_users_email` / `uq_users_username`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, username, display_name, password_hash, country, state_region, city)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.username)
            .bind(&input.display_name)
            .bind(&input.password_hash)
            .bind(&input.country)
            .bind(&input.state_region)
            .bind(&input.city)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// List all users ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Overwrite identity and location fields, returning the updated row.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                email = $2,
                username = $3,
                display_name = $4,
                country = $5,
                state_region = $6,
                city = $7,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.username)
            .bind(&input.display_name)
            .bind(&input.country)
            .bind(&input.state_region)
            .bind(&input.city)
            .fetch_optional(pool)
            .await
    }

    /// Remember the address of the most recent successful login.
    pub async fn record_login_ip(pool: &PgPool, id: DbId, ip: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_ip = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(ip)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a user as banned. Returns `true` if the row was updated.
    pub async fn set_ban(pool: &PgPool, id: DbId, ban: &BanUpdate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET
                is_banned = true,
                banned_until = $2,
                banned_ip = $3,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ban.banned_until)
        .bind(&ban.banned_ip)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lift a ban, clearing every ban field. Returns `true` if the row was updated.
    pub async fn clear_ban(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET
                is_banned = false,
                banned_until = NULL,
                banned_ip = NULL,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Grant or revoke the admin role. Returns `true` if the row was updated.
    pub async fn set_admin(pool: &PgPool, id: DbId, is_admin: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_admin = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(is_admin)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a user. Sessions go with it via `ON DELETE CASCADE`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
