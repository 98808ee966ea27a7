//! User entity model and DTOs.

use gotta_listen_core::ban::is_ban_active;
use gotta_listen_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_banned: bool,
    pub banned_until: Option<Timestamp>,
    pub banned_ip: Option<String>,
    pub last_login_ip: Option<String>,
    pub country: Option<String>,
    pub state_region: Option<String>,
    pub city: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Whether this account is refused authentication at `now`.
    pub fn is_banned_at(&self, now: Timestamp) -> bool {
        is_ban_active(self.is_banned, self.banned_until, now)
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_banned: bool,
    pub banned_until: Option<Timestamp>,
    pub banned_ip: Option<String>,
    pub last_login_ip: Option<String>,
    pub country: Option<String>,
    pub state_region: Option<String>,
    pub city: Option<String>,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin,
            is_banned: user.is_banned,
            banned_until: user.banned_until,
            banned_ip: user.banned_ip.clone(),
            last_login_ip: user.last_login_ip.clone(),
            country: user.country.clone(),
            state_region: user.state_region.clone(),
            city: user.city.clone(),
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. New accounts are never admins.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub country: Option<String>,
    pub state_region: Option<String>,
    pub city: Option<String>,
}

/// Identity and location fields an admin may rewrite.
#[derive(Debug, Clone)]
pub struct UpdateUserProfile {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub country: Option<String>,
    pub state_region: Option<String>,
    pub city: Option<String>,
}

/// New ban state written by the admin surface.
#[derive(Debug, Clone)]
pub struct BanUpdate {
    /// `None` bans permanently.
    pub banned_until: Option<Timestamp>,
    pub banned_ip: Option<String>,
}
