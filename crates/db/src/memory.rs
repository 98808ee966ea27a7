//! In-process backend for the store traits.
//!
//! Enforces the same uniqueness, expiry, and cascade rules as the PostgreSQL
//! schema so the service layer behaves identically on either backend. Each
//! operation holds the lock for its own duration only.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use gotta_listen_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use crate::models::session::{CreateSession, UserSession};
use crate::models::user::{BanUpdate, CreateUser, UpdateUserProfile, User};
use crate::store::{
    CredentialStore, SessionStore, StoreError, StoreResult, UQ_SESSIONS_TOKEN, UQ_USERS_EMAIL,
    UQ_USERS_USERNAME,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<DbId, User>,
    sessions: BTreeMap<DbId, UserSession>,
    next_user_id: DbId,
    next_session_id: DbId,
}

impl Tables {
    fn user_mut(&mut self, id: DbId) -> Option<&mut User> {
        self.users.get_mut(&id)
    }
}

/// Store holding users and sessions in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session rows currently held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }

    /// Number of user rows currently held.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(conflict(UQ_USERS_EMAIL));
        }
        if tables.users.values().any(|u| u.username == input.username) {
            return Err(conflict(UQ_USERS_USERNAME));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            email: input.email.clone(),
            username: input.username.clone(),
            display_name: input.display_name.clone(),
            password_hash: input.password_hash.clone(),
            is_admin: false,
            is_banned: false,
            banned_until: None,
            banned_ip: None,
            last_login_ip: None,
            country: input.country.clone(),
            state_region: input.state_region.clone(),
            city: input.city.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let others: Vec<&User> = tables.users.values().filter(|u| u.id != id).collect();
        if others.iter().any(|u| u.email == input.email) {
            return Err(conflict(UQ_USERS_EMAIL));
        }
        if others.iter().any(|u| u.username == input.username) {
            return Err(conflict(UQ_USERS_USERNAME));
        }

        let Some(user) = tables.user_mut(id) else {
            return Ok(None);
        };
        user.email = input.email.clone();
        user.username = input.username.clone();
        user.display_name = input.display_name.clone();
        user.country = input.country.clone();
        user.state_region = input.state_region.clone();
        user.city = input.city.clone();
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn record_login_ip(&self, id: DbId, ip: &str) -> StoreResult<()> {
        if let Some(user) = self.tables.write().await.user_mut(id) {
            user.last_login_ip = Some(ip.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_ban(&self, id: DbId, ban: &BanUpdate) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(id) else {
            return Ok(false);
        };
        user.is_banned = true;
        user.banned_until = ban.banned_until;
        user.banned_ip = ban.banned_ip.clone();
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn clear_ban(&self, id: DbId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(id) else {
            return Ok(false);
        };
        user.is_banned = false;
        user.banned_until = None;
        user.banned_ip = None;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_admin(&self, id: DbId, is_admin: bool) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(id) else {
            return Ok(false);
        };
        user.is_admin = is_admin;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.user_mut(id) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_user(&self, id: DbId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        tables.sessions.retain(|_, s| s.user_id != id);
        Ok(tables.users.remove(&id).is_some())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&input.user_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        if tables
            .sessions
            .values()
            .any(|s| s.session_token == input.session_token)
        {
            return Err(conflict(UQ_SESSIONS_TOKEN));
        }

        tables.next_session_id += 1;
        let session = UserSession {
            id: tables.next_session_id,
            user_id: input.user_id,
            session_token: input.session_token.clone(),
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<UserSession>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.session_token == token_hash)
            .cloned())
    }

    async fn find_active_session(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> StoreResult<Option<DbId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.session_token == token_hash && s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.session_token != token_hash);
        Ok(tables.sessions.len() < before)
    }

    async fn delete_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn extend_session(
        &self,
        token_hash: &str,
        new_expires_at: Timestamp,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .sessions
            .values_mut()
            .find(|s| s.session_token == token_hash && s.expires_at < new_expires_at)
        {
            Some(session) => {
                session.expires_at = new_expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired_sessions(&self, now: Timestamp) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}
