//! Registration, login, logout and session refresh.
//!
//! [`AuthService`] owns the moving parts of authentication (hasher, token
//! codec, cookie transport, clock) and talks to storage only through the
//! [`CredentialStore`] and [`SessionStore`] traits.

use std::sync::Arc;

use chrono::Duration;
use gotta_listen_core::clock::Clock;
use gotta_listen_core::error::CoreError;
use gotta_listen_core::registration::{validate_login, validate_registration};
use gotta_listen_core::types::{DbId, Timestamp};
use gotta_listen_db::models::session::CreateSession;
use gotta_listen_db::models::user::{CreateUser, User};
use gotta_listen_db::store::{
    CredentialStore, SessionStore, StoreError, UQ_USERS_EMAIL, UQ_USERS_USERNAME,
};
use serde::Deserialize;

use super::cookies::{CookieTransport, SessionCookies};
use super::error::AuthError;
use super::jwt::{hash_session_token, SessionTokenCodec};
use super::password::PasswordHasher;
use crate::config::AuthConfig;

/// Where the frontend goes after a successful register or login.
pub const HOME_REDIRECT: &str = "/feed";

pub const EMAIL_TAKEN_MESSAGE: &str = "Email is already registered";
pub const USERNAME_TAKEN_MESSAGE: &str = "Username is already taken";

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state_region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub user: User,
    pub redirect: &'static str,
}

pub struct AuthService {
    pub(super) users: Arc<dyn CredentialStore>,
    pub(super) sessions: Arc<dyn SessionStore>,
    pub(super) hasher: PasswordHasher,
    pub(super) codec: SessionTokenCodec,
    pub(super) cookies: CookieTransport,
    pub(super) clock: Arc<dyn Clock>,
    /// Verified against when the email is unknown, so that branch costs the
    /// same as a wrong password.
    dummy_hash: String,
    session_duration: Duration,
    remember_me_duration: Duration,
}

impl AuthService {
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.password_hash_cost, config.password_hash_memory_kib)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash parameters: {e}")))?;
        let cookies = CookieTransport::new(
            config.session_cookie_name.clone(),
            config.logged_in_cookie_name.clone(),
            config.cookie_secure,
        )
        .map_err(AuthError::Internal)?;
        let dummy_hash = hasher
            .hash("gotta-listen-unknown-account")
            .map_err(|e| AuthError::Internal(format!("Password hashing error: {e}")))?;
        let codec = SessionTokenCodec::new(
            &config.secret,
            Duration::days(config.session_max_age_days),
            Arc::clone(&clock),
        );

        Ok(Self {
            users,
            sessions,
            hasher,
            codec,
            cookies,
            clock,
            dummy_hash,
            session_duration: Duration::seconds(config.session_duration_secs),
            remember_me_duration: Duration::seconds(config.remember_me_duration_secs),
        })
    }

    pub fn cookies(&self) -> &CookieTransport {
        &self.cookies
    }

    /// Create an account and sign it in.
    pub async fn register(
        &self,
        input: RegisterInput,
        jar: &mut SessionCookies,
    ) -> Result<AuthSuccess, AuthError> {
        validate_registration(
            &input.email,
            &input.username,
            &input.display_name,
            &input.password,
        )?;

        if self.users.find_user_by_email(&input.email).await?.is_some() {
            tracing::debug!("Registration rejected: email taken");
            return Err(CoreError::conflict("email", EMAIL_TAKEN_MESSAGE).into());
        }
        if self
            .users
            .find_user_by_username(&input.username)
            .await?
            .is_some()
        {
            tracing::debug!(username = %input.username, "Registration rejected: username taken");
            return Err(CoreError::conflict("username", USERNAME_TAKEN_MESSAGE).into());
        }

        let password_hash = self.hash_password(input.password).await?;

        let create = CreateUser {
            email: input.email,
            username: input.username,
            display_name: input.display_name,
            password_hash,
            country: non_blank(input.country),
            state_region: non_blank(input.state_region),
            city: non_blank(input.city),
        };
        // A concurrent registration can still win the race past the checks above.
        let user = self
            .users
            .create_user(&create)
            .await
            .map_err(uniqueness_conflict)?;

        self.start_session(user.id, false, jar).await?;
        tracing::info!(user_id = user.id, "User registered");

        Ok(AuthSuccess {
            user,
            redirect: HOME_REDIRECT,
        })
    }

    /// Verify credentials and open a new session.
    pub async fn login(
        &self,
        input: LoginInput,
        client_ip: Option<&str>,
        jar: &mut SessionCookies,
    ) -> Result<AuthSuccess, AuthError> {
        validate_login(&input.email, &input.password)?;

        let Some(user) = self.users.find_user_by_email(&input.email).await? else {
            self.verify_password(input.password, self.dummy_hash.clone()).await?;
            tracing::debug!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let now = self.clock.now();
        if user.is_banned_at(now) {
            tracing::info!(user_id = user.id, "Login refused: account banned");
            return Err(AuthError::Banned {
                until: user.banned_until,
            });
        }

        if !self
            .verify_password(input.password, user.password_hash.clone())
            .await?
        {
            tracing::debug!(user_id = user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(ip) = client_ip {
            if let Err(e) = self.users.record_login_ip(user.id, ip).await {
                tracing::warn!(user_id = user.id, error = %e, "Failed to record login IP");
            }
        }

        self.start_session(user.id, input.remember_me, jar).await?;

        match self.sessions.purge_expired_sessions(now).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "Purged expired sessions"),
            Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
        }

        tracing::info!(user_id = user.id, remember_me = input.remember_me, "User logged in");
        Ok(AuthSuccess {
            user,
            redirect: HOME_REDIRECT,
        })
    }

    /// End the current session. Without a session this only clears cookies.
    pub async fn logout(&self, jar: &mut SessionCookies) -> Result<(), AuthError> {
        let Some(digest) = jar.token().map(hash_session_token) else {
            self.cookies.clear(jar);
            return Ok(());
        };

        // Clear first so the browser forgets the cookie even if the delete fails.
        self.cookies.clear(jar);
        let removed = self.sessions.delete_session(&digest).await?;
        tracing::debug!(removed, "Session logged out");
        Ok(())
    }

    /// End every session of the current user. Returns how many were revoked.
    pub async fn logout_all_devices(&self, jar: &mut SessionCookies) -> Result<u64, AuthError> {
        let user_id = match jar.token() {
            Some(token) => self.resolve_token(token, self.clock.now()).await?,
            None => None,
        };

        let revoked = match user_id {
            Some(user_id) => {
                let revoked = self.sessions.delete_sessions_for_user(user_id).await?;
                tracing::info!(user_id, revoked, "Logged out of all devices");
                revoked
            }
            None => 0,
        };

        self.cookies.clear(jar);
        Ok(revoked)
    }

    /// Slide the current session's expiry forward. Returns whether anything
    /// changed; without a valid session this does nothing.
    pub async fn refresh(&self, jar: &mut SessionCookies) -> Result<bool, AuthError> {
        let Some(token) = jar.token().map(str::to_owned) else {
            return Ok(false);
        };
        let Some(claims) = self.codec.verify(&token) else {
            return Ok(false);
        };
        let Some(token_expiry) = claims.expires_at() else {
            return Ok(false);
        };

        let now = self.clock.now();
        let digest = hash_session_token(&token);
        let Some(user_id) = self
            .sessions
            .find_active_session(&digest, now)
            .await?
            .filter(|id| *id == claims.sub)
        else {
            return Ok(false);
        };

        let usable = self
            .users
            .find_user_by_id(user_id)
            .await?
            .is_some_and(|user| !user.is_banned_at(now));
        if !usable {
            tracing::debug!(user_id, "Refresh refused: account banned or deleted");
            return Ok(false);
        }

        let expires_at = (now + self.lifetime(claims.persistent)).min(token_expiry);
        if !self.sessions.extend_session(&digest, expires_at).await? {
            return Ok(false);
        }

        self.cookies
            .set(jar, &token, (expires_at - now).num_seconds())
            .map_err(|e| AuthError::Internal(format!("Cookie encoding error: {e}")))?;
        tracing::debug!(user_id = claims.sub, %expires_at, "Session refreshed");
        Ok(true)
    }

    /// Mint a token, persist its digest and hand the token to the jar.
    pub(super) async fn start_session(
        &self,
        user_id: DbId,
        persistent: bool,
        jar: &mut SessionCookies,
    ) -> Result<(), AuthError> {
        let issued = self
            .codec
            .issue(user_id, persistent)
            .map_err(|e| AuthError::Internal(format!("Token generation error: {e}")))?;

        let now = self.clock.now();
        let expires_at = (now + self.lifetime(persistent)).min(issued.expires_at);

        self.sessions
            .create_session(&CreateSession {
                user_id,
                session_token: hash_session_token(&issued.token),
                expires_at,
            })
            .await?;

        self.cookies
            .set(jar, &issued.token, (expires_at - now).num_seconds())
            .map_err(|e| AuthError::Internal(format!("Cookie encoding error: {e}")))
    }

    /// The user a token belongs to, if it verifies and its row is live at `now`.
    pub(super) async fn resolve_token(
        &self,
        token: &str,
        now: Timestamp,
    ) -> Result<Option<DbId>, AuthError> {
        let Some(claims) = self.codec.verify(token) else {
            return Ok(None);
        };
        let user_id = self
            .sessions
            .find_active_session(&hash_session_token(token), now)
            .await?;
        Ok(user_id.filter(|id| *id == claims.sub))
    }

    /// Whether the token in the jar was opened with "remember me".
    pub(super) fn is_persistent(&self, jar: &SessionCookies) -> bool {
        jar.token()
            .and_then(|t| self.codec.verify(t))
            .is_some_and(|c| c.persistent)
    }

    fn lifetime(&self, persistent: bool) -> Duration {
        if persistent {
            self.remember_me_duration
        } else {
            self.session_duration
        }
    }

    pub(super) async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AuthError::Internal(format!("Password hashing error: {e}")))
    }

    pub(super) async fn verify_password(
        &self,
        password: String,
        hash: String,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AuthError::Internal(format!("Password verification error: {e}")))
    }
}

/// Map a uniqueness violation from storage to the same field error the
/// pre-checks produce.
pub(super) fn uniqueness_conflict(err: StoreError) -> AuthError {
    match &err {
        StoreError::Conflict { constraint } if constraint == UQ_USERS_EMAIL => {
            CoreError::conflict("email", EMAIL_TAKEN_MESSAGE).into()
        }
        StoreError::Conflict { constraint } if constraint == UQ_USERS_USERNAME => {
            CoreError::conflict("username", USERNAME_TAKEN_MESSAGE).into()
        }
        _ => err.into(),
    }
}

pub(super) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use gotta_listen_core::clock::ManualClock;
    use gotta_listen_db::memory::MemoryStore;
    use gotta_listen_db::models::user::{BanUpdate, UpdateUserProfile};
    use gotta_listen_db::store::StoreResult;

    use super::*;

    pub(crate) fn test_auth_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-secret".into(),
            session_duration_secs: 7 * 24 * 60 * 60,
            remember_me_duration_secs: 365 * 24 * 60 * 60,
            session_max_age_days: 365,
            password_hash_cost: 1,
            password_hash_memory_kib: 8,
            session_cookie_name: "gl_session".into(),
            logged_in_cookie_name: "gl_logged_in".into(),
            cookie_secure: false,
        }
    }

    pub(crate) struct Harness {
        pub service: AuthService,
        pub store: Arc<MemoryStore>,
        pub clock: Arc<ManualClock>,
    }

    pub(crate) fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        let service = AuthService::new(
            &test_auth_config(),
            store.clone(),
            store.clone(),
            clock.clone(),
        )
        .unwrap();
        Harness {
            service,
            store,
            clock,
        }
    }

    pub(crate) fn register_input(email: &str, username: &str) -> RegisterInput {
        RegisterInput {
            email: email.into(),
            username: username.into(),
            display_name: username.to_uppercase(),
            password: "secret1".into(),
            country: Some("US".into()),
            state_region: Some("  ".into()),
            city: None,
        }
    }

    /// A jar as the next request would present it: the token, nothing queued.
    pub(crate) fn request_jar(h: &Harness, token: &str) -> SessionCookies {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            format!("gl_session={token}; gl_logged_in=true").parse().unwrap(),
        );
        h.service.cookies().read(&headers)
    }

    pub(crate) fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
            remember_me: false,
        }
    }

    async fn stored_expiry(h: &Harness, jar: &SessionCookies) -> Timestamp {
        let digest = hash_session_token(jar.token().unwrap());
        h.store
            .find_session(&digest)
            .await
            .unwrap()
            .unwrap()
            .expires_at
    }

    #[tokio::test]
    async fn test_register_opens_seven_day_session() {
        let h = harness();
        let mut jar = SessionCookies::default();

        let success = h
            .service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();

        assert_eq!(success.redirect, HOME_REDIRECT);
        assert_eq!(success.user.username, "alice");
        assert!(!success.user.is_admin);
        assert_ne!(success.user.password_hash, "secret1");
        assert_eq!(success.user.state_region, None, "blank profile fields dropped");
        assert_eq!(jar.set_cookie_headers().len(), 2);

        let expiry = stored_expiry(&h, &jar).await;
        assert_eq!(expiry, h.clock.now() + Duration::days(7));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_writes_nothing() {
        let h = harness();
        let mut jar = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();

        let mut second = SessionCookies::default();
        let err = h
            .service
            .register(register_input("alice@x.io", "alice2"), &mut second)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            AuthError::Core(CoreError::Conflict { field: "email", .. })
        );
        assert_eq!(h.store.user_count().await, 1);
        assert_eq!(h.store.session_count().await, 1);
        assert!(second.set_cookie_headers().is_empty());
        assert!(second.token().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let h = harness();
        let mut jar = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();

        let err = h
            .service
            .register(register_input("other@x.io", "alice"), &mut jar)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            AuthError::Core(CoreError::Conflict { field: "username", .. })
        );
    }

    #[tokio::test]
    async fn test_register_validation_runs_first() {
        let h = harness();
        let mut jar = SessionCookies::default();
        let mut input = register_input("alice@x.io", "alice");
        input.password = "12345".into();

        let err = h.service.register(input, &mut jar).await.unwrap_err();
        assert_matches!(
            err,
            AuthError::Core(CoreError::Validation { field: "password", .. })
        );
        assert_eq!(h.store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_login_errors_are_indistinguishable() {
        let h = harness();
        let mut jar = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();

        let mut fresh = SessionCookies::default();
        let unknown = h
            .service
            .login(login_input("nobody@x.io", "secret1"), None, &mut fresh)
            .await
            .unwrap_err();
        let wrong = h
            .service
            .login(login_input("alice@x.io", "wrong-password"), None, &mut fresh)
            .await
            .unwrap_err();

        assert_matches!(unknown, AuthError::InvalidCredentials);
        assert_matches!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(fresh.set_cookie_headers().is_empty());
    }

    #[tokio::test]
    async fn test_login_remember_me_and_ip() {
        let h = harness();
        let mut jar = SessionCookies::default();
        let user = h
            .service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap()
            .user;

        let mut input = login_input("alice@x.io", "secret1");
        input.remember_me = true;
        let mut device = SessionCookies::default();
        h.service
            .login(input, Some("203.0.113.9"), &mut device)
            .await
            .unwrap();

        assert_eq!(
            stored_expiry(&h, &device).await,
            h.clock.now() + Duration::days(365)
        );
        let stored = h.store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.last_login_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(h.store.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_login_purges_expired_sessions() {
        let h = harness();
        let mut old = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut old)
            .await
            .unwrap();

        h.clock.advance(Duration::days(8));
        let mut jar = SessionCookies::default();
        h.service
            .login(login_input("alice@x.io", "secret1"), None, &mut jar)
            .await
            .unwrap();

        assert_eq!(h.store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_ban_window_controls_login() {
        let h = harness();
        let mut jar = SessionCookies::default();
        let user = h
            .service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap()
            .user;

        let until = h.clock.now() + Duration::hours(1);
        h.store
            .set_ban(
                user.id,
                &gotta_listen_db::models::user::BanUpdate {
                    banned_until: Some(until),
                    banned_ip: None,
                },
            )
            .await
            .unwrap();

        let mut device = SessionCookies::default();
        let err = h
            .service
            .login(login_input("alice@x.io", "secret1"), None, &mut device)
            .await
            .unwrap_err();
        assert_matches!(err, AuthError::Banned { until: Some(t) } if t == until);

        h.clock.advance(Duration::hours(2));
        h.service
            .login(login_input("alice@x.io", "secret1"), None, &mut device)
            .await
            .expect("expired ban no longer applies");
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let h = harness();
        let mut jar = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();

        let token = jar.token().unwrap().to_string();
        h.service.logout(&mut jar).await.unwrap();
        assert!(jar.token().is_none());
        assert_eq!(h.store.session_count().await, 0);
        assert!(h.service.resolve_token(&token, h.clock.now()).await.unwrap().is_none());

        h.service.logout(&mut jar).await.unwrap();
        h.service.logout(&mut SessionCookies::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_all_devices_revokes_every_token() {
        let h = harness();
        let mut first = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut first)
            .await
            .unwrap();
        let mut second = SessionCookies::default();
        h.service
            .login(login_input("alice@x.io", "secret1"), None, &mut second)
            .await
            .unwrap();
        let mut bystander = SessionCookies::default();
        h.service
            .register(register_input("bob@x.io", "bob"), &mut bystander)
            .await
            .unwrap();

        let tokens = [
            first.token().unwrap().to_string(),
            second.token().unwrap().to_string(),
        ];
        let revoked = h.service.logout_all_devices(&mut first).await.unwrap();

        assert_eq!(revoked, 2);
        let now = h.clock.now();
        for token in &tokens {
            assert!(h.service.resolve_token(token, now).await.unwrap().is_none());
        }
        assert!(h
            .service
            .resolve_token(bystander.token().unwrap(), now)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_logout_all_without_session_still_clears() {
        let h = harness();
        let mut jar = SessionCookies::default();
        assert_eq!(h.service.logout_all_devices(&mut jar).await.unwrap(), 0);
        assert_eq!(jar.set_cookie_headers().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_only_extends() {
        let h = harness();
        let mut jar = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();
        let before = stored_expiry(&h, &jar).await;

        // Same instant: the new expiry equals the old one, nothing moves.
        assert!(!h.service.refresh(&mut jar).await.unwrap());

        h.clock.advance(Duration::days(3));
        assert!(h.service.refresh(&mut jar).await.unwrap());
        let after = stored_expiry(&h, &jar).await;
        assert!(after > before);
        assert_eq!(after, h.clock.now() + Duration::days(7));
    }

    #[tokio::test]
    async fn test_refresh_is_capped_by_token_expiry() {
        let h = harness();
        let mut config = test_auth_config();
        config.session_max_age_days = 10;
        let service = AuthService::new(&config, h.store.clone(), h.store.clone(), h.clock.clone())
            .unwrap();

        let mut jar = SessionCookies::default();
        service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();
        let cap = h.clock.now() + Duration::days(10);

        h.clock.advance(Duration::days(6));
        assert!(service.refresh(&mut jar).await.unwrap());
        assert_eq!(stored_expiry(&h, &jar).await, cap);
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_noop() {
        let h = harness();
        let mut jar = SessionCookies::default();
        assert!(!h.service.refresh(&mut jar).await.unwrap());
        assert!(jar.set_cookie_headers().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_does_not_resolve() {
        let h = harness();
        let mut jar = SessionCookies::default();
        h.service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();
        let token = jar.token().unwrap().to_string();

        h.clock.advance(Duration::days(7));
        assert!(h
            .service
            .resolve_token(&token, h.clock.now())
            .await
            .unwrap()
            .is_none());
        assert!(!h.service.refresh(&mut jar).await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_refuses_banned_user() {
        let h = harness();
        let mut jar = SessionCookies::default();
        let user = h
            .service
            .register(register_input("bob@x.io", "bob"), &mut jar)
            .await
            .unwrap()
            .user;
        let before = stored_expiry(&h, &jar).await;

        h.store
            .set_ban(
                user.id,
                &BanUpdate {
                    banned_until: None,
                    banned_ip: None,
                },
            )
            .await
            .unwrap();
        h.clock.advance(Duration::days(1));

        let mut next = request_jar(&h, jar.token().unwrap());
        assert!(!h.service.refresh(&mut next).await.unwrap());
        assert!(next.set_cookie_headers().is_empty());
        assert_eq!(stored_expiry(&h, &jar).await, before);
    }

    #[tokio::test]
    async fn test_unknown_email_verifies_against_real_hash() {
        let h = harness();
        assert!(h.service.dummy_hash.starts_with("$argon2id$"));
        assert!(!h
            .service
            .verify_password("secret1".into(), h.service.dummy_hash.clone())
            .await
            .unwrap());

        let mut jar = SessionCookies::default();
        assert_matches!(
            h.service
                .login(login_input("ghost@x.io", "secret1"), None, &mut jar)
                .await,
            Err(AuthError::InvalidCredentials)
        );
    }

    /// Credential store whose lookups miss, so inserts reach the unique
    /// constraints as they would under a concurrent registration.
    struct StaleLookups(Arc<MemoryStore>);

    #[async_trait]
    impl CredentialStore for StaleLookups {
        async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
            self.0.find_user_by_id(id).await
        }

        async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn find_user_by_username(&self, _username: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn list_users(&self) -> StoreResult<Vec<User>> {
            self.0.list_users().await
        }

        async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
            self.0.create_user(input).await
        }

        async fn update_profile(
            &self,
            id: DbId,
            input: &UpdateUserProfile,
        ) -> StoreResult<Option<User>> {
            self.0.update_profile(id, input).await
        }

        async fn record_login_ip(&self, id: DbId, ip: &str) -> StoreResult<()> {
            self.0.record_login_ip(id, ip).await
        }

        async fn set_ban(&self, id: DbId, ban: &BanUpdate) -> StoreResult<bool> {
            self.0.set_ban(id, ban).await
        }

        async fn clear_ban(&self, id: DbId) -> StoreResult<bool> {
            self.0.clear_ban(id).await
        }

        async fn set_admin(&self, id: DbId, is_admin: bool) -> StoreResult<bool> {
            self.0.set_admin(id, is_admin).await
        }

        async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
            self.0.update_password(id, password_hash).await
        }

        async fn delete_user(&self, id: DbId) -> StoreResult<bool> {
            self.0.delete_user(id).await
        }
    }

    #[tokio::test]
    async fn test_late_uniqueness_violation_names_the_field() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        ));
        let service = AuthService::new(
            &test_auth_config(),
            Arc::new(StaleLookups(store.clone())),
            store.clone(),
            clock,
        )
        .unwrap();

        let mut jar = SessionCookies::default();
        service
            .register(register_input("alice@x.io", "alice"), &mut jar)
            .await
            .unwrap();

        for (input, expected) in [
            (register_input("alice@x.io", "alice2"), "email"),
            (register_input("other@x.io", "alice"), "username"),
        ] {
            let mut second = SessionCookies::default();
            let err = service.register(input, &mut second).await.unwrap_err();
            assert_matches!(
                err,
                AuthError::Core(CoreError::Conflict { field, .. }) if field == expected
            );
            assert!(second.token().is_none());
        }

        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.session_count().await, 1);
    }
}
