//! Signed session tokens.
//!
//! A session token is an HS256-signed JWT carrying [`SessionClaims`]. The
//! `exp` claim is an absolute cap on the token's life; the sliding expiry
//! lives on the server-side session row, which is keyed by the SHA-256 digest
//! of the token so a database leak does not expose usable cookies.

use std::sync::Arc;

use chrono::{DateTime, Duration};
use gotta_listen_core::clock::Clock;
use gotta_listen_core::types::{DbId, Timestamp};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Absolute expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4); two tokens minted in the same second differ.
    pub jti: String,
    /// Whether the session was opened with "remember me".
    pub persistent: bool,
}

impl SessionClaims {
    /// `exp` as a timestamp.
    pub fn expires_at(&self) -> Option<Timestamp> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly minted token and the instant it stops verifying.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Mints and verifies session tokens against the injected [`Clock`].
pub struct SessionTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionTokenCodec {
    pub fn new(secret: &str, max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            max_age,
            clock,
        }
    }

    /// Mint a token for `user_id` valid for the configured maximum age.
    pub fn issue(
        &self,
        user_id: DbId,
        persistent: bool,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = self.clock.now();
        let expires_at = now + self.max_age;

        let claims = SessionClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            persistent,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Decode a token, returning its claims only if the signature is valid
    /// and `exp` is still in the future according to the clock.
    ///
    /// Every failure (tampering, wrong key, garbage, expiry) collapses to
    /// `None`; callers treat them all as "no session".
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the injected clock, not the OS clock.
        validation.validate_exp = false;

        let claims = match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        if claims.exp <= self.clock.now().timestamp() {
            tracing::debug!(user_id = claims.sub, "Session token past its absolute expiry");
            return None;
        }
        Some(claims)
    }
}

/// Compute the SHA-256 hex digest of a session token.
///
/// Only this digest is persisted.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
