use gotta_listen_core::error::CoreError;
use gotta_listen_core::types::Timestamp;
use gotta_listen_db::store::StoreError;

/// The one message shown for any failed login, whichever half was wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Failures of the authentication service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input validation, conflicts, missing targets, forbidden actions.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("{INVALID_CREDENTIALS_MESSAGE}")]
    InvalidCredentials,

    /// The account is banned; `None` means permanently.
    #[error("Account is banned")]
    Banned { until: Option<Timestamp> },

    /// No valid session accompanied a request that needs one.
    #[error("Authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Hashing, token signing or cookie encoding failed.
    #[error("Internal error: {0}")]
    Internal(String),
}
