use std::str::FromStr;

/// Server configuration loaded from environment variables.
///
/// All fields except the session secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Which store backs credentials and sessions.
    pub storage: StorageBackend,
    /// Required when `storage` is [`StorageBackend::Postgres`].
    pub database_url: Option<String>,
    /// Session, cookie and password hashing settings.
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `STORAGE_BACKEND`      | `postgres`                 |
    /// | `DATABASE_URL`         | --                         |
    ///
    /// # Panics
    ///
    /// Panics on malformed values, and when the Postgres backend is selected
    /// without `DATABASE_URL`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres {
            assert!(
                database_url.is_some(),
                "DATABASE_URL must be set when STORAGE_BACKEND=postgres"
            );
        }

        let auth = AuthConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage,
            database_url,
            auth,
        }
    }
}

/// Store implementation selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local maps. Sessions do not survive a restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "STORAGE_BACKEND must be `postgres` or `memory`, got `{other}`"
            )),
        }
    }
}

/// Default sliding session lifetime: 7 days.
pub const DEFAULT_SESSION_DURATION_SECS: i64 = 7 * 24 * 60 * 60;
/// Default sliding lifetime for "remember me" sessions: 1 year.
pub const DEFAULT_REMEMBER_ME_DURATION_SECS: i64 = 365 * 24 * 60 * 60;
/// Default absolute lifetime of a signed session token.
pub const DEFAULT_SESSION_MAX_AGE_DAYS: i64 = 365;
/// Default Argon2 iteration count.
pub const DEFAULT_PASSWORD_HASH_COST: u32 = 3;
/// Default Argon2 memory cost in KiB.
pub const DEFAULT_PASSWORD_HASH_MEMORY_KIB: u32 = 19_456;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "gl_session";
pub const DEFAULT_LOGGED_IN_COOKIE_NAME: &str = "gl_logged_in";

/// Configuration for session tokens, cookies and password hashing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret used to sign and verify session tokens.
    pub secret: String,
    /// Sliding lifetime of an ordinary session, in seconds.
    pub session_duration_secs: i64,
    /// Sliding lifetime of a "remember me" session, in seconds.
    pub remember_me_duration_secs: i64,
    /// Hard cap on a token's life regardless of refreshes, in days.
    pub session_max_age_days: i64,
    /// Argon2 `t_cost`.
    pub password_hash_cost: u32,
    /// Argon2 `m_cost` in KiB.
    pub password_hash_memory_kib: u32,
    pub session_cookie_name: String,
    pub logged_in_cookie_name: String,
    /// Add the `Secure` attribute to both cookies.
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default        |
    /// |-----------------------------|----------|----------------|
    /// | `SESSION_SECRET`            | **yes**  | --             |
    /// | `SESSION_DURATION_SECS`     | no       | `604800`       |
    /// | `REMEMBER_ME_DURATION_SECS` | no       | `31536000`     |
    /// | `SESSION_MAX_AGE_DAYS`      | no       | `365`          |
    /// | `PASSWORD_HASH_COST`        | no       | `3`            |
    /// | `PASSWORD_HASH_MEMORY_KIB`  | no       | `19456`        |
    /// | `SESSION_COOKIE_NAME`       | no       | `gl_session`   |
    /// | `LOGGED_IN_COOKIE_NAME`     | no       | `gl_logged_in` |
    /// | `COOKIE_SECURE`             | no       | `APP_ENV == production` |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty, or if any numeric
    /// value fails to parse.
    pub fn from_env() -> Self {
        let secret = std::env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let session_duration_secs = env_or("SESSION_DURATION_SECS", DEFAULT_SESSION_DURATION_SECS);
        let remember_me_duration_secs =
            env_or("REMEMBER_ME_DURATION_SECS", DEFAULT_REMEMBER_ME_DURATION_SECS);
        let session_max_age_days = env_or("SESSION_MAX_AGE_DAYS", DEFAULT_SESSION_MAX_AGE_DAYS);
        let password_hash_cost = env_or("PASSWORD_HASH_COST", DEFAULT_PASSWORD_HASH_COST);
        let password_hash_memory_kib =
            env_or("PASSWORD_HASH_MEMORY_KIB", DEFAULT_PASSWORD_HASH_MEMORY_KIB);

        let session_cookie_name = std::env::var("SESSION_COOKIE_NAME")
            .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE_NAME.into());
        let logged_in_cookie_name = std::env::var("LOGGED_IN_COOKIE_NAME")
            .unwrap_or_else(|_| DEFAULT_LOGGED_IN_COOKIE_NAME.into());

        let production = std::env::var("APP_ENV").is_ok_and(|v| v == "production");
        let cookie_secure = match std::env::var("COOKIE_SECURE") {
            Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => production,
        };

        Self {
            secret,
            session_duration_secs,
            remember_me_duration_secs,
            session_max_age_days,
            password_hash_cost,
            password_hash_memory_kib,
            session_cookie_name,
            logged_in_cookie_name,
            cookie_secure,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + ToString,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}
