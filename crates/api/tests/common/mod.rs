#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use gotta_listen_api::auth::service::AuthService;
use gotta_listen_api::config::{AuthConfig, ServerConfig, StorageBackend};
use gotta_listen_api::router::build_app_router;
use gotta_listen_api::state::AppState;
use gotta_listen_core::clock::ManualClock;
use gotta_listen_db::memory::MemoryStore;

pub const SESSION_COOKIE: &str = "gl_session";
pub const PASSWORD: &str = "secret1";

/// Auth settings with the cheapest valid Argon2 parameters.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        secret: "integration-test-secret".to_string(),
        session_duration_secs: 7 * 24 * 60 * 60,
        remember_me_duration_secs: 365 * 24 * 60 * 60,
        session_max_age_days: 365,
        password_hash_cost: 1,
        password_hash_memory_kib: 8,
        session_cookie_name: SESSION_COOKIE.to_string(),
        logged_in_cookie_name: "gl_logged_in".to_string(),
        cookie_secure: false,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage: StorageBackend::Memory,
        database_url: None,
        auth: test_auth_config(),
    }
}

/// The router plus handles on its store and clock.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

/// Build the full application router over the memory backend, using the same
/// middleware stack as `main.rs`.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ));

    let auth = AuthService::new(&config.auth, store.clone(), store.clone(), clock.clone())
        .expect("test auth config is valid");

    let state = AppState {
        auth: Arc::new(auth),
        pool: None,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        clock,
    }
}

/// Send one request, optionally carrying a session cookie and a JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    session: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = session {
        builder = builder.header(COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, session: Option<&str>) -> Response {
    send(app, Method::GET, uri, session, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    session: Option<&str>,
    body: serde_json::Value,
) -> Response {
    send(app, Method::POST, uri, session, Some(body)).await
}

/// Read the response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Every `Set-Cookie` header on the response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The session token set by the response, if any (empty when cleared).
pub fn session_token(response: &Response) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    set_cookies(response).into_iter().find_map(|cookie| {
        let rest = cookie.strip_prefix(&prefix)?;
        Some(rest.split(';').next().unwrap_or_default().to_string())
    })
}

/// Register `username` (`<username>@test.io` / [`PASSWORD`]) and return its
/// session token.
pub async fn register(app: &Router, username: &str) -> String {
    let body = serde_json::json!({
        "email": format!("{username}@test.io"),
        "username": username,
        "display_name": username,
        "password": PASSWORD,
    });
    let response = post_json(app, "/api/v1/auth/register", None, body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    session_token(&response).expect("register sets a session cookie")
}

/// The id of the user the session belongs to.
pub async fn whoami(app: &Router, session: &str) -> Option<i64> {
    let response = get(app, "/api/v1/auth/session", Some(session)).await;
    body_json(response).await["data"]["id"].as_i64()
}
