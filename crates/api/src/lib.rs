//! HTTP surface for the Gotta Listen authentication core.
//!
//! - [`auth`] -- password hashing, session tokens, cookies and the
//!   [`AuthService`](auth::service::AuthService).
//! - [`middleware`] -- `CurrentUser`, `AuthUser` and `RequireAdmin` extractors.
//! - [`handlers`] / [`routes`] -- the `/api/v1` endpoints.
//! - [`router`] -- the full middleware stack shared by `main.rs` and tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
