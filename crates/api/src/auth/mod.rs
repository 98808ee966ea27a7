//! Authentication: password hashing, signed session tokens, session cookies,
//! and the [`AuthService`](service::AuthService) that ties them to storage.

pub mod accounts;
pub mod cookies;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;
