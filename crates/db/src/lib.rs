//! Persistence for the Gotta Listen authentication core.
//!
//! - [`models`] -- row structs and DTOs for `users` and `sessions`.
//! - [`repositories`] -- zero-sized repositories issuing parameterized SQL.
//! - [`store`] -- the [`CredentialStore`](store::CredentialStore) and
//!   [`SessionStore`](store::SessionStore) traits the service layer depends on.
//! - [`pg_store`] and [`memory`] -- the two backends behind those traits.

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod pg_store;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
