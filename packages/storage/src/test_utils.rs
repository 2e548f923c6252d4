//! Test utilities for storage-backed tests

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::run_migrations;

/// In-memory database with the schema applied.
///
/// Limited to a single connection that never expires, since every new
/// in-memory connection would open an empty database.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str(":memory:")
        .expect("valid in-memory connection string")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory database");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
