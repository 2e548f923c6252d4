// ABOUTME: Data layer and persistence for Courier
// ABOUTME: Storage errors, pool configuration, migrations, and transaction scoping

use thiserror::Error;

pub mod config;
pub mod pool;
pub mod transaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::StorageConfig;
pub use pool::{open_pool, run_migrations};
pub use transaction::with_transaction;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(#[from] courier_core::ValidationError),
}

pub type StorageResult<T> = Result<T, StorageError>;
