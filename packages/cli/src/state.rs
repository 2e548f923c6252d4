// ABOUTME: Database connection management and storage initialization
// ABOUTME: Provides shared access to the SQLite pool and storage layers

use courier_records::{CollectionStorage, InProcessSequence, OrderSequence, RecordStorage};
use courier_storage::{open_pool, StorageConfig, StorageResult};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Shared database state for command handlers
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub record_storage: Arc<RecordStorage>,
    pub collection_storage: Arc<CollectionStorage>,
}

impl DbState {
    /// Create new database state from an open pool
    pub fn new(pool: SqlitePool) -> Self {
        let sequence: Arc<dyn OrderSequence> = Arc::new(InProcessSequence::new());
        let record_storage = Arc::new(RecordStorage::with_sequence(pool.clone(), sequence));
        let collection_storage = Arc::new(CollectionStorage::new(pool.clone()));

        Self {
            pool,
            record_storage,
            collection_storage,
        }
    }

    /// Open the configured database (running migrations) and build the storages
    pub async fn init(config: &StorageConfig) -> StorageResult<Self> {
        let pool = open_pool(config).await?;
        debug!("Storage initialized at {}", config.path.display());
        Ok(Self::new(pool))
    }
}
