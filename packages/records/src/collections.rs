// ABOUTME: Collection storage layer using SQLite
// ABOUTME: Create, look up, list, and delete collections (deletes cascade to records)

use chrono::Utc;
use courier_core::{generate_id, validate_name};
use courier_storage::{StorageError, StorageResult};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::types::{Collection, CollectionCreateInput};

pub struct CollectionStorage {
    pool: SqlitePool,
}

impl CollectionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new collection
    pub async fn create(&self, input: CollectionCreateInput) -> StorageResult<Collection> {
        validate_name("Collection name", &input.name)?;

        let collection = Collection {
            id: generate_id("col"),
            name: input.name.trim().to_string(),
            description: input.description,
            created_at: Utc::now(),
        };

        debug!(
            "Creating collection: {} (name: {})",
            collection.id, collection.name
        );

        sqlx::query(
            r#"
            INSERT INTO collections (id, name, description, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(collection.created_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(collection)
    }

    /// Get a single collection by ID
    pub async fn get(&self, id: &str) -> StorageResult<Option<Collection>> {
        debug!("Fetching collection: {}", id);

        let row = sqlx::query("SELECT * FROM collections WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_collection).transpose()
    }

    /// List all collections by name
    pub async fn list(&self) -> StorageResult<Vec<Collection>> {
        let rows = sqlx::query("SELECT * FROM collections ORDER BY name, created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_collection).collect()
    }

    /// Delete a collection along with its records and their headers.
    /// Returns false when nothing matched.
    pub async fn delete(&self, id: &str) -> StorageResult<bool> {
        debug!("Deleting collection: {}", id);

        let result = sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_collection(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Collection> {
    Ok(Collection {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}
