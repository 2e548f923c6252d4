// ABOUTME: Record storage layer using SQLite
// ABOUTME: Lookups by collection and id, create/update with header replacement, sort and delete

use chrono::{DateTime, Utc};
use courier_core::{generate_id, messages, validate_name, MutationResult};
use courier_storage::{with_transaction, StorageError, StorageResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::order::{InProcessSequence, OrderMaintainer, OrderSequence};
use crate::types::{Header, Record};

/// Upper bound on ids bound into one `IN (...)` list. SQLite builds before
/// 3.32 allow only 999 parameters per statement.
const COLLECTION_IDS_PER_QUERY: usize = 500;

pub struct RecordStorage {
    pool: SqlitePool,
    order: OrderMaintainer,
}

impl RecordStorage {
    /// Storage with its own process-local order sequence
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_sequence(pool, Arc::new(InProcessSequence::new()))
    }

    /// Storage sharing `sequence` with other holders (e.g. several storages
    /// over the same pool)
    pub fn with_sequence(pool: SqlitePool, sequence: Arc<dyn OrderSequence>) -> Self {
        let order = OrderMaintainer::new(pool.clone(), sequence);
        Self { pool, order }
    }

    /// Records (with headers) owned by the given collections, grouped by
    /// collection id. Collections without records are absent from the map.
    ///
    /// Ids are deduplicated and queried in chunks of
    /// `COLLECTION_IDS_PER_QUERY` to stay under SQLite's bound-parameter limit.
    pub async fn get_by_collection_ids<S: AsRef<str>>(
        &self,
        collection_ids: &[S],
    ) -> StorageResult<HashMap<String, Vec<Record>>> {
        let mut seen = HashSet::new();
        let unique_ids: Vec<&str> = collection_ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .collect();

        if unique_ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!("Fetching records for {} collections", unique_ids.len());

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        let mut grouped: HashMap<String, Vec<Record>> = HashMap::new();

        // A collection falls in exactly one chunk, so each group keeps the
        // ORDER BY of its own query
        for chunk in unique_ids.chunks(COLLECTION_IDS_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(", ");

            let records_sql = format!(
                r#"
                SELECT r.*
                FROM records r
                INNER JOIN collections c ON c.id = r.collection_id
                WHERE r.collection_id IN ({})
                ORDER BY r.sort, r.id
                "#,
                placeholders
            );
            let headers_sql = format!(
                r#"
                SELECT h.*
                FROM headers h
                INNER JOIN records r ON r.id = h.record_id
                WHERE r.collection_id IN ({})
                ORDER BY h.rowid
                "#,
                placeholders
            );

            let mut records_query = sqlx::query(&records_sql);
            for id in chunk {
                records_query = records_query.bind(*id);
            }
            let record_rows = records_query
                .fetch_all(&mut *conn)
                .await
                .map_err(StorageError::Sqlx)?;

            let mut headers_query = sqlx::query(&headers_sql);
            for id in chunk {
                headers_query = headers_query.bind(*id);
            }
            let header_rows = headers_query
                .fetch_all(&mut *conn)
                .await
                .map_err(StorageError::Sqlx)?;

            let mut headers_by_record: HashMap<String, Vec<Header>> = HashMap::new();
            for row in &header_rows {
                let record_id: String = row.try_get("record_id")?;
                headers_by_record
                    .entry(record_id)
                    .or_default()
                    .push(row_to_header(row)?);
            }

            for row in &record_rows {
                let mut record = row_to_record(row)?;
                record.headers = Some(headers_by_record.remove(&record.id).unwrap_or_default());
                grouped
                    .entry(record.collection_id.clone())
                    .or_default()
                    .push(record);
            }
        }

        Ok(grouped)
    }

    /// Get a single record by ID. Headers are loaded only when asked for;
    /// otherwise `headers` is `None`.
    pub async fn get_by_id(
        &self,
        id: &str,
        include_headers: bool,
    ) -> StorageResult<Option<Record>> {
        debug!("Fetching record: {} (include_headers: {})", id, include_headers);

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        let mut record = match fetch_record(&mut *conn, id).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        if include_headers {
            record.headers = Some(fetch_headers(&mut *conn, id).await?);
        }

        Ok(Some(record))
    }

    /// Create a record at the end of the global order.
    ///
    /// The supplied `order` is ignored. A blank name is reported in the result
    /// without touching storage or the order sequence.
    pub async fn create(&self, record: Record) -> StorageResult<MutationResult> {
        if validate_name("Record name", &record.name).is_err() {
            debug!("Rejected record {} with empty name", record.id);
            return Ok(MutationResult::failure(messages::RECORD_NAME_REQUIRED));
        }

        let order = self.order.compute_initial_order().await?;
        let now = Utc::now();
        let record = Record {
            order,
            created_at: now,
            updated_at: now,
            ..record
        };

        debug!(
            "Creating record: {} in collection {} at order {}",
            record.id, record.collection_id, record.order
        );

        with_transaction(&self.pool, move |conn| {
            Box::pin(async move {
                insert_record(conn, &record).await?;
                insert_headers(conn, &record.id, record.header_list()).await?;
                Ok::<_, StorageError>(())
            })
        })
        .await?;

        Ok(MutationResult::ok())
    }

    /// Persist the full state of `record`, replacing its header set.
    ///
    /// Any headers currently stored for the record are deleted and the
    /// supplied ones inserted; nothing survives unless re-supplied. A record
    /// that does not exist yet is inserted. A blank name is reported in the
    /// result and nothing is written.
    pub async fn update(&self, record: Record) -> StorageResult<MutationResult> {
        if validate_name("Record name", &record.name).is_err() {
            debug!("Rejected update of record {} with empty name", record.id);
            return Ok(MutationResult::failure(messages::RECORD_NAME_REQUIRED));
        }

        debug!("Updating record: {}", record.id);

        let now = Utc::now();

        with_transaction(&self.pool, move |conn| {
            Box::pin(async move {
                if fetch_record(conn, &record.id).await?.is_some() {
                    let existing_headers = fetch_headers(conn, &record.id).await?;
                    if !existing_headers.is_empty() {
                        delete_headers(conn, &record.id).await?;
                    }
                }

                upsert_record(conn, &record, now).await?;
                insert_headers(conn, &record.id, record.header_list()).await?;
                Ok::<_, StorageError>(())
            })
        })
        .await?;

        Ok(MutationResult::ok())
    }

    /// Move a record to `new_order` within `collection_id`, shifting every
    /// record at or above that position up by one.
    pub async fn sort(
        &self,
        record_id: &str,
        collection_id: &str,
        new_order: i64,
    ) -> StorageResult<MutationResult> {
        self.order
            .relocate(record_id, collection_id, new_order)
            .await?;
        Ok(MutationResult::ok())
    }

    /// Delete a record and its headers. Returns false when nothing matched.
    pub async fn delete(&self, id: &str) -> StorageResult<bool> {
        debug!("Deleting record: {}", id);

        let result = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}

async fn fetch_record(conn: &mut SqliteConnection, id: &str) -> StorageResult<Option<Record>> {
    let row = sqlx::query("SELECT * FROM records WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(StorageError::Sqlx)?;

    row.as_ref().map(row_to_record).transpose()
}

async fn fetch_headers(conn: &mut SqliteConnection, record_id: &str) -> StorageResult<Vec<Header>> {
    let rows = sqlx::query("SELECT * FROM headers WHERE record_id = ? ORDER BY rowid")
        .bind(record_id)
        .fetch_all(conn)
        .await
        .map_err(StorageError::Sqlx)?;

    rows.iter().map(row_to_header).collect()
}

async fn delete_headers(conn: &mut SqliteConnection, record_id: &str) -> StorageResult<u64> {
    let result = sqlx::query("DELETE FROM headers WHERE record_id = ?")
        .bind(record_id)
        .execute(conn)
        .await
        .map_err(StorageError::Sqlx)?;
    Ok(result.rows_affected())
}

/// Insert `headers` for `record_id`. A header whose id is missing, or already
/// stored under another record, is given a fresh id.
async fn insert_headers(
    conn: &mut SqliteConnection,
    record_id: &str,
    headers: &[Header],
) -> StorageResult<()> {
    for header in headers {
        let id = if header.id.is_empty() {
            generate_id("hdr")
        } else {
            let owner: Option<String> =
                sqlx::query_scalar("SELECT record_id FROM headers WHERE id = ?")
                    .bind(&header.id)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(StorageError::Sqlx)?;

            match owner {
                Some(owner) if owner != record_id => {
                    debug!(
                        "Header {} belongs to record {}; assigning a new id",
                        header.id, owner
                    );
                    generate_id("hdr")
                }
                _ => header.id.clone(),
            }
        };

        sqlx::query("INSERT INTO headers (id, record_id, key, value) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(record_id)
            .bind(&header.key)
            .bind(&header.value)
            .execute(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;
    }
    Ok(())
}

async fn insert_record(conn: &mut SqliteConnection, record: &Record) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO records (
            id, collection_id, name, method, url, body, sort, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.collection_id)
    .bind(&record.name)
    .bind(&record.method)
    .bind(&record.url)
    .bind(&record.body)
    .bind(record.order)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(conn)
    .await
    .map_err(StorageError::Sqlx)?;
    Ok(())
}

async fn upsert_record(
    conn: &mut SqliteConnection,
    record: &Record,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO records (
            id, collection_id, name, method, url, body, sort, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            collection_id = excluded.collection_id,
            name = excluded.name,
            method = excluded.method,
            url = excluded.url,
            body = excluded.body,
            sort = excluded.sort,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&record.id)
    .bind(&record.collection_id)
    .bind(&record.name)
    .bind(&record.method)
    .bind(&record.url)
    .bind(&record.body)
    .bind(record.order)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await
    .map_err(StorageError::Sqlx)?;
    Ok(())
}

fn row_to_record(row: &SqliteRow) -> StorageResult<Record> {
    Ok(Record {
        id: row.try_get("id")?,
        collection_id: row.try_get("collection_id")?,
        name: row.try_get("name")?,
        method: row.try_get("method")?,
        url: row.try_get("url")?,
        body: row.try_get("body")?,
        order: row.try_get("sort")?,
        headers: None, // Populated by the caller when requested
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_header(row: &SqliteRow) -> StorageResult<Header> {
    Ok(Header {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        value: row.try_get("value")?,
    })
}
