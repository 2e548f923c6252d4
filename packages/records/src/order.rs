// ABOUTME: Display-order maintenance for records
// ABOUTME: Assigns increasing orders on create and relocates records atomically

use chrono::Utc;
use courier_storage::{with_transaction, StorageError, StorageResult};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Source of initial orders for newly created records.
///
/// Implementations combine their own memory of issued values with the
/// largest order currently in storage. The read of storage and the insert
/// that follows are not atomic: two processes creating records at the same
/// moment can still receive the same order. Duplicate orders are tolerated
/// by the listing (ties break by id).
#[cfg_attr(test, mockall::automock)]
pub trait OrderSequence: Send + Sync {
    /// Next order to hand out, given the largest persisted order (`None` when
    /// there are no records).
    fn next_after(&self, persisted_max: Option<i64>) -> i64;
}

/// Process-local sequence. Resets on restart, after which only the storage
/// read keeps new orders above historical ones.
#[derive(Debug, Default)]
pub struct InProcessSequence {
    last: AtomicI64,
}

impl InProcessSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence that behaves as if `last` had already been issued
    pub fn starting_at(last: i64) -> Self {
        Self {
            last: AtomicI64::new(last),
        }
    }

    pub fn last_issued(&self) -> i64 {
        self.last.load(Ordering::Acquire)
    }
}

impl OrderSequence for InProcessSequence {
    fn next_after(&self, persisted_max: Option<i64>) -> i64 {
        let floor = persisted_max.map_or(i64::MIN, |max| max.saturating_add(1));
        let mut current = self.last.load(Ordering::Acquire);

        loop {
            let next = current.saturating_add(1).max(floor);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Keeps record orders consistent when records are created or moved.
///
/// Numbering is global: the maximum and the shift on relocation both span
/// every collection.
#[derive(Clone)]
pub struct OrderMaintainer {
    pool: SqlitePool,
    sequence: Arc<dyn OrderSequence>,
}

impl OrderMaintainer {
    pub fn new(pool: SqlitePool, sequence: Arc<dyn OrderSequence>) -> Self {
        Self { pool, sequence }
    }

    /// Order for a record about to be created: strictly greater than both the
    /// last value this sequence issued and the largest order in storage.
    pub async fn compute_initial_order(&self) -> StorageResult<i64> {
        let persisted_max = read_max_order(&self.pool).await?;
        let order = self.sequence.next_after(persisted_max);

        debug!(
            "Assigned initial order {} (persisted max: {:?})",
            order, persisted_max
        );
        Ok(order)
    }

    /// Move a record to `new_order` in `collection_id`.
    ///
    /// Every record at or above `new_order` shifts up by one, then the target
    /// takes the freed position. Both steps commit together or not at all.
    /// Returns `StorageError::NotFound` (after rolling back the shift) when no
    /// record has `record_id`.
    pub async fn relocate(
        &self,
        record_id: &str,
        collection_id: &str,
        new_order: i64,
    ) -> StorageResult<()> {
        debug!(
            "Relocating record {} to collection {} at order {}",
            record_id, collection_id, new_order
        );

        let record_id = record_id.to_owned();
        let collection_id = collection_id.to_owned();

        with_transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let shifted = bulk_increment_order_at_or_above(conn, new_order).await?;
                let placed =
                    set_order_and_owner(conn, &record_id, &collection_id, new_order).await?;

                if placed == 0 {
                    return Err(StorageError::NotFound(format!("record '{}'", record_id)));
                }

                debug!("Relocated record {} ({} records shifted)", record_id, shifted);
                Ok(())
            })
        })
        .await
    }
}

/// Largest order across all records
pub(crate) async fn read_max_order(pool: &SqlitePool) -> StorageResult<Option<i64>> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(sort) FROM records")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Sqlx)?;
    Ok(max)
}

/// Shift every record with order >= `threshold` up by one
pub(crate) async fn bulk_increment_order_at_or_above(
    conn: &mut SqliteConnection,
    threshold: i64,
) -> StorageResult<u64> {
    let result = sqlx::query("UPDATE records SET sort = sort + 1 WHERE sort >= ?")
        .bind(threshold)
        .execute(conn)
        .await
        .map_err(StorageError::Sqlx)?;
    Ok(result.rows_affected())
}

/// Assign owner and order to one record; returns the number of rows touched
pub(crate) async fn set_order_and_owner(
    conn: &mut SqliteConnection,
    record_id: &str,
    collection_id: &str,
    order: i64,
) -> StorageResult<u64> {
    let result =
        sqlx::query("UPDATE records SET collection_id = ?, sort = ?, updated_at = ? WHERE id = ?")
            .bind(collection_id)
            .bind(order)
            .bind(Utc::now())
            .bind(record_id)
            .execute(conn)
            .await
            .map_err(StorageError::Sqlx)?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_storage::test_utils::memory_pool;
    use mockall::predicate::eq;
    use std::collections::HashSet;

    async fn seed(pool: &SqlitePool, records: &[(&str, &str, i64)]) {
        for (id, collection_id, sort) in records {
            sqlx::query(
                "INSERT OR IGNORE INTO collections (id, name, created_at) VALUES (?, ?, ?)",
            )
            .bind(collection_id)
            .bind(collection_id)
            .bind(Utc::now())
            .execute(pool)
            .await
            .unwrap();

            sqlx::query(
                "INSERT INTO records (id, collection_id, name, sort, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(collection_id)
            .bind(id)
            .bind(sort)
            .bind(Utc::now())
            .bind(Utc::now())
            .execute(pool)
            .await
            .unwrap();
        }
    }

    async fn order_of(pool: &SqlitePool, id: &str) -> (String, i64) {
        sqlx::query_as("SELECT collection_id, sort FROM records WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_sequence_increments_without_storage() {
        let sequence = InProcessSequence::new();
        assert_eq!(sequence.next_after(None), 1);
        assert_eq!(sequence.next_after(None), 2);
        assert_eq!(sequence.last_issued(), 2);
    }

    #[test]
    fn test_sequence_jumps_past_persisted_max() {
        let sequence = InProcessSequence::new();
        assert_eq!(sequence.next_after(Some(41)), 42);
        // Counter follows the jump
        assert_eq!(sequence.next_after(None), 43);
    }

    #[test]
    fn test_sequence_stays_ahead_of_stale_storage() {
        let sequence = InProcessSequence::starting_at(10);
        // Storage has not caught up with values issued in this process
        assert_eq!(sequence.next_after(Some(5)), 11);
        assert_eq!(sequence.next_after(Some(5)), 12);
    }

    #[test]
    fn test_sequence_is_unique_across_threads() {
        let sequence = InProcessSequence::new();
        let issued: Vec<i64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..250)
                            .map(|_| sequence.next_after(None))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        let unique: HashSet<i64> = issued.iter().copied().collect();
        assert_eq!(unique.len(), 2000);
        assert_eq!(sequence.last_issued(), 2000);
    }

    #[tokio::test]
    async fn test_compute_initial_order_passes_persisted_max() {
        let pool = memory_pool().await;
        seed(&pool, &[("rec-a", "col-x", 7), ("rec-b", "col-y", 41)]).await;

        let mut sequence = MockOrderSequence::new();
        sequence
            .expect_next_after()
            .with(eq(Some(41)))
            .times(1)
            .returning(|max| max.unwrap_or(0) + 1);

        let maintainer = OrderMaintainer::new(pool, Arc::new(sequence));
        assert_eq!(maintainer.compute_initial_order().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_compute_initial_order_on_empty_store() {
        let pool = memory_pool().await;

        let mut sequence = MockOrderSequence::new();
        sequence
            .expect_next_after()
            .with(eq(None))
            .times(1)
            .returning(|_| 1);

        let maintainer = OrderMaintainer::new(pool, Arc::new(sequence));
        assert_eq!(maintainer.compute_initial_order().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_relocate_shifts_and_places() {
        let pool = memory_pool().await;
        seed(
            &pool,
            &[("rec-a", "col-x", 1), ("rec-b", "col-x", 2), ("rec-c", "col-y", 3)],
        )
        .await;

        let maintainer = OrderMaintainer::new(pool.clone(), Arc::new(InProcessSequence::new()));
        maintainer.relocate("rec-c", "col-x", 2).await.unwrap();

        assert_eq!(order_of(&pool, "rec-a").await, ("col-x".to_string(), 1));
        assert_eq!(order_of(&pool, "rec-c").await, ("col-x".to_string(), 2));
        assert_eq!(order_of(&pool, "rec-b").await, ("col-x".to_string(), 3));
    }

    #[tokio::test]
    async fn test_relocate_beyond_max_leaves_gap() {
        let pool = memory_pool().await;
        seed(&pool, &[("rec-a", "col-x", 1), ("rec-b", "col-x", 2)]).await;

        let maintainer = OrderMaintainer::new(pool.clone(), Arc::new(InProcessSequence::new()));
        maintainer.relocate("rec-a", "col-x", 10).await.unwrap();

        assert_eq!(order_of(&pool, "rec-a").await.1, 10);
        assert_eq!(order_of(&pool, "rec-b").await.1, 2);
    }

    #[tokio::test]
    async fn test_relocate_unknown_record_rolls_back_shift() {
        let pool = memory_pool().await;
        seed(&pool, &[("rec-a", "col-x", 1), ("rec-b", "col-x", 2)]).await;

        let maintainer = OrderMaintainer::new(pool.clone(), Arc::new(InProcessSequence::new()));
        let result = maintainer.relocate("rec-missing", "col-x", 1).await;

        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(order_of(&pool, "rec-a").await.1, 1);
        assert_eq!(order_of(&pool, "rec-b").await.1, 2);
    }
}
