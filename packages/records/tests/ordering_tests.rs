// ABOUTME: Integration tests for record display ordering
// ABOUTME: Initial order assignment, restarts, concurrent creates, and atomic relocation

use courier_records::{
    CollectionCreateInput, CollectionStorage, InProcessSequence, Record, RecordStorage,
};
use courier_storage::test_utils::memory_pool;
use courier_storage::StorageError;
use rstest::rstest;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

async fn create_collection(pool: &SqlitePool, name: &str) -> String {
    CollectionStorage::new(pool.clone())
        .create(CollectionCreateInput {
            name: name.to_string(),
            description: None,
        })
        .await
        .unwrap()
        .id
}

async fn create_named(storage: &RecordStorage, collection_id: &str, name: &str) -> String {
    let record = Record::new(collection_id, name);
    let id = record.id.clone();
    assert!(storage.create(record).await.unwrap().success);
    id
}

/// Snapshot of every record as id -> (collection_id, order)
async fn snapshot(pool: &SqlitePool) -> HashMap<String, (String, i64)> {
    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT id, collection_id, sort FROM records")
            .fetch_all(pool)
            .await
            .unwrap();
    rows.into_iter()
        .map(|(id, collection_id, sort)| (id, (collection_id, sort)))
        .collect()
}

async fn order_of(storage: &RecordStorage, id: &str) -> i64 {
    storage.get_by_id(id, false).await.unwrap().unwrap().order
}

#[tokio::test]
async fn test_sequential_creates_are_strictly_increasing() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;
    let y = create_collection(&pool, "y").await;

    let mut orders = Vec::new();
    for i in 0..10 {
        let collection_id = if i % 2 == 0 { &x } else { &y };
        let id = create_named(&storage, collection_id, &format!("record {}", i)).await;
        orders.push(order_of(&storage, &id).await);
    }

    assert!(orders.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(orders, (1..=10).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_fresh_process_starts_above_existing_orders() {
    let pool = memory_pool().await;
    let collection_id = create_collection(&pool, "x").await;

    let before_restart = RecordStorage::new(pool.clone());
    let id = create_named(&before_restart, &collection_id, "old").await;
    before_restart.sort(&id, &collection_id, 40).await.unwrap();
    drop(before_restart);

    // New storage, new sequence: only the stored maximum is known
    let after_restart = RecordStorage::new(pool.clone());
    let new_id = create_named(&after_restart, &collection_id, "new").await;

    assert_eq!(order_of(&after_restart, &new_id).await, 41);
}

#[tokio::test]
async fn test_sequence_outpaces_storage_that_lost_rows() {
    let pool = memory_pool().await;
    let collection_id = create_collection(&pool, "x").await;
    let sequence = Arc::new(InProcessSequence::new());
    let storage = RecordStorage::with_sequence(pool.clone(), sequence.clone());

    let first = create_named(&storage, &collection_id, "first").await;
    let second = create_named(&storage, &collection_id, "second").await;
    storage.delete(&second).await.unwrap();
    storage.delete(&first).await.unwrap();

    // Storage is empty again but the sequence remembers what it issued
    let third = create_named(&storage, &collection_id, "third").await;
    assert_eq!(order_of(&storage, &third).await, 3);
    assert_eq!(sequence.last_issued(), 3);
}

#[tokio::test]
async fn test_shared_sequence_across_storages() {
    let pool = memory_pool().await;
    let collection_id = create_collection(&pool, "x").await;
    let sequence = Arc::new(InProcessSequence::new());
    let left = RecordStorage::with_sequence(pool.clone(), sequence.clone());
    let right = RecordStorage::with_sequence(pool.clone(), sequence);

    let a = create_named(&left, &collection_id, "a").await;
    let b = create_named(&right, &collection_id, "b").await;

    assert_eq!(order_of(&left, &a).await, 1);
    assert_eq!(order_of(&right, &b).await, 2);
}

#[tokio::test]
async fn test_interleaved_creates_get_unique_orders() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let collection_id = create_collection(&pool, "x").await;

    let creates = (0..20).map(|i| storage.create(Record::new(&collection_id, format!("r{}", i))));
    let results = futures::future::join_all(creates).await;
    assert!(results.into_iter().all(|r| r.unwrap().success));

    let orders: HashSet<i64> = snapshot(&pool).await.values().map(|(_, o)| *o).collect();
    assert_eq!(orders.len(), 20);
}

#[tokio::test]
async fn test_relocate_scenario_last_to_first() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;

    let a = create_named(&storage, &x, "A").await;
    let b = create_named(&storage, &x, "B").await;
    let c = create_named(&storage, &x, "C").await;
    assert_eq!(
        (order_of(&storage, &a).await, order_of(&storage, &b).await, order_of(&storage, &c).await),
        (1, 2, 3)
    );

    let result = storage.sort(&c, &x, 1).await.unwrap();
    assert!(result.success);
    assert!(result.message.is_empty());

    assert_eq!(order_of(&storage, &c).await, 1);
    assert_eq!(order_of(&storage, &a).await, 2);
    assert_eq!(order_of(&storage, &b).await, 3);
}

#[rstest]
#[case::to_front(4, 1)]
#[case::to_middle(0, 3)]
#[case::onto_itself(2, 3)]
#[case::to_end(1, 6)]
#[case::past_end(0, 50)]
#[tokio::test]
async fn test_relocate_shifts_by_exactly_one(#[case] moved: usize, #[case] new_order: i64) {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;
    let y = create_collection(&pool, "y").await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let collection_id = if i < 3 { &x } else { &y };
        ids.push(create_named(&storage, collection_id, &format!("r{}", i)).await);
    }
    let target = ids[moved].clone();

    let before = snapshot(&pool).await;
    storage.sort(&target, &y, new_order).await.unwrap();
    let after = snapshot(&pool).await;

    assert_eq!(after[&target], (y.clone(), new_order));
    let at_new_order: Vec<&String> = after
        .iter()
        .filter(|(_, (owner, order))| owner == &y && *order == new_order)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(at_new_order, vec![&target]);

    for (id, (owner, old_order)) in &before {
        if id == &target {
            continue;
        }
        let (new_owner, current) = &after[id];
        assert_eq!(new_owner, owner, "only the moved record changes collection");
        if *old_order >= new_order {
            assert_eq!(*current, old_order + 1, "record {} should shift up by one", id);
        } else {
            assert_eq!(current, old_order, "record {} should not move", id);
        }
    }
}

#[tokio::test]
async fn test_relocate_numbering_is_global_across_collections() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;
    let y = create_collection(&pool, "y").await;

    let in_x = create_named(&storage, &x, "in x").await;
    let in_y = create_named(&storage, &y, "in y").await;
    let moved = create_named(&storage, &x, "moved").await;

    storage.sort(&moved, &x, 1).await.unwrap();

    // The record in another collection is shifted too
    assert_eq!(order_of(&storage, &in_x).await, 2);
    assert_eq!(order_of(&storage, &in_y).await, 3);
    assert_eq!(order_of(&storage, &moved).await, 1);
}

#[tokio::test]
async fn test_relocate_to_unknown_collection_changes_nothing() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;

    let a = create_named(&storage, &x, "A").await;
    create_named(&storage, &x, "B").await;
    let before = snapshot(&pool).await;

    let result = storage.sort(&a, "col-missing", 1).await;

    assert!(matches!(result, Err(StorageError::Sqlx(_))));
    assert_eq!(snapshot(&pool).await, before);
}

#[tokio::test]
async fn test_relocate_unknown_record_changes_nothing() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;

    create_named(&storage, &x, "A").await;
    create_named(&storage, &x, "B").await;
    let before = snapshot(&pool).await;

    let result = storage.sort("rec-missing", &x, 1).await;

    assert!(matches!(result, Err(StorageError::NotFound(_))));
    assert_eq!(snapshot(&pool).await, before);
}

#[tokio::test]
async fn test_create_after_relocation_goes_to_the_end() {
    let pool = memory_pool().await;
    let storage = RecordStorage::new(pool.clone());
    let x = create_collection(&pool, "x").await;

    let a = create_named(&storage, &x, "A").await;
    create_named(&storage, &x, "B").await;
    storage.sort(&a, &x, 10).await.unwrap();

    let c = create_named(&storage, &x, "C").await;
    assert_eq!(order_of(&storage, &c).await, 11);
}
