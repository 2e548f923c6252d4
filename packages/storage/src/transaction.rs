// ABOUTME: Scoped transaction helper for multi-step writes
// ABOUTME: Commits when the body succeeds and rolls back on every other exit path

use futures::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

/// Run `body` inside a transaction on a connection from `pool`.
///
/// The transaction is committed when `body` returns `Ok` and rolled back when
/// it returns `Err`. If the returned future is dropped before completion
/// (cancellation or panic), the sqlx transaction guard rolls back on drop.
///
/// The body receives the transaction's connection and must run all of its
/// statements on it. Capture owned values (`move`) rather than borrows.
///
/// ```ignore
/// with_transaction(&pool, move |conn| {
///     Box::pin(async move {
///         sqlx::query("UPDATE records SET sort = sort + 1").execute(&mut *conn).await?;
///         Ok::<_, StorageError>(())
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, E, F>(pool: &SqlitePool, body: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>>,
    E: From<sqlx::Error>,
{
    let mut tx = pool.begin().await?;
    let outcome = body(&mut *tx).await;

    match outcome {
        Ok(value) => {
            tx.commit().await?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Transaction rollback failed: {}", rollback_err);
            } else {
                debug!("Transaction rolled back");
            }
            Err(err)
        }
    }
}
