//! Database query timeout helpers
//!
//! Wraps sqlx futures so a stalled connection surfaces as
//! [`StoreError::Timeout`] instead of hanging the caller.

use std::time::Duration;
use tokio::time::timeout;

use crate::store::{StoreError, StoreResult};

/// Default timeout for database queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Map a sqlx error, turning serialization failures and deadlocks into
/// [`StoreError::Conflict`] so callers retry them
pub fn db_error(err: sqlx::Error) -> StoreError {
    let retryable = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "40001" || code == "40P01");
    if retryable {
        StoreError::Conflict
    } else {
        StoreError::Database(err)
    }
}

/// Execute a query with timeout
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(db_error(e)),
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}

/// Execute a query with default timeout (5 seconds)
pub async fn with_default_timeout<F, T>(future: F) -> StoreResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}
