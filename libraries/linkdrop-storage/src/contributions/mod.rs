//! Contribution counts per user
//!
//! Each function takes the pool directly; [`crate::SqliteLedger`] wraps them
//! behind the core's `ContributionLedger` trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use linkdrop_core::UserId;
//! use linkdrop_storage::contributions;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! let user = UserId::new("123456789");
//! let total = contributions::increment(pool, &user, 2).await?;
//! assert_eq!(contributions::count_for(pool, &user).await?, total);
//! # Ok(())
//! # }
//! ```

use linkdrop_core::{ContributionRecord, UserId};
use sqlx::SqlitePool;

use crate::error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

fn to_count(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| StorageError::Corrupt {
        column: "contributions.count",
        value,
    })
}

/// Add `amount` to a user's count and return the new total
///
/// A single upsert statement: the first contribution creates the row, later
/// ones add to it inside SQLite, so concurrent callers cannot lose updates.
/// An amount of 0 writes nothing and returns the current count.
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn increment(pool: &SqlitePool, user: &UserId, amount: u32) -> Result<u64> {
    if amount == 0 {
        return count_for(pool, user).await;
    }

    let count: i64 = sqlx::query_scalar(
        "INSERT INTO contributions (user_id, count) VALUES (?, ?)
         ON CONFLICT(user_id) DO UPDATE SET count = count + excluded.count
         RETURNING count",
    )
    .bind(user)
    .bind(i64::from(amount))
    .fetch_one(pool)
    .await?;

    to_count(count)
}

/// Current count for a user, 0 if they never contributed
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn count_for(pool: &SqlitePool, user: &UserId) -> Result<u64> {
    let count: Option<i64> = sqlx::query_scalar("SELECT count FROM contributions WHERE user_id = ?")
        .bind(user)
        .fetch_optional(pool)
        .await?;

    to_count(count.unwrap_or(0))
}

/// Highest counts first, ties by user id ascending, at most `limit` rows
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn top(pool: &SqlitePool, limit: usize) -> Result<Vec<ContributionRecord>> {
    let rows: Vec<(UserId, i64)> = sqlx::query_as(
        "SELECT user_id, count FROM contributions
         ORDER BY count DESC, user_id ASC
         LIMIT ?",
    )
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(user_id, count)| Ok(ContributionRecord::new(user_id, to_count(count)?)))
        .collect()
}

/// Sum of every user's count
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn total(pool: &SqlitePool) -> Result<u64> {
    let sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(count), 0) FROM contributions")
        .fetch_one(pool)
        .await?;

    to_count(sum)
}
