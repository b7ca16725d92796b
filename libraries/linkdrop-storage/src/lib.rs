//! Linkdrop Storage
//!
//! `SQLite` persistence for the contribution ledger.
//!
//! The schema is a single `contributions (user_id, count)` table. Increments
//! are one atomic upsert statement, so concurrent increments from independent
//! events never lose updates.
//!
//! # Example
//!
//! ```rust,no_run
//! use linkdrop_core::{ContributionLedger, UserId};
//! use linkdrop_storage::{create_pool, run_migrations, SqliteLedger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://linkdrop.db").await?;
//! run_migrations(&pool).await?;
//!
//! let ledger = SqliteLedger::new(pool);
//! ledger.increment(&UserId::new("123456789"), 3).await?;
//! let top = ledger.top(10).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod ledger;

// Vertical slices
pub mod contributions;

pub use error::StorageError;
pub use ledger::SqliteLedger;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the ledger is used.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    debug!("Ledger migrations applied");
    Ok(())
}

/// Create a new `SQLite` pool
///
/// WAL journal, 30 s busy timeout and at most 5 connections. The database
/// file is created if missing; its parent directory must exist.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://linkdrop.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(url = %database_url, "Creating ledger pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
