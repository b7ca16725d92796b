use crate::contributions;
use async_trait::async_trait;
use linkdrop_core::{error::Result, ContributionLedger, ContributionRecord, UserId};
use sqlx::SqlitePool;

/// Contribution ledger backed by `SQLite`
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Sum of all counts, for the CLI summary
    pub async fn total(&self) -> Result<u64> {
        Ok(contributions::total(&self.pool).await?)
    }
}

#[async_trait]
impl ContributionLedger for SqliteLedger {
    async fn increment(&self, user: &UserId, amount: u32) -> Result<u64> {
        Ok(contributions::increment(&self.pool, user, amount).await?)
    }

    async fn count_for(&self, user: &UserId) -> Result<u64> {
        Ok(contributions::count_for(&self.pool, user).await?)
    }

    async fn top(&self, limit: usize) -> Result<Vec<ContributionRecord>> {
        Ok(contributions::top(&self.pool, limit).await?)
    }
}
