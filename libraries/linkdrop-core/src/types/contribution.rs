//! Contribution ledger records

use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// Cumulative number of tracks a user has contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Contributing user
    pub user_id: UserId,

    /// Tracks added on behalf of this user, never decreases
    pub count: u64,
}

impl ContributionRecord {
    /// Record for one user
    pub fn new(user_id: UserId, count: u64) -> Self {
        Self { user_id, count }
    }
}
