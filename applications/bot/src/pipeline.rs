//! Message ingestion and history backfill
//!
//! Both entry points run exactly one reconciliation pass: the playlist is
//! read, links are extracted against it, and the batch is committed while
//! the maintainer's lock is held.

use crate::error::{BotError, Result};
use crate::state::AppState;
use linkdrop_core::{links, PassOutcome, TrackId, TrackReference, UserId};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// One chat message read back from channel history
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    pub author: UserId,
    pub text: String,
}

impl HistoryMessage {
    pub fn new(author: UserId, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
        }
    }
}

/// Summary of a `/sync` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Messages that carried at least one link
    pub scanned: usize,
    pub inserted: usize,
    pub evicted: usize,
}

/// Reject use outside the configured channel
pub fn ensure_channel(state: &AppState, channel_id: u64) -> Result<()> {
    let allowed = state.channel_id();
    if channel_id == allowed {
        Ok(())
    } else {
        Err(BotError::ScopeViolation { allowed })
    }
}

/// Handle one live message
///
/// Returns the number of tracks added on behalf of `author`. Messages
/// without any link never touch the playlist.
pub async fn ingest_message(state: &AppState, author: &UserId, text: &str) -> Result<usize> {
    if links::scan(text).is_empty() {
        return Ok(0);
    }

    let pass = state.maintainer.begin().await?;
    let mut batch = state.extractor.extract(text, pass.existing_ids()).await;
    if batch.is_empty() {
        debug!(author = %author, "No new tracks in message");
        return Ok(0);
    }

    // Last link in the message ends up at the head
    batch.reverse();
    let outcome = pass.commit(batch).await?;
    let added = outcome.inserted.len();

    credit(state, author, added).await;
    info!(author = %author, added, evicted = outcome.evicted.len(), "Message ingested");
    Ok(added)
}

/// Re-read channel history in one pass
///
/// `messages` are newest first, as the chat platform returns them. Tracks
/// are credited to the author of the message they were first found in.
pub async fn backfill(state: &AppState, messages: Vec<HistoryMessage>) -> Result<BackfillReport> {
    let mut pass = state.maintainer.begin().await?;
    let mut batch: Vec<TrackReference> = Vec::new();
    let mut authors: HashMap<TrackId, UserId> = HashMap::new();
    let mut scanned = 0;

    for message in &messages {
        if links::scan(&message.text).is_empty() {
            continue;
        }
        scanned += 1;

        let mut found = state
            .extractor
            .extract(&message.text, pass.existing_ids())
            .await;
        pass.claim(&found);
        found.reverse();

        for reference in &found {
            authors
                .entry(reference.id.clone())
                .or_insert_with(|| message.author.clone());
        }
        batch.extend(found);
    }

    debug!(messages = messages.len(), scanned, candidates = batch.len(), "History scanned");

    let outcome = pass.commit(batch).await?;
    credit_outcome(state, &outcome, &authors).await;

    let report = BackfillReport {
        scanned,
        inserted: outcome.inserted.len(),
        evicted: outcome.evicted.len(),
    };
    info!(?report, "Backfill finished");
    Ok(report)
}

async fn credit_outcome(state: &AppState, outcome: &PassOutcome, authors: &HashMap<TrackId, UserId>) {
    let mut per_user: BTreeMap<&UserId, usize> = BTreeMap::new();
    for id in &outcome.inserted {
        if let Some(author) = authors.get(id) {
            *per_user.entry(author).or_default() += 1;
        }
    }

    for (author, added) in per_user {
        credit(state, author, added).await;
    }
}

// The playlist write already happened; a ledger failure only loses credit
async fn credit(state: &AppState, author: &UserId, added: usize) {
    if added == 0 {
        return;
    }
    let amount = u32::try_from(added).unwrap_or(u32::MAX);
    match state.ledger.increment(author, amount).await {
        Ok(total) => debug!(author = %author, added, total, "Contribution recorded"),
        Err(e) => warn!(author = %author, added, error = %e, "Failed to record contribution"),
    }
}

/// Acknowledgement posted after a live message added tracks
pub fn added_reply(count: usize) -> String {
    format!("Added {count} track(s).")
}

/// Follow-up posted when `/sync` finishes
pub fn backfill_reply(report: &BackfillReport) -> String {
    if report.inserted == 0 {
        "No new tracks found in previous messages.".to_string()
    } else {
        format!(
            "Added {} new track(s) from message history.",
            report.inserted
        )
    }
}

/// Reply to `/playlist`
pub fn playlist_reply(url: &str) -> String {
    format!("🎧 {url}")
}

pub const ADD_FAILED_REPLY: &str = "Failed to add track(s).";
pub const BACKFILL_FAILED_REPLY: &str = "Failed to add tracks from history.";
pub const BACKFILL_STARTED_REPLY: &str = "Reading previous messages...";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_reply_mentions_history() {
        let none = BackfillReport::default();
        assert_eq!(backfill_reply(&none), "No new tracks found in previous messages.");

        let some = BackfillReport {
            scanned: 4,
            inserted: 7,
            evicted: 0,
        };
        assert_eq!(backfill_reply(&some), "Added 7 new track(s) from message history.");
    }

    #[test]
    fn short_replies() {
        assert_eq!(added_reply(2), "Added 2 track(s).");
        assert_eq!(playlist_reply("https://x/p"), "🎧 https://x/p");
    }
}
