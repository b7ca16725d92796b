//! Collaborator traits for Linkdrop
//!
//! The core never talks to a network or a database directly; the bot wires in
//! implementations of these traits (HTTP catalog client, yt-dlp, SQLite).

use crate::error::Result;
use crate::paging::{Page, PageCursor};
use crate::types::{ContributionRecord, PlaylistHandle, PlaylistId, TrackId, UserId};
use async_trait::async_trait;

/// Largest number of tracks a single catalog write may carry
pub const WRITE_BATCH_LIMIT: usize = 100;

/// Remote music catalog
///
/// All operations may fail with a recoverable `LinkdropError::Catalog`, which
/// is also what malformed ids produce.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Find the user's playlist with this name (case-insensitive) or create it
    async fn resolve_playlist(&self, name: &str) -> Result<PlaylistHandle>;

    /// One page of a playlist's track ids, starting at `cursor` (or the first page)
    ///
    /// Entries without a catalog track (local files, podcasts) are skipped.
    async fn playlist_page(
        &self,
        playlist: &PlaylistId,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<TrackId>>;

    /// Track ids of an album, in album order
    async fn album_track_ids(&self, album_id: &str) -> Result<Vec<TrackId>>;

    /// Best match for a free-text query, if any
    async fn search_track(&self, query: &str) -> Result<Option<TrackId>>;

    /// Insert up to `WRITE_BATCH_LIMIT` tracks starting at `position`, keeping their order
    async fn insert_tracks(
        &self,
        playlist: &PlaylistId,
        position: usize,
        tracks: &[TrackId],
    ) -> Result<()>;

    /// Remove every occurrence of up to `WRITE_BATCH_LIMIT` tracks
    async fn remove_tracks(&self, playlist: &PlaylistId, tracks: &[TrackId]) -> Result<()>;

    /// Current number of entries, without listing them
    async fn playlist_len(&self, playlist: &PlaylistId) -> Result<usize>;
}

/// Resolves a video link to a display title
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TitleResolver: Send + Sync {
    /// `Ok(None)` means the link is unresolvable (private, removed, not a video)
    async fn resolve_title(&self, url: &str) -> Result<Option<String>>;
}

/// Durable per-user contribution counter
#[async_trait]
pub trait ContributionLedger: Send + Sync {
    /// Add `amount` to the user's count and return the new total
    ///
    /// Must be an atomic upsert: concurrent increments never lose updates.
    /// An amount of 0 leaves the ledger untouched.
    async fn increment(&self, user: &UserId, amount: u32) -> Result<u64>;

    /// Current count for one user (0 if they never contributed)
    async fn count_for(&self, user: &UserId) -> Result<u64>;

    /// Highest counts first, at most `limit` records
    async fn top(&self, limit: usize) -> Result<Vec<ContributionRecord>>;
}
