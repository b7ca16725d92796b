//! In-memory collaborators for tests.
//!
//! Enabled inside this crate's tests and for downstream crates through the
//! `test-util` feature. Every double records what it was asked to do so tests
//! can assert on call order.

#![allow(clippy::missing_panics_doc)]

use crate::error::{LinkdropError, Result};
use crate::paging::{Page, PageCursor};
use crate::traits::{CatalogGateway, ContributionLedger, TitleResolver, WRITE_BATCH_LIMIT};
use crate::types::{ContributionRecord, PlaylistHandle, PlaylistId, TrackId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A catalog write observed by [`InMemoryCatalog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    /// Tracks inserted at `position`
    Insert {
        /// Zero-based insert index
        position: usize,
        /// Inserted ids in order
        tracks: Vec<TrackId>,
    },
    /// Tracks removed by id
    Remove {
        /// Removed ids
        tracks: Vec<TrackId>,
    },
}

#[derive(Default)]
struct CatalogState {
    playlists: HashMap<PlaylistId, Vec<TrackId>>,
    names: HashMap<String, PlaylistId>,
    albums: HashMap<String, Vec<TrackId>>,
    search: HashMap<String, TrackId>,
    broken: HashSet<String>,
    fail_insert: bool,
    fail_remove: bool,
    writes: Vec<WriteCall>,
}

/// Catalog backed by in-memory lists with configurable failures
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
    page_size: usize,
    page_requests: AtomicUsize,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    /// Empty catalog with the default page size
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState::default()),
            page_size: 100,
            page_requests: AtomicUsize::new(0),
        }
    }

    /// Overrides how many tracks one page holds
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Replaces the contents of a playlist
    pub fn set_playlist(&self, playlist: &PlaylistId, tracks: Vec<TrackId>) {
        let mut state = self.state.lock().unwrap();
        state.playlists.insert(playlist.clone(), tracks);
    }

    /// Makes a playlist visible to the by-name lookup
    pub fn name_playlist(&self, name: &str, playlist: &PlaylistId) {
        let mut state = self.state.lock().unwrap();
        state.names.insert(name.to_lowercase(), playlist.clone());
        state.playlists.entry(playlist.clone()).or_default();
    }

    /// Tracks returned for an album
    pub fn set_album(&self, album_id: &str, tracks: Vec<TrackId>) {
        let mut state = self.state.lock().unwrap();
        state.albums.insert(album_id.to_string(), tracks);
    }

    /// Answer returned for a search query
    pub fn set_search_result(&self, query: &str, track: TrackId) {
        let mut state = self.state.lock().unwrap();
        state.search.insert(query.to_lowercase(), track);
    }

    /// Make lookups of this album/playlist id or search query fail
    pub fn break_lookup(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        state.broken.insert(key.to_lowercase());
    }

    /// Makes every insert fail until reset
    pub fn fail_inserts(&self, fail: bool) {
        self.state.lock().unwrap().fail_insert = fail;
    }

    /// Makes every removal fail until reset
    pub fn fail_removals(&self, fail: bool) {
        self.state.lock().unwrap().fail_remove = fail;
    }

    /// Current contents of a playlist
    pub fn tracks(&self, playlist: &PlaylistId) -> Vec<TrackId> {
        let state = self.state.lock().unwrap();
        state.playlists.get(playlist).cloned().unwrap_or_default()
    }

    /// Every write call made so far, in order
    pub fn writes(&self) -> Vec<WriteCall> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Number of playlist pages fetched
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    fn check_broken(state: &CatalogState, key: &str) -> Result<()> {
        if state.broken.contains(&key.to_lowercase()) {
            return Err(LinkdropError::catalog(format!("lookup failed for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn resolve_playlist(&self, name: &str) -> Result<PlaylistHandle> {
        let mut state = self.state.lock().unwrap();
        let key = name.to_lowercase();
        let id = match state.names.get(&key) {
            Some(id) => id.clone(),
            None => {
                let id = PlaylistId::new(format!("generated-{}", state.names.len() + 1));
                state.names.insert(key, id.clone());
                state.playlists.insert(id.clone(), Vec::new());
                id
            }
        };
        let url = format!("https://open.spotify.com/playlist/{id}");
        Ok(PlaylistHandle::new(id, name, url))
    }

    async fn playlist_page(
        &self,
        playlist: &PlaylistId,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<TrackId>> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Self::check_broken(&state, playlist.as_str())?;

        let tracks = state
            .playlists
            .get(playlist)
            .ok_or_else(|| LinkdropError::catalog(format!("no such playlist: {playlist}")))?;

        let offset = match cursor {
            Some(cursor) => cursor
                .as_str()
                .strip_prefix("offset:")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| LinkdropError::catalog("malformed cursor"))?,
            None => 0,
        };

        let end = (offset + self.page_size).min(tracks.len());
        let items = tracks.get(offset..end).unwrap_or_default().to_vec();
        if end < tracks.len() {
            Ok(Page::with_next(items, PageCursor::new(format!("offset:{end}"))))
        } else {
            Ok(Page::last(items))
        }
    }

    async fn album_track_ids(&self, album_id: &str) -> Result<Vec<TrackId>> {
        let state = self.state.lock().unwrap();
        Self::check_broken(&state, album_id)?;
        state
            .albums
            .get(album_id)
            .cloned()
            .ok_or_else(|| LinkdropError::catalog(format!("no such album: {album_id}")))
    }

    async fn search_track(&self, query: &str) -> Result<Option<TrackId>> {
        let state = self.state.lock().unwrap();
        Self::check_broken(&state, query)?;
        Ok(state.search.get(&query.to_lowercase()).cloned())
    }

    async fn insert_tracks(
        &self,
        playlist: &PlaylistId,
        position: usize,
        tracks: &[TrackId],
    ) -> Result<()> {
        assert!(tracks.len() <= WRITE_BATCH_LIMIT, "insert batch too large");
        let mut state = self.state.lock().unwrap();
        if state.fail_insert {
            return Err(LinkdropError::catalog("insert rejected"));
        }
        state.writes.push(WriteCall::Insert {
            position,
            tracks: tracks.to_vec(),
        });
        let list = state.playlists.entry(playlist.clone()).or_default();
        let at = position.min(list.len());
        list.splice(at..at, tracks.iter().cloned());
        Ok(())
    }

    async fn remove_tracks(&self, playlist: &PlaylistId, tracks: &[TrackId]) -> Result<()> {
        assert!(tracks.len() <= WRITE_BATCH_LIMIT, "remove batch too large");
        let mut state = self.state.lock().unwrap();
        if state.fail_remove {
            return Err(LinkdropError::catalog("remove rejected"));
        }
        state.writes.push(WriteCall::Remove {
            tracks: tracks.to_vec(),
        });
        let doomed: HashSet<&TrackId> = tracks.iter().collect();
        if let Some(list) = state.playlists.get_mut(playlist) {
            list.retain(|id| !doomed.contains(id));
        }
        Ok(())
    }

    async fn playlist_len(&self, playlist: &PlaylistId) -> Result<usize> {
        let state = self.state.lock().unwrap();
        Ok(state.playlists.get(playlist).map_or(0, Vec::len))
    }
}

/// Title resolver answering from a fixed table
#[derive(Default)]
pub struct StaticTitleResolver {
    titles: HashMap<String, String>,
}

impl StaticTitleResolver {
    /// Resolver that knows no titles
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the title returned for `url`
    pub fn with_title(mut self, url: &str, title: &str) -> Self {
        self.titles.insert(url.to_string(), title.to_string());
        self
    }
}

#[async_trait]
impl TitleResolver for StaticTitleResolver {
    async fn resolve_title(&self, url: &str) -> Result<Option<String>> {
        Ok(self.titles.get(url).cloned())
    }
}

/// Ledger kept in a map
#[derive(Default)]
pub struct InMemoryLedger {
    counts: Mutex<HashMap<UserId, u64>>,
}

impl InMemoryLedger {
    /// Ledger with no contributions
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContributionLedger for InMemoryLedger {
    async fn increment(&self, user: &UserId, amount: u32) -> Result<u64> {
        let mut counts = self.counts.lock().unwrap();
        if amount == 0 {
            return Ok(counts.get(user).copied().unwrap_or(0));
        }
        let count = counts.entry(user.clone()).or_insert(0);
        *count += u64::from(amount);
        Ok(*count)
    }

    async fn count_for(&self, user: &UserId) -> Result<u64> {
        Ok(self.counts.lock().unwrap().get(user).copied().unwrap_or(0))
    }

    async fn top(&self, limit: usize) -> Result<Vec<ContributionRecord>> {
        let counts = self.counts.lock().unwrap();
        let mut records: Vec<_> = counts
            .iter()
            .map(|(user, count)| ContributionRecord::new(user.clone(), *count))
            .collect();
        records.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));
        records.truncate(limit);
        Ok(records)
    }
}
