//! Playlist maintenance: dedup, eviction and head insertion.
//!
//! A [`ReconciliationPass`] is the unit of work against the target playlist.
//! It is created by [`PlaylistMaintainer::begin`], which takes the playlist's
//! lock and reads a fresh snapshot; the lock is released when the pass is
//! committed or dropped. Within a commit, eviction happens before insertion
//! and insertion happens before the size re-check.
//!
//! Batches are ordered most-recent-first. The first element of a batch ends
//! up at the head of the playlist, so the tail always holds the
//! longest-resident entries and eviction can take it as "oldest". That only
//! holds while every insertion targets the head.

use crate::error::{LinkdropError, Result, WriteOp};
use crate::paging::{collect_pages, playlist_pages};
use crate::traits::{CatalogGateway, WRITE_BATCH_LIMIT};
use crate::types::{ExistingIdSet, PlaylistHandle, PlaylistSnapshot, TrackId, TrackReference};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// What a pass has to remove before inserting a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Tail entries to remove, oldest last
    pub evict: Vec<TrackId>,
    /// Batch length after capping to the maximum size
    pub batch_len: usize,
}

impl EvictionPlan {
    /// True when nothing has to be evicted
    pub fn is_noop(&self) -> bool {
        self.evict.is_empty()
    }
}

/// Work out the eviction needed to fit `batch_len` new entries
///
/// With `max_size` set, a batch larger than the maximum is capped to its first
/// `max_size` elements, and `current + batch - max` entries are taken from the
/// tail of `snapshot`. A playlist that is already over the maximum gets
/// trimmed back even for an empty batch. Without a maximum nothing is evicted.
pub fn plan_eviction(
    snapshot: &PlaylistSnapshot,
    batch_len: usize,
    max_size: Option<usize>,
) -> EvictionPlan {
    let Some(max) = max_size else {
        return EvictionPlan {
            evict: Vec::new(),
            batch_len,
        };
    };

    let batch_len = batch_len.min(max);
    let overflow = (snapshot.len() + batch_len).saturating_sub(max);

    EvictionPlan {
        evict: snapshot.tail(overflow).to_vec(),
        batch_len,
    }
}

/// Result of a committed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Inserted ids, head first
    pub inserted: Vec<TrackId>,
    /// Evicted ids, including any corrective trim
    pub evicted: Vec<TrackId>,
    /// Playlist size reported after the pass
    pub final_size: usize,
}

/// Owner of the target playlist
///
/// Shared behind an `Arc`; every pass against the playlist goes through here
/// so passes never interleave.
pub struct PlaylistMaintainer {
    catalog: Arc<dyn CatalogGateway>,
    playlist: PlaylistHandle,
    max_size: Option<usize>,
    lock: Mutex<()>,
}

impl PlaylistMaintainer {
    /// `max_size: None` disables rotation
    pub fn new(
        catalog: Arc<dyn CatalogGateway>,
        playlist: PlaylistHandle,
        max_size: Option<usize>,
    ) -> Self {
        Self {
            catalog,
            playlist,
            max_size,
            lock: Mutex::new(()),
        }
    }

    /// Playlist this maintainer writes to
    pub fn playlist(&self) -> &PlaylistHandle {
        &self.playlist
    }

    /// Size cap, `None` when rotation is off
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Lock the playlist and read its current contents
    ///
    /// Waits for any pass in progress to finish first.
    pub async fn begin(&self) -> Result<ReconciliationPass<'_>> {
        let guard = self.lock.lock().await;

        let tracks = collect_pages(playlist_pages(self.catalog.as_ref(), &self.playlist.id)).await?;
        let snapshot = PlaylistSnapshot::new(tracks);
        let present = snapshot.existing_ids();
        debug!(
            playlist = %self.playlist.id,
            size = snapshot.len(),
            "Began reconciliation pass"
        );

        Ok(ReconciliationPass {
            maintainer: self,
            _guard: guard,
            existing: present.clone(),
            present,
            snapshot,
        })
    }

    async fn remove_chunked(&self, ids: &[TrackId]) -> Result<()> {
        let mut seen = HashSet::new();
        let unique: Vec<TrackId> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();

        for chunk in unique.chunks(WRITE_BATCH_LIMIT) {
            self.catalog
                .remove_tracks(&self.playlist.id, chunk)
                .await
                .map_err(|e| LinkdropError::write(WriteOp::Evict, e.to_string()))?;
        }
        Ok(())
    }

    async fn insert_at_head(&self, ids: &[TrackId]) -> Result<()> {
        for (index, chunk) in ids.chunks(WRITE_BATCH_LIMIT).enumerate() {
            self.catalog
                .insert_tracks(&self.playlist.id, index * WRITE_BATCH_LIMIT, chunk)
                .await
                .map_err(|e| LinkdropError::write(WriteOp::Insert, e.to_string()))?;
        }
        Ok(())
    }

    /// Trim the tail if the playlist grew past the maximum behind our back
    async fn enforce_max(&self, max: usize, size: usize) -> Result<(Vec<TrackId>, usize)> {
        if size <= max {
            return Ok((Vec::new(), size));
        }

        warn!(
            playlist = %self.playlist.id,
            size,
            max,
            "Playlist over maximum after insert, trimming tail"
        );
        let tracks = collect_pages(playlist_pages(self.catalog.as_ref(), &self.playlist.id)).await?;
        let listing = PlaylistSnapshot::new(tracks);
        let excess = listing.tail(listing.len().saturating_sub(max)).to_vec();
        self.remove_chunked(&excess).await?;

        let size = self.catalog.playlist_len(&self.playlist.id).await?;
        Ok((excess, size))
    }
}

/// One locked dedup/evict/insert cycle against the target playlist
pub struct ReconciliationPass<'a> {
    maintainer: &'a PlaylistMaintainer,
    _guard: MutexGuard<'a, ()>,
    snapshot: PlaylistSnapshot,
    /// Ids in the playlist when the pass began
    present: ExistingIdSet,
    /// `present` plus everything claimed during the pass
    existing: ExistingIdSet,
}

impl ReconciliationPass<'_> {
    /// Playlist contents read when the pass began
    pub fn snapshot(&self) -> &PlaylistSnapshot {
        &self.snapshot
    }

    /// Ids to extract against
    pub fn existing_ids(&self) -> &ExistingIdSet {
        &self.existing
    }

    /// Mark references as taken so later extractions in this pass skip them
    pub fn claim(&mut self, refs: &[TrackReference]) {
        self.existing.extend(refs.iter().map(|r| r.id.clone()));
    }

    /// Evict as needed, then insert `batch` at the head
    ///
    /// `batch` is most-recent-first. Ids already in the playlist and repeats
    /// within the batch are dropped. An eviction failure aborts before any
    /// insertion; both surface as [`LinkdropError::Write`].
    pub async fn commit(self, batch: Vec<TrackReference>) -> Result<PassOutcome> {
        let maintainer = self.maintainer;
        let mut seen = HashSet::new();
        let mut ids: Vec<TrackId> = batch
            .into_iter()
            .map(|r| r.id)
            .filter(|id| !self.present.contains(id) && seen.insert(id.clone()))
            .collect();

        let plan = plan_eviction(&self.snapshot, ids.len(), maintainer.max_size);
        if plan.batch_len < ids.len() {
            warn!(
                dropped = ids.len() - plan.batch_len,
                max = ?maintainer.max_size,
                "Batch larger than the playlist maximum, keeping the most recent"
            );
            ids.truncate(plan.batch_len);
        }

        if ids.is_empty() && plan.is_noop() {
            debug!(playlist = %maintainer.playlist.id, "Nothing to reconcile");
            return Ok(PassOutcome {
                final_size: self.snapshot.len(),
                ..PassOutcome::default()
            });
        }

        maintainer.remove_chunked(&plan.evict).await?;
        maintainer.insert_at_head(&ids).await?;

        let expected = self.snapshot.len() - plan.evict.len() + ids.len();
        let size = match maintainer.catalog.playlist_len(&maintainer.playlist.id).await {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "Could not re-check playlist size, assuming expected size");
                expected
            }
        };

        let mut evicted = plan.evict;
        let final_size = match maintainer.max_size {
            Some(max) => match maintainer.enforce_max(max, size).await {
                Ok((trimmed, size)) => {
                    evicted.extend(trimmed);
                    size
                }
                Err(e) => {
                    // The batch is in; a failed corrective trim must not hide that
                    warn!(error = %e, size, max, "Corrective trim failed");
                    size
                }
            },
            None => size,
        };

        info!(
            playlist = %maintainer.playlist.id,
            inserted = ids.len(),
            evicted = evicted.len(),
            final_size,
            "Reconciliation pass committed"
        );

        Ok(PassOutcome {
            inserted: ids,
            evicted,
            final_size,
        })
    }
}
