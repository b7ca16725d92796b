//! Playlist domain types

use crate::types::{ExistingIdSet, PlaylistId, TrackId};
use serde::{Deserialize, Serialize};

/// The target playlist, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHandle {
    /// Catalog playlist ID
    pub id: PlaylistId,

    /// Display name
    pub name: String,

    /// Public link shared by the `/playlist` command
    pub url: String,
}

impl PlaylistHandle {
    /// Handle with its display name and share URL
    pub fn new(id: PlaylistId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Remote playlist contents in stored order
///
/// Index 0 is the head: new tracks are always inserted there, so the tail
/// holds the longest-resident entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistSnapshot {
    tracks: Vec<TrackId>,
}

impl PlaylistSnapshot {
    /// Snapshot over tracks in playlist order
    pub fn new(tracks: Vec<TrackId>) -> Self {
        Self { tracks }
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True for an empty playlist
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks in playlist order
    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }

    /// The `count` oldest entries, oldest last
    pub fn tail(&self, count: usize) -> &[TrackId] {
        let start = self.tracks.len().saturating_sub(count);
        &self.tracks[start..]
    }

    /// Membership view used to filter newly extracted links
    pub fn existing_ids(&self) -> ExistingIdSet {
        self.tracks.iter().cloned().collect()
    }
}
