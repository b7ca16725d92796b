//! Extracted track references

use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// How a track was found in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Link straight to a track
    DirectTrack,
    /// Member of a linked album
    AlbumDerived,
    /// Member of a linked playlist
    PlaylistDerived,
    /// Top search hit for a video's title
    TitleMatched,
}

impl SourceKind {
    /// Label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::DirectTrack => "direct_track",
            SourceKind::AlbumDerived => "album_derived",
            SourceKind::PlaylistDerived => "playlist_derived",
            SourceKind::TitleMatched => "title_matched",
        }
    }
}

/// A catalog track discovered in chat
///
/// Identity is the track id alone: the same track found through an album and
/// through a direct link is one reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackReference {
    /// Catalog track id
    pub id: TrackId,
    /// How the track was found
    pub source: SourceKind,
}

impl TrackReference {
    /// Pairs an id with its source
    pub fn new(id: TrackId, source: SourceKind) -> Self {
        Self { id, source }
    }
}

impl PartialEq for TrackReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackReference {}

impl Hash for TrackReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Ids already in the target playlist when a pass began
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingIdSet(HashSet<TrackId>);

impl ExistingIdSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is already present
    pub fn contains(&self, id: &TrackId) -> bool {
        self.0.contains(id)
    }

    /// Returns `true` if the id was not present yet
    pub fn insert(&mut self, id: TrackId) -> bool {
        self.0.insert(id)
    }

    /// Number of ids
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no ids are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TrackId> for ExistingIdSet {
    fn from_iter<I: IntoIterator<Item = TrackId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<TrackId> for ExistingIdSet {
    fn extend<I: IntoIterator<Item = TrackId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_compare_by_id_only() {
        let direct = TrackReference::new(TrackId::new("abc"), SourceKind::DirectTrack);
        let album = TrackReference::new(TrackId::new("abc"), SourceKind::AlbumDerived);
        assert_eq!(direct, album);

        let set: HashSet<_> = [direct, album].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn source_kind_string_conversion() {
        assert_eq!(SourceKind::DirectTrack.as_str(), "direct_track");
        assert_eq!(SourceKind::TitleMatched.as_str(), "title_matched");
    }
}
