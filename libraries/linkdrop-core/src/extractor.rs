//! Link extraction: chat text in, net-new catalog tracks out.

use crate::error::{LinkdropError, Result};
use crate::links::{scan, CatalogKind, LinkMatch};
use crate::paging::{collect_pages, playlist_pages};
use crate::title::normalize_video_title;
use crate::traits::{CatalogGateway, TitleResolver};
use crate::types::{ExistingIdSet, PlaylistId, SourceKind, TrackId, TrackReference};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds music links in text and resolves them to catalog tracks
///
/// Catalog links resolve directly (expanding albums and playlists), video
/// links resolve across services by searching the catalog for the video's
/// title. A link that fails to resolve is logged and skipped without affecting
/// the other links in the same text.
#[derive(Clone)]
pub struct LinkExtractor {
    catalog: Arc<dyn CatalogGateway>,
    titles: Arc<dyn TitleResolver>,
}

impl LinkExtractor {
    /// Builds an extractor over the given catalog and title resolver
    pub fn new(catalog: Arc<dyn CatalogGateway>, titles: Arc<dyn TitleResolver>) -> Self {
        Self { catalog, titles }
    }

    /// Tracks linked from `text` that are not in `existing`
    ///
    /// The result has no duplicates and keeps first-seen order. Neither input
    /// is modified, so repeating the call gives the same answer as long as the
    /// catalog does.
    pub async fn extract(&self, text: &str, existing: &ExistingIdSet) -> Vec<TrackReference> {
        let mut emitted: HashSet<TrackId> = HashSet::new();
        let mut found = Vec::new();

        for link in scan(text) {
            let refs = match self.resolve(&link).await {
                Ok(refs) => refs,
                Err(e) => {
                    warn!(link = %link, error = %e, "Skipping link that failed to resolve");
                    continue;
                }
            };

            for reference in refs {
                if existing.contains(&reference.id) || !emitted.insert(reference.id.clone()) {
                    continue;
                }
                found.push(reference);
            }
        }

        debug!(count = found.len(), "Extracted new track references");
        found
    }

    /// Every track one link stands for, before dedup
    pub async fn resolve(&self, link: &LinkMatch) -> Result<Vec<TrackReference>> {
        match link {
            LinkMatch::Catalog { kind, id } => self.expand_catalog_link(*kind, id).await,
            LinkMatch::Video { .. } => match link.video_url() {
                Some(url) => self.match_video(&url).await,
                None => Ok(Vec::new()),
            },
        }
    }

    /// Direct references: a track as-is, albums and playlists expanded to members
    pub async fn expand_catalog_link(
        &self,
        kind: CatalogKind,
        id: &str,
    ) -> Result<Vec<TrackReference>> {
        let reference = format!("{}:{}", kind.as_str(), id);
        match kind {
            CatalogKind::Track => Ok(vec![TrackReference::new(
                TrackId::new(id),
                SourceKind::DirectTrack,
            )]),
            CatalogKind::Album => {
                let tracks = self
                    .catalog
                    .album_track_ids(id)
                    .await
                    .map_err(|e| LinkdropError::expansion(&reference, e.to_string()))?;
                debug!(album = %id, tracks = tracks.len(), "Expanded album");
                Ok(tag(tracks, SourceKind::AlbumDerived))
            }
            CatalogKind::Playlist => {
                let playlist = PlaylistId::new(id);
                let tracks = collect_pages(playlist_pages(self.catalog.as_ref(), &playlist))
                    .await
                    .map_err(|e| LinkdropError::expansion(&reference, e.to_string()))?;
                debug!(playlist = %id, tracks = tracks.len(), "Expanded playlist");
                Ok(tag(tracks, SourceKind::PlaylistDerived))
            }
        }
    }

    /// Cross-service reference: the top catalog hit for a video's title
    pub async fn match_video(&self, url: &str) -> Result<Vec<TrackReference>> {
        let Some(title) = self.titles.resolve_title(url).await? else {
            debug!(url = %url, "Video title unresolvable");
            return Ok(Vec::new());
        };

        let query = normalize_video_title(&title);
        let hit = self
            .catalog
            .search_track(&query)
            .await
            .map_err(|e| LinkdropError::expansion(url, e.to_string()))?;

        match hit {
            Some(id) => {
                debug!(url = %url, query = %query, track = %id, "Matched video to track");
                Ok(vec![TrackReference::new(id, SourceKind::TitleMatched)])
            }
            None => {
                debug!(url = %url, query = %query, "No catalog match for video");
                Ok(Vec::new())
            }
        }
    }
}

fn tag(tracks: Vec<TrackId>, source: SourceKind) -> Vec<TrackReference> {
    tracks
        .into_iter()
        .map(|id| TrackReference::new(id, source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCatalog, StaticTitleResolver};
    use crate::traits::MockTitleResolver;
    use proptest::prelude::*;

    const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn ids(raw: &[&str]) -> Vec<TrackId> {
        raw.iter().map(|id| TrackId::new(*id)).collect()
    }

    fn existing(raw: &[&str]) -> ExistingIdSet {
        ids(raw).into_iter().collect()
    }

    fn returned_ids(refs: &[TrackReference]) -> Vec<&str> {
        refs.iter().map(|r| r.id.as_str()).collect()
    }

    fn extractor(catalog: InMemoryCatalog, titles: StaticTitleResolver) -> LinkExtractor {
        LinkExtractor::new(Arc::new(catalog), Arc::new(titles))
    }

    #[tokio::test]
    async fn direct_track_link_is_returned() {
        let extractor = extractor(InMemoryCatalog::new(), StaticTitleResolver::new());

        let refs = extractor
            .extract("check this https://open.spotify.com/track/abc123", &existing(&[]))
            .await;

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id.as_str(), "abc123");
        assert_eq!(refs[0].source, SourceKind::DirectTrack);
    }

    #[tokio::test]
    async fn track_already_in_playlist_is_dropped() {
        let extractor = extractor(InMemoryCatalog::new(), StaticTitleResolver::new());

        let refs = extractor
            .extract("check this https://open.spotify.com/track/abc123", &existing(&["abc123"]))
            .await;

        assert!(refs.is_empty());
    }

    #[tokio::test]
    async fn album_expands_to_its_tracks() {
        let catalog = InMemoryCatalog::new();
        catalog.set_album("alb1", ids(&["t1", "t2", "t3"]));
        let extractor = extractor(catalog, StaticTitleResolver::new());

        let refs = extractor
            .extract("https://open.spotify.com/album/alb1", &existing(&["t2"]))
            .await;

        assert_eq!(returned_ids(&refs), vec!["t1", "t3"]);
        assert!(refs.iter().all(|r| r.source == SourceKind::AlbumDerived));
    }

    #[tokio::test]
    async fn playlist_expansion_follows_every_page() {
        let catalog = InMemoryCatalog::new().with_page_size(2);
        catalog.set_playlist(&PlaylistId::new("pl1"), ids(&["a", "b", "c", "d", "e"]));
        let extractor = extractor(catalog, StaticTitleResolver::new());

        let refs = extractor
            .extract("https://open.spotify.com/playlist/pl1", &existing(&["c"]))
            .await;

        assert_eq!(returned_ids(&refs), vec!["a", "b", "d", "e"]);
        assert!(refs.iter().all(|r| r.source == SourceKind::PlaylistDerived));
    }

    #[tokio::test]
    async fn duplicates_across_links_keep_first_occurrence() {
        let catalog = InMemoryCatalog::new();
        catalog.set_album("alb1", ids(&["t1", "t2"]));
        let extractor = extractor(catalog, StaticTitleResolver::new());

        let text = "https://open.spotify.com/track/t2 https://open.spotify.com/album/alb1 \
                    https://open.spotify.com/track/t1";
        let refs = extractor.extract(text, &existing(&[])).await;

        assert_eq!(returned_ids(&refs), vec!["t2", "t1"]);
        assert_eq!(refs[0].source, SourceKind::DirectTrack);
        assert_eq!(refs[1].source, SourceKind::AlbumDerived);
    }

    #[tokio::test]
    async fn video_link_matches_by_title() {
        let catalog = InMemoryCatalog::new();
        catalog.set_search_result("Song X", TrackId::new("xyz"));
        let titles = StaticTitleResolver::new().with_title(VIDEO_URL, "Song X");
        let extractor = extractor(catalog, titles);

        let refs = extractor
            .extract("https://youtu.be/dQw4w9WgXcQ", &existing(&[]))
            .await;

        assert_eq!(returned_ids(&refs), vec!["xyz"]);
        assert_eq!(refs[0].source, SourceKind::TitleMatched);
    }

    #[tokio::test]
    async fn video_title_is_cleaned_before_search() {
        let catalog = InMemoryCatalog::new();
        catalog.set_search_result("Song X", TrackId::new("xyz"));
        let titles = StaticTitleResolver::new().with_title(VIDEO_URL, "Song X (Official Video)");
        let extractor = extractor(catalog, titles);

        let refs = extractor
            .extract("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &existing(&[]))
            .await;

        assert_eq!(returned_ids(&refs), vec!["xyz"]);
    }

    #[tokio::test]
    async fn unresolvable_video_does_not_affect_other_links() {
        let mut titles = MockTitleResolver::new();
        titles
            .expect_resolve_title()
            .withf(|url| url == VIDEO_URL)
            .times(1)
            .returning(|_| Ok(None));
        let extractor = LinkExtractor::new(Arc::new(InMemoryCatalog::new()), Arc::new(titles));

        let text = "https://youtu.be/dQw4w9WgXcQ https://open.spotify.com/track/t1";
        let refs = extractor.extract(text, &existing(&[])).await;

        assert_eq!(returned_ids(&refs), vec!["t1"]);
    }

    #[tokio::test]
    async fn resolver_error_is_contained() {
        let mut titles = MockTitleResolver::new();
        titles
            .expect_resolve_title()
            .returning(|_| Err(LinkdropError::TitleResolution("yt-dlp exited with 1".into())));
        let extractor = LinkExtractor::new(Arc::new(InMemoryCatalog::new()), Arc::new(titles));

        let text = "https://open.spotify.com/track/t1 https://youtu.be/dQw4w9WgXcQ \
                    https://open.spotify.com/track/t2";
        let refs = extractor.extract(text, &existing(&[])).await;

        assert_eq!(returned_ids(&refs), vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn failed_album_lookup_skips_only_that_album() {
        let catalog = InMemoryCatalog::new();
        catalog.set_album("good", ids(&["g1"]));
        catalog.break_lookup("bad");
        let extractor = extractor(catalog, StaticTitleResolver::new());

        let text = "https://open.spotify.com/album/bad https://open.spotify.com/album/good";
        let refs = extractor.extract(text, &existing(&[])).await;

        assert_eq!(returned_ids(&refs), vec!["g1"]);
    }

    #[tokio::test]
    async fn expansion_error_names_the_link() {
        let catalog = InMemoryCatalog::new();
        catalog.break_lookup("bad");
        let extractor = extractor(catalog, StaticTitleResolver::new());

        let err = extractor
            .expand_catalog_link(CatalogKind::Album, "bad")
            .await
            .unwrap_err();

        match err {
            LinkdropError::Expansion { reference, .. } => assert_eq!(reference, "album:bad"),
            other => panic!("expected expansion error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_without_hit_contributes_nothing() {
        let titles = StaticTitleResolver::new().with_title(VIDEO_URL, "Unknown Song");
        let extractor = extractor(InMemoryCatalog::new(), titles);

        let refs = extractor
            .extract("https://youtu.be/dQw4w9WgXcQ", &existing(&[]))
            .await;

        assert!(refs.is_empty());
    }

    #[tokio::test]
    async fn search_error_is_contained() {
        let catalog = InMemoryCatalog::new();
        catalog.break_lookup("Song X");
        let titles = StaticTitleResolver::new().with_title(VIDEO_URL, "Song X");
        let extractor = extractor(catalog, titles);

        let text = "https://youtu.be/dQw4w9WgXcQ and https://open.spotify.com/track/t1";
        let refs = extractor.extract(text, &existing(&[])).await;

        assert_eq!(returned_ids(&refs), vec!["t1"]);
    }

    #[tokio::test]
    async fn failed_playlist_expansion_skips_only_that_playlist() {
        let catalog = InMemoryCatalog::new().with_page_size(1);
        catalog.set_playlist(&PlaylistId::new("good"), ids(&["p1", "p2"]));
        catalog.set_playlist(&PlaylistId::new("bad"), ids(&["x1"]));
        catalog.break_lookup("bad");
        let extractor = extractor(catalog, StaticTitleResolver::new());

        let text = "https://open.spotify.com/playlist/bad https://open.spotify.com/playlist/good";
        let refs = extractor.extract(text, &existing(&[])).await;

        assert_eq!(returned_ids(&refs), vec!["p1", "p2"]);
        assert!(refs.iter().all(|r| r.source == SourceKind::PlaylistDerived));
    }

    // ===== Properties =====

    #[derive(Debug, Clone)]
    enum Piece {
        Track(u8),
        Album(u8),
        Words,
    }

    fn piece() -> impl Strategy<Value = Piece> {
        prop_oneof![
            (0u8..12).prop_map(Piece::Track),
            (0u8..3).prop_map(Piece::Album),
            Just(Piece::Words),
        ]
    }

    fn render(pieces: &[Piece]) -> String {
        pieces
            .iter()
            .map(|p| match p {
                Piece::Track(n) => format!("https://open.spotify.com/track/t{n}"),
                Piece::Album(n) => format!("https://open.spotify.com/album/a{n}"),
                Piece::Words => "nice one".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn album_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        // Albums overlap with each other and with direct track ids
        catalog.set_album("a0", ids(&["t0", "t1", "t2"]));
        catalog.set_album("a1", ids(&["t2", "t3", "t4", "t5"]));
        catalog.set_album("a2", ids(&["t5", "t11", "t12"]));
        catalog
    }

    proptest! {
        #[test]
        fn never_returns_existing_or_duplicate_ids(
            pieces in prop::collection::vec(piece(), 0..12),
            known in prop::collection::hash_set(0u8..13, 0..8),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let extractor = extractor(album_catalog(), StaticTitleResolver::new());
            let existing: ExistingIdSet = known.iter().map(|n| TrackId::new(format!("t{n}"))).collect();
            let text = render(&pieces);

            let refs = rt.block_on(extractor.extract(&text, &existing));

            let mut seen = HashSet::new();
            for r in &refs {
                prop_assert!(!existing.contains(&r.id), "returned existing id {}", r.id);
                prop_assert!(seen.insert(r.id.clone()), "returned duplicate id {}", r.id);
            }
        }

        #[test]
        fn extraction_is_repeatable(
            pieces in prop::collection::vec(piece(), 0..12),
            known in prop::collection::hash_set(0u8..13, 0..8),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let extractor = extractor(album_catalog(), StaticTitleResolver::new());
            let existing: ExistingIdSet = known.iter().map(|n| TrackId::new(format!("t{n}"))).collect();
            let before = existing.clone();
            let text = render(&pieces);

            let first = rt.block_on(extractor.extract(&text, &existing));
            let second = rt.block_on(extractor.extract(&text, &existing));

            prop_assert_eq!(returned_ids(&first), returned_ids(&second));
            prop_assert_eq!(existing, before);
        }
    }
}
