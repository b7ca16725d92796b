//! Catalog gateway backed by the Web API client.

use crate::client::SpotifyClient;
use async_trait::async_trait;
use linkdrop_core::{
    CatalogGateway, Page, PageCursor, PlaylistHandle, PlaylistId, Result, TrackId,
};

#[async_trait]
impl CatalogGateway for SpotifyClient {
    async fn resolve_playlist(&self, name: &str) -> Result<PlaylistHandle> {
        Ok(self.find_or_create_playlist(name).await?)
    }

    async fn playlist_page(
        &self,
        playlist: &PlaylistId,
        cursor: Option<&PageCursor>,
    ) -> Result<Page<TrackId>> {
        let page = self
            .playlist_tracks_page(playlist.as_str(), cursor.map(PageCursor::as_str))
            .await?;

        let items = page
            .items
            .into_iter()
            .filter_map(|item| item.track.and_then(|track| track.id))
            .map(TrackId::new)
            .collect();

        Ok(match page.next {
            Some(next) => Page::with_next(items, PageCursor::new(next)),
            None => Page::last(items),
        })
    }

    async fn album_track_ids(&self, album_id: &str) -> Result<Vec<TrackId>> {
        let ids = self.album_tracks(album_id).await?;
        Ok(ids.into_iter().map(TrackId::new).collect())
    }

    async fn search_track(&self, query: &str) -> Result<Option<TrackId>> {
        Ok(SpotifyClient::search_track(self, query).await?.map(TrackId::new))
    }

    async fn insert_tracks(
        &self,
        playlist: &PlaylistId,
        position: usize,
        tracks: &[TrackId],
    ) -> Result<()> {
        let uris = tracks.iter().map(TrackId::uri).collect();
        self.add_tracks(playlist.as_str(), position, uris).await?;
        Ok(())
    }

    async fn remove_tracks(&self, playlist: &PlaylistId, tracks: &[TrackId]) -> Result<()> {
        let uris = tracks.iter().map(TrackId::uri).collect();
        SpotifyClient::remove_tracks(self, playlist.as_str(), uris).await?;
        Ok(())
    }

    async fn playlist_len(&self, playlist: &PlaylistId) -> Result<usize> {
        Ok(self.playlist_total(playlist.as_str()).await?)
    }
}
