//! Main catalog client.

use crate::auth::AuthClient;
use crate::error::{CatalogClientError, Result};
use crate::types::{
    AddTracksRequest, CreatePlaylistRequest, Paging, PlaylistItem, PlaylistSummary, PlaylistTotal,
    RemoveTracksRequest, SearchResponse, SnapshotResponse, SpotifyConfig, TrackObject, TrackUri,
};
use linkdrop_core::{PlaylistHandle, PlaylistId};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Page size for playlist listings (service maximum)
const PLAYLIST_PAGE_LIMIT: &str = "100";
/// Page size for album track listings (service maximum)
const ALBUM_PAGE_LIMIT: &str = "50";

/// Client for the catalog Web API.
///
/// Holds one access token, obtained lazily from the configured refresh token
/// and refreshed once whenever a request comes back 401. A refresh token
/// rotated by the accounts service replaces the configured one.
pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
    api_base: Url,
    access_token: RwLock<Option<String>>,
    refresh_token: RwLock<String>,
}

impl SpotifyClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let api_base = parse_base(&config.api_base)?;
        parse_base(&config.accounts_base)?;

        let config = SpotifyConfig {
            accounts_base: config.accounts_base.trim_end_matches('/').to_string(),
            ..config
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Linkdrop/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let refresh_token = RwLock::new(config.refresh_token.clone());

        Ok(Self {
            http,
            config,
            api_base,
            access_token: RwLock::new(None),
            refresh_token,
        })
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    /// Set the access token directly (skips the first refresh).
    pub async fn set_access_token(&self, token: impl Into<String>) {
        *self.access_token.write().await = Some(token.into());
    }

    /// Refresh token used for the next exchange.
    pub async fn current_refresh_token(&self) -> String {
        self.refresh_token.read().await.clone()
    }

    /// Exchange the refresh token for a new access token and store it.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self.current_refresh_token().await;
        let auth = AuthClient::new(&self.http, &self.config.accounts_base);
        let response = auth
            .refresh_access_token(
                &self.config.client_id,
                &self.config.client_secret,
                &refresh_token,
            )
            .await?;

        if let Some(rotated) = response.refresh_token.filter(|t| !t.is_empty()) {
            debug!("Refresh token rotated");
            *self.refresh_token.write().await = rotated;
        }

        *self.access_token.write().await = Some(response.access_token.clone());
        Ok(response.access_token)
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_access_token().await
    }

    /// Execute an operation with automatic token refresh on 401.
    ///
    /// The operation receives the bearer token. If it fails with
    /// `AuthRequired`, the token is refreshed and the operation retried once.
    pub async fn with_auto_refresh<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let token = self.access_token().await?;
        match operation(token).await {
            Err(CatalogClientError::AuthRequired) => {
                warn!("Access token expired, attempting refresh");
                let token = self.refresh_access_token().await?;
                operation(token).await
            }
            other => other,
        }
    }

    /// API URL from path segments and query parameters.
    fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogClientError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Accept a `next` link only if it points back at the API.
    fn follow(&self, next: &str) -> Result<Url> {
        let base = self.api_base.as_str().trim_end_matches('/');
        if !next.starts_with(base) {
            return Err(CatalogClientError::InvalidUrl(format!(
                "pagination link outside the API: {next}"
            )));
        }
        Url::parse(next).map_err(|e| CatalogClientError::InvalidUrl(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!(url = %url, "GET");
        self.with_auto_refresh(|token| {
            let request = self.http.get(url.clone()).bearer_auth(token);
            async move { parse(send(request).await?).await }
        })
        .await
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Find the user's playlist by name (case-insensitive) or create it.
    pub async fn find_or_create_playlist(&self, name: &str) -> Result<PlaylistHandle> {
        let wanted = name.to_lowercase();
        let mut url = self.endpoint(&["me", "playlists"], &[("limit", "50")])?;

        loop {
            let page: Paging<PlaylistSummary> = self.get_json(&url).await?;
            if let Some(found) = page.items.into_iter().find(|p| p.name.to_lowercase() == wanted) {
                info!(playlist = %found.id, name = %found.name, "Found existing playlist");
                return Ok(handle(found));
            }
            match page.next {
                Some(next) => url = self.follow(&next)?,
                None => break,
            }
        }

        self.create_playlist(name).await
    }

    /// Create a public playlist owned by the configured user.
    pub async fn create_playlist(&self, name: &str) -> Result<PlaylistHandle> {
        let url = self.endpoint(&["users", &self.config.username, "playlists"], &[])?;
        let body = CreatePlaylistRequest {
            name,
            public: true,
            description: "Tracks shared in chat, collected by Linkdrop",
        };

        let created: PlaylistSummary = self
            .with_auto_refresh(|token| {
                let request = self.http.post(url.clone()).bearer_auth(token).json(&body);
                async move { parse(send(request).await?).await }
            })
            .await?;

        info!(playlist = %created.id, name = %created.name, "Created playlist");
        Ok(handle(created))
    }

    /// One page of a playlist's entries; `cursor` is the previous page's `next`.
    pub async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paging<PlaylistItem>> {
        let url = match cursor {
            Some(next) => self.follow(next)?,
            None => self.endpoint(
                &["playlists", playlist_id, "tracks"],
                &[("limit", PLAYLIST_PAGE_LIMIT)],
            )?,
        };
        self.get_json(&url).await
    }

    /// Number of entries in a playlist.
    pub async fn playlist_total(&self, playlist_id: &str) -> Result<usize> {
        let url = self.endpoint(
            &["playlists", playlist_id, "tracks"],
            &[("fields", "total"), ("limit", "1")],
        )?;
        let total: PlaylistTotal = self.get_json(&url).await?;
        Ok(total.total)
    }

    /// Insert track URIs at `position`, keeping their order.
    pub async fn add_tracks(&self, playlist_id: &str, position: usize, uris: Vec<String>) -> Result<String> {
        let url = self.endpoint(&["playlists", playlist_id, "tracks"], &[])?;
        let count = uris.len();
        let body = AddTracksRequest { uris, position };

        let snapshot: SnapshotResponse = self
            .with_auto_refresh(|token| {
                let request = self.http.post(url.clone()).bearer_auth(token).json(&body);
                async move { parse(send(request).await?).await }
            })
            .await?;

        debug!(playlist = %playlist_id, count, position, "Inserted tracks");
        Ok(snapshot.snapshot_id)
    }

    /// Remove every occurrence of the given track URIs.
    pub async fn remove_tracks(&self, playlist_id: &str, uris: Vec<String>) -> Result<String> {
        let url = self.endpoint(&["playlists", playlist_id, "tracks"], &[])?;
        let count = uris.len();
        let body = RemoveTracksRequest {
            tracks: uris.into_iter().map(|uri| TrackUri { uri }).collect(),
        };

        let snapshot: SnapshotResponse = self
            .with_auto_refresh(|token| {
                let request = self.http.delete(url.clone()).bearer_auth(token).json(&body);
                async move { parse(send(request).await?).await }
            })
            .await?;

        debug!(playlist = %playlist_id, count, "Removed tracks");
        Ok(snapshot.snapshot_id)
    }

    // =========================================================================
    // Albums & Search
    // =========================================================================

    /// Track ids of an album in album order (one request).
    pub async fn album_tracks(&self, album_id: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["albums", album_id, "tracks"], &[("limit", ALBUM_PAGE_LIMIT)])?;
        let page: Paging<TrackObject> = self.get_json(&url).await?;
        Ok(page.items.into_iter().filter_map(|t| t.id).collect())
    }

    /// Id of the top track hit for a free-text query.
    pub async fn search_track(&self, query: &str) -> Result<Option<String>> {
        let url = self.endpoint(&["search"], &[("q", query), ("type", "track"), ("limit", "1")])?;
        let results: SearchResponse = self.get_json(&url).await?;
        Ok(results.tracks.items.into_iter().find_map(|t| t.id))
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    if raw.is_empty() {
        return Err(CatalogClientError::InvalidUrl("URL cannot be empty".into()));
    }
    let url = Url::parse(raw).map_err(|e| CatalogClientError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogClientError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }
    Ok(url)
}

fn handle(playlist: PlaylistSummary) -> PlaylistHandle {
    let url = playlist
        .external_urls
        .spotify
        .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", playlist.id));
    PlaylistHandle::new(PlaylistId::new(playlist.id), playlist.name, url)
}

/// Send a request and map error statuses.
async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(CatalogClientError::AuthRequired),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1);
            warn!(retry_after_secs, "Rate limited by catalog");
            Err(CatalogClientError::RateLimited { retry_after_secs })
        }
        _ => {
            let error_text = response.text().await.unwrap_or_default();
            Err(CatalogClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| CatalogClientError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base: &str) -> Result<SpotifyClient> {
        SpotifyClient::new(
            SpotifyConfig::new("id", "secret", "refresh", "owner")
                .with_bases(api_base, "https://accounts.example.com/"),
        )
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(client("").is_err());
        assert!(client("not-a-url").is_err());
        assert!(client("ftp://example.com").is_err());
        assert!(client("https://api.example.com/v1").is_ok());
    }

    #[test]
    fn endpoint_joins_and_encodes_segments() {
        let client = client("https://api.example.com/v1/").unwrap();
        let url = client
            .endpoint(&["search"], &[("q", "Song X & Y"), ("type", "track")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/search?q=Song+X+%26+Y&type=track"
        );

        let url = client.endpoint(&["playlists", "a/b", "tracks"], &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/playlists/a%2Fb/tracks");
    }

    #[test]
    fn pagination_links_must_stay_on_the_api() {
        let client = client("https://api.example.com/v1").unwrap();
        assert!(client
            .follow("https://api.example.com/v1/playlists/p/tracks?offset=100")
            .is_ok());
        assert!(matches!(
            client.follow("https://evil.example.com/steal"),
            Err(CatalogClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn accounts_base_loses_trailing_slash() {
        let client = client("https://api.example.com/v1").unwrap();
        assert_eq!(client.config().accounts_base, "https://accounts.example.com");
    }
}
