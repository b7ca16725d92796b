//! Types for catalog API requests and responses.

use serde::{Deserialize, Serialize};

/// Default Web API base
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Default accounts service base (token endpoint lives under it)
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Credentials and endpoints for the catalog service.
#[derive(Clone)]
pub struct SpotifyConfig {
    /// Web API base URL
    pub api_base: String,
    /// Accounts service base URL
    pub accounts_base: String,
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token obtained out of band
    pub refresh_token: String,
    /// Owner of the target playlist
    pub username: String,
}

impl SpotifyConfig {
    /// Config against the public service endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            accounts_base: DEFAULT_ACCOUNTS_BASE.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            username: username.into(),
        }
    }

    /// Point both services somewhere else (tests, proxies).
    pub fn with_bases(mut self, api_base: impl Into<String>, accounts_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.accounts_base = accounts_base.into();
        self
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("api_base", &self.api_base)
            .field("accounts_base", &self.accounts_base)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Token validity in seconds
    #[serde(default)]
    pub expires_in: u64,
    /// Present only when the service rotates the refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// =============================================================================
// Listing Types
// =============================================================================

/// One page of a paginated listing; `next` is the absolute URL of the next page.
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

/// A playlist in the user's library.
#[derive(Debug, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub external_urls: ExternalUrls,
}

/// Entry of a playlist; `track` is null for removed or unavailable items.
#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// Track as returned by listings and search; local files have no id.
#[derive(Debug, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<TrackObject>,
}

/// Response from `fields=total` playlist queries.
#[derive(Debug, Deserialize)]
pub struct PlaylistTotal {
    pub total: usize,
}

// =============================================================================
// Write Types
// =============================================================================

/// Request body for creating a playlist.
#[derive(Debug, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub public: bool,
    pub description: &'a str,
}

/// Request body for inserting tracks.
#[derive(Debug, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
    pub position: usize,
}

#[derive(Debug, Serialize)]
pub struct TrackUri {
    pub uri: String,
}

/// Request body for removing every occurrence of tracks.
#[derive(Debug, Serialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

/// Response from playlist writes.
#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}
