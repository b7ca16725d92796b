//! Linkdrop Catalog Client
//!
//! HTTP client for the Spotify Web API, implementing the core's
//! [`linkdrop_core::CatalogGateway`].
//!
//! # Features
//!
//! - **Authentication**: refresh-token grant, one automatic refresh on 401
//! - **Playlists**: find-or-create by name, paginated listing, insert at
//!   position, remove all occurrences, size
//! - **Lookup**: album tracks, top search hit
//!
//! # Example
//!
//! ```ignore
//! use linkdrop_catalog::{SpotifyClient, SpotifyConfig};
//! use linkdrop_core::CatalogGateway;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SpotifyConfig::new("client-id", "client-secret", "refresh-token", "owner");
//!     let client = SpotifyClient::new(config)?;
//!
//!     let playlist = client.resolve_playlist("Channel Picks").await?;
//!     println!("Playlist at {}", playlist.url);
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod error;
mod gateway;
mod types;

// Re-export main types
pub use auth::AuthClient;
pub use client::SpotifyClient;
pub use error::{CatalogClientError, Result};
pub use types::{
    Paging, PlaylistItem, PlaylistSummary, SpotifyConfig, TokenResponse, TrackObject,
    DEFAULT_ACCOUNTS_BASE, DEFAULT_API_BASE,
};
