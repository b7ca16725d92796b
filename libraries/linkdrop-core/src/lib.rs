//! Linkdrop Core
//!
//! Platform-agnostic core for the Linkdrop playlist bot: it turns chat
//! messages into catalog tracks and keeps a shared playlist within bounds.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackReference`, `PlaylistSnapshot`, `ContributionRecord`, etc.
//! - **Collaborator Traits**: `CatalogGateway`, `TitleResolver`, `ContributionLedger`
//! - **Link Extractor**: finds catalog and video links in free text and resolves them
//! - **Playlist Maintainer**: serialized dedup/evict/insert passes against one playlist
//! - **Error Handling**: Unified `LinkdropError` and `Result` types
//!
//! # Example
//!
//! ```rust,no_run
//! use linkdrop_core::{ExistingIdSet, LinkExtractor, PlaylistMaintainer};
//! # async fn example(
//! #     extractor: LinkExtractor,
//! #     maintainer: PlaylistMaintainer,
//! # ) -> linkdrop_core::Result<()> {
//! let pass = maintainer.begin().await?;
//! let refs = extractor
//!     .extract("https://open.spotify.com/track/abc123", pass.existing_ids())
//!     .await;
//! let outcome = pass.commit(refs).await?;
//! println!("added {} track(s)", outcome.inserted.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractor;
pub mod links;
pub mod maintainer;
pub mod paging;
pub mod scoreboard;
pub mod title;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export commonly used types
pub use error::{LinkdropError, Result, WriteOp};
pub use extractor::LinkExtractor;
pub use links::{scan, CatalogKind, LinkMatch};
pub use maintainer::{plan_eviction, EvictionPlan, PassOutcome, PlaylistMaintainer, ReconciliationPass};
pub use paging::{collect_pages, playlist_pages, Page, PageCursor};
pub use scoreboard::render_scoreboard;
pub use traits::{CatalogGateway, ContributionLedger, TitleResolver};

pub use types::{
    ContributionRecord, ExistingIdSet, PlaylistHandle, PlaylistId, PlaylistSnapshot, SourceKind,
    TrackId, TrackReference, UserId,
};
