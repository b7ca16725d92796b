//! Cursor-based pagination as lazy page streams.
//!
//! A page stream fetches nothing until polled and fetches one page per poll,
//! so a caller that stops early never pays for the remaining pages. Calling
//! [`playlist_pages`] again restarts from the first page.

use crate::error::{LinkdropError, Result};
use crate::traits::CatalogGateway;
use crate::types::{PlaylistId, TrackId};
use futures::stream::{self, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};

/// Opaque position of the next page (the catalog's "next" link)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wraps an opaque continuation value
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }

    /// Raw cursor value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// `None` once the listing is exhausted
    pub next: Option<PageCursor>,
}

impl<T> Page<T> {
    /// Final page, nothing follows
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    /// Page followed by `next`
    pub fn with_next(items: Vec<T>, next: PageCursor) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }
}

enum Position {
    First,
    At(PageCursor),
    Exhausted,
}

/// Lazily walk every page of a playlist's track ids
pub fn playlist_pages<'a>(
    catalog: &'a dyn CatalogGateway,
    playlist: &'a PlaylistId,
) -> impl Stream<Item = Result<Vec<TrackId>>> + Send + 'a {
    stream::try_unfold(Position::First, move |position| async move {
        let cursor = match position {
            Position::Exhausted => return Ok::<_, LinkdropError>(None),
            Position::First => None,
            Position::At(cursor) => Some(cursor),
        };

        let page = catalog.playlist_page(playlist, cursor.as_ref()).await?;
        let next = match page.next {
            Some(next) if Some(&next) == cursor.as_ref() => {
                // A cursor pointing at itself would never terminate
                return Err(LinkdropError::catalog(format!(
                    "pagination cursor did not advance: {}",
                    next.as_str()
                )));
            }
            Some(next) => Position::At(next),
            None => Position::Exhausted,
        };

        Ok(Some((page.items, next)))
    })
}

/// Drain a page stream into one ordered list
pub async fn collect_pages<T, S>(pages: S) -> Result<Vec<T>>
where
    S: Stream<Item = Result<Vec<T>>>,
{
    pages.try_concat().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryCatalog;
    use futures::StreamExt;

    fn ids(raw: &[&str]) -> Vec<TrackId> {
        raw.iter().map(|id| TrackId::new(*id)).collect()
    }

    #[tokio::test]
    async fn concatenation_of_pages_is_the_full_listing() {
        let catalog = InMemoryCatalog::new().with_page_size(2);
        let playlist = PlaylistId::new("mix");
        catalog.set_playlist(&playlist, ids(&["a", "b", "c", "d", "e"]));

        let all = collect_pages(playlist_pages(&catalog, &playlist))
            .await
            .unwrap();

        assert_eq!(all, ids(&["a", "b", "c", "d", "e"]));
        assert_eq!(catalog.page_requests(), 3);
    }

    #[tokio::test]
    async fn stream_is_lazy() {
        let catalog = InMemoryCatalog::new().with_page_size(1);
        let playlist = PlaylistId::new("mix");
        catalog.set_playlist(&playlist, ids(&["a", "b", "c"]));

        let mut pages = Box::pin(playlist_pages(&catalog, &playlist));
        assert_eq!(catalog.page_requests(), 0);

        let first = pages.next().await.unwrap().unwrap();
        assert_eq!(first, ids(&["a"]));
        assert_eq!(catalog.page_requests(), 1);
    }

    #[tokio::test]
    async fn restarting_reads_from_the_first_page() {
        let catalog = InMemoryCatalog::new().with_page_size(2);
        let playlist = PlaylistId::new("mix");
        catalog.set_playlist(&playlist, ids(&["a", "b", "c"]));

        let first = collect_pages(playlist_pages(&catalog, &playlist)).await.unwrap();
        let second = collect_pages(playlist_pages(&catalog, &playlist)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_playlist_yields_one_empty_page() {
        let catalog = InMemoryCatalog::new();
        let playlist = PlaylistId::new("empty");
        catalog.set_playlist(&playlist, Vec::new());

        let all = collect_pages(playlist_pages(&catalog, &playlist)).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn unknown_playlist_surfaces_the_catalog_error() {
        let catalog = InMemoryCatalog::new();
        let playlist = PlaylistId::new("missing");

        let result = collect_pages(playlist_pages(&catalog, &playlist)).await;
        assert!(matches!(result, Err(LinkdropError::Catalog(_))));
    }
}
