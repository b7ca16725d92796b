//! Link recognition in free-form chat text.
//!
//! Pure pattern matching: nothing here touches the network. Matches come back
//! in the order they appear in the text so that first-seen ordering survives
//! all the way to the playlist.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Catalog links: `open.spotify.com/[intl-xx/](track|album|playlist)/<id>`
static CATALOG_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"https?://open\.spotify\.com/(?:intl-[a-z]{2}/)?(?P<kind>track|album|playlist)/(?P<id>[a-zA-Z0-9]+)",
    )
    .expect("catalog link pattern is valid")
});

/// Long video links: `youtube.com/watch?...v=<id>` on www., m. and music. hosts
static VIDEO_WATCH_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"https?://(?:www\.|m\.|music\.)?youtube\.com/watch\?(?:[^\s&#]*&)*v=(?P<id>[a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)",
    )
    .expect("video watch pattern is valid")
});

/// Short video links: `youtu.be/<id>`
static VIDEO_SHORT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://youtu\.be/(?P<id>[a-zA-Z0-9_-]{11})(?:[^a-zA-Z0-9_-]|$)")
        .expect("video short-link pattern is valid")
});

/// Container kind of a catalog link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// A single track
    Track,
    /// Expands with one album lookup
    Album,
    /// Expands page by page
    Playlist,
}

impl CatalogKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "track" => Some(CatalogKind::Track),
            "album" => Some(CatalogKind::Album),
            "playlist" => Some(CatalogKind::Playlist),
            _ => None,
        }
    }

    /// Path segment used in catalog URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Track => "track",
            CatalogKind::Album => "album",
            CatalogKind::Playlist => "playlist",
        }
    }
}

/// A recognised link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMatch {
    /// Direct catalog reference carrying the catalog id
    Catalog {
        /// What the id names
        kind: CatalogKind,
        /// Base-62 catalog id
        id: String,
    },
    /// Video on the other service, identified by its video id
    Video {
        /// Eleven-character video id
        video_id: String,
    },
}

impl LinkMatch {
    /// Canonical URL handed to the title resolver
    pub fn video_url(&self) -> Option<String> {
        match self {
            LinkMatch::Video { video_id } => {
                Some(format!("https://www.youtube.com/watch?v={video_id}"))
            }
            LinkMatch::Catalog { .. } => None,
        }
    }
}

impl fmt::Display for LinkMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMatch::Catalog { kind, id } => write!(f, "{}:{}", kind.as_str(), id),
            LinkMatch::Video { video_id } => write!(f, "video:{video_id}"),
        }
    }
}

/// Every link in `text`, in order of appearance
pub fn scan(text: &str) -> Vec<LinkMatch> {
    let mut found: Vec<(usize, LinkMatch)> = Vec::new();

    for caps in CATALOG_LINK.captures_iter(text) {
        let (Some(whole), Some(kind), Some(id)) = (caps.get(0), caps.name("kind"), caps.name("id"))
        else {
            continue;
        };
        if let Some(kind) = CatalogKind::parse(kind.as_str()) {
            found.push((
                whole.start(),
                LinkMatch::Catalog {
                    kind,
                    id: id.as_str().to_string(),
                },
            ));
        }
    }

    for pattern in [&*VIDEO_WATCH_LINK, &*VIDEO_SHORT_LINK] {
        for caps in pattern.captures_iter(text) {
            if let (Some(whole), Some(id)) = (caps.get(0), caps.name("id")) {
                found.push((
                    whole.start(),
                    LinkMatch::Video {
                        video_id: id.as_str().to_string(),
                    },
                ));
            }
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, link)| link).collect()
}
