//! Video title cleanup before catalog search.
//!
//! Uploaded videos decorate song titles with "(Official Video)", "[Lyrics]",
//! "HD" and similar noise that drags catalog search toward covers and live
//! versions. Patterns are applied in order.

use once_cell::sync::Lazy;
use regex::Regex;

static DECORATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "(Official Music Video)", "[Official Video 4K]", "(Official Audio)"
        r"(?i)\s*[\(\[]\s*official\s+(?:music\s+)?(?:video|audio|visuali[sz]er|lyric\s+video)(?:\s+\w+)?\s*[\)\]]",
        // "(Lyrics)", "[Lyric Video]", "(Audio)", "(Visualizer)"
        r"(?i)\s*[\(\[]\s*(?:lyrics?(?:\s+video)?|audio|visuali[sz]er|music\s+video|video\s+clip|clip\s+officiel)\s*[\)\]]",
        // "[HD]", "(4K Remaster)", "[HQ]"
        r"(?i)\s*[\(\[]\s*(?:hd|hq|4k|1080p)(?:\s+remaster(?:ed)?)?\s*[\)\]]",
        // Trailing "| Official Video" style separators
        r"(?i)\s*[|│]\s*official.*$",
        // Bare trailing "HD" / "HQ"
        r"(?i)\s+(?:hd|hq)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("title pattern is valid"))
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strip upload decorations from a video title
///
/// Falls back to the trimmed input if cleanup would leave nothing.
pub fn normalize_video_title(raw: &str) -> String {
    let mut title = raw.trim().to_string();
    for pattern in DECORATIONS.iter() {
        title = pattern.replace_all(&title, "").into_owned();
    }
    let title = WHITESPACE.replace_all(title.trim(), " ").into_owned();

    if title.is_empty() {
        raw.trim().to_string()
    } else {
        title
    }
}
