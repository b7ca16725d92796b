//! Domain types shared by every Linkdrop crate

mod contribution;
mod ids;
mod playlist;
mod reference;

pub use contribution::ContributionRecord;
pub use ids::{PlaylistId, TrackId, UserId};
pub use playlist::{PlaylistHandle, PlaylistSnapshot};
pub use reference::{ExistingIdSet, SourceKind, TrackReference};
