/// Shared application state
use crate::config::BotConfig;
use linkdrop_core::{ContributionLedger, LinkExtractor, PlaylistMaintainer};
use std::sync::Arc;

/// Everything event handlers need, built once in `main`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub extractor: Arc<LinkExtractor>,
    pub maintainer: Arc<PlaylistMaintainer>,
    pub ledger: Arc<dyn ContributionLedger>,
}

impl AppState {
    pub fn new(
        config: Arc<BotConfig>,
        extractor: Arc<LinkExtractor>,
        maintainer: Arc<PlaylistMaintainer>,
        ledger: Arc<dyn ContributionLedger>,
    ) -> Self {
        Self {
            config,
            extractor,
            maintainer,
            ledger,
        }
    }

    /// The configured chat channel
    pub fn channel_id(&self) -> u64 {
        self.config.discord.channel_id
    }

    /// Public link of the target playlist
    pub fn playlist_url(&self) -> &str {
        &self.maintainer.playlist().url
    }
}
