/// Bot configuration
use crate::error::{BotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "linkdrop.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BotConfig {
    #[serde(default)]
    pub discord: DiscordSettings,

    #[serde(default)]
    pub spotify: SpotifySettings,

    #[serde(default)]
    pub playlist: PlaylistSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub resolver: ResolverSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordSettings {
    #[serde(default)]
    pub token: String,

    /// The one channel the bot listens to
    #[serde(default)]
    pub channel_id: u64,

    /// Messages read by `/sync`, newest first
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_ack_delete_after_secs")]
    pub ack_delete_after_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub refresh_token: String,

    /// Owner of the target playlist
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub playlist_name: String,

    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub accounts_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistSettings {
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    #[serde(default = "default_rotation_enabled")]
    pub rotation_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    #[serde(default = "default_resolver_timeout_secs")]
    pub timeout_secs: u64,
}

impl BotConfig {
    /// Load configuration from file and environment
    ///
    /// The file is optional. Environment variables prefixed `LINKDROP_`
    /// override it, with `__` between section and key
    /// (`LINKDROP_DISCORD__TOKEN`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if let Some(path) = path {
            return Err(BotError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("LINKDROP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| BotError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| BotError::Config(e.to_string()))
    }

    /// Parse a TOML document without consulting files or environment
    pub fn from_toml(toml: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| BotError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let required = [
            (self.discord.token.as_str(), "discord.token (LINKDROP_DISCORD__TOKEN)"),
            (self.spotify.client_id.as_str(), "spotify.client_id (LINKDROP_SPOTIFY__CLIENT_ID)"),
            (
                self.spotify.client_secret.as_str(),
                "spotify.client_secret (LINKDROP_SPOTIFY__CLIENT_SECRET)",
            ),
            (
                self.spotify.refresh_token.as_str(),
                "spotify.refresh_token (LINKDROP_SPOTIFY__REFRESH_TOKEN)",
            ),
            (self.spotify.username.as_str(), "spotify.username (LINKDROP_SPOTIFY__USERNAME)"),
            (
                self.spotify.playlist_name.as_str(),
                "spotify.playlist_name (LINKDROP_SPOTIFY__PLAYLIST_NAME)",
            ),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(value, _)| value.trim().is_empty())
            .map(|(_, name)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(BotError::Config(format!("missing {}", missing.join(", "))));
        }

        if self.discord.channel_id == 0 {
            return Err(BotError::Config(
                "discord.channel_id is required (LINKDROP_DISCORD__CHANNEL_ID)".to_string(),
            ));
        }

        if self.playlist.rotation_enabled && self.playlist.max_size == 0 {
            return Err(BotError::Config(
                "playlist.max_size must be at least 1 while rotation is enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Human-readable summary with secrets redacted
    pub fn summary(&self) -> String {
        let rotation = match self.playlist.effective_max() {
            Some(max) => format!("keep newest {max}"),
            None => "off".to_string(),
        };
        [
            format!("discord.token          {}", redact(&self.discord.token)),
            format!("discord.channel_id     {}", self.discord.channel_id),
            format!("discord.history_limit  {}", self.discord.history_limit),
            format!("spotify.client_id      {}", self.spotify.client_id),
            format!("spotify.client_secret  {}", redact(&self.spotify.client_secret)),
            format!("spotify.refresh_token  {}", redact(&self.spotify.refresh_token)),
            format!("spotify.username       {}", self.spotify.username),
            format!("spotify.playlist_name  {}", self.spotify.playlist_name),
            format!("playlist.rotation      {rotation}"),
            format!("storage.database_url   {}", self.storage.database_url),
            format!("resolver.ytdlp_path    {}", self.resolver.ytdlp_path.display()),
        ]
        .join("\n")
    }
}

impl PlaylistSettings {
    /// Maximum size to enforce, `None` when rotation is off
    pub fn effective_max(&self) -> Option<usize> {
        self.rotation_enabled.then_some(self.max_size)
    }
}

impl DiscordSettings {
    pub fn ack_delete_after(&self) -> Duration {
        Duration::from_secs(self.ack_delete_after_secs)
    }
}

impl ResolverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorageSettings {
    /// Filesystem path of the database file, if the URL names one
    pub fn database_path(&self) -> Option<PathBuf> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Some(PathBuf::from(path))
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

// Default values
impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: 0,
            history_limit: default_history_limit(),
            ack_delete_after_secs: default_ack_delete_after_secs(),
        }
    }
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            rotation_enabled: default_rotation_enabled(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            timeout_secs: default_resolver_timeout_secs(),
        }
    }
}

fn default_history_limit() -> usize {
    500
}

fn default_ack_delete_after_secs() -> u64 {
    5
}

fn default_max_size() -> usize {
    64
}

fn default_rotation_enabled() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite://./data/linkdrop.db".to_string()
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_resolver_timeout_secs() -> u64 {
    20
}
