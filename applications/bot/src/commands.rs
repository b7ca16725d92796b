/// Slash command definitions
use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

pub const DEFAULT_SCOREBOARD_LIMIT: usize = 10;
pub const MAX_SCOREBOARD_LIMIT: usize = 25;

/// A recognised slash command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    /// Post the playlist link
    Playlist,
    /// Backfill from channel history
    Sync,
    /// Show top contributors
    Scoreboard { limit: usize },
}

impl SlashCommand {
    /// Map a command name and its optional `limit` argument
    pub fn parse(name: &str, limit: Option<i64>) -> Option<Self> {
        match name {
            "playlist" => Some(Self::Playlist),
            "sync" => Some(Self::Sync),
            "scoreboard" => {
                let limit = limit.map_or(DEFAULT_SCOREBOARD_LIMIT, |n| {
                    n.clamp(1, MAX_SCOREBOARD_LIMIT as i64) as usize
                });
                Some(Self::Scoreboard { limit })
            }
            _ => None,
        }
    }

    /// Placeholder posted while a slow command runs, removed once it finishes
    pub fn progress_reply(&self) -> Option<&'static str> {
        match self {
            Self::Sync => Some(crate::pipeline::BACKFILL_STARTED_REPLY),
            Self::Playlist | Self::Scoreboard { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Playlist => "playlist",
            Self::Sync => "sync",
            Self::Scoreboard { .. } => "scoreboard",
        }
    }
}

/// Commands registered when the bot connects
pub fn register() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("playlist").description("Get the link to the shared playlist"),
        CreateCommand::new("sync").description("Read past messages and add the tracks they link"),
        CreateCommand::new("scoreboard")
            .description("Show who contributed the most tracks")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "limit",
                    "How many contributors to show",
                )
                .min_int_value(1)
                .max_int_value(MAX_SCOREBOARD_LIMIT as u64)
                .required(false),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(SlashCommand::parse("playlist", None), Some(SlashCommand::Playlist));
        assert_eq!(SlashCommand::parse("sync", None), Some(SlashCommand::Sync));
        assert_eq!(SlashCommand::parse("dance", None), None);
    }

    #[test]
    fn scoreboard_limit_defaults_and_clamps() {
        assert_eq!(
            SlashCommand::parse("scoreboard", None),
            Some(SlashCommand::Scoreboard { limit: 10 })
        );
        assert_eq!(
            SlashCommand::parse("scoreboard", Some(100)),
            Some(SlashCommand::Scoreboard { limit: 25 })
        );
        assert_eq!(
            SlashCommand::parse("scoreboard", Some(-3)),
            Some(SlashCommand::Scoreboard { limit: 1 })
        );
    }

    #[test]
    fn only_sync_posts_a_progress_reply() {
        assert_eq!(
            SlashCommand::Sync.progress_reply(),
            Some("Reading previous messages...")
        );
        assert_eq!(SlashCommand::Playlist.progress_reply(), None);
        assert_eq!(SlashCommand::Scoreboard { limit: 10 }.progress_reply(), None);
    }

    #[test]
    fn every_registered_command_parses() {
        assert_eq!(register().len(), 3);
        for name in ["playlist", "sync", "scoreboard"] {
            let parsed = SlashCommand::parse(name, None).unwrap();
            assert_eq!(parsed.name(), name);
        }
    }
}
