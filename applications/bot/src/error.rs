/// Bot error types
use linkdrop_core::LinkdropError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    /// Missing or invalid settings; fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command used outside the configured channel
    #[error("Command used outside channel {allowed}")]
    ScopeViolation { allowed: u64 },

    #[error(transparent)]
    Core(#[from] LinkdropError),

    #[error("Chat platform error: {0}")]
    Chat(#[from] Box<serenity::Error>),
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        Self::Chat(Box::new(err))
    }
}

impl BotError {
    /// Text shown to the user who triggered the failing action
    pub fn user_message(&self) -> String {
        match self {
            BotError::ScopeViolation { allowed } => {
                format!("This command can only be used in <#{allowed}>.")
            }
            BotError::Core(e) if e.is_write_failure() => {
                "Couldn't update the playlist right now, please try again later.".to_string()
            }
            _ => "Something went wrong, please try again later.".to_string(),
        }
    }

    /// Whether this deserves an error log rather than a polite reply only
    pub fn is_loggable(&self) -> bool {
        !matches!(self, BotError::ScopeViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdrop_core::WriteOp;

    #[test]
    fn scope_violation_points_at_the_channel() {
        let err = BotError::ScopeViolation { allowed: 42 };
        assert_eq!(err.user_message(), "This command can only be used in <#42>.");
        assert!(!err.is_loggable());
    }

    #[test]
    fn write_failures_get_a_playlist_message() {
        let err = BotError::from(LinkdropError::write(WriteOp::Insert, "502"));
        assert!(err.user_message().contains("playlist"));
        assert!(err.is_loggable());
    }
}
