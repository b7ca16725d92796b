//! Linkdrop Bot Library
//!
//! Chat surface for the Linkdrop playlist bot: configuration, the serenity
//! event handler, and the orchestration between chat events and the core.
//!
//! This library exposes the components for testing purposes.

pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::BotConfig;
pub use error::{BotError, Result};
pub use handler::Handler;
pub use services::YtDlpTitleResolver;
pub use state::AppState;
