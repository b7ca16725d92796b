/// Chat gateway event handler
use crate::commands::{self, SlashCommand};
use crate::error::{BotError, Result};
use crate::pipeline::{self, HistoryMessage};
use crate::state::AppState;
use futures::{StreamExt, TryStreamExt};
use linkdrop_core::{render_scoreboard, UserId};
use serenity::all::{
    ChannelId, Command, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EventHandler,
    Interaction, Message, Ready,
};
use serenity::async_trait;
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

pub struct Handler {
    state: AppState,
    bot_id: OnceLock<serenity::all::UserId>,
}

impl Handler {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            bot_id: OnceLock::new(),
        }
    }

    fn is_own(&self, author: serenity::all::UserId) -> bool {
        self.bot_id.get() == Some(&author)
    }

    /// Post a short acknowledgement that removes itself after a while
    async fn acknowledge(&self, ctx: &Context, channel: ChannelId, text: String) {
        let sent = match channel.say(&ctx.http, text).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, "Failed to post acknowledgement");
                return;
            }
        };

        let delay = self.state.config.discord.ack_delete_after();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sent.delete(&ctx).await {
                debug!(error = %e, "Failed to delete acknowledgement");
            }
        });
    }

    async fn respond(&self, ctx: &Context, command: &CommandInteraction, text: String, ephemeral: bool) {
        let message = CreateInteractionResponseMessage::new()
            .content(text)
            .ephemeral(ephemeral);
        if let Err(e) = command
            .create_response(&ctx.http, CreateInteractionResponse::Message(message))
            .await
        {
            warn!(command = %command.data.name, error = %e, "Failed to respond to command");
        }
    }

    async fn follow_up(&self, ctx: &Context, command: &CommandInteraction, text: &str) {
        let followup = CreateInteractionResponseFollowup::new().content(text);
        if let Err(e) = command.create_followup(&ctx.http, followup).await {
            warn!(command = %command.data.name, error = %e, "Failed to send follow-up");
        }
    }

    async fn run_command(&self, ctx: &Context, command: &CommandInteraction) -> Result<()> {
        let limit = command
            .data
            .options
            .iter()
            .find(|option| option.name == "limit")
            .and_then(|option| option.value.as_i64());

        let Some(parsed) = SlashCommand::parse(&command.data.name, limit) else {
            debug!(command = %command.data.name, "Ignoring unknown command");
            return Ok(());
        };

        pipeline::ensure_channel(&self.state, command.channel_id.get())?;
        info!(command = parsed.name(), user = %command.user.id, "Slash command");

        match parsed {
            SlashCommand::Playlist => {
                let reply = pipeline::playlist_reply(self.state.playlist_url());
                self.respond(ctx, command, reply, false).await;
            }
            SlashCommand::Sync => {
                let progress = parsed.progress_reply();
                if let Some(text) = progress {
                    self.respond(ctx, command, text.to_string(), false).await;
                }

                let reply = match self.sync_history(ctx, command.channel_id).await {
                    Ok(report) => pipeline::backfill_reply(&report),
                    Err(e) => {
                        error!(error = %e, "Backfill failed");
                        pipeline::BACKFILL_FAILED_REPLY.to_string()
                    }
                };
                self.follow_up(ctx, command, &reply).await;

                if progress.is_some() {
                    if let Err(e) = command.delete_response(&ctx.http).await {
                        debug!(error = %e, "Failed to remove progress reply");
                    }
                }
            }
            SlashCommand::Scoreboard { limit } => {
                let records = self.state.ledger.top(limit).await?;
                self.respond(ctx, command, render_scoreboard(&records), false)
                    .await;
            }
        }

        Ok(())
    }

    async fn sync_history(&self, ctx: &Context, channel: ChannelId) -> Result<pipeline::BackfillReport> {
        let limit = self.state.config.discord.history_limit;
        let history: Vec<Message> = channel
            .messages_iter(&ctx.http)
            .take(limit)
            .try_collect()
            .await
            .map_err(BotError::from)?;

        let messages = history
            .into_iter()
            .filter(|message| !self.is_own(message.author.id))
            .map(|message| {
                HistoryMessage::new(UserId::new(message.author.id.to_string()), message.content)
            })
            .collect();

        pipeline::backfill(&self.state, messages).await
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let _ = self.bot_id.set(ready.user.id);
        info!(user = %ready.user.name, "Connected to chat gateway");

        match Command::set_global_commands(&ctx.http, commands::register()).await {
            Ok(registered) => info!(count = registered.len(), "Slash commands registered"),
            Err(e) => error!(error = %e, "Failed to register slash commands"),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.channel_id.get() != self.state.channel_id() || self.is_own(msg.author.id) {
            return;
        }

        let author = UserId::new(msg.author.id.to_string());
        match pipeline::ingest_message(&self.state, &author, &msg.content).await {
            Ok(0) => {}
            Ok(added) => {
                self.acknowledge(&ctx, msg.channel_id, pipeline::added_reply(added))
                    .await;
            }
            Err(e) => {
                error!(author = %author, error = %e, "Failed to add tracks from message");
                self.acknowledge(&ctx, msg.channel_id, pipeline::ADD_FAILED_REPLY.to_string())
                    .await;
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        if let Err(e) = self.run_command(&ctx, &command).await {
            if e.is_loggable() {
                error!(command = %command.data.name, error = %e, "Command failed");
            }
            self.respond(&ctx, &command, e.user_message(), true).await;
        }
    }
}
