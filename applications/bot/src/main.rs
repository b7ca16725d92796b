/// Linkdrop Bot - collects music links shared in chat into a playlist
use clap::{Parser, Subcommand};
use linkdrop_bot::{AppState, BotConfig, Handler, YtDlpTitleResolver};
use linkdrop_catalog::{SpotifyClient, SpotifyConfig};
use linkdrop_core::{CatalogGateway, LinkExtractor, PlaylistMaintainer};
use linkdrop_storage::SqliteLedger;
use serenity::all::GatewayIntents;
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "linkdrop-bot")]
#[command(about = "Collects music links shared in a chat channel into a playlist", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "LINKDROP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to chat and start collecting links (default)
    Run,
    /// Print the contribution scoreboard
    Scoreboard {
        /// Number of contributors to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Load and validate configuration, then print it with secrets redacted
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "linkdrop_bot=info,linkdrop_core=info,linkdrop_catalog=info,serenity=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = BotConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await?,
        Commands::Scoreboard { limit } => print_scoreboard(&config, limit).await?,
        Commands::CheckConfig => check_config(&config)?,
    }

    Ok(())
}

async fn run(config: BotConfig) -> anyhow::Result<()> {
    config.validate()?;
    tracing::info!("Starting Linkdrop bot");

    // Initialize database
    let ledger = open_ledger(&config).await?;
    tracing::info!("Database connected");

    // Initialize catalog client
    let mut spotify_config = SpotifyConfig::new(
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
        config.spotify.refresh_token.clone(),
        config.spotify.username.clone(),
    );
    if config.spotify.api_base.is_some() || config.spotify.accounts_base.is_some() {
        spotify_config = spotify_config.with_bases(
            config
                .spotify
                .api_base
                .clone()
                .unwrap_or_else(|| linkdrop_catalog::DEFAULT_API_BASE.to_string()),
            config
                .spotify
                .accounts_base
                .clone()
                .unwrap_or_else(|| linkdrop_catalog::DEFAULT_ACCOUNTS_BASE.to_string()),
        );
    }
    let client = SpotifyClient::new(spotify_config)?;
    client.refresh_access_token().await?;
    let catalog: Arc<dyn CatalogGateway> = Arc::new(client);

    let playlist = catalog
        .resolve_playlist(&config.spotify.playlist_name)
        .await?;
    tracing::info!(playlist = %playlist.id, url = %playlist.url, "Target playlist resolved");

    // Title resolver
    let titles = YtDlpTitleResolver::new(
        config.resolver.ytdlp_path.clone(),
        config.resolver.timeout(),
    );
    match titles.check_available().await {
        Ok(version) => tracing::info!(version = %version, "yt-dlp available"),
        Err(e) => tracing::warn!(error = %e, "yt-dlp unavailable, video links will be skipped"),
    }

    let max_size = config.playlist.effective_max();
    let maintainer = Arc::new(PlaylistMaintainer::new(Arc::clone(&catalog), playlist, max_size));
    let extractor = Arc::new(LinkExtractor::new(catalog, Arc::new(titles)));
    tracing::info!(max_size = ?max_size, "Playlist maintainer ready");

    let token = config.discord.token.clone();
    let state = AppState::new(Arc::new(config), extractor, maintainer, Arc::new(ledger));

    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::Client::builder(&token, intents)
        .event_handler(Handler::new(state))
        .await?;

    tracing::info!("Connecting to chat gateway");
    client.start().await?;

    Ok(())
}

async fn open_ledger(config: &BotConfig) -> anyhow::Result<SqliteLedger> {
    if let Some(parent) = config
        .storage
        .database_path()
        .as_deref()
        .and_then(|path| path.parent())
    {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = linkdrop_storage::create_pool(&config.storage.database_url).await?;
    linkdrop_storage::run_migrations(&pool).await?;
    Ok(SqliteLedger::new(pool))
}

async fn print_scoreboard(config: &BotConfig, limit: usize) -> anyhow::Result<()> {
    use linkdrop_core::ContributionLedger;

    let ledger = open_ledger(config).await?;
    let records = ledger.top(limit).await?;

    if records.is_empty() {
        println!("No contributions recorded yet.");
        return Ok(());
    }

    println!("{:<6} {:<24} {:>8}", "RANK", "USER", "TRACKS");
    println!("{}", "-".repeat(40));
    for (rank, record) in records.iter().enumerate() {
        println!("{:<6} {:<24} {:>8}", rank + 1, record.user_id, record.count);
    }
    println!("\nTotal tracks contributed: {}", ledger.total().await?);

    Ok(())
}

fn check_config(config: &BotConfig) -> anyhow::Result<()> {
    println!("{}", config.summary());
    config.validate()?;
    println!("\nConfiguration OK");
    Ok(())
}
