//! `matterlog` -- minimal Mattermost integration bot.
//!
//! Startup is strictly linear: load config, build the client, verify
//! the server, resolve the logging channel, post a startup notice,
//! open the event stream. After that two things run concurrently: the
//! event receive loop and the Ctrl-C wait. Shutdown cancels the loop,
//! posts a shutdown notice, and exits 0.
//!
//! Exit codes: 0 on graceful shutdown (including the degenerate case
//! where the interrupt listener cannot be installed and the bot shuts
//! down immediately), 1 on config or liveness failure.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use matterlog_core::{Bot, BotConfig, LoggingPostHandler, PostHandler};

/// Minimal Mattermost integration bot.
#[derive(Parser)]
#[command(name = "matterlog", about = "Minimal Mattermost integration bot", version)]
struct Cli {
    /// Path to the JSON config file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = match BotConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "there was a problem loading the config file");
            std::process::exit(1);
        }
    };

    info!(name = %config.display_name(), "starting");

    let mut bot = match Bot::new(config) {
        Ok(bot) => bot,
        Err(e) => {
            e.report("invalid configuration");
            std::process::exit(1);
        }
    };

    // Liveness check is fatal; nothing works without a live server.
    if let Err(e) = bot.verify_server().await {
        e.report("there was a problem pinging the mattermost server, is it running?");
        std::process::exit(1);
    }

    // Channel resolution and the startup notice degrade without
    // crashing; later posts fail individually.
    if let Err(e) = bot.resolve_logging_channel().await {
        e.report("failed to resolve the logging channel, check team_name and channel_name");
    }

    if let Err(e) = bot.announce_startup().await {
        e.report("failed to post the startup notice");
    }

    let cancel = CancellationToken::new();
    let stream = bot.event_stream();
    let handler: Arc<dyn PostHandler> = Arc::new(LoggingPostHandler);

    let cancel_for_stream = cancel.clone();
    let stream_handle = tokio::spawn(async move {
        if let Err(e) = stream.run(handler, cancel_for_stream).await {
            // Non-fatal: the bot keeps running without event handling.
            e.report("event stream unavailable");
        }
    });

    info!("bot running -- press Ctrl+C to stop");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(e) => {
            error!(error = %e, "failed to listen for the interrupt signal, shutting down");
        }
    }

    // Cancel the receive loop (it closes the socket gracefully), then
    // post the shutdown notice -- same non-fatal semantics as startup.
    if let Err(e) = bot.shutdown(&cancel).await {
        e.report("failed to post the shutdown notice");
    }

    let _ = stream_handle.await;

    info!("shutdown complete");
    Ok(())
}
