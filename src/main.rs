//! Nabo game client - terminal entry point
//!
//! Parses the CLI, loads configuration, and hands control to the app shell.
//! A match in progress is abandoned cleanly on Ctrl+C.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nabo_game_client::app;
use nabo_game_client::cli::Cli;
use nabo_game_client::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Nabo game client");
    info!("Match API: {}", config.api_url);

    tokio::select! {
        result = app::run(config, cli) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, leaving the match");
            Ok(())
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
