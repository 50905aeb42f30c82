//! market-mood - Crypto Market Data and Mood Index
//!
//! Queries the configured providers and prints results as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use market_mood::adapters::cli::{self, CliApp};
use market_mood::application::MarketEngine;
use market_mood::config::resolve_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    let config = resolve_config(app.config.as_deref());
    let level = config.as_ref().map(|c| c.logging.level.as_str()).unwrap_or("info");
    init_logging(app.verbose, app.debug, level);

    let config = config.context("Failed to load configuration")?;
    let engine = MarketEngine::from_config(&config).context("Failed to create market engine")?;

    let output = cli::execute(app.command, &engine).await?;
    println!("{}", output);

    let stats = engine.cache_stats();
    tracing::debug!("Cache: {} entries ({} fresh)", stats.total_entries, stats.fresh_entries);
    Ok(())
}

/// Flags win over RUST_LOG, which wins over the configured level
fn init_logging(verbose: bool, debug: bool, level: &str) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
