#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use docqa::cli::Cli;
use docqa::config::Config;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load()?;
    docqa::app::dispatch::dispatch(cli, config).await
}
