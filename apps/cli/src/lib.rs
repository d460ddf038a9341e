//! Command-line front end and SQLite storage for the scheduler.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::CliConfig;

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env(cli.db.clone());
    tracing::debug!(path = %config.db_path.display(), "opening collection");
    let repo = config.open_repository()?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();
    commands::dispatch(cli.command, repo, &mut input, &mut out)
}
