use anyhow::{Context as _, Result};
use clap::Parser;
use reelcache_core::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod report;

use cli::{Cli, Command};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "reelcachectl=debug,reelcache_core=debug"
    } else {
        "reelcachectl=info,reelcache_core=info"
    };

    // Logs go to stderr so reports on stdout stay clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(Some(cli.env_file.as_path()))
        .with_context(|| format!("failed to load configuration ({})", cli.env_file.display()))?;
    if let Some(limit) = cli.concurrency {
        config.fetch.concurrency = Some(limit);
    }

    let ctx = commands::Context::new(config)?;

    match cli.command {
        Command::Search { keys, json } => {
            commands::search(&ctx, keys.into_keys(), json).await
        }
        Command::Poster { keys, out } => {
            commands::poster(&ctx, keys.into_keys(), out).await
        }
    }
}
