//! Nexus CLI
//!
//! Provisions static sites behind a shared TLS reverse proxy and tears them
//! down again.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Nexus static site provisioning", long_about = None)]
struct Cli {
    /// SQLite database holding deployment records
    #[arg(long, env = "NEXUS_DATABASE_URL")]
    database_url: Option<String>,

    /// Container runtime binary (podman or docker)
    #[arg(long, env = "NEXUS_CONTAINER_RUNTIME")]
    runtime: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus=info,nexus_runner=info,nexus_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.database_url, cli.runtime)?;

    if handle_command(cli.command, &config).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
