//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod deployment;

use anyhow::Result;
use clap::Subcommand;
use nexus_runner::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a repository as a static site
    Deploy {
        /// Git URL of the repository holding the site and its nexus.toml
        repository: String,
    },
    /// List stored deployments
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a deployment from the proxy and destroy its environment
    Teardown {
        /// Deployment name
        name: String,
    },
}

/// Handle a CLI command
///
/// Returns `false` when the command ran but the deployment work failed.
pub async fn handle_command(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Deploy { repository } => deployment::deploy(&repository, config).await,
        Commands::List { json } => deployment::list(json, config).await,
        Commands::Teardown { name } => deployment::teardown(&name, config).await,
    }
}
