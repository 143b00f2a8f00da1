//! Configuration module
//!
//! Environment variables provide the base configuration; command-line flags
//! win over them.

use anyhow::{Context, Result};
use nexus_runner::Config;

/// Loads the configuration and applies command-line overrides
pub fn load(database_url: Option<String>, runtime: Option<String>) -> Result<Config> {
    let config = Config::from_env().context("Invalid configuration")?;
    let config = with_overrides(config, database_url, runtime);
    config.validate()?;
    Ok(config)
}

fn with_overrides(
    mut config: Config,
    database_url: Option<String>,
    runtime: Option<String>,
) -> Config {
    if let Some(database_url) = database_url {
        config.database_url = database_url;
    }
    if let Some(runtime) = runtime {
        config.container_runtime = runtime;
    }
    config
}
