//! Deployment command handlers
//!
//! Wires the container runtime, the store and the runner flows together for
//! deploy, list and teardown.

use anyhow::{Context, Result};
use colored::*;
use nexus_core::{CommandOutput, DeploymentRecord};
use nexus_runner::environment::{
    CliRuntime, ContainerEnvironment, ContainerFactory, ContainerRuntime,
};
use nexus_runner::{Config, Deployment, flows};
use nexus_store::{db, deployment_repository};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// Deploy a repository
pub async fn deploy(repository: &str, config: &Config) -> Result<bool> {
    let runtime = runtime(config)?;
    let pool = open_store(config).await?;

    let proxy = ContainerEnvironment::open(runtime.clone(), config.proxy_spec())
        .context("Failed to open reverse proxy container")?;
    let mut proxy = Deployment::new(Box::new(proxy), "")?;

    let site = ContainerEnvironment::open(runtime, config.site_spec())
        .context("Failed to start site container")?;
    let mut site = Deployment::new(Box::new(site), "")?;

    let result = flows::provision(repository, &mut site, &mut proxy, &pool, config).await?;
    if !report(&result) {
        return Ok(false);
    }

    println!("{}", "✓ Deployment created successfully!".green().bold());
    print_deployment(&site);
    Ok(true)
}

/// List stored deployments
pub async fn list(json: bool, config: &Config) -> Result<bool> {
    let pool = open_store(config).await?;
    let records = deployment_repository::list_all(&pool)
        .await
        .context("Failed to list deployments")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(true);
    }

    if records.is_empty() {
        println!("{}", "No deployments found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} deployment(s):", records.len()).bold()
        );
        println!();
        for record in &records {
            print_record(record);
        }
    }

    Ok(true)
}

/// Tear down a stored deployment
pub async fn teardown(name: &str, config: &Config) -> Result<bool> {
    let runtime = runtime(config)?;
    let pool = open_store(config).await?;

    let factory = ContainerFactory::new(runtime.clone(), config.site_spec());
    let Some(mut site) = Deployment::load(&pool, &factory, name).await? else {
        println!("{}", format!("No deployment named {}", name).yellow());
        return Ok(false);
    };

    let proxy = ContainerEnvironment::open(runtime, config.proxy_spec())
        .context("Failed to open reverse proxy container")?;
    let mut proxy = Deployment::new(Box::new(proxy), "")?;

    let result = flows::teardown(&mut site, &mut proxy, &pool).await?;
    if !report(&result) {
        return Ok(false);
    }

    println!(
        "{}",
        format!("✓ Deployment {} removed successfully!", name)
            .green()
            .bold()
    );
    Ok(true)
}

fn runtime(config: &Config) -> Result<Arc<dyn ContainerRuntime>> {
    let runtime = CliRuntime::new(&config.container_runtime);
    runtime.check_available()?;
    Ok(Arc::new(runtime))
}

async fn open_store(config: &Config) -> Result<SqlitePool> {
    let pool = db::create_pool(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Using database {}", config.database_url);
    Ok(pool)
}

/// Prints a failed result; returns whether the result was a success
fn report(result: &CommandOutput) -> bool {
    if result.is_success() {
        return true;
    }
    eprintln!(
        "{}",
        format!(
            "Exit code: {}, Error message {}",
            result.exit_code, result.output
        )
        .red()
    );
    false
}

fn print_deployment(deployment: &Deployment) {
    for (property, value) in deployment.properties() {
        println!("  {:<7} {}", format!("{}:", property.key()), value.cyan());
    }
}

fn print_record(record: &DeploymentRecord) {
    println!(
        "  {} {}",
        "▸".cyan(),
        record.name.as_deref().unwrap_or("<unnamed>").bold()
    );
    if let Some(domain) = &record.domain {
        println!("    Domain:      {}", domain);
    }
    if let Some(email) = &record.email {
        println!("    Email:       {}", email.dimmed());
    }
    println!("    Environment: {}", record.environment.dimmed());
    println!(
        "    Created:     {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
}
