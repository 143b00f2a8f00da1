//! Provisioning and teardown flows
//!
//! Both flows drive two pipelines: the site's own deployment and the shared
//! reverse proxy. The proxy only runs after the site pipeline succeeded, and
//! the store is only touched once every pipeline involved has succeeded.

use anyhow::{Context, Result};
use nexus_core::{CommandOutput, Property};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::config::Config;
use crate::deployment::Deployment;
use crate::manifest::ReadManifest;
use crate::steps::{
    AddDomainToCertificate, BuildNginxReverseProxyConfig, DestroyEnvironment, GitClone,
    ReloadNginx, RemoveNginxReverseProxyConfig, TestNginxConfig,
};

/// Clones, builds and serves `repository`, then routes its domain through
/// the reverse proxy
///
/// Returns the failing step's result when a pipeline fails; `Err` is kept for
/// store failures.
pub async fn provision(
    repository: &str,
    site: &mut Deployment,
    proxy: &mut Deployment,
    pool: &SqlitePool,
    config: &Config,
) -> Result<CommandOutput> {
    info!("Provisioning {}", repository);

    site.add_step(GitClone::new(repository));
    site.add_step(ReadManifest::new(&config.manifest_file));
    let result = site.run_all_steps();
    if !result.is_success() {
        error!("Site deployment failed");
        return Ok(result);
    }

    let (Some(domain), Some(email), Some(upstream)) = (
        site.property(Property::Domain),
        site.property(Property::Email),
        site.name(),
    ) else {
        return Ok(CommandOutput::failure("Site deployment is incomplete"));
    };

    proxy.add_step(AddDomainToCertificate::new(
        domain,
        email,
        config.certificate.clone(),
    ));
    proxy.add_step(BuildNginxReverseProxyConfig::new(
        domain,
        upstream,
        config.certificate.clone(),
    ));
    proxy.add_step(TestNginxConfig);
    proxy.add_step(ReloadNginx);

    let result = proxy.run_all_steps();
    if !result.is_success() {
        error!("Reverse proxy deployment failed");
        return Ok(result);
    }

    site.save(pool)
        .await
        .context("Failed to save deployment")?;

    info!("Provisioned {}", site.name().unwrap_or_default());
    Ok(result)
}

/// Removes a deployment from the reverse proxy, destroys its environment and
/// forgets it
///
/// Stops at the first failing stage; the stored record stays until every
/// stage succeeded.
pub async fn teardown(
    site: &mut Deployment,
    proxy: &mut Deployment,
    pool: &SqlitePool,
) -> Result<CommandOutput> {
    let Some(domain) = site.property(Property::Domain).map(str::to_string) else {
        return Ok(CommandOutput::failure("Missing domain"));
    };
    info!("Tearing down {}", domain);

    proxy.add_step(RemoveNginxReverseProxyConfig::new(&domain));
    proxy.add_step(TestNginxConfig);
    proxy.add_step(ReloadNginx);
    let result = proxy.run_all_steps();
    if !result.is_success() {
        error!("Reverse proxy teardown failed");
        return Ok(result);
    }

    site.add_step(DestroyEnvironment);
    let result = site.run_all_steps();
    if !result.is_success() {
        error!("Environment teardown failed");
        return Ok(result);
    }

    site.delete(pool)
        .await
        .context("Failed to delete deployment")?;

    info!("Tore down {}", domain);
    Ok(result)
}
