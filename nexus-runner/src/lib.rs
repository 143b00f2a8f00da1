//! Nexus Runner
//!
//! Runs deployments: a self-extending worklist of steps executed against an
//! environment, plus the flows that provision and tear down a site behind
//! the shared reverse proxy.
//!
//! - `environment`: where commands run (host or container)
//! - `step` / `steps`: units of work and the concrete git, nginx and certbot steps
//! - `manifest`: the `nexus.toml` reader that expands into a site's steps
//! - `deployment`: the pipeline and its persistence
//! - `flows`: provisioning and teardown across the site and proxy pipelines

pub mod config;
pub mod deployment;
pub mod environment;
pub mod flows;
pub mod manifest;
pub mod shell;
pub mod step;
pub mod steps;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use deployment::Deployment;
