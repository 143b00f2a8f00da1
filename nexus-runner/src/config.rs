//! Nexus configuration
//!
//! Defines where deployments are stored, which container runtime runs them
//! and the images, names and paths shared by every deployment.

use crate::environment::{
    BASE_DIRECTORY, ContainerSpec, DEFAULT_NETWORK, REVERSE_PROXY_IMAGE, STATIC_HOST_IMAGE,
};
use crate::manifest::MANIFEST_FILE;
use crate::steps::CertificateSettings;

/// Default SQLite database, relative to the current directory
pub const DEFAULT_DATABASE_URL: &str = "sqlite:nexus.db";

/// Default container runtime binary
pub const DEFAULT_CONTAINER_RUNTIME: &str = "podman";

/// Name of the shared reverse proxy container
pub const DEFAULT_PROXY_NAME: &str = "nexus-reverse-proxy";

/// Nexus configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string (e.g., "sqlite:nexus.db")
    pub database_url: String,

    /// Container runtime binary (e.g., "podman", "docker")
    pub container_runtime: String,

    /// Network shared by the proxy and every site container
    pub network: String,

    /// Working directory new environments start in
    pub base_directory: String,

    pub proxy_name: String,

    pub proxy_image: String,

    pub site_image: String,

    /// Manifest file read from each cloned repository
    pub manifest_file: String,

    /// Certificate served by the reverse proxy
    pub certificate: CertificateSettings,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - NEXUS_DATABASE_URL (default: sqlite:nexus.db)
    /// - NEXUS_CONTAINER_RUNTIME (default: podman)
    /// - NEXUS_NETWORK (default: nexus-net)
    /// - NEXUS_BASE_DIRECTORY (default: /tmp)
    /// - NEXUS_PROXY_NAME (default: nexus-reverse-proxy)
    /// - NEXUS_PROXY_IMAGE, NEXUS_SITE_IMAGE
    /// - NEXUS_MANIFEST_FILE (default: nexus.toml)
    /// - NEXUS_CERTIFICATE_NAME, NEXUS_CERTIFICATE_DIRECTORY
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str, default: String| lookup(key).unwrap_or(default);

        Self {
            database_url: var("NEXUS_DATABASE_URL", defaults.database_url),
            container_runtime: var("NEXUS_CONTAINER_RUNTIME", defaults.container_runtime),
            network: var("NEXUS_NETWORK", defaults.network),
            base_directory: var("NEXUS_BASE_DIRECTORY", defaults.base_directory),
            proxy_name: var("NEXUS_PROXY_NAME", defaults.proxy_name),
            proxy_image: var("NEXUS_PROXY_IMAGE", defaults.proxy_image),
            site_image: var("NEXUS_SITE_IMAGE", defaults.site_image),
            manifest_file: var("NEXUS_MANIFEST_FILE", defaults.manifest_file),
            certificate: CertificateSettings {
                name: var("NEXUS_CERTIFICATE_NAME", defaults.certificate.name),
                directory: var("NEXUS_CERTIFICATE_DIRECTORY", defaults.certificate.directory),
            },
        }
    }

    /// Container spec for the shared reverse proxy, publishing HTTP and HTTPS
    pub fn proxy_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.proxy_image)
            .with_name(&self.proxy_name)
            .with_network(&self.network)
            .with_port(80, 80)
            .with_port(443, 443)
            .with_working_directory(&self.base_directory)
    }

    /// Container spec for a new site; the runtime picks a unique name
    pub fn site_spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.site_image)
            .with_network(&self.network)
            .with_working_directory(&self.base_directory)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("database_url cannot be empty");
        }

        if !self.database_url.starts_with("sqlite:") {
            anyhow::bail!("database_url must start with sqlite:");
        }

        if self.container_runtime.is_empty() {
            anyhow::bail!("container_runtime cannot be empty");
        }

        if self.proxy_name.is_empty() {
            anyhow::bail!("proxy_name cannot be empty");
        }

        if !self.base_directory.starts_with('/') {
            anyhow::bail!("base_directory must be an absolute path");
        }

        if self.manifest_file.is_empty() {
            anyhow::bail!("manifest_file cannot be empty");
        }

        if self.certificate.name.is_empty() {
            anyhow::bail!("certificate name cannot be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            container_runtime: DEFAULT_CONTAINER_RUNTIME.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            base_directory: BASE_DIRECTORY.to_string(),
            proxy_name: DEFAULT_PROXY_NAME.to_string(),
            proxy_image: REVERSE_PROXY_IMAGE.to_string(),
            site_image: STATIC_HOST_IMAGE.to_string(),
            manifest_file: MANIFEST_FILE.to_string(),
            certificate: CertificateSettings::default(),
        }
    }
}
