//! Concrete steps
//!
//! Each step is a thin call into an external tool (git, nginx, certbot) or a
//! change to the environment's own state.

mod build;
mod certificate;
mod environment;
mod git;
mod nginx;

pub use build::BuildSource;
pub use certificate::{AddDomainToCertificate, CertificateSettings, parse_certificate_domains};
pub use environment::{DestroyEnvironment, SetName, SetWorkingDirectory};
pub use git::{GitCheckout, GitClone};
pub use nginx::{
    BuildNginxConfig, BuildNginxReverseProxyConfig, NGINX_CONFIG_DIRECTORY, ReloadNginx,
    RemoveNginxReverseProxyConfig, SITE_CONFIG_FILE, TestNginxConfig, render_reverse_proxy_config,
    render_site_config, reverse_proxy_config_path,
};
