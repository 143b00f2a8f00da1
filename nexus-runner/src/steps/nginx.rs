//! Nginx configuration steps
//!
//! Generated blocks are consumed by nginx as-is, so the rendering functions
//! are kept separate and tested against exact output.

use nexus_core::CommandOutput;

use crate::environment::Environment;
use crate::shell::quote_arg;
use crate::step::{Effects, Step};
use crate::steps::certificate::CertificateSettings;

/// Directory nginx loads server blocks from
pub const NGINX_CONFIG_DIRECTORY: &str = "/etc/nginx/http.d";

/// File holding a static site's server block
pub const SITE_CONFIG_FILE: &str = "site.conf";

/// Server block serving a static site on port 80
pub fn render_site_config(domain: &str, publish_directory: &str) -> String {
    format!(
        "server {{\n\
         \tlisten 80;\n\
         \n\
         \tserver_name {domain} www.{domain};\n\
         \n\
         \troot {publish_directory};\n\
         }}\n"
    )
}

/// TLS-terminating block for one domain plus its HTTP to HTTPS redirect
pub fn render_reverse_proxy_config(
    domain: &str,
    upstream: &str,
    certificate: &CertificateSettings,
) -> String {
    let certificate_path = format!("{}/{}", certificate.directory, certificate.name);
    format!(
        "server {{\n\
         \tlisten 443 ssl;\n\
         \n\
         \tserver_name {domain} www.{domain};\n\
         \n\
         \tssl_certificate {certificate_path}/fullchain.pem;\n\
         \tssl_certificate_key {certificate_path}/privkey.pem;\n\
         \n\
         \tlocation / {{\n\
         \t\tproxy_pass http://{upstream}:80;\n\
         \t\tproxy_set_header Host $host;\n\
         \t\tproxy_set_header X-Real-IP $remote_addr;\n\
         \t\tproxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n\
         \t\tproxy_set_header X-Forwarded-Proto $scheme;\n\
         \t}}\n\
         }}\n\
         \n\
         server {{\n\
         \tlisten 80;\n\
         \n\
         \tserver_name {domain} www.{domain};\n\
         \n\
         \treturn 301 https://$host$request_uri;\n\
         }}\n"
    )
}

/// Where the reverse proxy keeps a domain's server block
pub fn reverse_proxy_config_path(domain: &str) -> String {
    format!("{}/{}.conf", NGINX_CONFIG_DIRECTORY, domain)
}

const HEREDOC_DELIMITER: &str = "NEXUS_EOF";

/// Shell command writing `contents` to `path` verbatim
///
/// `None` if a line of `contents` would terminate the heredoc early.
fn write_file_command(path: &str, contents: &str) -> Option<String> {
    if contents.lines().any(|line| line == HEREDOC_DELIMITER) {
        return None;
    }
    Some(format!(
        "cat > {} <<'{delimiter}'\n{}{delimiter}",
        quote_arg(path),
        contents,
        delimiter = HEREDOC_DELIMITER
    ))
}

fn write_file(environment: &mut dyn Environment, path: &str, contents: &str) -> CommandOutput {
    match write_file_command(path, contents) {
        Some(command) => environment.run_command(&command),
        None => CommandOutput::failure(format!(
            "Refusing to write {}: contents contain {}",
            path, HEREDOC_DELIMITER
        )),
    }
}

/// Writes the static site server block
pub struct BuildNginxConfig {
    domain: String,
    publish_directory: String,
}

impl BuildNginxConfig {
    pub fn new(domain: impl Into<String>, publish_directory: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            publish_directory: publish_directory.into(),
        }
    }
}

impl Step for BuildNginxConfig {
    fn name(&self) -> &str {
        "Build Nginx Config"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        let config = render_site_config(&self.domain, &self.publish_directory);
        let path = format!("{}/{}", NGINX_CONFIG_DIRECTORY, SITE_CONFIG_FILE);
        write_file(environment, &path, &config)
    }
}

/// Validates the nginx configuration
#[derive(Default)]
pub struct TestNginxConfig;

impl Step for TestNginxConfig {
    fn name(&self) -> &str {
        "Test Nginx Config"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        environment.run_command("nginx -t")
    }
}

/// Reloads a running nginx
#[derive(Default)]
pub struct ReloadNginx;

impl Step for ReloadNginx {
    fn name(&self) -> &str {
        "Reload Nginx"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        environment.run_command("nginx -s reload")
    }
}

/// Writes the reverse proxy block for a domain
pub struct BuildNginxReverseProxyConfig {
    domain: String,
    upstream: String,
    certificate: CertificateSettings,
}

impl BuildNginxReverseProxyConfig {
    /// `upstream` is the site container's name on the shared network
    pub fn new(
        domain: impl Into<String>,
        upstream: impl Into<String>,
        certificate: CertificateSettings,
    ) -> Self {
        Self {
            domain: domain.into(),
            upstream: upstream.into(),
            certificate,
        }
    }
}

impl Step for BuildNginxReverseProxyConfig {
    fn name(&self) -> &str {
        "Build Nginx Reverse Proxy Config"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        let config = render_reverse_proxy_config(&self.domain, &self.upstream, &self.certificate);
        let path = reverse_proxy_config_path(&self.domain);
        write_file(environment, &path, &config)
    }
}

/// Deletes the reverse proxy block for a domain
pub struct RemoveNginxReverseProxyConfig {
    domain: String,
}

impl RemoveNginxReverseProxyConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl Step for RemoveNginxReverseProxyConfig {
    fn name(&self) -> &str {
        "Remove Nginx Reverse Proxy Config"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        let path = reverse_proxy_config_path(&self.domain);
        environment.run_command(&format!("rm {}", quote_arg(&path)))
    }
}
