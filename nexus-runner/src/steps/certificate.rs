//! Shared TLS certificate management
//!
//! All sites behind the reverse proxy share one certificate; adding a site
//! re-issues it with the site's domains appended.

use nexus_core::CommandOutput;

use crate::environment::Environment;
use crate::shell::quote_arg;
use crate::step::{Effects, Step};

/// Where certbot keeps issued certificates
pub const CERTIFICATE_DIRECTORY: &str = "/etc/letsencrypt/live";

/// Name of the certificate shared by all sites
pub const CERTIFICATE_NAME: &str = "nexus";

/// Which certificate the reverse proxy serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSettings {
    pub name: String,
    pub directory: String,
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            name: CERTIFICATE_NAME.to_string(),
            directory: CERTIFICATE_DIRECTORY.to_string(),
        }
    }
}

/// Extracts the domain list from `certbot certificates` output
pub fn parse_certificate_domains(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("Domains:"))
        .map(|domains| domains.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Extends the shared certificate with a domain and its `www.` alias
///
/// Fails if the domain is already on the certificate.
pub struct AddDomainToCertificate {
    domain: String,
    email: String,
    certificate: CertificateSettings,
}

impl AddDomainToCertificate {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        certificate: CertificateSettings,
    ) -> Self {
        Self {
            domain: domain.into(),
            email: email.into(),
            certificate,
        }
    }
}

impl Step for AddDomainToCertificate {
    fn name(&self) -> &str {
        "Add Domain To Certificate"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        _effects: &mut Effects,
    ) -> CommandOutput {
        let listing = environment.run_command(&format!(
            "certbot certificates --cert-name {}",
            quote_arg(&self.certificate.name)
        ));

        // No certificate yet is not an error: the first site creates it
        let mut domains = if listing.is_success() {
            parse_certificate_domains(&listing.output)
        } else {
            Vec::new()
        };

        if domains.contains(&self.domain) {
            return CommandOutput::failure(format!(
                "Domain {} already added to certificate {}",
                self.domain, self.certificate.name
            ));
        }

        for domain in [self.domain.clone(), format!("www.{}", self.domain)] {
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }

        let mut command = format!(
            "certbot certonly --nginx --non-interactive --agree-tos --expand --cert-name {} --email {}",
            quote_arg(&self.certificate.name),
            quote_arg(&self.email)
        );
        for domain in &domains {
            command.push_str(" -d ");
            command.push_str(&quote_arg(domain));
        }

        environment.run_command(&command)
    }
}
