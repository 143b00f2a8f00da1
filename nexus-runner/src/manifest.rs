//! Site manifest
//!
//! A repository describes how it is hosted in a TOML file at its root:
//!
//! ```toml
//! [host]
//! name = "acme"
//! domain = "acme.io"
//! email = "admin@acme.io"
//!
//! [source]
//! branch = "main"
//! root_directory = "site"
//!
//! [deploy]
//! build_command = "npm ci && npm run build"
//! publish_directory = "dist"
//! ```
//!
//! `ReadManifest` reads that file from inside the environment and expands it
//! into the steps that check out, build and serve the site.

use nexus_core::{CommandOutput, Property};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::environment::Environment;
use crate::shell::quote_arg;
use crate::step::{Effects, Step};
use crate::steps::{
    BuildNginxConfig, BuildSource, GitCheckout, SetName, SetWorkingDirectory, TestNginxConfig,
};

/// Manifest file name looked up in the cloned repository
pub const MANIFEST_FILE: &str = "nexus.toml";

/// Reasons a manifest is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// Not valid TOML, or a known field has the wrong type
    #[error("Invalid manifest: {0}")]
    Invalid(String),

    #[error("Missing {0}")]
    MissingSection(&'static str),

    #[error("Missing {0}")]
    MissingField(&'static str),

    /// A value that cannot be placed in a container name, hostname or nginx path
    #[error("Invalid {0}")]
    InvalidField(&'static str),
}

/// Container names: alphanumerics plus `_`, `.` and `-`, starting alphanumeric
fn is_valid_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Hostnames: dot-separated labels of 1 to 63 alphanumerics or inner hyphens
fn is_valid_domain(domain: &str) -> bool {
    domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// Paths interpolated into an nginx directive
fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && !path.chars().any(|c| {
            c.is_control() || c.is_whitespace() || matches!(c, ';' | '{' | '}' | '"' | '\'')
        })
}

/// `[host]` section; every field is required
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub domain: String,
    pub email: String,
}

/// `[source]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub branch: Option<String>,
    pub root_directory: Option<String>,
}

/// `[deploy]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Deploy {
    pub build_command: Option<String>,
    pub publish_directory: Option<String>,
}

/// A validated manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub host: Host,
    pub source: Option<Source>,
    pub deploy: Option<Deploy>,
}

#[derive(Deserialize)]
struct RawManifest {
    host: Option<RawHost>,
    source: Option<Source>,
    deploy: Option<Deploy>,
}

#[derive(Deserialize)]
struct RawHost {
    name: Option<String>,
    domain: Option<String>,
    email: Option<String>,
}

impl Manifest {
    /// Parses and validates manifest text
    ///
    /// Unknown sections and fields are ignored. Required host fields are
    /// checked in the order name, domain, email.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            toml::from_str(text).map_err(|e| ManifestError::Invalid(e.to_string()))?;

        let host = raw.host.ok_or(ManifestError::MissingSection("host"))?;
        let host = Host {
            name: host.name.ok_or(ManifestError::MissingField("name"))?,
            domain: host.domain.ok_or(ManifestError::MissingField("domain"))?,
            email: host.email.ok_or(ManifestError::MissingField("email"))?,
        };

        if !is_valid_name(&host.name) {
            return Err(ManifestError::InvalidField("name"));
        }
        if !is_valid_domain(&host.domain) {
            return Err(ManifestError::InvalidField("domain"));
        }

        let root_directory = raw.source.as_ref().and_then(|s| s.root_directory.as_deref());
        if root_directory.is_some_and(|path| !is_valid_path(path)) {
            return Err(ManifestError::InvalidField("root_directory"));
        }
        let publish_directory = raw.deploy.as_ref().and_then(|d| d.publish_directory.as_deref());
        if publish_directory.is_some_and(|path| !is_valid_path(path)) {
            return Err(ManifestError::InvalidField("publish_directory"));
        }

        Ok(Self {
            host,
            source: raw.source,
            deploy: raw.deploy,
        })
    }

    /// Directory holding the site once `root_directory` has been applied
    pub fn site_directory(&self, working_directory: &str) -> PathBuf {
        let base = PathBuf::from(working_directory);
        match self.source.as_ref().and_then(|s| s.root_directory.as_ref()) {
            Some(root) => base.join(root),
            None => base,
        }
    }

    /// Directory nginx serves; relative paths resolve against the site directory
    pub fn publish_directory(&self, working_directory: &str) -> String {
        let site = self.site_directory(working_directory);
        let publish = match self.deploy.as_ref().and_then(|d| d.publish_directory.as_ref()) {
            Some(publish) => site.join(publish),
            None => site,
        };
        publish.to_string_lossy().to_string()
    }

    /// Queues the steps and properties this manifest asks for
    ///
    /// Follow-ups run in push order, so the directory change lands before the
    /// build and the nginx config is generated after the build.
    pub fn expand(&self, working_directory: &str, effects: &mut Effects) {
        effects.push_step(SetName::new(&self.host.name));
        effects.set_property(Property::Domain.key(), &self.host.domain);
        effects.set_property(Property::Email.key(), &self.host.email);

        if let Some(source) = &self.source {
            if let Some(branch) = &source.branch {
                effects.push_step(GitCheckout::new(branch));
            }
            if let Some(root_directory) = &source.root_directory {
                effects.push_step(SetWorkingDirectory::new(root_directory));
            }
        }

        if let Some(build_command) = self.deploy.as_ref().and_then(|d| d.build_command.as_ref()) {
            effects.push_step(BuildSource::new(build_command));
        }

        effects.push_step(BuildNginxConfig::new(
            &self.host.domain,
            self.publish_directory(working_directory),
        ));
        effects.push_step(TestNginxConfig);
    }
}

/// Reads the manifest from the environment and injects its steps
pub struct ReadManifest {
    manifest_file: String,
}

impl ReadManifest {
    pub fn new(manifest_file: impl Into<String>) -> Self {
        Self {
            manifest_file: manifest_file.into(),
        }
    }
}

impl Default for ReadManifest {
    fn default() -> Self {
        Self::new(MANIFEST_FILE)
    }
}

impl Step for ReadManifest {
    fn name(&self) -> &str {
        "Read Nexus Config"
    }

    fn run_action(
        &mut self,
        environment: &mut dyn Environment,
        effects: &mut Effects,
    ) -> CommandOutput {
        let read = environment.run_command(&format!("cat {}", quote_arg(&self.manifest_file)));
        if !read.is_success() {
            return CommandOutput::new(
                read.exit_code,
                format!("Failed to read config file {}", self.manifest_file),
            );
        }

        let manifest = match Manifest::parse(&read.output) {
            Ok(manifest) => manifest,
            Err(ManifestError::Invalid(detail)) => {
                debug!("Manifest {} rejected: {}", self.manifest_file, detail);
                return CommandOutput::failure(format!(
                    "Config file {} is invalid",
                    self.manifest_file
                ));
            }
            Err(e) => return CommandOutput::failure(e.to_string()),
        };

        manifest.expand(environment.working_directory(), effects);
        CommandOutput::default()
    }
}
