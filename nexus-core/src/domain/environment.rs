//! Environment variant tags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Which kind of execution context a deployment runs in
///
/// Persisted as a plain tag so stored rows never reference a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    /// Commands run directly on the host
    Local,
    /// Commands run inside a named container
    Container,
}

impl EnvironmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::Local => "local",
            EnvironmentKind::Container => "container",
        }
    }

    /// Whether the environment's own name is the deployment's NAME
    pub fn owns_identity(&self) -> bool {
        matches!(self, EnvironmentKind::Container)
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(EnvironmentKind::Local),
            "container" => Ok(EnvironmentKind::Container),
            other => Err(DomainError::UnknownEnvironment(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for kind in [EnvironmentKind::Local, EnvironmentKind::Container] {
            assert_eq!(kind.as_str().parse::<EnvironmentKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            "vm".parse::<EnvironmentKind>(),
            Err(DomainError::UnknownEnvironment(tag)) if tag == "vm"
        ));
    }

    #[test]
    fn test_identity_ownership() {
        assert!(EnvironmentKind::Container.owns_identity());
        assert!(!EnvironmentKind::Local.owns_identity());
    }
}
