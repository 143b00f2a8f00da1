//! Recognized deployment properties

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// The closed set of properties a deployment keeps from its steps
///
/// Steps report properties by key; keys that do not parse into this enum
/// are dropped by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Property {
    Name,
    Domain,
    Email,
}

impl Property {
    pub const ALL: [Property; 3] = [Property::Name, Property::Domain, Property::Email];

    /// Key used when steps report this property
    pub fn key(&self) -> &'static str {
        match self {
            Property::Name => "NAME",
            Property::Domain => "DOMAIN",
            Property::Email => "EMAIL",
        }
    }

    /// Column holding this property in the deployments table
    pub fn column(&self) -> &'static str {
        match self {
            Property::Name => "name",
            Property::Domain => "domain",
            Property::Email => "email",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Property {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NAME" => Ok(Property::Name),
            "DOMAIN" => Ok(Property::Domain),
            "EMAIL" => Ok(Property::Email),
            other => Err(DomainError::UnknownProperty(other.to_string())),
        }
    }
}
