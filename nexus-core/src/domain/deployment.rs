//! Deployment record types

use serde::{Deserialize, Serialize};

use crate::domain::property::Property;

/// Persisted deployment row
///
/// Written only after a deployment ran to completion; used to rebuild the
/// deployment for teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: i64,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub email: Option<String>,
    /// Environment variant tag (see `EnvironmentKind`)
    pub environment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DeploymentRecord {
    /// Value stored for a property, if any
    pub fn property(&self, property: Property) -> Option<&str> {
        match property {
            Property::Name => self.name.as_deref(),
            Property::Domain => self.domain.as_deref(),
            Property::Email => self.email.as_deref(),
        }
    }
}
