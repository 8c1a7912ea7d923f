//! Deployment locations and the logical roles bound to them

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named deployment target (production, dev, certification, ...).
///
/// The host is stored under `netloc` on the wire; `host` is accepted as an
/// alias when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub scheme: String,
    #[serde(rename = "netloc", alias = "host")]
    pub host: String,
}

impl Location {
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self { scheme: scheme.into(), host: host.into() }
    }

    /// `scheme://host` without a trailing path.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Template entries ship with an empty host until an environment is
    /// provisioned.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.scheme.is_empty() && !self.host.is_empty()
    }
}

/// Location name to location mapping, fixed for a session's lifetime.
pub type LocationMap = BTreeMap<String, Location>;

/// Logical function an endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRole {
    /// Authorization page the user-agent is redirected to.
    AuthPage,
    /// Token endpoint for code exchange and refresh.
    Token,
    /// Base of the services API. Versioned paths are appended by callers.
    ServicesApi,
}

impl EndpointRole {
    pub const ALL: [Self; 3] = [Self::AuthPage, Self::Token, Self::ServicesApi];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthPage => "auth_page",
            Self::Token => "token",
            Self::ServicesApi => "services_api",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
