//! Configuration documents
//!
//! `SessionSettings` is the location/config store document: the location
//! mapping, the two fixed paths and the default role bindings.
//! `AnalyticsEndpoint` describes the Basic-auth analytics service.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTH_LOCATION, DEFAULT_AUTH_PAGE_PATH, DEFAULT_REDIRECT_URL, DEFAULT_SCOPE,
    DEFAULT_SERVICES_API_LOCATION, DEFAULT_TOKEN_PATH,
};
use crate::types::{Location, LocationMap};

/// Location configuration supplied once at session construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
    pub auth_page_path: String,
    pub token_path: String,
    pub location: LocationMap,
    #[serde(default = "default_auth_location")]
    pub auth_page_location: String,
    #[serde(default = "default_auth_location")]
    pub token_location: String,
    #[serde(default = "default_services_api_location")]
    pub services_api_location: String,
    #[serde(default = "default_scope")]
    pub scope: Vec<String>,
}

impl Default for SessionSettings {
    /// Production auth and services-api hosts plus unprovisioned dev and
    /// certification entries.
    fn default() -> Self {
        let mut location = LocationMap::new();
        location.insert("auth".into(), Location::new("https", "auth-api.lexisnexis.com"));
        location.insert(
            "services-api".into(),
            Location::new("https", "services-api.lexisnexis.com"),
        );
        location.insert("dev_auth".into(), Location::new("http", "dvc7720.lexisnexis.com:39143"));
        location.insert("dev_services-api".into(), Location::new("http", ""));
        location.insert("cert_auth".into(), Location::new("http", ""));
        location.insert("cert_services-api".into(), Location::new("http", ""));

        Self {
            redirect_url: default_redirect_url(),
            auth_page_path: DEFAULT_AUTH_PAGE_PATH.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            location,
            auth_page_location: default_auth_location(),
            token_location: default_auth_location(),
            services_api_location: default_services_api_location(),
            scope: default_scope(),
        }
    }
}

/// Analytics (OData) endpoint reached with HTTP Basic auth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEndpoint {
    pub scheme: String,
    #[serde(rename = "netloc", alias = "host")]
    pub host: String,
    /// Path of the OData collection, e.g. `/DefaultCollection/_odata`
    pub odata: String,
}

impl AnalyticsEndpoint {
    /// Base URL that OData queries are appended to.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.odata)
    }
}

fn default_redirect_url() -> String {
    DEFAULT_REDIRECT_URL.to_string()
}

fn default_auth_location() -> String {
    DEFAULT_AUTH_LOCATION.to_string()
}

fn default_services_api_location() -> String {
    DEFAULT_SERVICES_API_LOCATION.to_string()
}

fn default_scope() -> Vec<String> {
    vec![DEFAULT_SCOPE.to_string()]
}
