//! Role → location → URL resolution
//!
//! An [`EndpointConfig`] binds the three [`EndpointRole`]s to location names
//! and carries the two environment-independent paths. Resolution is a pure
//! function of the current bindings and the (immutable) location mapping, so
//! rebinding a role is how an environment override is applied.

use tracing::debug;
use url::Url;
use zephyr_domain::{EndpointRole, Location, LocationMap, Result, SessionSettings, ZephyrError};

/// Role bindings, fixed paths and the location mapping for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    locations: LocationMap,
    auth_page_path: String,
    token_path: String,
    auth_page_location: String,
    token_location: String,
    services_api_location: String,
}

impl EndpointConfig {
    /// Build from a settings document, validating that every role is bound
    /// to a location present in the mapping.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` for an unbound role or an unknown
    /// location name.
    pub fn from_settings(settings: &SessionSettings) -> Result<Self> {
        let config = Self {
            locations: settings.location.clone(),
            auth_page_path: settings.auth_page_path.clone(),
            token_path: settings.token_path.clone(),
            auth_page_location: settings.auth_page_location.clone(),
            token_location: settings.token_location.clone(),
            services_api_location: settings.services_api_location.clone(),
        };

        for role in EndpointRole::ALL {
            config.bound_location(role)?;
        }

        Ok(config)
    }

    /// Location name currently bound to `role` (empty when unbound).
    #[must_use]
    pub fn binding(&self, role: EndpointRole) -> &str {
        match role {
            EndpointRole::AuthPage => &self.auth_page_location,
            EndpointRole::Token => &self.token_location,
            EndpointRole::ServicesApi => &self.services_api_location,
        }
    }

    /// Rebind `role` to another location, e.g. `token` from `auth` to
    /// `dev_auth`. Takes effect on the next resolution.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` if `location` is not in the
    /// mapping; the previous binding is kept.
    pub fn bind(&mut self, role: EndpointRole, location: impl Into<String>) -> Result<()> {
        let location = location.into();
        if !self.locations.contains_key(&location) {
            return Err(ZephyrError::Configuration(format!(
                "cannot bind role '{role}' to unknown location '{location}'"
            )));
        }

        debug!(%role, %location, "rebinding endpoint role");
        let slot = match role {
            EndpointRole::AuthPage => &mut self.auth_page_location,
            EndpointRole::Token => &mut self.token_location,
            EndpointRole::ServicesApi => &mut self.services_api_location,
        };
        *slot = location;
        Ok(())
    }

    /// Resolve `role` to `scheme://host` joined with the role's fixed path.
    /// The services-api role has an empty path; callers append versioned
    /// paths themselves.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` if the role is unbound, the bound
    /// location is absent or unprovisioned, or the result is not a URL.
    pub fn resolve(&self, role: EndpointRole) -> Result<Url> {
        let location = self.bound_location(role)?;
        if !location.is_configured() {
            return Err(ZephyrError::Configuration(format!(
                "location '{}' bound to role '{role}' has no scheme or host",
                self.binding(role)
            )));
        }

        let raw = format!("{}{}", location.origin(), self.path(role));
        Url::parse(&raw).map_err(|e| {
            ZephyrError::Configuration(format!("invalid URL '{raw}' for role '{role}': {e}"))
        })
    }

    #[must_use]
    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.get(name)
    }

    #[must_use]
    pub fn locations(&self) -> &LocationMap {
        &self.locations
    }

    #[must_use]
    pub fn auth_page_path(&self) -> &str {
        &self.auth_page_path
    }

    #[must_use]
    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    /// Settings document reproducing this configuration.
    #[must_use]
    pub fn to_settings(&self, redirect_url: &str, scope: &[String]) -> SessionSettings {
        SessionSettings {
            redirect_url: redirect_url.to_string(),
            auth_page_path: self.auth_page_path.clone(),
            token_path: self.token_path.clone(),
            location: self.locations.clone(),
            auth_page_location: self.auth_page_location.clone(),
            token_location: self.token_location.clone(),
            services_api_location: self.services_api_location.clone(),
            scope: scope.to_vec(),
        }
    }

    fn path(&self, role: EndpointRole) -> &str {
        match role {
            EndpointRole::AuthPage => &self.auth_page_path,
            EndpointRole::Token => &self.token_path,
            EndpointRole::ServicesApi => "",
        }
    }

    fn bound_location(&self, role: EndpointRole) -> Result<&Location> {
        let name = self.binding(role);
        if name.is_empty() {
            return Err(ZephyrError::Configuration(format!(
                "role '{role}' is not bound to a location"
            )));
        }
        self.locations.get(name).ok_or_else(|| {
            ZephyrError::Configuration(format!(
                "location '{name}' bound to role '{role}' is not in the location mapping"
            ))
        })
    }
}
