use url::Url;
use zephyr_domain::{EndpointRole, Result, SessionSettings};

use crate::endpoint::EndpointConfig;
use crate::oauth::OAuth2ClientState;

/// Endpoint configuration plus OAuth client state for one user session
///
/// Not shared between requests: a host rehydrates one per request, works on
/// it sequentially and serializes it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    endpoints: EndpointConfig,
    oauth: OAuth2ClientState,
}

impl SessionState {
    /// New unauthenticated session from a settings document.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` if a role binding in `settings`
    /// names a location missing from its mapping.
    pub fn new(settings: &SessionSettings, client_id: impl Into<String>) -> Result<Self> {
        let endpoints = EndpointConfig::from_settings(settings)?;
        let oauth =
            OAuth2ClientState::new(client_id, settings.redirect_url.clone(), settings.scope.clone());
        Ok(Self { endpoints, oauth })
    }

    #[must_use]
    pub fn from_parts(endpoints: EndpointConfig, oauth: OAuth2ClientState) -> Self {
        Self { endpoints, oauth }
    }

    #[must_use]
    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub fn endpoints_mut(&mut self) -> &mut EndpointConfig {
        &mut self.endpoints
    }

    #[must_use]
    pub fn oauth(&self) -> &OAuth2ClientState {
        &self.oauth
    }

    pub fn oauth_mut(&mut self) -> &mut OAuth2ClientState {
        &mut self.oauth
    }

    /// Resolve the authorization page and decorate it with a fresh state.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` if the auth page role does not
    /// resolve.
    pub fn authorization_url(&mut self) -> Result<Url> {
        let endpoint = self.endpoints.resolve(EndpointRole::AuthPage)?;
        Ok(self.oauth.build_authorization_url(&endpoint))
    }

    /// # Errors
    /// Returns `ZephyrError::Configuration` if the token role does not
    /// resolve.
    pub fn token_endpoint(&self) -> Result<Url> {
        self.endpoints.resolve(EndpointRole::Token)
    }

    /// # Errors
    /// Returns `ZephyrError::Configuration` if the services-api role does
    /// not resolve.
    pub fn services_api_base(&self) -> Result<Url> {
        self.endpoints.resolve(EndpointRole::ServicesApi)
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.oauth.is_authorized()
    }
}
