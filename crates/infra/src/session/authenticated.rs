use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use url::Url;
use zephyr_core::{from_plain, to_plain, SessionState};
use zephyr_domain::{ClientCredentials, Result, SessionSettings, TokenSet, ZephyrError};

use super::transport::{redacted, TransportPolicy};
use crate::errors::InfraError;
use crate::http::HttpClient;
use crate::oauth::HttpTokenTransport;

/// OAuth-authenticated HTTP session
///
/// Owns one [`SessionState`] plus transport defaults. Client credentials are
/// held in memory only, for token endpoint calls, and never serialized.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    state: SessionState,
    http: HttpClient,
    tokens: HttpTokenTransport,
    policy: TransportPolicy,
    credentials: Option<ClientCredentials>,
}

impl AuthenticatedSession {
    pub fn new(state: SessionState, http: HttpClient, policy: TransportPolicy) -> Self {
        let tokens = HttpTokenTransport::new(http.clone(), policy);
        Self { state, http, tokens, policy, credentials: None }
    }

    /// Fresh unauthenticated session.
    pub fn from_settings(
        settings: &SessionSettings,
        client_id: impl Into<String>,
        http: HttpClient,
        policy: TransportPolicy,
    ) -> Result<Self> {
        Ok(Self::new(SessionState::new(settings, client_id)?, http, policy))
    }

    /// Rehydrate from the plain form produced by [`to_plain`](Self::to_plain).
    pub fn from_plain(
        data: &Map<String, Value>,
        http: HttpClient,
        policy: TransportPolicy,
    ) -> Result<Self> {
        Ok(Self::new(from_plain(data)?, http, policy))
    }

    pub fn to_plain(&self) -> Result<Map<String, Value>> {
        to_plain(&self.state)
    }

    /// Attach client credentials used for code exchange and refresh.
    #[must_use]
    pub fn with_credentials(mut self, credentials: ClientCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn policy(&self) -> TransportPolicy {
        self.policy
    }

    pub fn is_authorized(&self) -> bool {
        self.state.is_authorized()
    }

    pub fn token(&self) -> Option<&TokenSet> {
        self.state.oauth().token()
    }

    /// Authorization page URL with a fresh state token.
    pub fn authorization_url(&mut self) -> Result<Url> {
        self.state.authorization_url()
    }

    /// `path` joined onto the services-api base URL.
    pub fn api_url(&self, path: &str) -> Result<Url> {
        let base = self.state.services_api_base()?;
        base.join(path).map_err(|e| {
            ZephyrError::Configuration(format!("cannot join '{path}' onto services-api URL: {e}"))
        })
    }

    /// Exchange the callback's authorization code at the token endpoint.
    ///
    /// # Errors
    /// `Configuration` when no credentials are attached, plus everything
    /// `OAuth2ClientState::exchange_code_for_token` returns.
    #[instrument(skip(self, callback_url))]
    pub async fn exchange_code(&mut self, callback_url: &str) -> Result<&TokenSet> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ZephyrError::Configuration("no client credentials attached to session".into())
        })?;
        let endpoint = self.state.token_endpoint()?;

        let oauth = self.state.oauth_mut();
        oauth.exchange_code_for_token(&self.tokens, &endpoint, callback_url, credentials).await
    }

    /// Refresh the access token with the attached credentials.
    ///
    /// An unresolvable token role counts as no token endpoint.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<&TokenSet> {
        let endpoint = match self.state.token_endpoint() {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(error = %e, "token endpoint does not resolve");
                String::new()
            }
        };

        let oauth = self.state.oauth_mut();
        oauth.refresh(&self.tokens, &endpoint, self.credentials.as_ref()).await
    }

    /// Send a request, injecting the bearer token when authorized.
    ///
    /// A token that is already expired client-side is refreshed first. A 401
    /// from the target triggers one refresh and one retry; a second expiry
    /// signal in the same call is `TokenRejected`. An unauthorized session
    /// sends the request unmodified and returns whatever comes back.
    ///
    /// # Errors
    /// - `InsecureTransport` before any I/O when the policy forbids `url`.
    /// - `TokenRefresh`, `NoRefreshToken`, `NoTokenEndpoint` from the
    ///   refresh step.
    /// - `TokenRejected` on a 401 after a refresh.
    /// - `Network`, `Timeout` from the transport.
    #[instrument(skip(self, headers, body), fields(method = %method, url = %redacted(&url)))]
    pub async fn send(
        &mut self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        self.policy.check(&url)?;

        let mut refreshed = false;
        if self.token_expired_with_refresh() {
            debug!("access token expired client-side, refreshing before send");
            self.refresh().await?;
            refreshed = true;
        }

        let response = self.dispatch(&method, &url, &headers, body.clone()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || !self.is_authorized() {
            return Ok(response);
        }

        if refreshed {
            return Err(rejected(&url));
        }

        info!("target rejected access token, refreshing once");
        self.refresh().await?;

        let retry = self.dispatch(&method, &url, &headers, body).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(rejected(&url));
        }
        Ok(retry)
    }

    pub async fn get(&mut self, url: Url) -> Result<Response> {
        self.send(Method::GET, url, HeaderMap::new(), None).await
    }

    /// POST `payload` as a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &mut self,
        url: Url,
        payload: &T,
    ) -> Result<Response> {
        let body = serde_json::to_vec(payload).map_err(|e| ZephyrError::from(InfraError::from(e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.send(Method::POST, url, headers, Some(body)).await
    }

    fn token_expired_with_refresh(&self) -> bool {
        self.token().is_some_and(|token| {
            token.is_expired(0) && token.refresh_token.as_deref().is_some_and(|r| !r.is_empty())
        })
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let mut request = self.http.request(method.clone(), url.clone()).headers(headers.clone());

        if let Some(token) = self.token().filter(|token| !token.access_token.is_empty()) {
            let mut value = HeaderValue::from_str(&token.authorization_value()).map_err(|_| {
                ZephyrError::InvalidInput("access token is not a valid header value".into())
            })?;
            value.set_sensitive(true);
            request = request.header(AUTHORIZATION, value);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        self.http.send(request).await
    }
}

fn rejected(url: &Url) -> ZephyrError {
    warn!(url = %redacted(url), "access token rejected after refresh");
    ZephyrError::TokenRejected(format!("HTTP 401 from {}", redacted(url)))
}
