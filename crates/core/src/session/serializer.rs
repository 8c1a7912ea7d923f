//! Session ⇄ plain JSON object
//!
//! The plain form is a flat object:
//!
//! ```json
//! {
//!   "client_id": "...",
//!   "state": "...",
//!   "token": { "access_token": "...", "refresh_token": "...", ... },
//!   "auth_role": "auth",
//!   "token_role": "auth",
//!   "services_api_role": "services-api",
//!   "redirect_url": "http://127.0.0.1:4999/callback",
//!   "scope": ["http://oauth.lexisnexis.com/all"],
//!   "location_config": {
//!     "redirect_url": "...",
//!     "auth_page_path": "/oauth/v2/authorize",
//!     "token_path": "/oauth/v2/token",
//!     "location": { "auth": { "scheme": "https", "netloc": "..." } }
//!   }
//! }
//! ```
//!
//! Client secrets are never part of it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use zephyr_domain::constants::{
    DEFAULT_AUTH_LOCATION, DEFAULT_SCOPE, DEFAULT_SERVICES_API_LOCATION,
};
use zephyr_domain::{EndpointRole, LocationMap, Result, SessionSettings, TokenSet, ZephyrError};

use super::state::SessionState;
use crate::endpoint::EndpointConfig;
use crate::oauth::OAuth2ClientState;

/// Serialized session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainSession {
    pub client_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub token: Option<TokenSet>,
    /// Authorization code accepted from a callback but not yet redeemed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default = "default_auth_role")]
    pub auth_role: String,
    #[serde(default = "default_auth_role")]
    pub token_role: String,
    #[serde(default = "default_services_api_role")]
    pub services_api_role: String,
    pub redirect_url: String,
    #[serde(default = "default_scope")]
    pub scope: Vec<String>,
    pub location_config: LocationConfig,
}

/// Location mapping and fixed paths carried inside a [`PlainSession`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub redirect_url: String,
    pub auth_page_path: String,
    pub token_path: String,
    pub location: LocationMap,
}

impl From<&SessionState> for PlainSession {
    fn from(session: &SessionState) -> Self {
        let endpoints = session.endpoints();
        let oauth = session.oauth();

        Self {
            client_id: oauth.client_id().to_string(),
            state: oauth.state_token().map(str::to_string),
            token: oauth.token().cloned(),
            code: oauth.authorization_code().map(str::to_string),
            auth_role: endpoints.binding(EndpointRole::AuthPage).to_string(),
            token_role: endpoints.binding(EndpointRole::Token).to_string(),
            services_api_role: endpoints.binding(EndpointRole::ServicesApi).to_string(),
            redirect_url: oauth.redirect_url().to_string(),
            scope: oauth.scope().to_vec(),
            location_config: LocationConfig {
                redirect_url: oauth.redirect_url().to_string(),
                auth_page_path: endpoints.auth_page_path().to_string(),
                token_path: endpoints.token_path().to_string(),
                location: endpoints.locations().clone(),
            },
        }
    }
}

impl PlainSession {
    /// Rebuild the live session.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` if a role is bound to a location
    /// missing from the carried mapping.
    pub fn into_state(self) -> Result<SessionState> {
        let settings = SessionSettings {
            redirect_url: self.redirect_url.clone(),
            auth_page_path: self.location_config.auth_page_path,
            token_path: self.location_config.token_path,
            location: self.location_config.location,
            auth_page_location: self.auth_role,
            token_location: self.token_role,
            services_api_location: self.services_api_role,
            scope: self.scope.clone(),
        };
        let endpoints = EndpointConfig::from_settings(&settings)?;
        let oauth = OAuth2ClientState::new(self.client_id, self.redirect_url, self.scope)
            .restore(self.state, self.code, self.token);

        Ok(SessionState::from_parts(endpoints, oauth))
    }
}

/// Serialize `session` into a plain JSON object.
///
/// # Errors
/// Returns `ZephyrError::Deserialization` if the session cannot be encoded
/// as a JSON object.
pub fn to_plain(session: &SessionState) -> Result<Map<String, Value>> {
    match serde_json::to_value(PlainSession::from(session)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ZephyrError::Deserialization(format!(
            "session encoded as {other} instead of an object"
        ))),
        Err(e) => Err(ZephyrError::Deserialization(format!("failed to encode session: {e}"))),
    }
}

/// Rehydrate a session from its plain JSON object.
///
/// # Errors
/// - `ZephyrError::Deserialization` if `client_id`, `redirect_url`,
///   `location_config` or one of its paths is missing or malformed.
/// - `ZephyrError::Configuration` if a role binding is invalid.
pub fn from_plain(data: &Map<String, Value>) -> Result<SessionState> {
    let plain: PlainSession = serde_json::from_value(Value::Object(data.clone()))
        .map_err(|e| ZephyrError::Deserialization(format!("invalid session data: {e}")))?;

    debug!(
        client_id = %plain.client_id,
        has_token = plain.token.is_some(),
        "rehydrating session"
    );
    plain.into_state()
}

fn default_auth_role() -> String {
    DEFAULT_AUTH_LOCATION.to_string()
}

fn default_services_api_role() -> String {
    DEFAULT_SERVICES_API_LOCATION.to_string()
}

fn default_scope() -> Vec<String> {
    vec![DEFAULT_SCOPE.to_string()]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::oauth::AuthPhase;

    fn session() -> SessionState {
        SessionState::new(&SessionSettings::default(), "abc").unwrap()
    }

    #[test]
    fn test_round_trip_fresh_session() {
        let original = session();
        let plain = to_plain(&original).unwrap();

        assert_eq!(plain.get("client_id"), Some(&json!("abc")));
        assert_eq!(plain.get("auth_role"), Some(&json!("auth")));
        assert_eq!(plain.get("services_api_role"), Some(&json!("services-api")));
        assert!(plain.get("location_config").is_some_and(Value::is_object));

        assert_eq!(from_plain(&plain).unwrap(), original);
    }

    #[test]
    fn test_round_trip_authenticated_session_with_rebinding() {
        let mut original = session();
        original.authorization_url().unwrap();
        original.endpoints_mut().bind(EndpointRole::Token, "dev_auth").unwrap();
        original.oauth_mut().set_token(TokenSet::new("A1", Some("R1".into()), Some(3600)));

        let restored = from_plain(&to_plain(&original).unwrap()).unwrap();

        assert_eq!(restored, original);
        assert_eq!(restored.endpoints().binding(EndpointRole::Token), "dev_auth");
        assert_eq!(restored.oauth().phase(), AuthPhase::Authenticated);
    }

    #[test]
    fn test_plain_form_has_no_client_secret() {
        let plain = to_plain(&session()).unwrap();
        let rendered = Value::Object(plain).to_string();
        assert!(!rendered.contains("client_secret"));
    }

    #[test]
    fn test_missing_token_and_state_mean_unauthenticated() {
        let mut plain = to_plain(&session()).unwrap();
        plain.remove("token");
        plain.remove("state");

        let restored = from_plain(&plain).unwrap();
        assert_eq!(restored.oauth().phase(), AuthPhase::Unauthenticated);
        assert!(!restored.is_authorized());
    }

    #[test]
    fn test_missing_client_id_is_deserialization_error() {
        let mut plain = to_plain(&session()).unwrap();
        plain.remove("client_id");

        let result = from_plain(&plain);
        assert!(matches!(result, Err(ZephyrError::Deserialization(_))));
    }

    #[test]
    fn test_missing_location_config_path_is_deserialization_error() {
        let mut plain = to_plain(&session()).unwrap();
        if let Some(Value::Object(config)) = plain.get_mut("location_config") {
            config.remove("token_path");
        }

        let result = from_plain(&plain);
        assert!(matches!(result, Err(ZephyrError::Deserialization(_))));
    }

    #[test]
    fn test_binding_to_absent_location_is_configuration_error() {
        let mut plain = to_plain(&session()).unwrap();
        plain.insert("token_role".into(), json!("staging_auth"));

        let result = from_plain(&plain);
        assert!(matches!(result, Err(ZephyrError::Configuration(_))));
    }

    #[test]
    fn test_serialized_copies_are_independent() {
        let original = session();
        let plain = to_plain(&original).unwrap();

        let mut first = from_plain(&plain).unwrap();
        let second = from_plain(&plain).unwrap();
        first.oauth_mut().set_token(TokenSet::new("A1", None, None));

        assert!(first.is_authorized());
        assert!(!second.is_authorized());
    }
}
