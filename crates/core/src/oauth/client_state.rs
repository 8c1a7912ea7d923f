//! Authorization-Code client state machine
//!
//! Holds client identity, the CSRF state token, scope, redirect URL, the
//! pending authorization code and the current token. All token endpoint I/O
//! goes through a [`TokenTransport`], so every transition is testable
//! without a network.

use tracing::{debug, info, warn};
use url::Url;
use zephyr_domain::{
    ClientCredentials, OAuthErrorResponse, Result, TokenResponse, TokenSet, ZephyrError,
};

use super::ports::{TokenEndpointResponse, TokenTransport};
use super::state_token::{generate_state, validate_state};

/// Where a session stands in the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No state token, no code, no token.
    Unauthenticated,
    /// Authorization URL issued; waiting for the redirect back.
    AwaitingCallback,
    Authenticated,
    /// Holding a token whose client-side expiry has passed.
    Expired,
}

/// OAuth 2.0 Authorization-Code client state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2ClientState {
    client_id: String,
    redirect_url: String,
    scope: Vec<String>,
    state_token: Option<String>,
    authorization_code: Option<String>,
    token: Option<TokenSet>,
}

impl OAuth2ClientState {
    /// Create an unauthenticated client.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
        scope: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_url: redirect_url.into(),
            scope,
            state_token: None,
            authorization_code: None,
            token: None,
        }
    }

    pub(crate) fn restore(
        mut self,
        state_token: Option<String>,
        authorization_code: Option<String>,
        token: Option<TokenSet>,
    ) -> Self {
        self.state_token = state_token.filter(|s| !s.is_empty());
        self.authorization_code = authorization_code.filter(|c| !c.is_empty());
        self.token = token;
        self
    }

    /// Compose the authorization URL the user-agent is redirected to.
    ///
    /// A fresh state token is generated on every call and any pending
    /// authorization code is dropped.
    pub fn build_authorization_url(&mut self, auth_endpoint: &Url) -> Url {
        let state = generate_state();
        let scope = self.scope_string();

        let mut url = auth_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", &scope)
            .append_pair("state", &state);

        self.state_token = Some(state);
        self.authorization_code = None;

        debug!(endpoint = %auth_endpoint, "built authorization URL");
        url
    }

    /// Take the authorization code from the callback URL's query string.
    ///
    /// Accepts an absolute URL, a path with a query, or a bare query string.
    ///
    /// # Errors
    /// - `MissingAuthorizationCode` if there is no `code` parameter; the
    ///   token is left untouched.
    /// - `StateMismatch` if the returned `state` is absent or differs from
    ///   the issued state token, or the token was already used by an
    ///   accepted callback.
    pub fn accept_callback(&mut self, callback_url: &str) -> Result<()> {
        let params = callback_params(callback_url);
        let param = |name: &str| {
            params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
        };

        let Some(code) = param("code").filter(|code| !code.is_empty()) else {
            if let Some(error) = param("error") {
                warn!(error, "authorization server returned an error on callback");
            }
            return Err(ZephyrError::MissingAuthorizationCode);
        };

        let state_matches = match (self.state_token.as_deref(), param("state")) {
            (Some(expected), Some(returned)) => validate_state(expected, returned),
            _ => false,
        };
        if !state_matches {
            warn!("callback state does not match the issued state token");
            return Err(ZephyrError::StateMismatch);
        }

        // The state token is single-use; a replayed callback must not match.
        self.state_token = None;
        self.authorization_code = Some(code.to_string());
        Ok(())
    }

    /// Redeem the pending authorization code at the token endpoint.
    ///
    /// The code is consumed whatever the outcome; codes are single-use.
    ///
    /// # Errors
    /// - `MissingAuthorizationCode` if no code is pending.
    /// - `Configuration` if `credentials` are empty.
    /// - `TokenExchange` on a non-2xx or unparsable reply.
    /// - Transport errors from `transport` unchanged.
    pub async fn redeem_code<T>(
        &mut self,
        transport: &T,
        token_endpoint: &Url,
        credentials: &ClientCredentials,
    ) -> Result<&TokenSet>
    where
        T: TokenTransport + ?Sized,
    {
        if credentials.is_empty() {
            return Err(ZephyrError::Configuration(
                "client credentials are empty; cannot authenticate at the token endpoint".into(),
            ));
        }
        let code = self.authorization_code.take().ok_or(ZephyrError::MissingAuthorizationCode)?;

        let form = [
            ("grant_type", "authorization_code".to_string()),
            ("code", code),
            ("redirect_uri", self.redirect_url.clone()),
            ("scope", self.scope_string()),
        ];

        let response = transport.post_form(token_endpoint, Some(credentials), &form).await?;
        debug!(status = response.status, endpoint = %token_endpoint, "token exchange completed");

        let token = parse_token(&response).map_err(ZephyrError::TokenExchange)?;
        info!(expires_in = ?token.expires_in, "obtained access token");
        Ok(self.token.insert(token))
    }

    /// [`accept_callback`](Self::accept_callback) followed by
    /// [`redeem_code`](Self::redeem_code).
    ///
    /// # Errors
    /// See both steps.
    pub async fn exchange_code_for_token<T>(
        &mut self,
        transport: &T,
        token_endpoint: &Url,
        callback_url: &str,
        credentials: &ClientCredentials,
    ) -> Result<&TokenSet>
    where
        T: TokenTransport + ?Sized,
    {
        self.accept_callback(callback_url)?;
        self.redeem_code(transport, token_endpoint, credentials).await
    }

    /// Obtain a new access token with the current refresh token.
    ///
    /// The refresh token is read before anything else is touched, and the
    /// held token is only replaced on success. A reply without a new
    /// `refresh_token` keeps the previous one.
    ///
    /// # Errors
    /// - `NoTokenEndpoint` if `token_endpoint` is empty.
    /// - `NoRefreshToken` if the current token has no refresh token.
    /// - `TokenRefresh` on a non-2xx or unparsable reply.
    /// - Transport errors from `transport` unchanged.
    pub async fn refresh<T>(
        &mut self,
        transport: &T,
        token_endpoint: &str,
        auth: Option<&ClientCredentials>,
    ) -> Result<&TokenSet>
    where
        T: TokenTransport + ?Sized,
    {
        if token_endpoint.trim().is_empty() {
            return Err(ZephyrError::NoTokenEndpoint);
        }
        let endpoint = Url::parse(token_endpoint).map_err(|e| {
            ZephyrError::Configuration(format!("invalid token endpoint '{token_endpoint}': {e}"))
        })?;

        let refresh_token = self
            .token
            .as_ref()
            .and_then(|token| token.refresh_token.clone())
            .filter(|token| !token.is_empty())
            .ok_or(ZephyrError::NoRefreshToken)?;

        let form = [
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.clone()),
            ("scope", self.scope_string()),
        ];

        let response = transport.post_form(&endpoint, auth, &form).await?;
        debug!(status = response.status, endpoint = %endpoint, "token refresh completed");

        let token = parse_token(&response)
            .map_err(ZephyrError::TokenRefresh)?
            .with_refresh_fallback(Some(refresh_token));
        info!(expires_in = ?token.expires_in, "refreshed access token");
        Ok(self.token.insert(token))
    }

    /// True iff an access token is present and non-empty.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.token.as_ref().is_some_and(|token| !token.access_token.is_empty())
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        match &self.token {
            Some(token) if !token.access_token.is_empty() => {
                if token.is_expired(0) {
                    AuthPhase::Expired
                } else {
                    AuthPhase::Authenticated
                }
            }
            _ if self.state_token.is_some() || self.authorization_code.is_some() => {
                AuthPhase::AwaitingCallback
            }
            _ => AuthPhase::Unauthenticated,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    pub fn set_redirect_url(&mut self, redirect_url: impl Into<String>) {
        self.redirect_url = redirect_url.into();
    }

    #[must_use]
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Scopes as the space-separated string sent on the wire.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scope.join(" ")
    }

    #[must_use]
    pub fn state_token(&self) -> Option<&str> {
        self.state_token.as_deref()
    }

    #[must_use]
    pub fn authorization_code(&self) -> Option<&str> {
        self.authorization_code.as_deref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&TokenSet> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: TokenSet) {
        self.token = Some(token);
    }

    /// Drop the token, returning the session to the unauthorized state.
    pub fn clear_token(&mut self) {
        self.token = None;
    }
}

fn callback_params(callback_url: &str) -> Vec<(String, String)> {
    let query = match Url::parse(callback_url) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => callback_url.split_once('?').map_or(callback_url, |(_, query)| query).to_string(),
    };
    url::form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

fn parse_token(response: &TokenEndpointResponse) -> std::result::Result<TokenSet, String> {
    if !response.is_success() {
        let detail = match serde_json::from_str::<OAuthErrorResponse>(&response.body) {
            Ok(error) => error.to_string(),
            Err(_) => response.body.chars().take(200).collect(),
        };
        return Err(format!("token endpoint returned HTTP {}: {detail}", response.status));
    }

    let parsed: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|e| format!("unparsable token response: {e}"))?;
    if parsed.access_token.is_empty() {
        return Err("token response contained an empty access_token".to_string());
    }
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Replays canned replies and records every form it was sent.
    struct ScriptedTransport {
        replies: Mutex<Vec<Result<TokenEndpointResponse>>>,
        sent: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl ScriptedTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                replies: Mutex::new(vec![Ok(TokenEndpointResponse {
                    status,
                    body: body.to_string(),
                })]),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_forms(&self) -> Vec<Vec<(String, String)>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenTransport for ScriptedTransport {
        async fn post_form(
            &self,
            _endpoint: &Url,
            _credentials: Option<&ClientCredentials>,
            form: &[(&'static str, String)],
        ) -> Result<TokenEndpointResponse> {
            self.sent
                .lock()
                .unwrap()
                .push(form.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn client() -> OAuth2ClientState {
        OAuth2ClientState::new("abc", "http://localhost/callback", vec!["s1".to_string()])
    }

    fn endpoint(path: &str) -> Url {
        Url::parse(&format!("https://auth.example.com{path}")).unwrap()
    }

    fn creds() -> ClientCredentials {
        ClientCredentials::new("abc", "secret")
    }

    fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_authorization_url_query() {
        let mut client = client();
        assert_eq!(client.phase(), AuthPhase::Unauthenticated);

        let url = client.build_authorization_url(&endpoint("/oauth/v2/authorize"));
        let query = url.query().unwrap();

        assert!(query.contains("client_id=abc"));
        assert!(query.contains("redirect_uri=http%3A%2F%2Flocalhost%2Fcallback"));
        assert!(query.contains("response_type=code"));
        assert!(query.contains("scope=s1"));

        let state = url.query_pairs().find(|(k, _)| k == "state").map(|(_, v)| v.into_owned());
        assert!(state.as_deref().is_some_and(|s| !s.is_empty()));
        assert_eq!(state.as_deref(), client.state_token());
        assert_eq!(client.phase(), AuthPhase::AwaitingCallback);
    }

    #[test]
    fn test_each_authorization_url_gets_a_fresh_state() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let first = client.state_token().map(str::to_string);
        client.build_authorization_url(&endpoint("/authorize"));
        assert_ne!(first.as_deref(), client.state_token());
    }

    #[tokio::test]
    async fn test_callback_without_code_fails_and_leaves_token_unset() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let transport = ScriptedTransport::replying(200, "{}");

        let result = client
            .exchange_code_for_token(
                &transport,
                &endpoint("/token"),
                "http://localhost/callback?state=whatever",
                &creds(),
            )
            .await;

        assert!(matches!(result, Err(ZephyrError::MissingAuthorizationCode)));
        assert!(client.token().is_none());
        assert!(transport.sent_forms().is_empty());
    }

    #[test]
    fn test_callback_with_error_parameter_has_no_code() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));

        let result = client.accept_callback("/callback?error=access_denied");
        assert!(matches!(result, Err(ZephyrError::MissingAuthorizationCode)));
    }

    #[test]
    fn test_callback_with_forged_state_is_rejected() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));

        let result = client.accept_callback("http://localhost/callback?code=c1&state=forged");
        assert!(matches!(result, Err(ZephyrError::StateMismatch)));
        assert!(client.authorization_code().is_none());
    }

    #[test]
    fn test_state_token_is_single_use() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let state = client.state_token().unwrap().to_string();

        client.accept_callback(&format!("code=c1&state={state}")).unwrap();
        assert!(client.state_token().is_none());
        assert_eq!(client.phase(), AuthPhase::AwaitingCallback);

        let replay = client.accept_callback(&format!("code=c2&state={state}"));
        assert!(matches!(replay, Err(ZephyrError::StateMismatch)));
        assert_eq!(client.authorization_code(), Some("c1"));
    }

    #[tokio::test]
    async fn test_exchange_with_huge_expires_in_succeeds() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let state = client.state_token().unwrap().to_string();
        let transport =
            ScriptedTransport::replying(200, r#"{"access_token":"A1","expires_in":10000000000000}"#);

        let token = client
            .exchange_code_for_token(&transport, &endpoint("/token"), &format!("code=c1&state={state}"), &creds())
            .await
            .unwrap();

        assert_eq!(token.access_token, "A1");
        assert!(token.expires_at.is_none());
        assert_eq!(client.phase(), AuthPhase::Authenticated);
    }

    #[test]
    fn test_callback_before_any_authorization_request_is_rejected() {
        let mut client = client();
        let result = client.accept_callback("code=c1&state=anything");
        assert!(matches!(result, Err(ZephyrError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let mut client = client();
        let auth_url = client.build_authorization_url(&endpoint("/authorize"));
        let state = client.state_token().unwrap().to_string();
        assert!(auth_url.as_str().contains(&state));

        let transport = ScriptedTransport::replying(
            200,
            r#"{"access_token":"A1","token_type":"Bearer","expires_in":3600,"refresh_token":"R1"}"#,
        );
        let callback = format!("http://localhost/callback?code=c1&state={state}");

        let token = client
            .exchange_code_for_token(&transport, &endpoint("/token"), &callback, &creds())
            .await
            .unwrap();
        assert_eq!(token.access_token, "A1");

        let forms = transport.sent_forms();
        assert_eq!(forms.len(), 1);
        assert_eq!(form_value(&forms[0], "grant_type"), Some("authorization_code"));
        assert_eq!(form_value(&forms[0], "code"), Some("c1"));
        assert_eq!(form_value(&forms[0], "redirect_uri"), Some("http://localhost/callback"));
        assert_eq!(form_value(&forms[0], "scope"), Some("s1"));

        assert!(client.is_authorized());
        assert_eq!(client.phase(), AuthPhase::Authenticated);
        assert!(client.authorization_code().is_none());
    }

    #[tokio::test]
    async fn test_exchange_non_success_is_token_exchange_error() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let state = client.state_token().unwrap().to_string();
        let transport = ScriptedTransport::replying(
            400,
            r#"{"error":"invalid_grant","error_description":"code expired"}"#,
        );

        let result = client
            .exchange_code_for_token(
                &transport,
                &endpoint("/token"),
                &format!("?code=c1&state={state}"),
                &creds(),
            )
            .await;

        match result {
            Err(ZephyrError::TokenExchange(msg)) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("invalid_grant"));
            }
            other => panic!("expected TokenExchange, got {other:?}"),
        }
        assert!(!client.is_authorized());
        assert!(client.authorization_code().is_none());
    }

    #[tokio::test]
    async fn test_exchange_unparsable_body_is_token_exchange_error() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let state = client.state_token().unwrap().to_string();
        let transport = ScriptedTransport::replying(200, "<html>gateway</html>");

        let result = client
            .exchange_code_for_token(
                &transport,
                &endpoint("/token"),
                &format!("code=c1&state={state}"),
                &creds(),
            )
            .await;

        assert!(matches!(result, Err(ZephyrError::TokenExchange(_))));
    }

    #[tokio::test]
    async fn test_exchange_requires_credentials() {
        let mut client = client();
        client.build_authorization_url(&endpoint("/authorize"));
        let state = client.state_token().unwrap().to_string();
        client.accept_callback(&format!("code=c1&state={state}")).unwrap();
        let transport = ScriptedTransport::replying(200, "{}");

        let result =
            client.redeem_code(&transport, &endpoint("/token"), &ClientCredentials::default()).await;
        assert!(matches!(result, Err(ZephyrError::Configuration(_))));
        // The code stays pending so the host can retry with real credentials.
        assert_eq!(client.authorization_code(), Some("c1"));
    }

    #[tokio::test]
    async fn test_refresh_preserves_prior_refresh_token() {
        let mut client = client();
        client.set_token(TokenSet::new("A1", Some("R1".into()), Some(3600)));
        let transport = ScriptedTransport::replying(200, r#"{"access_token":"A2"}"#);

        let token = client
            .refresh(&transport, "https://auth.example.com/token", None)
            .await
            .unwrap();

        assert_eq!(token.access_token, "A2");
        assert_eq!(token.refresh_token.as_deref(), Some("R1"));

        let forms = transport.sent_forms();
        assert_eq!(form_value(&forms[0], "grant_type"), Some("refresh_token"));
        assert_eq!(form_value(&forms[0], "refresh_token"), Some("R1"));
        assert_eq!(form_value(&forms[0], "scope"), Some("s1"));
    }

    #[tokio::test]
    async fn test_refresh_takes_new_refresh_token_when_issued() {
        let mut client = client();
        client.set_token(TokenSet::new("A1", Some("R1".into()), Some(3600)));
        let transport =
            ScriptedTransport::replying(200, r#"{"access_token":"A2","refresh_token":"R2"}"#);

        let token = client.refresh(&transport, "https://auth.example.com/token", None).await.unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_refresh_without_endpoint() {
        let mut client = client();
        client.set_token(TokenSet::new("A1", Some("R1".into()), None));
        let transport = ScriptedTransport::replying(200, "{}");

        let result = client.refresh(&transport, "", None).await;
        assert!(matches!(result, Err(ZephyrError::NoTokenEndpoint)));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_keeps_token() {
        let mut client = client();
        client.set_token(TokenSet::new("A1", None, None));
        let transport = ScriptedTransport::replying(200, "{}");

        let result = client.refresh(&transport, "https://auth.example.com/token", None).await;
        assert!(matches!(result, Err(ZephyrError::NoRefreshToken)));
        assert_eq!(client.token().map(|t| t.access_token.as_str()), Some("A1"));
        assert!(transport.sent_forms().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_token_in_place() {
        let mut client = client();
        client.set_token(TokenSet::new("A1", Some("R1".into()), None));
        let transport = ScriptedTransport::replying(401, r#"{"error":"invalid_grant"}"#);

        let result = client.refresh(&transport, "https://auth.example.com/token", None).await;
        assert!(matches!(result, Err(ZephyrError::TokenRefresh(msg)) if msg.contains("invalid_grant")));
        assert_eq!(client.token().and_then(|t| t.refresh_token.as_deref()), Some("R1"));
    }

    #[test]
    fn test_is_authorized_requires_non_empty_access_token() {
        let mut client = client();
        assert!(!client.is_authorized());

        client.set_token(TokenSet::new("", None, None));
        assert!(!client.is_authorized());

        client.set_token(TokenSet::new("A1", None, None));
        assert!(client.is_authorized());

        client.clear_token();
        assert!(!client.is_authorized());
    }

    #[test]
    fn test_expired_phase() {
        let mut client = client();
        let mut token = TokenSet::new("A1", Some("R1".into()), Some(60));
        token.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(5));
        client.set_token(token);

        assert_eq!(client.phase(), AuthPhase::Expired);
        assert!(client.is_authorized());
    }
}
