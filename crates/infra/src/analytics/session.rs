use reqwest::header::ACCEPT;
use reqwest::{Method, Response};
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use url::Url;
use zephyr_domain::{AnalyticsEndpoint, ClientCredentials, Result, ZephyrError};

use crate::errors::InfraError;
use crate::http::HttpClient;
use crate::session::transport::{redacted, TransportPolicy};

/// Basic-auth client for the analytics OData service
///
/// Only the endpoint is serialized; credentials are re-supplied by the host
/// whenever the session is rehydrated.
#[derive(Debug, Clone)]
pub struct AnalyticsSession {
    endpoint: AnalyticsEndpoint,
    credentials: ClientCredentials,
    http: HttpClient,
    policy: TransportPolicy,
}

impl AnalyticsSession {
    pub fn new(
        endpoint: AnalyticsEndpoint,
        credentials: ClientCredentials,
        http: HttpClient,
        policy: TransportPolicy,
    ) -> Self {
        Self { endpoint, credentials, http, policy }
    }

    pub fn endpoint(&self) -> &AnalyticsEndpoint {
        &self.endpoint
    }

    /// `{base}{resource}` with `query` as the raw query string.
    pub fn url_for(&self, resource: &str, query: Option<&str>) -> Result<Url> {
        let raw = format!("{}{resource}", self.endpoint.base_url());
        let mut url = Url::parse(&raw).map_err(|e| {
            ZephyrError::Configuration(format!("invalid analytics URL '{raw}': {e}"))
        })?;
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// GET `resource` with HTTP Basic auth.
    pub async fn get(&self, resource: &str, query: Option<&str>) -> Result<Response> {
        let url = self.url_for(resource, query)?;
        self.get_url(url).await
    }

    /// GET an absolute URL, e.g. an `@odata.nextLink`.
    #[instrument(skip(self, url), fields(url = %redacted(&url)))]
    pub async fn get_url(&self, url: Url) -> Result<Response> {
        self.policy.check(&url)?;
        if self.credentials.is_empty() {
            return Err(ZephyrError::Configuration(
                "analytics credentials are empty".into(),
            ));
        }

        let request = self
            .http
            .request(Method::GET, url)
            .header(ACCEPT, "application/json")
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret));

        self.http.send(request).await
    }

    /// GET and decode a JSON body.
    ///
    /// # Errors
    /// `Network` for a non-2xx status, `Deserialization` for an unparsable
    /// body, plus everything [`get_url`](Self::get_url) returns.
    pub async fn get_json(&self, resource: &str, query: Option<&str>) -> Result<Value> {
        let url = self.url_for(resource, query)?;
        self.get_json_url(url).await
    }

    pub async fn get_json_url(&self, url: Url) -> Result<Value> {
        let response = self.get_url(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ZephyrError::Network(format!(
                "analytics service returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = self.http.text(response).await?;
        debug!(status = status.as_u16(), body_len = body.len(), "analytics reply");
        serde_json::from_str(&body).map_err(|e| ZephyrError::from(InfraError::from(e)))
    }

    /// Plain form holding only the endpoint.
    pub fn to_plain(&self) -> Result<Map<String, Value>> {
        let endpoint =
            serde_json::to_value(&self.endpoint).map_err(|e| ZephyrError::from(InfraError::from(e)))?;
        let mut plain = Map::new();
        plain.insert("endpoint".into(), endpoint);
        Ok(plain)
    }

    /// Rehydrate from [`to_plain`](Self::to_plain) output.
    ///
    /// # Errors
    /// Returns `ZephyrError::Deserialization` if `endpoint` is missing or
    /// malformed.
    pub fn from_plain(
        data: &Map<String, Value>,
        credentials: ClientCredentials,
        http: HttpClient,
        policy: TransportPolicy,
    ) -> Result<Self> {
        let endpoint = data.get("endpoint").cloned().ok_or_else(|| {
            ZephyrError::Deserialization("analytics session has no endpoint".into())
        })?;
        let endpoint: AnalyticsEndpoint = serde_json::from_value(endpoint)
            .map_err(|e| ZephyrError::Deserialization(format!("invalid analytics endpoint: {e}")))?;

        Ok(Self::new(endpoint, credentials, http, policy))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn endpoint_for(server: &MockServer) -> AnalyticsEndpoint {
        AnalyticsEndpoint {
            scheme: "http".into(),
            host: server.address().to_string(),
            odata: "/DefaultCollection/_odata".into(),
        }
    }

    fn session_for(server: &MockServer) -> AnalyticsSession {
        AnalyticsSession::new(
            endpoint_for(server),
            ClientCredentials::new("user", "pat"),
            HttpClient::new().unwrap(),
            TransportPolicy::AllowInsecure,
        )
    }

    #[test]
    fn url_for_encodes_odata_query() {
        let session = AnalyticsSession::new(
            AnalyticsEndpoint {
                scheme: "https".into(),
                host: "analytics.example.com".into(),
                odata: "/DefaultCollection/_odata".into(),
            },
            ClientCredentials::default(),
            HttpClient::new().unwrap(),
            TransportPolicy::RequireHttps,
        );

        let url = session.url_for("/WorkItems", Some("$filter=State ne 'Removed'")).unwrap();
        assert_eq!(url.path(), "/DefaultCollection/_odata/WorkItems");
        assert!(url.query().is_some_and(|q| q.starts_with("$filter=State%20ne%20")));
    }

    #[tokio::test]
    async fn get_json_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/DefaultCollection/_odata/WorkItems"))
            .and(query_param("$select", "WorkItemId"))
            .and(basic_auth("user", "pat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let payload =
            session_for(&server).get_json("/WorkItems", Some("$select=WorkItemId")).await.unwrap();
        assert_eq!(payload["value"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(403)).mount(&server).await;

        let result = session_for(&server).get_json("/WorkItems", None).await;
        assert!(matches!(result, Err(ZephyrError::Network(msg)) if msg.contains("403")));
    }

    #[tokio::test]
    async fn empty_credentials_are_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let session = AnalyticsSession::new(
            endpoint_for(&server),
            ClientCredentials::default(),
            HttpClient::new().unwrap(),
            TransportPolicy::AllowInsecure,
        );
        let result = session.get("/WorkItems", None).await;
        assert!(matches!(result, Err(ZephyrError::Configuration(_))));
    }

    #[test]
    fn plain_form_holds_only_the_endpoint() {
        let session = AnalyticsSession::new(
            AnalyticsEndpoint {
                scheme: "https".into(),
                host: "analytics.example.com".into(),
                odata: "/_odata".into(),
            },
            ClientCredentials::new("user", "pat"),
            HttpClient::new().unwrap(),
            TransportPolicy::RequireHttps,
        );

        let plain = session.to_plain().unwrap();
        assert_eq!(plain.len(), 1);
        assert!(!Value::Object(plain.clone()).to_string().contains("pat"));

        let restored = AnalyticsSession::from_plain(
            &plain,
            ClientCredentials::new("user", "pat"),
            HttpClient::new().unwrap(),
            TransportPolicy::RequireHttps,
        )
        .unwrap();
        assert_eq!(restored.endpoint(), session.endpoint());
    }

    #[test]
    fn from_plain_without_endpoint_is_deserialization_error() {
        let result = AnalyticsSession::from_plain(
            &Map::new(),
            ClientCredentials::default(),
            HttpClient::new().unwrap(),
            TransportPolicy::RequireHttps,
        );
        assert!(matches!(result, Err(ZephyrError::Deserialization(_))));
    }
}
