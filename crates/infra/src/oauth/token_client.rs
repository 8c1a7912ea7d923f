//! reqwest implementation of the token endpoint port
//!
//! Posts `application/x-www-form-urlencoded` bodies with HTTP Basic client
//! authentication and hands back status and raw body; interpretation of the
//! reply stays in the core state machine.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Method;
use tracing::{debug, instrument};
use url::Url;
use zephyr_core::{TokenEndpointResponse, TokenTransport};
use zephyr_domain::{ClientCredentials, Result};

use crate::http::HttpClient;
use crate::session::TransportPolicy;

/// Token endpoint client over [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpTokenTransport {
    http: HttpClient,
    policy: TransportPolicy,
}

impl HttpTokenTransport {
    pub fn new(http: HttpClient, policy: TransportPolicy) -> Self {
        Self { http, policy }
    }
}

#[async_trait]
impl TokenTransport for HttpTokenTransport {
    #[instrument(skip(self, credentials, form), fields(endpoint = %endpoint))]
    async fn post_form(
        &self,
        endpoint: &Url,
        credentials: Option<&ClientCredentials>,
        form: &[(&'static str, String)],
    ) -> Result<TokenEndpointResponse> {
        self.policy.check(endpoint)?;

        let mut request = self
            .http
            .request(Method::POST, endpoint.clone())
            .header(ACCEPT, "application/json")
            .form(form);

        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.client_id, Some(&credentials.client_secret));
        }

        let response = self.http.send(request).await?;
        let status = response.status().as_u16();
        let body = self.http.text(response).await?;

        debug!(status, body_len = body.len(), "token endpoint replied");
        Ok(TokenEndpointResponse { status, body })
    }
}
