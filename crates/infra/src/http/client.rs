use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;
use zephyr_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use zephyr_domain::{Result, ZephyrError};

use crate::errors::InfraError;

const DEFAULT_USER_AGENT: &str = concat!("zephyr/", env!("CARGO_PKG_VERSION"));

/// HTTP client with an explicit per-request timeout.
///
/// Every request is attempted once; a timeout surfaces as
/// `ZephyrError::Timeout` carrying the configured limit.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the provided request builder.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(|err| ZephyrError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, host = url.host_str().unwrap_or_default(), path = url.path(), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, path = url.path(), %status, "received HTTP response");
                Ok(response)
            }
            Err(err) if err.is_timeout() => {
                debug!(%method, path = url.path(), timeout = ?self.timeout, "HTTP request timed out");
                Err(ZephyrError::Timeout(self.timeout))
            }
            Err(err) => {
                debug!(%method, path = url.path(), error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }

    /// Read the full body as text.
    ///
    /// The request timeout also bounds the body; a stalled body is
    /// `ZephyrError::Timeout` like a stalled connect.
    pub async fn text(&self, response: Response) -> Result<String> {
        response.text().await.map_err(|err| self.body_error(err))
    }

    /// Read the full body as raw bytes.
    pub async fn bytes(&self, response: Response) -> Result<Vec<u8>> {
        response.bytes().await.map(|body| body.to_vec()).map_err(|err| self.body_error(err))
    }

    fn body_error(&self, err: reqwest::Error) -> ZephyrError {
        if err.is_timeout() {
            debug!(timeout = ?self.timeout, "HTTP body read timed out");
            ZephyrError::Timeout(self.timeout)
        } else {
            InfraError::from(err).into()
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers sent with every request made through this client.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut builder = ReqwestClient::builder().timeout(self.timeout).user_agent(agent).no_proxy();

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| ZephyrError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
