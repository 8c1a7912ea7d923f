//! Token endpoint port
//!
//! The state machine only needs "POST this form, give me status and body".
//! `zephyr-infra` implements it over reqwest; tests use in-memory doubles.

use async_trait::async_trait;
use url::Url;
use zephyr_domain::{ClientCredentials, Result};

/// Raw token endpoint reply; interpretation stays in the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEndpointResponse {
    pub status: u16,
    pub body: String,
}

impl TokenEndpointResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait TokenTransport: Send + Sync {
    /// POST `form` as `application/x-www-form-urlencoded` to `endpoint`,
    /// authenticating with HTTP Basic auth when `credentials` is given.
    ///
    /// # Errors
    /// Transport failures only (`InsecureTransport`, `Network`, `Timeout`).
    /// Non-2xx replies are returned as a response.
    async fn post_form(
        &self,
        endpoint: &Url,
        credentials: Option<&ClientCredentials>,
        form: &[(&'static str, String)],
    ) -> Result<TokenEndpointResponse>;
}
