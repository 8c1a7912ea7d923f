//! OAuth 2.0 token types
//!
//! `TokenSet` is what a session holds and persists; `TokenResponse` is the
//! raw document returned by the token endpoint.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_TOKEN_TYPE;

/// Access token plus the metadata needed to use and renew it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime in seconds as reported by the token endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Absolute expiry computed from `expires_in` when the token was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scopes (space-separated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a bearer token, computing `expires_at` from `expires_in`.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_in,
            expires_at: expires_at_from(expires_in),
            refresh_token,
            scope: None,
        }
    }

    /// Keep `prior` as the refresh token when this token arrived without one.
    #[must_use]
    pub fn with_refresh_fallback(mut self, prior: Option<String>) -> Self {
        if self.refresh_token.as_deref().map_or(true, str::is_empty) {
            self.refresh_token = prior;
        }
        self
    }

    /// Check if the access token is expired or will expire within
    /// `threshold_seconds`. Tokens without an expiry never count as expired.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Duration::try_seconds(threshold_seconds)
                .and_then(|threshold| Utc::now().checked_add_signed(threshold))
                .map_or(true, |deadline| deadline >= expires_at),
            None => false,
        }
    }

    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        let token_type = if self.token_type.is_empty()
            || self.token_type.eq_ignore_ascii_case(DEFAULT_TOKEN_TYPE)
        {
            DEFAULT_TOKEN_TYPE
        } else {
            self.token_type.as_str()
        };
        format!("{token_type} {}", self.access_token)
    }
}

/// Token document returned by the token endpoint (RFC 6749 §5.1)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(default_token_type),
            expires_in: response.expires_in,
            expires_at: expires_at_from(response.expires_in),
            refresh_token: response.refresh_token,
            scope: response.scope,
        }
    }
}

/// Error document returned by the token endpoint (RFC 6749 §5.2)
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

/// `None` for non-positive lifetimes and for lifetimes past the
/// representable range, which are treated as non-expiring.
fn expires_at_from(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    let secs = expires_in.filter(|secs| *secs > 0)?;
    Utc::now().checked_add_signed(chrono::Duration::try_seconds(secs)?)
}

/// Some token endpoints send `expires_in` as a string.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(i64),
        Text(String),
    }

    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(secs)) => Ok(Some(secs)),
        Some(Seconds::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
