//! Error types used throughout the session layer

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Zephyr
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ZephyrError {
    /// Unbound role, unknown location or otherwise unusable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing authorization code in callback URL")]
    MissingAuthorizationCode,

    /// The `state` returned on callback does not match the one issued.
    #[error("State mismatch on authorization callback")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("No token endpoint set for refresh")]
    NoTokenEndpoint,

    #[error("No refresh token available")]
    NoRefreshToken,

    /// The target rejected the token again after a successful refresh.
    #[error("Token rejected after refresh: {0}")]
    TokenRejected(String),

    #[error("Insecure transport, HTTPS is required: {0}")]
    InsecureTransport(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ZephyrError {
    /// Stable label suitable for structured logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::MissingAuthorizationCode => "missing_authorization_code",
            Self::StateMismatch => "state_mismatch",
            Self::TokenExchange(_) => "token_exchange",
            Self::TokenRefresh(_) => "token_refresh",
            Self::NoTokenEndpoint => "no_token_endpoint",
            Self::NoRefreshToken => "no_refresh_token",
            Self::TokenRejected(_) => "token_rejected",
            Self::InsecureTransport(_) => "insecure_transport",
            Self::Deserialization(_) => "deserialization",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    /// Whether the host should discard the session and restart the
    /// authorization redirect instead of reporting a failure.
    #[must_use]
    pub fn restarts_login(&self) -> bool {
        matches!(
            self,
            Self::MissingAuthorizationCode
                | Self::StateMismatch
                | Self::TokenExchange(_)
                | Self::TokenRefresh(_)
                | Self::NoRefreshToken
                | Self::TokenRejected(_)
                | Self::Deserialization(_)
        )
    }
}

/// Result type alias for Zephyr operations
pub type Result<T> = std::result::Result<T, ZephyrError>;
