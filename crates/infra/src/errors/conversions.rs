//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;
use std::time::Duration;

use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use zephyr_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use zephyr_domain::ZephyrError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ZephyrError);

impl From<InfraError> for ZephyrError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ZephyrError> for InfraError {
    fn from(value: ZephyrError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoZephyrError {
    fn into_zephyr(self) -> ZephyrError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ZephyrError */
/* -------------------------------------------------------------------------- */

impl IntoZephyrError for HttpError {
    fn into_zephyr(self) -> ZephyrError {
        // The configured limit is unknown here; HttpClient reports its own.
        if self.is_timeout() {
            return ZephyrError::Timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        }

        if self.is_connect() {
            return ZephyrError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return ZephyrError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return ZephyrError::Deserialization(format!("failed to decode HTTP body: {self}"));
        }

        if let Some(status) = self.status() {
            return ZephyrError::Network(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        ZephyrError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_zephyr())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → ZephyrError */
/* -------------------------------------------------------------------------- */

impl IntoZephyrError for JsonError {
    fn into_zephyr(self) -> ZephyrError {
        ZephyrError::Deserialization(format!("invalid JSON: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_zephyr())
    }
}

/* -------------------------------------------------------------------------- */
/* toml → ZephyrError */
/* -------------------------------------------------------------------------- */

impl IntoZephyrError for toml::de::Error {
    fn into_zephyr(self) -> ZephyrError {
        ZephyrError::Configuration(format!("invalid TOML: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_zephyr())
    }
}

impl IntoZephyrError for toml::ser::Error {
    fn into_zephyr(self) -> ZephyrError {
        ZephyrError::Configuration(format!("failed to render TOML: {self}"))
    }
}

impl From<toml::ser::Error> for InfraError {
    fn from(value: toml::ser::Error) -> Self {
        InfraError(value.into_zephyr())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → ZephyrError */
/* -------------------------------------------------------------------------- */

impl IntoZephyrError for IoError {
    fn into_zephyr(self) -> ZephyrError {
        ZephyrError::Configuration(format!("I/O error: {self}"))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_zephyr())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
