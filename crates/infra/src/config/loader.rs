//! Configuration loader
//!
//! Loads the location configuration document and the analytics endpoint
//! description from files.
//!
//! ## Formats
//! The format is detected by file extension: `.toml` is parsed as TOML,
//! anything else as JSON.
//!
//! ## Location document
//! ```json
//! {
//!   "redirect_url": "http://127.0.0.1:4999/callback",
//!   "auth_page_path": "/oauth/v2/authorize",
//!   "token_path": "/oauth/v2/token",
//!   "location": {
//!     "auth": { "scheme": "https", "netloc": "auth-api.lexisnexis.com" },
//!     "services-api": { "scheme": "https", "netloc": "services-api.lexisnexis.com" }
//!   },
//!   "auth_page_location": "auth",
//!   "token_location": "auth",
//!   "services_api_location": "services-api"
//! }
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use zephyr_domain::{AnalyticsEndpoint, Result, SessionSettings, ZephyrError};

use crate::errors::InfraError;

/// Load the location configuration document.
///
/// # Errors
/// Returns `ZephyrError::Configuration` if the file cannot be read or the
/// document is invalid.
pub fn load_settings(path: &Path) -> Result<SessionSettings> {
    let settings: SessionSettings = read_document(path)?;
    tracing::info!(
        path = %path.display(),
        locations = settings.location.len(),
        "Loaded location configuration"
    );
    Ok(settings)
}

/// Load the analytics endpoint description (`{scheme, netloc, odata}`).
///
/// # Errors
/// Returns `ZephyrError::Configuration` if the file cannot be read or the
/// document is invalid.
pub fn load_analytics_endpoint(path: &Path) -> Result<AnalyticsEndpoint> {
    let endpoint: AnalyticsEndpoint = read_document(path)?;
    tracing::info!(path = %path.display(), host = %endpoint.host, "Loaded analytics endpoint");
    Ok(endpoint)
}

/// Write the default location configuration to `path`, creating parent
/// directories as needed.
///
/// # Errors
/// Returns `ZephyrError::Configuration` if the document cannot be rendered
/// or written.
pub fn write_template(path: &Path) -> Result<()> {
    let rendered = render_document(&SessionSettings::default(), path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
    }
    std::fs::write(path, rendered).map_err(|e| io_error(path, e))?;

    tracing::info!(path = %path.display(), "Wrote configuration template");
    Ok(())
}

/// Parse a document from string content, format chosen by `path`'s
/// extension.
///
/// # Errors
/// Returns `ZephyrError::Configuration` if parsing fails.
pub fn parse_document<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    let parsed = if is_toml(path) {
        toml::from_str(contents).map_err(InfraError::from)
    } else {
        serde_json::from_str(contents).map_err(InfraError::from)
    };

    parsed.map_err(|InfraError(err)| {
        ZephyrError::Configuration(format!("{}: {}", path.display(), detail(err)))
    })
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ZephyrError::Configuration(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    tracing::debug!(path = %path.display(), "Loading configuration from file");
    let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    parse_document(&contents, path)
}

fn render_document<T: Serialize>(value: &T, path: &Path) -> Result<String> {
    let rendered = if is_toml(path) {
        toml::to_string_pretty(value).map_err(InfraError::from)
    } else {
        serde_json::to_string_pretty(value).map_err(InfraError::from)
    };
    rendered.map_err(ZephyrError::from)
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

fn io_error(path: &Path, err: std::io::Error) -> ZephyrError {
    ZephyrError::Configuration(format!("{}: {}", path.display(), detail(InfraError::from(err).0)))
}

fn detail(err: ZephyrError) -> String {
    match err {
        ZephyrError::Configuration(msg) | ZephyrError::Deserialization(msg) => msg,
        other => other.to_string(),
    }
}
