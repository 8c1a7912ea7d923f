//! Front-end settings
//!
//! Read from `ZEPHYR_*` environment variables (after `.env` is loaded), with
//! defaults matching the local development layout.
//!
//! ## Environment Variables
//! - `ZEPHYR_BIND`: listen address (default `127.0.0.1:4999`)
//! - `ZEPHYR_CONFIG`: location config document (default `var/vsts_config.json`)
//! - `ZEPHYR_CREDENTIALS`: credentials file (default `client_credentials.json`)
//! - `ZEPHYR_CREDENTIALS_NAME`: OAuth credential set (default `zephyr2`)
//! - `ZEPHYR_ANALYTICS_CONFIG`: analytics endpoint document
//! - `ZEPHYR_ANALYTICS_CREDENTIALS_NAME`: analytics credential set
//! - `ZEPHYR_DASHBOARD_PATH`: services-api path shown on `/dashboard`
//! - `ZEPHYR_SPRINT`, `ZEPHYR_STORY_AREAS` (`;`-separated), `ZEPHYR_EPIC_AREA`
//! - `ZEPHYR_TIMEOUT_SECS`: outbound request timeout (default 30)
//! - `ZEPHYR_ALLOW_INSECURE`: permit plain-HTTP targets (default false)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use zephyr_core::StoryQuery;
use zephyr_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use zephyr_domain::{Result, ZephyrError};
use zephyr_infra::TransportPolicy;

const DEFAULT_BIND: &str = "127.0.0.1:4999";
const DEFAULT_STORY_AREAS: &str =
    "NL\\App Programs;NL\\SharedSvcs Asset Teams;NL\\Content Asset Teams";

/// Explicit configuration for the web front-end
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub bind_addr: SocketAddr,
    pub config_path: PathBuf,
    pub credentials_path: PathBuf,
    pub credentials_name: String,
    pub analytics_config_path: PathBuf,
    pub analytics_credentials_name: String,
    pub dashboard_path: String,
    pub story_query: StoryQuery,
    pub timeout: Duration,
    pub allow_insecure: bool,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4999)),
            config_path: PathBuf::from("var/vsts_config.json"),
            credentials_path: PathBuf::from("client_credentials.json"),
            credentials_name: "zephyr2".into(),
            analytics_config_path: PathBuf::from("var/analytics_config.json"),
            analytics_credentials_name: "analytics".into(),
            dashboard_path: "/".into(),
            story_query: StoryQuery::new(
                "NL\\Sprint 8",
                split_areas(DEFAULT_STORY_AREAS),
                "NL\\NARS Flowpath",
            ),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            allow_insecure: false,
        }
    }
}

impl WebSettings {
    /// Load settings from `ZEPHYR_*` variables, defaulting anything unset.
    ///
    /// # Errors
    /// Returns `ZephyrError::Configuration` for an unparsable address or
    /// timeout.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = env_string("ZEPHYR_BIND", DEFAULT_BIND).parse().map_err(|e| {
            ZephyrError::Configuration(format!("Invalid ZEPHYR_BIND address: {e}"))
        })?;
        let timeout = match std::env::var("ZEPHYR_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ZephyrError::Configuration(format!(
                        "Invalid ZEPHYR_TIMEOUT_SECS '{raw}': expected a positive integer"
                    ))
                })?,
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            bind_addr,
            config_path: env_path("ZEPHYR_CONFIG", defaults.config_path),
            credentials_path: env_path("ZEPHYR_CREDENTIALS", defaults.credentials_path),
            credentials_name: env_string("ZEPHYR_CREDENTIALS_NAME", &defaults.credentials_name),
            analytics_config_path: env_path(
                "ZEPHYR_ANALYTICS_CONFIG",
                defaults.analytics_config_path,
            ),
            analytics_credentials_name: env_string(
                "ZEPHYR_ANALYTICS_CREDENTIALS_NAME",
                &defaults.analytics_credentials_name,
            ),
            dashboard_path: env_string("ZEPHYR_DASHBOARD_PATH", &defaults.dashboard_path),
            story_query: StoryQuery::new(
                env_string("ZEPHYR_SPRINT", &defaults.story_query.sprint),
                split_areas(&env_string("ZEPHYR_STORY_AREAS", DEFAULT_STORY_AREAS)),
                env_string("ZEPHYR_EPIC_AREA", &defaults.story_query.epic_area),
            ),
            timeout,
            allow_insecure: env_bool("ZEPHYR_ALLOW_INSECURE", false),
        })
    }

    pub fn transport_policy(&self) -> TransportPolicy {
        if self.allow_insecure {
            TransportPolicy::AllowInsecure
        } else {
            TransportPolicy::RequireHttps
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var_os(key).filter(|v| !v.is_empty()).map_or(default, PathBuf::from)
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn split_areas(raw: &str) -> Vec<String> {
    raw.split(';').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
