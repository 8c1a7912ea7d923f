//! Shared application state

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use zephyr_domain::{ClientCredentials, Result};
use zephyr_infra::config::load_credentials;
use zephyr_infra::{HttpClient, TransportPolicy};

use crate::settings::WebSettings;

type PlainMap = Map<String, Value>;

/// Serialized sessions kept between requests
#[derive(Debug, Default)]
struct SessionStore {
    oauth: Option<PlainMap>,
    analytics: Option<PlainMap>,
}

/// State shared by all route handlers.
///
/// The store lock is held only while loading or saving a plain session,
/// never across an outbound call.
#[derive(Clone)]
pub struct AppState {
    settings: Arc<WebSettings>,
    http: HttpClient,
    store: Arc<Mutex<SessionStore>>,
}

impl AppState {
    /// # Errors
    /// Returns a `ZephyrError` if the HTTP client cannot be built.
    pub fn new(settings: WebSettings) -> Result<Self> {
        let http = HttpClient::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            settings: Arc::new(settings),
            http,
            store: Arc::new(Mutex::new(SessionStore::default())),
        })
    }

    pub fn settings(&self) -> &WebSettings {
        &self.settings
    }

    pub fn http(&self) -> HttpClient {
        self.http.clone()
    }

    pub fn policy(&self) -> TransportPolicy {
        self.settings.transport_policy()
    }

    /// OAuth client credentials, read on demand.
    pub fn oauth_credentials(&self) -> ClientCredentials {
        load_credentials(&self.settings.credentials_path, &self.settings.credentials_name)
    }

    /// Analytics Basic-auth credentials, read on demand.
    pub fn analytics_credentials(&self) -> ClientCredentials {
        load_credentials(&self.settings.credentials_path, &self.settings.analytics_credentials_name)
    }

    pub async fn load_oauth(&self) -> Option<PlainMap> {
        self.store.lock().await.oauth.clone()
    }

    pub async fn store_oauth(&self, plain: PlainMap) {
        self.store.lock().await.oauth = Some(plain);
    }

    pub async fn clear_oauth(&self) {
        self.store.lock().await.oauth = None;
    }

    pub async fn load_analytics(&self) -> Option<PlainMap> {
        self.store.lock().await.analytics.clone()
    }

    pub async fn store_analytics(&self, plain: PlainMap) {
        self.store.lock().await.analytics = Some(plain);
    }
}
