//! Client credential store
//!
//! Credentials live in a JSON document outside the source tree and are read
//! on demand, never copied into a session:
//!
//! ```json
//! { "credentials": { "zephyr2": { "client_id": "...", "client_secret": "..." } } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use zephyr_domain::ClientCredentials;

#[derive(Debug, Deserialize)]
struct CredentialsDocument {
    #[serde(default)]
    credentials: HashMap<String, ClientCredentials>,
}

/// Look up credential set `name` in the file at `path`.
///
/// A missing file, unknown name or malformed document is logged and yields
/// empty credentials; the session refuses to use those at the token
/// endpoint.
pub fn load_credentials(path: &Path, name: &str) -> ClientCredentials {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "Cannot read credentials file");
            return ClientCredentials::default();
        }
    };

    let document: CredentialsDocument = match serde_json::from_str(&contents) {
        Ok(document) => document,
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "Credentials file is not valid");
            return ClientCredentials::default();
        }
    };

    match document.credentials.get(name) {
        Some(credentials) => {
            tracing::debug!(name, client_id = %credentials.client_id, "Loaded client credentials");
            credentials.clone()
        }
        None => {
            tracing::info!(name, path = %path.display(), "Cannot find credentials in file");
            ClientCredentials::default()
        }
    }
}
