//! Domain constants
//!
//! Defaults shared by the session configuration and the web front-end.

/// Scope demanded by the services API. The API ignores scopes otherwise, so
/// a single fixed value is requested.
pub const DEFAULT_SCOPE: &str = "http://oauth.lexisnexis.com/all";

/// Location name conventionally bound to the authorization-page and token
/// roles.
pub const DEFAULT_AUTH_LOCATION: &str = "auth";

/// Location name conventionally bound to the services-api role.
pub const DEFAULT_SERVICES_API_LOCATION: &str = "services-api";

pub const DEFAULT_AUTH_PAGE_PATH: &str = "/oauth/v2/authorize";
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/v2/token";
pub const DEFAULT_REDIRECT_URL: &str = "http://127.0.0.1:4999/callback";

/// Token type assumed when the token endpoint omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Timeout applied to every outbound call unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
