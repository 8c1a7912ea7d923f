//! OAuth 2.0 Authorization-Code client state
//!
//! ```text
//! ┌──────────────────┐  build_authorization_url  ┌───────────────────┐
//! │ Unauthenticated  │ ────────────────────────► │ AwaitingCallback  │
//! └──────────────────┘                           └─────────┬─────────┘
//!                                                          │ exchange_code_for_token
//!                     refresh  ┌───────────┐               ▼
//!               ┌─────────────►│  Expired  │      ┌───────────────────┐
//!               │              └───────────┘◄─────│   Authenticated   │
//!               └───────────────────────────────► └───────────────────┘
//! ```
//!
//! - **[`client_state`]**: `OAuth2ClientState` and its transitions
//! - **[`state_token`]**: CSRF state token generation and comparison
//! - **[`ports`]**: the token endpoint transport implemented by `zephyr-infra`

pub mod client_state;
pub mod ports;
pub mod state_token;

pub use client_state::{AuthPhase, OAuth2ClientState};
pub use ports::{TokenEndpointResponse, TokenTransport};
pub use state_token::{generate_state, validate_state};
