//! # Zephyr Core
//!
//! Session logic with no transport of its own.
//!
//! This crate contains:
//! - `EndpointConfig`: role → location → URL resolution
//! - `OAuth2ClientState`: the Authorization-Code state machine
//! - `SessionState` and its plain (de)serialization
//! - The epic/story aggregation view
//!
//! ## Architecture Principles
//! - Only depends on `zephyr-domain`
//! - Token endpoint I/O goes through the [`TokenTransport`] port
//! - Pure, testable business logic

pub mod endpoint;
pub mod oauth;
pub mod session;
pub mod stories;

pub use endpoint::EndpointConfig;
pub use oauth::{generate_state, validate_state, AuthPhase, OAuth2ClientState, TokenTransport};
pub use oauth::ports::TokenEndpointResponse;
pub use session::{from_plain, to_plain, PlainSession, SessionState};
pub use stories::{EpicStoryView, StoryQuery};
