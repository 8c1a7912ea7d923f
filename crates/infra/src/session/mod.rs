//! Authenticated HTTP session
//!
//! [`AuthenticatedSession`] composes the core [`SessionState`] with an
//! [`HttpClient`]: it injects the bearer token, enforces the
//! [`TransportPolicy`] and performs at most one refresh-and-retry per
//! request.
//!
//! [`SessionState`]: zephyr_core::SessionState
//! [`HttpClient`]: crate::http::HttpClient

pub mod authenticated;
pub mod transport;

pub use authenticated::AuthenticatedSession;
pub use transport::TransportPolicy;
