//! # Zephyr Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP client and token endpoint transport
//! - `AuthenticatedSession`: bearer injection with refresh-and-retry
//! - File-backed configuration and credential loading
//! - The Basic-auth analytics (OData) session
//!
//! ## Architecture
//! - Implements traits defined in `zephyr-core`
//! - Depends on `zephyr-domain` and `zephyr-core`
//! - Contains all "impure" code (network and file I/O)

pub mod analytics;
pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod session;

// Re-export commonly used items
pub use analytics::{fetch_epic_stories, AnalyticsSession};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use oauth::HttpTokenTransport;
pub use session::{AuthenticatedSession, TransportPolicy};
