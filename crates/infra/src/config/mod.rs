//! Configuration loading and management
//!
//! This module provides utilities for loading the location configuration,
//! the analytics endpoint and client credentials from files.

pub mod credentials;
pub mod loader;

// Re-export commonly used items
pub use credentials::load_credentials;
pub use loader::{load_analytics_endpoint, load_settings, parse_document, write_template};
