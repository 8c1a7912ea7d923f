//! # Zephyr Domain
//!
//! Domain types shared by every Zephyr crate.
//!
//! This crate contains:
//! - Deployment locations and endpoint roles
//! - OAuth token and client-credential types
//! - Session and analytics configuration documents
//! - The error taxonomy and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other Zephyr crates
//! - No I/O; plain data and invariants only

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
