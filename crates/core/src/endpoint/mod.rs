//! Endpoint resolution
//!
//! Maps logical roles to deployment locations and composes URLs.

pub mod resolver;

pub use resolver::EndpointConfig;
