//! Composite session state and its plain-data form
//!
//! A [`SessionState`] is the transport-free half of an authenticated session:
//! endpoint bindings plus OAuth client state. Hosts persist it between
//! requests as a [`PlainSession`] JSON object.

pub mod serializer;
pub mod state;

pub use serializer::{from_plain, to_plain, LocationConfig, PlainSession};
pub use state::SessionState;
