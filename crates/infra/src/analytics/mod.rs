//! Analytics (OData) access over HTTP Basic auth

pub mod session;
pub mod stories;

pub use session::AnalyticsSession;
pub use stories::fetch_epic_stories;
