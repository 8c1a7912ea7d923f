//! # Zephyr Web
//!
//! axum front-end driving the Authorization-Code login flow.
//!
//! Routes:
//! - `GET /`: start a session and redirect to the authorization page
//! - `GET /callback`: exchange the authorization code for a token
//! - `GET /dashboard`: authenticated request against the services API
//! - `GET /flowpath`: epic/story view from the analytics service

pub mod error;
pub mod routes;
pub mod settings;
pub mod state;
pub mod utils;

pub use error::WebError;
pub use routes::router;
pub use settings::WebSettings;
pub use state::AppState;
