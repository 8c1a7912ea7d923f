//! Domain types and models

pub mod credentials;
pub mod location;
pub mod token;

pub use credentials::ClientCredentials;
pub use location::{EndpointRole, Location, LocationMap};
pub use token::{OAuthErrorResponse, TokenResponse, TokenSet};
