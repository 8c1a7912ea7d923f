//! Token endpoint transport

pub mod token_client;

pub use token_client::HttpTokenTransport;
