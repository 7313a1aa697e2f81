// watts-api: Async Rust client for the Watts SmartHome cloud API

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod transport;

pub use auth::{Credentials, Token};
pub use client::{DEFAULT_ALLOWED_CODES, DEFAULT_LANG, WattsClient};
pub use error::Error;
pub use transport::{DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL, TransportConfig};
