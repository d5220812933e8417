//! NRF access token service library.
//!
//! Issues OAuth2 `client_credentials` access tokens that let one network
//! function call another: request validation, optional registry checks,
//! claims construction, JWT signing and the HTTP endpoint around them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod issuer;
pub mod jwt;
pub mod metrics;
pub mod model;
pub mod observability;
pub mod registry;
pub mod server;
pub mod shutdown;

// Re-exports for convenience
pub use config::Config;
pub use error::TokenError;
pub use issuer::AccessTokenIssuer;
