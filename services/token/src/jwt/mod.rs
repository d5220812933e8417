//! Access token claims, signing and verification.

pub mod builder;
pub mod claims;
pub mod serializer;
pub mod signer;

pub use builder::ClaimsBuilder;
pub use claims::AccessTokenClaims;
pub use serializer::{serialize, JwtVerifier};
pub use signer::{SigningKey, TokenSigner};
