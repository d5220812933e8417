//! Access token payload.

use serde::{Deserialize, Serialize};

/// Payload of an NF access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// NRF instance id of the issuer.
    pub iss: String,
    /// Consumer NF instance id.
    pub sub: String,
    /// Producer NF instance id, or `*` when no producer was targeted.
    pub aud: String,
    /// Granted service names, space-delimited.
    pub scope: String,
    /// Issued at
    pub iat: i64,
    /// Expiry
    pub exp: i64,
    /// Not before
    pub nbf: i64,
}

impl AccessTokenClaims {
    /// Lifetime in seconds as embedded in the token.
    #[must_use]
    pub const fn lifetime(&self) -> i64 {
        self.exp - self.iat
    }
}
