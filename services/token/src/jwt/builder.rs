//! Claims construction.

use crate::jwt::claims::AccessTokenClaims;
use crate::model::{Scope, ValidatedTokenRequest, AUDIENCE_ANY};

/// Maps a validated request onto the claims of an access token.
///
/// Holds only the issuer identity and the token lifetime, so building is
/// deterministic for a given request, scope and instant.
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    issuer: String,
    lifetime_seconds: i64,
}

impl ClaimsBuilder {
    /// Builder stamping `issuer` and tokens valid for `lifetime_seconds`.
    #[must_use]
    pub fn new(issuer: impl Into<String>, lifetime_seconds: i64) -> Self {
        Self {
            issuer: issuer.into(),
            lifetime_seconds,
        }
    }

    /// Build claims for `request`, granting `scope` at time `now`.
    ///
    /// `scope` is the request's own scope unless a policy narrowed it.
    /// `exp` saturates at `i64::MAX`.
    #[must_use]
    pub fn build(
        &self,
        request: &ValidatedTokenRequest,
        scope: &Scope,
        now: i64,
    ) -> AccessTokenClaims {
        AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: request.nf_instance_id().to_string(),
            aud: request
                .target_nf_instance_id()
                .unwrap_or(AUDIENCE_ANY)
                .to_string(),
            scope: scope.as_str().to_string(),
            iat: now,
            exp: now.saturating_add(self.lifetime_seconds),
            nbf: now,
        }
    }
}
