//! Token signing and verification.

use crate::config::JwtAlgorithm;
use crate::error::TokenError;
use crate::jwt::claims::AccessTokenClaims;
use crate::jwt::signer::TokenSigner;
use jsonwebtoken::{decode, encode, DecodingKey, Header, Validation};

/// Sign claims with the configured key.
///
/// The header algorithm always comes from the signer.
///
/// # Errors
///
/// Returns [`TokenError::Signing`] if the key is unavailable or encoding fails.
pub fn serialize(claims: &AccessTokenClaims, signer: &dyn TokenSigner) -> Result<String, TokenError> {
    let key = signer.encoding_key()?;

    let mut header = Header::new(signer.algorithm().into());
    header.kid = signer.key_id().map(str::to_string);

    encode(&header, claims, key).map_err(|e| TokenError::signing(e.to_string()))
}

/// Verifies tokens issued by this service.
///
/// Only the configured algorithm is accepted, so a token whose header names
/// another algorithm fails verification.
pub struct JwtVerifier {
    algorithm: JwtAlgorithm,
    key: DecodingKey,
    issuer: Option<String>,
}

impl JwtVerifier {
    /// Verifier accepting only `algorithm`.
    #[must_use]
    pub fn new(algorithm: JwtAlgorithm, key: DecodingKey) -> Self {
        Self {
            algorithm,
            key,
            issuer: None,
        }
    }

    /// Require a specific `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Verify the signature and time window, then decode the claims.
    ///
    /// Audience is left to the producer, which knows its own instance id.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidRequest`] for any verification failure.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm.into());
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        decode::<AccessTokenClaims>(token, &self.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::invalid_request(format!("token verification failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::signer::SigningKey;

    const SECRET: &[u8] = b"serializer-test-secret-32-bytes!!";

    fn claims() -> AccessTokenClaims {
        let now = chrono::Utc::now().timestamp();
        AccessTokenClaims {
            iss: "nrf-1".to_string(),
            sub: "consumer-1".to_string(),
            aud: "producer-1".to_string(),
            scope: "nnrf-disc".to_string(),
            iat: now,
            exp: now + 1000,
            nbf: now,
        }
    }

    #[test]
    fn test_round_trip_hs256() {
        let signer = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET)
            .unwrap()
            .with_key_id("key-1");
        let claims = claims();

        let token = serialize(&claims, &signer).unwrap();
        let decoded = JwtVerifier::new(JwtAlgorithm::HS256, DecodingKey::from_secret(SECRET))
            .with_issuer("nrf-1")
            .verify(&token)
            .unwrap();

        assert_eq!(claims, decoded);
    }

    #[test]
    fn test_header_carries_configured_algorithm_and_kid() {
        let signer = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET)
            .unwrap()
            .with_key_id("key-1");
        let token = serialize(&claims(), &signer).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, jsonwebtoken::Algorithm::HS256);
        assert_eq!(header.kid.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signer = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET).unwrap();
        let token = serialize(&claims(), &signer).unwrap();

        let result = JwtVerifier::new(
            JwtAlgorithm::HS256,
            DecodingKey::from_secret(b"some-other-secret-of-enough-length"),
        )
        .verify(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_issuer_fails_verification() {
        let signer = SigningKey::from_secret(JwtAlgorithm::HS256, SECRET).unwrap();
        let token = serialize(&claims(), &signer).unwrap();

        let result = JwtVerifier::new(JwtAlgorithm::HS256, DecodingKey::from_secret(SECRET))
            .with_issuer("nrf-2")
            .verify(&token);
        assert!(result.is_err());
    }
}
