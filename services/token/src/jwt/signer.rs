//! Signing key handling.
//!
//! The key and its algorithm are fixed at startup. Nothing in a request can
//! influence which algorithm is used.

use crate::config::{ConfigError, JwtAlgorithm, KeyMaterial, SigningConfig};
use crate::error::TokenError;
use jsonwebtoken::EncodingKey;
use secrecy::ExposeSecret;
use std::fmt;
use zeroize::Zeroizing;

/// Minimum HMAC secret length in bytes.
pub const MIN_HMAC_SECRET_LEN: usize = 32;

/// Source of the key used to sign access tokens.
pub trait TokenSigner: Send + Sync {
    /// Get the encoding key for JWT serialization.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] when the key is not available.
    fn encoding_key(&self) -> Result<&EncodingKey, TokenError>;

    /// Key ID for the JWT header.
    fn key_id(&self) -> Option<&str>;

    /// Algorithm for the JWT header.
    fn algorithm(&self) -> JwtAlgorithm;
}

/// Signing key loaded once at startup and immutable afterwards.
#[derive(Clone)]
pub struct SigningKey {
    algorithm: JwtAlgorithm,
    key_id: Option<String>,
    key: EncodingKey,
}

impl SigningKey {
    /// Build an HMAC key from a shared secret.
    ///
    /// # Errors
    ///
    /// Fails if `algorithm` is not HMAC based or the secret is too short.
    pub fn from_secret(algorithm: JwtAlgorithm, secret: &[u8]) -> Result<Self, ConfigError> {
        if !algorithm.is_hmac() {
            return Err(ConfigError::InvalidSigningKey(format!(
                "{} requires a PEM private key, not a shared secret",
                algorithm.as_str()
            )));
        }
        if secret.len() < MIN_HMAC_SECRET_LEN {
            return Err(ConfigError::InvalidSigningKey(format!(
                "HMAC secret must be at least {MIN_HMAC_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            algorithm,
            key_id: None,
            key: EncodingKey::from_secret(secret),
        })
    }

    /// Build an asymmetric key from a PEM encoded private key.
    ///
    /// # Errors
    ///
    /// Fails if `algorithm` is HMAC based or the PEM cannot be parsed.
    pub fn from_pem(algorithm: JwtAlgorithm, pem: &[u8]) -> Result<Self, ConfigError> {
        let key = match algorithm {
            JwtAlgorithm::RS256 | JwtAlgorithm::PS256 => EncodingKey::from_rsa_pem(pem),
            JwtAlgorithm::ES256 => EncodingKey::from_ec_pem(pem),
            JwtAlgorithm::HS256 => {
                return Err(ConfigError::InvalidSigningKey(
                    "HS256 requires a shared secret, not a PEM key".to_string(),
                ))
            }
        }
        .map_err(|e| ConfigError::InvalidSigningKey(format!("unreadable PEM key: {e}")))?;

        Ok(Self {
            algorithm,
            key_id: None,
            key,
        })
    }

    /// Load the key described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if no key material is configured, the key file cannot be read,
    /// or the material does not suit the algorithm.
    pub fn load(config: &SigningConfig) -> Result<Self, ConfigError> {
        let key = match &config.key {
            Some(KeyMaterial::Secret(secret)) => {
                Self::from_secret(config.algorithm, secret.expose_secret())?
            }
            Some(KeyMaterial::File(path)) => {
                let bytes = Zeroizing::new(std::fs::read(path).map_err(|e| {
                    ConfigError::InvalidSigningKey(format!(
                        "cannot read {}: {e}",
                        path.display()
                    ))
                })?);
                if config.algorithm.is_hmac() {
                    Self::from_secret(config.algorithm, trim_trailing_newlines(&bytes))?
                } else {
                    Self::from_pem(config.algorithm, &bytes)?
                }
            }
            None => {
                return Err(ConfigError::MissingRequired(
                    "JWT_SIGNING_KEY or JWT_SIGNING_KEY_FILE".to_string(),
                ))
            }
        };

        Ok(match &config.key_id {
            Some(kid) => key.with_key_id(kid.clone()),
            None => key,
        })
    }

    /// Set the key ID placed in the JWT header.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

fn trim_trailing_newlines(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(b, b'\n' | b'\r'))
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

impl TokenSigner for SigningKey {
    fn encoding_key(&self) -> Result<&EncodingKey, TokenError> {
        Ok(&self.key)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
