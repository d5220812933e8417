//! Centralized configuration for the access token service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup. Key material is wrapped in `secrecy` types so it never shows
//! up in `Debug` output.

use secrecy::SecretSlice;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_LIFETIME: i64 = 1000;

/// Longest token lifetime accepted from configuration, in seconds.
pub const MAX_TOKEN_LIFETIME: i64 = 86_400;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable name
        field: String,
        /// Parser message
        reason: String,
    },

    /// Unsupported signing algorithm
    #[error("Invalid JWT algorithm: {0}")]
    InvalidAlgorithm(String),

    /// Key material does not suit the algorithm or cannot be read
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// Token lifetime outside `1..=MAX_TOKEN_LIFETIME`
    #[error("Invalid token lifetime: must be between 1 and {MAX_TOKEN_LIFETIME} seconds")]
    InvalidLifetime,

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Registry profile file could not be loaded
    #[error("Invalid registry profiles: {0}")]
    InvalidProfiles(String),
}

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256
    HS256,
    /// RSA with SHA-256
    RS256,
    /// RSA-PSS with SHA-256
    PS256,
    /// ECDSA with P-256 and SHA-256
    ES256,
}

impl JwtAlgorithm {
    /// Parse algorithm from string.
    ///
    /// # Errors
    ///
    /// Returns an error for anything outside the supported set, including `none`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "RS256" => Ok(Self::RS256),
            "PS256" => Ok(Self::PS256),
            "ES256" => Ok(Self::ES256),
            _ => Err(ConfigError::InvalidAlgorithm(s.to_string())),
        }
    }

    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
            Self::PS256 => "PS256",
            Self::ES256 => "ES256",
        }
    }

    /// True for shared-secret algorithms.
    #[must_use]
    pub const fn is_hmac(&self) -> bool {
        matches!(self, Self::HS256)
    }
}

impl From<JwtAlgorithm> for jsonwebtoken::Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Self::HS256,
            JwtAlgorithm::RS256 => Self::RS256,
            JwtAlgorithm::PS256 => Self::PS256,
            JwtAlgorithm::ES256 => Self::ES256,
        }
    }
}

/// Where the signing key comes from.
#[derive(Debug)]
pub enum KeyMaterial {
    /// Shared secret given inline.
    Secret(SecretSlice<u8>),
    /// PEM private key, or a shared secret for HS256, read from disk.
    File(PathBuf),
}

/// Signing settings.
#[derive(Debug)]
pub struct SigningConfig {
    /// Fixed signing algorithm
    pub algorithm: JwtAlgorithm,
    /// `kid` header value
    pub key_id: Option<String>,
    /// Key source
    pub key: Option<KeyMaterial>,
}

/// Registry collaborator settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// NRF NF Management base URL
    pub url: Option<Url>,
    /// JSON file with static NF profiles
    pub profiles_file: Option<PathBuf>,
    /// Per-lookup timeout
    pub timeout: Duration,
}

/// Issuer settings.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// NRF instance id placed in `iss`
    pub nrf_instance_id: String,
    /// Token lifetime in seconds
    pub token_lifetime: i64,
    /// Permit tokens whose audience is the consumer itself
    pub allow_self_invocation: bool,
    /// Registry lookup timeout
    pub registry_timeout: Duration,
}

impl IssuerConfig {
    /// Issuer config with the default lifetime and self-invocation disabled.
    #[must_use]
    pub fn new(nrf_instance_id: impl Into<String>) -> Self {
        Self {
            nrf_instance_id: nrf_instance_id.into(),
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
            allow_self_invocation: false,
            registry_timeout: Duration::from_millis(2000),
        }
    }

    /// Override the token lifetime in seconds.
    #[must_use]
    pub const fn with_token_lifetime(mut self, seconds: i64) -> Self {
        self.token_lifetime = seconds;
        self
    }

    /// Permit or forbid self-invocation.
    #[must_use]
    pub const fn with_self_invocation(mut self, allowed: bool) -> Self {
        self.allow_self_invocation = allowed;
        self
    }

    /// Override the registry lookup timeout.
    #[must_use]
    pub const fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.registry_timeout = timeout;
        self
    }
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines
    pub json: bool,
}

/// Access token service configuration.
#[derive(Debug)]
pub struct Config {
    // Server settings
    /// Host to bind to
    pub host: String,
    /// SBI port
    pub port: u16,
    /// Metrics port
    pub metrics_port: u16,
    /// Start the metrics exporter
    pub metrics_enabled: bool,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,

    /// Issuer settings
    pub issuer: IssuerConfig,
    /// Signing key settings
    pub signing: SigningConfig,
    /// Registry settings
    pub registry: RegistryConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var(&lookup, "PORT", 8000)?;
        let metrics_port = parse_var(&lookup, "METRICS_PORT", 8080)?;
        let metrics_enabled = parse_var(&lookup, "METRICS_ENABLED", true)?;
        let shutdown_timeout = Duration::from_secs(parse_var(&lookup, "SHUTDOWN_TIMEOUT", 30)?);

        let nrf_instance_id = non_empty(&lookup, "NRF_INSTANCE_ID")
            .ok_or_else(|| ConfigError::MissingRequired("NRF_INSTANCE_ID".to_string()))?;
        let registry_timeout =
            Duration::from_millis(parse_var(&lookup, "REGISTRY_TIMEOUT_MS", 2000)?);

        let issuer = IssuerConfig {
            nrf_instance_id,
            token_lifetime: parse_var(&lookup, "ACCESS_TOKEN_LIFETIME", DEFAULT_TOKEN_LIFETIME)?,
            allow_self_invocation: parse_var(&lookup, "ALLOW_SELF_INVOCATION", false)?,
            registry_timeout,
        };

        let algorithm = JwtAlgorithm::parse(
            &lookup("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string()),
        )?;
        let key = match (
            non_empty(&lookup, "JWT_SIGNING_KEY"),
            non_empty(&lookup, "JWT_SIGNING_KEY_FILE"),
        ) {
            (Some(secret), _) => Some(KeyMaterial::Secret(SecretSlice::from(
                secret.into_bytes(),
            ))),
            (None, Some(path)) => Some(KeyMaterial::File(PathBuf::from(path))),
            (None, None) => None,
        };
        let signing = SigningConfig {
            algorithm,
            key_id: non_empty(&lookup, "JWT_KEY_ID"),
            key,
        };

        let registry = RegistryConfig {
            url: non_empty(&lookup, "REGISTRY_URL")
                .map(|raw| parse_url("REGISTRY_URL", &raw))
                .transpose()?,
            profiles_file: non_empty(&lookup, "REGISTRY_PROFILES_FILE").map(PathBuf::from),
            timeout: registry_timeout,
        };

        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json: parse_var(&lookup, "LOG_JSON", false)?,
        };

        let config = Self {
            host,
            port,
            metrics_port,
            metrics_enabled,
            shutdown_timeout,
            issuer,
            signing,
            registry,
            logging,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 || self.metrics_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !(1..=MAX_TOKEN_LIFETIME).contains(&self.issuer.token_lifetime) {
            return Err(ConfigError::InvalidLifetime);
        }
        if self.signing.key.is_none() {
            return Err(ConfigError::MissingRequired(
                "JWT_SIGNING_KEY or JWT_SIGNING_KEY_FILE".to_string(),
            ));
        }
        if self.registry.timeout.is_zero() {
            return Err(ConfigError::ParseError {
                name: "REGISTRY_TIMEOUT_MS".to_string(),
                reason: "timeout must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// SBI listen address.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Metrics listen address.
    #[must_use]
    pub fn metrics_addr(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Parse a variable with default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })
}
