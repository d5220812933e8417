//! Wire types for the NRF access token endpoint (3GPP TS 29.510).
//!
//! `AccessTokenReq` is decoded from the form body as-is and must pass
//! [`AccessTokenReq::validate`] before anything else looks at it. The
//! resulting [`ValidatedTokenRequest`] can only be built by the validator.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only grant type this issuer accepts.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";

/// Token type literal returned in every successful response.
pub const BEARER: &str = "Bearer";

/// Audience used when the consumer did not name a target producer.
pub const AUDIENCE_ANY: &str = "*";

/// Access token request as sent by the consumer NF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenReq {
    /// Must equal [`CLIENT_CREDENTIALS`].
    #[serde(default)]
    pub grant_type: Option<String>,
    /// Consumer NF instance id.
    #[serde(rename = "nfInstanceId", default)]
    pub nf_instance_id: Option<String>,
    /// Consumer NF type.
    #[serde(rename = "nfType", default, skip_serializing_if = "Option::is_none")]
    pub requester_nf_type: Option<String>,
    /// Producer NF type.
    #[serde(rename = "targetNfType", default, skip_serializing_if = "Option::is_none")]
    pub target_nf_type: Option<String>,
    /// Space-delimited list of requested service names.
    #[serde(default)]
    pub scope: Option<String>,
    /// Producer NF instance id.
    #[serde(
        rename = "targetNfInstanceId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_nf_instance_id: Option<String>,
}

impl AccessTokenReq {
    /// Create a client-credentials request for the given consumer and scope.
    #[must_use]
    pub fn client_credentials(nf_instance_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            grant_type: Some(CLIENT_CREDENTIALS.to_string()),
            nf_instance_id: Some(nf_instance_id.into()),
            scope: Some(scope.into()),
            ..Self::default()
        }
    }

    /// Set the target producer instance.
    #[must_use]
    pub fn with_target(mut self, target_nf_instance_id: impl Into<String>) -> Self {
        self.target_nf_instance_id = Some(target_nf_instance_id.into());
        self
    }

    /// Set the consumer NF type.
    #[must_use]
    pub fn with_requester_type(mut self, nf_type: impl Into<String>) -> Self {
        self.requester_nf_type = Some(nf_type.into());
        self
    }

    /// Set the producer NF type.
    #[must_use]
    pub fn with_target_type(mut self, nf_type: impl Into<String>) -> Self {
        self.target_nf_type = Some(nf_type.into());
        self
    }

    /// Check the structural invariants and produce a validated request.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidRequest`] when the grant type is not
    /// `client_credentials`, when `nfInstanceId` or `scope` is missing, or
    /// when either instance id is the wildcard audience.
    pub fn validate(self) -> Result<ValidatedTokenRequest, TokenError> {
        match self.grant_type.as_deref() {
            Some(CLIENT_CREDENTIALS) => {}
            Some(other) => {
                return Err(TokenError::invalid_request(format!(
                    "unsupported grant_type: {other}"
                )))
            }
            None => return Err(TokenError::invalid_request("grant_type is required")),
        }

        let nf_instance_id = non_blank(self.nf_instance_id)
            .ok_or_else(|| TokenError::invalid_request("nfInstanceId is required"))?;
        if nf_instance_id == AUDIENCE_ANY {
            return Err(TokenError::invalid_request("nfInstanceId must name an NF instance"));
        }

        let target_nf_instance_id = non_blank(self.target_nf_instance_id);
        if target_nf_instance_id.as_deref() == Some(AUDIENCE_ANY) {
            return Err(TokenError::invalid_request(
                "targetNfInstanceId must name an NF instance",
            ));
        }

        let raw_scope = non_blank(self.scope)
            .ok_or_else(|| TokenError::invalid_request("scope is required"))?;
        let scope = Scope::parse(&raw_scope)
            .ok_or_else(|| TokenError::invalid_request("scope is required"))?;

        Ok(ValidatedTokenRequest {
            nf_instance_id,
            target_nf_instance_id,
            scope,
            requester_nf_type: non_blank(self.requester_nf_type),
            target_nf_type: non_blank(self.target_nf_type),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A request that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTokenRequest {
    nf_instance_id: String,
    target_nf_instance_id: Option<String>,
    scope: Scope,
    requester_nf_type: Option<String>,
    target_nf_type: Option<String>,
}

impl ValidatedTokenRequest {
    /// Consumer NF instance id. Never empty.
    #[must_use]
    pub fn nf_instance_id(&self) -> &str {
        &self.nf_instance_id
    }

    /// Producer NF instance id, if one was targeted.
    #[must_use]
    pub fn target_nf_instance_id(&self) -> Option<&str> {
        self.target_nf_instance_id.as_deref()
    }

    /// Requested scope. Never empty.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Consumer NF type, if supplied.
    #[must_use]
    pub fn requester_nf_type(&self) -> Option<&str> {
        self.requester_nf_type.as_deref()
    }

    /// Producer NF type, if supplied.
    #[must_use]
    pub fn target_nf_type(&self) -> Option<&str> {
        self.target_nf_type.as_deref()
    }

    /// True when the consumer targets itself.
    #[must_use]
    pub fn is_self_invocation(&self) -> bool {
        self.target_nf_instance_id.as_deref() == Some(self.nf_instance_id.as_str())
    }
}

/// Space-delimited set of NF service names.
///
/// Keeps the original spelling so an unnarrowed scope is echoed back
/// byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    raw: String,
    services: Vec<String>,
}

impl Scope {
    /// Parse a scope string. Returns `None` when it names no service.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut services: Vec<String> = Vec::new();
        for name in raw.split_whitespace() {
            if !services.iter().any(|s| s == name) {
                services.push(name.to_string());
            }
        }
        if services.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.trim().to_string(),
            services,
        })
    }

    /// Individual service names, deduplicated, in request order.
    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Keep only the services in `allowed`. Returns `None` if nothing is left.
    ///
    /// When every requested service is allowed the original string is kept.
    #[must_use]
    pub fn narrow_to(&self, allowed: &[String]) -> Option<Self> {
        let kept: Vec<String> = self
            .services
            .iter()
            .filter(|s| allowed.contains(s))
            .cloned()
            .collect();
        if kept.is_empty() {
            return None;
        }
        if kept.len() == self.services.len() {
            return Some(self.clone());
        }
        Some(Self {
            raw: kept.join(" "),
            services: kept,
        })
    }

    /// The scope as it goes on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Successful token response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRsp {
    /// Signed JWT.
    pub access_token: String,
    /// Always [`BEARER`].
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// Granted scope.
    pub scope: String,
}

/// OAuth2 error codes used by the access token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenErrorCode {
    /// Malformed request, or an internal signing failure.
    InvalidRequest,
    /// Consumer not recognised or not allowed to request tokens.
    InvalidClient,
    /// Scope or target producer not recognised or not permitted.
    InvalidScope,
}

impl AccessTokenErrorCode {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidScope => "invalid_scope",
        }
    }
}

impl fmt::Display for AccessTokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body for a rejected token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenErr {
    /// Error code.
    pub error: AccessTokenErrorCode,
    /// Human-readable detail. Never carries internal error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Generic problem body for the unspecified/forbidden outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable cause.
    pub cause: String,
}

impl ProblemDetails {
    /// The 403 body used when neither a token nor a typed error was produced.
    #[must_use]
    pub fn forbidden() -> Self {
        Self {
            status: 403,
            cause: "UNSPECIFIED".to_string(),
        }
    }
}
