//! Access token issuance.
//!
//! [`AccessTokenIssuer::issue`] is a single linear pass: validate, consult
//! the registry if one is configured, build claims, sign, respond. Each step
//! can reject with a typed [`TokenError`]; nothing is retried and no state is
//! kept between calls.

use crate::clock::{Clock, SystemClock};
use crate::config::IssuerConfig;
use crate::error::TokenError;
use crate::jwt::{self, ClaimsBuilder, TokenSigner};
use crate::metrics;
use crate::model::{AccessTokenReq, AccessTokenRsp, Scope, ValidatedTokenRequest, BEARER};
use crate::registry::{NfProfile, NfRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Issues NF access tokens.
///
/// Cheap to share behind an `Arc`; all fields are read-only after
/// construction.
pub struct AccessTokenIssuer {
    config: IssuerConfig,
    claims: ClaimsBuilder,
    signer: Arc<dyn TokenSigner>,
    registry: Option<Arc<dyn NfRegistry>>,
    clock: Arc<dyn Clock>,
}

impl AccessTokenIssuer {
    /// Create an issuer that trusts every structurally valid request.
    pub fn new(config: IssuerConfig, signer: Arc<dyn TokenSigner>) -> Self {
        let claims = ClaimsBuilder::new(config.nrf_instance_id.clone(), config.token_lifetime);
        Self {
            config,
            claims,
            signer,
            registry: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Consult `registry` for consumer and target eligibility.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn NfRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle one access token request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for malformed input
    /// - `InvalidClient` when the consumer is unknown or ineligible
    /// - `InvalidScope` when the target or scope is not acceptable
    /// - `Signing` when the claims cannot be signed
    pub async fn issue(&self, request: AccessTokenReq) -> Result<AccessTokenRsp, TokenError> {
        let consumer = request.nf_instance_id.clone().unwrap_or_default();

        let result = self.process(request).await;

        if let Err(e) = &result {
            metrics::record_rejection(e.error_code().as_str());
            if e.is_internal() {
                error!(consumer = %consumer, error = %e, "Access token issuance failed");
            } else {
                warn!(
                    consumer = %consumer,
                    error_code = %e.error_code(),
                    reason = %e,
                    "Access token request rejected"
                );
            }
        }

        result
    }

    async fn process(&self, request: AccessTokenReq) -> Result<AccessTokenRsp, TokenError> {
        let request = request.validate()?;

        if request.is_self_invocation() && !self.config.allow_self_invocation {
            return Err(TokenError::invalid_scope(
                "targetNfInstanceId must differ from nfInstanceId",
            ));
        }

        let scope = self.authorize(&request).await?;
        let claims = self.claims.build(&request, &scope, self.clock.now());

        let started = Instant::now();
        let signed = jwt::serialize(&claims, self.signer.as_ref());
        metrics::record_signing_latency(started.elapsed().as_secs_f64());
        let access_token = signed?;

        metrics::record_token_issued(self.signer.algorithm().as_str());
        info!(
            consumer = %claims.sub,
            audience = %claims.aud,
            scope = %claims.scope,
            expires_in = claims.lifetime(),
            "Issued access token"
        );

        Ok(AccessTokenRsp {
            access_token,
            token_type: BEARER.to_string(),
            expires_in: claims.lifetime(),
            scope: claims.scope,
        })
    }

    /// Apply registry policy and return the scope to grant.
    async fn authorize(&self, request: &ValidatedTokenRequest) -> Result<Scope, TokenError> {
        let Some(registry) = &self.registry else {
            return Ok(request.scope().clone());
        };

        match self
            .lookup(registry.as_ref(), "consumer", request.nf_instance_id())
            .await
        {
            Ok(Some(profile))
                if profile.is_registered()
                    && profile.matches_type(request.requester_nf_type()) => {}
            Ok(Some(_)) => {
                return Err(TokenError::invalid_client(
                    "NF instance is not authorized to request access tokens",
                ))
            }
            Ok(None) => return Err(TokenError::invalid_client("unknown NF instance")),
            Err(()) => {
                return Err(TokenError::invalid_client(
                    "NF instance could not be verified",
                ))
            }
        }

        let Some(target) = request.target_nf_instance_id() else {
            return Ok(request.scope().clone());
        };

        let profile = match self.lookup(registry.as_ref(), "producer", target).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Err(TokenError::invalid_scope("unknown target NF instance")),
            Err(()) => {
                return Err(TokenError::invalid_scope(
                    "target NF instance could not be verified",
                ))
            }
        };

        if !profile.is_registered() || !profile.matches_type(request.target_nf_type()) {
            return Err(TokenError::invalid_scope(
                "target NF instance is not eligible",
            ));
        }

        let granted = request
            .scope()
            .narrow_to(&profile.service_names())
            .ok_or_else(|| {
                TokenError::invalid_scope("requested services are not offered by the target")
            })?;

        if granted.services().len() < request.scope().services().len() {
            debug!(
                requested = %request.scope(),
                granted = %granted,
                "Scope narrowed to target services"
            );
        }

        Ok(granted)
    }

    /// Bounded registry lookup. Failures are logged here and collapse to `Err(())`.
    async fn lookup(
        &self,
        registry: &dyn NfRegistry,
        role: &'static str,
        nf_instance_id: &str,
    ) -> Result<Option<NfProfile>, ()> {
        match tokio::time::timeout(self.config.registry_timeout, registry.profile(nf_instance_id))
            .await
        {
            Ok(Ok(profile)) => {
                let outcome = if profile.is_some() { "found" } else { "unknown" };
                metrics::record_registry_lookup(role, outcome);
                Ok(profile)
            }
            Ok(Err(e)) => {
                metrics::record_registry_lookup(role, "error");
                warn!(role, nf_instance_id, error = %e, "Registry lookup failed");
                Err(())
            }
            Err(_) => {
                metrics::record_registry_lookup(role, "timeout");
                warn!(
                    role,
                    nf_instance_id,
                    timeout_ms = u64::try_from(self.config.registry_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    "Registry lookup timed out"
                );
                Err(())
            }
        }
    }
}
