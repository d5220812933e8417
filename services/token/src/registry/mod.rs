//! NF registry collaborator.
//!
//! The issuer asks the registry whether consumer and producer instances are
//! known and which services a producer offers. Profiles follow the
//! `NFProfile` shape of 3GPP TS 29.510, trimmed to the fields used here.

pub mod http;
pub mod memory;

pub use http::HttpRegistry;
pub use memory::InMemoryRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registry lookup errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registry could not be reached or answered with a failure status
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    /// Registry answered with something that is not an NF profile
    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),
}

/// Registration status of an NF instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NfStatus {
    /// Eligible for tokens
    Registered,
    /// Temporarily out of service
    Suspended,
    /// Registered but hidden from discovery
    Undiscoverable,
}

/// A service exposed by an NF instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfService {
    /// Service name, e.g. `nsmf-pdusession`
    pub service_name: String,
}

/// Registry view of an NF instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfProfile {
    /// NF instance id
    pub nf_instance_id: String,
    /// NF type, e.g. `AMF`
    pub nf_type: String,
    /// Registration status
    pub nf_status: NfStatus,
    /// Offered services
    #[serde(default)]
    pub nf_services: Vec<NfService>,
}

impl NfProfile {
    /// Create a registered profile offering `services`.
    #[must_use]
    pub fn registered<I, S>(nf_instance_id: impl Into<String>, nf_type: impl Into<String>, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nf_instance_id: nf_instance_id.into(),
            nf_type: nf_type.into(),
            nf_status: NfStatus::Registered,
            nf_services: services
                .into_iter()
                .map(|s| NfService {
                    service_name: s.into(),
                })
                .collect(),
        }
    }

    /// Override the status.
    #[must_use]
    pub fn with_status(mut self, status: NfStatus) -> Self {
        self.nf_status = status;
        self
    }

    /// True when the status is `REGISTERED`.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.nf_status == NfStatus::Registered
    }

    /// True when `nf_type` is absent or names this profile's type.
    #[must_use]
    pub fn matches_type(&self, nf_type: Option<&str>) -> bool {
        nf_type.map_or(true, |t| t.eq_ignore_ascii_case(&self.nf_type))
    }

    /// Names of the services this instance offers.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        self.nf_services
            .iter()
            .map(|s| s.service_name.clone())
            .collect()
    }
}

/// Lookup of NF instance profiles.
#[async_trait]
pub trait NfRegistry: Send + Sync {
    /// Fetch the profile of `nf_instance_id`. `Ok(None)` means unknown.
    async fn profile(&self, nf_instance_id: &str) -> Result<Option<NfProfile>, RegistryError>;
}
