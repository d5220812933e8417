//! Static NF profile registry.

use super::{NfProfile, NfRegistry, RegistryError};
use crate::config::ConfigError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Fixed set of NF profiles, built at startup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    profiles: HashMap<String, NfProfile>,
}

impl InMemoryRegistry {
    /// Registry holding `profiles`, keyed by instance id.
    pub fn new(profiles: impl IntoIterator<Item = NfProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.nf_instance_id.clone(), p))
                .collect(),
        }
    }

    /// Load profiles from a JSON array of `NfProfile` objects.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidProfiles(format!("{}: {e}", path.display())))?;
        let profiles: Vec<NfProfile> = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::InvalidProfiles(format!("{}: {e}", path.display())))?;
        Ok(Self::new(profiles))
    }

    /// Add or replace one profile.
    #[must_use]
    pub fn with_profile(mut self, profile: NfProfile) -> Self {
        self.profiles.insert(profile.nf_instance_id.clone(), profile);
        self
    }

    /// Number of profiles held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True when no profile is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl NfRegistry for InMemoryRegistry {
    async fn profile(&self, nf_instance_id: &str) -> Result<Option<NfProfile>, RegistryError> {
        Ok(self.profiles.get(nf_instance_id).cloned())
    }
}
