//! Registry client for the NRF NF Management service.

use super::{NfProfile, NfRegistry, RegistryError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Looks up NF profiles with `GET {base}/nnrf-nfm/v1/nf-instances/{id}`.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    base: Url,
}

impl HttpRegistry {
    /// Create a client for the registry at `base`.
    ///
    /// # Errors
    ///
    /// Fails if `base` cannot carry a path or the HTTP client cannot be built.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, RegistryError> {
        if base.cannot_be_a_base() {
            return Err(RegistryError::Unavailable(format!(
                "registry URL {base} cannot be a base"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        Ok(Self { client, base })
    }

    fn instance_url(&self, nf_instance_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["nnrf-nfm", "v1", "nf-instances", nf_instance_id]);
        }
        url
    }
}

#[async_trait]
impl NfRegistry for HttpRegistry {
    async fn profile(&self, nf_instance_id: &str) -> Result<Option<NfProfile>, RegistryError> {
        let url = self.instance_url(nf_instance_id);
        debug!(url = %url, "Fetching NF profile");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<NfProfile>()
                .await
                .map(Some)
                .map_err(|e| RegistryError::InvalidResponse(e.to_string())),
            status => Err(RegistryError::Unavailable(format!(
                "registry returned {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(base: &str) -> HttpRegistry {
        HttpRegistry::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_instance_url() {
        assert_eq!(
            registry("http://nrf:8000").instance_url("producer-1").as_str(),
            "http://nrf:8000/nnrf-nfm/v1/nf-instances/producer-1"
        );
        assert_eq!(
            registry("http://nrf:8000/sbi/").instance_url("producer-1").as_str(),
            "http://nrf:8000/sbi/nnrf-nfm/v1/nf-instances/producer-1"
        );
    }

    #[test]
    fn test_instance_url_escapes_id() {
        assert_eq!(
            registry("http://nrf:8000").instance_url("a/b").as_str(),
            "http://nrf:8000/nnrf-nfm/v1/nf-instances/a%2Fb"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = HttpRegistry::new(
            Url::parse("mailto:ops@example.com").unwrap(),
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
