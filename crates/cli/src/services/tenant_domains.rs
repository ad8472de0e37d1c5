//! Tenant domain resolver.
//!
//! Looks up the federation metadata of a domain and lists every domain
//! registered to the same Microsoft 365 tenant. Lookup failures never
//! propagate: they are logged and an empty list is returned.

use std::time::Duration;

use domain::models::{DomainRecord, TenantMetadata};
use graph::metrics::RequestTimer;
use reqwest::{Client, StatusCode};
use shared::validation::validate_path_segment;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TenantMetadataConfig;

/// Why a tenant metadata lookup produced no domains.
#[derive(Debug, Error)]
pub enum TenantLookupError {
    /// The domain does not belong to a Microsoft 365 tenant.
    #[error("{0} is not part of a Microsoft 365 tenant")]
    ExpectedNonFatal(String),

    #[error("Tenant metadata request failed: {0}")]
    Transport(String),

    #[error("Unexpected tenant metadata error: {0}")]
    Unknown(String),
}

pub struct TenantDomainResolver {
    client: Client,
    base_url: String,
}

impl TenantDomainResolver {
    pub fn new(config: &TenantMetadataConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn metadata_url(&self, domain: &str) -> String {
        format!("{}/{}/metadata/json/1", self.base_url, domain)
    }

    /// Fetches the federation metadata document of `domain`.
    pub async fn fetch_metadata(&self, domain: &str) -> Result<TenantMetadata, TenantLookupError> {
        validate_path_segment(domain)
            .map_err(|e| TenantLookupError::Unknown(format!("invalid domain {:?}: {}", domain, e)))?;

        let timer = RequestTimer::new("tenant_metadata");
        let response = self.client.get(self.metadata_url(domain)).send().await;
        timer.record();

        let response = response.map_err(|e| TenantLookupError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::BAD_REQUEST => Err(TenantLookupError::ExpectedNonFatal(domain.to_string())),
            status if !status.is_success() => {
                Err(TenantLookupError::Transport(format!("HTTP {}", status)))
            }
            _ => response
                .json::<TenantMetadata>()
                .await
                .map_err(|e| TenantLookupError::Unknown(e.to_string())),
        }
    }

    /// Every domain registered to the tenant owning `domain`, in metadata
    /// order. Empty when the lookup fails.
    pub async fn resolve(&self, domain: &str) -> Vec<DomainRecord> {
        match self.fetch_metadata(domain).await {
            Ok(metadata) => {
                let domains = metadata.domains();
                debug!(domain = %domain, count = domains.len(), "Resolved tenant domains");
                domains
            }
            Err(TenantLookupError::ExpectedNonFatal(_)) => {
                warn!(domain = %domain, "{} is not part of a Microsoft 365 tenant", domain);
                Vec::new()
            }
            Err(TenantLookupError::Transport(message)) => {
                warn!(domain = %domain, error = %message, "Tenant metadata lookup failed");
                Vec::new()
            }
            Err(TenantLookupError::Unknown(message)) => {
                warn!(domain = %domain, error = %message, "Unexpected error resolving tenant domains");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(base_url: &str) -> TenantDomainResolver {
        TenantDomainResolver::new(&TenantMetadataConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_metadata_url() {
        assert_eq!(
            resolver("https://accounts.accesscontrol.windows.net/").metadata_url("contoso.com"),
            "https://accounts.accesscontrol.windows.net/contoso.com/metadata/json/1"
        );
    }

    #[tokio::test]
    async fn test_invalid_domain_is_unknown_error() {
        let result = resolver("http://127.0.0.1:9")
            .fetch_metadata("contoso.com/../x")
            .await;
        assert!(matches!(result, Err(TenantLookupError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_invalid_domain_resolves_empty() {
        assert!(resolver("http://127.0.0.1:9").resolve("").await.is_empty());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TenantLookupError::ExpectedNonFatal("example.com".into()).to_string(),
            "example.com is not part of a Microsoft 365 tenant"
        );
    }
}
