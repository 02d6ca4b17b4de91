//! Blur API Client
//!
//! HTTP client for the Blur collection tokens endpoint.
//! Fetches the filtered listing snapshot for the XENFT collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::response::parse_tokens_response;
use crate::domain::RawListing;
use crate::ports::{ListingError, ListingFilter, ListingSource};

/// XENFT collection contract on Ethereum mainnet
pub const XENFT_COLLECTION: &str = "0x0a252663dbcc0b073063d6420a40319e438cfa59";

/// Blur's API sits behind a bot filter that rejects unknown agents
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Blur client configuration
#[derive(Debug, Clone)]
pub struct BlurConfig {
    /// Base URL for the Blur core API
    pub api_base_url: String,
    /// Base URL for asset detail pages
    pub asset_base_url: String,
    /// Collection contract address
    pub collection: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://core-api.prod.blur.io/v1".to_string(),
            asset_base_url: "https://blur.io/asset".to_string(),
            collection: XENFT_COLLECTION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blur marketplace client
#[derive(Debug, Clone)]
pub struct BlurClient {
    config: BlurConfig,
    http: Client,
}

impl BlurClient {
    /// Create a new Blur client with default configuration
    pub fn new() -> Result<Self, ListingError> {
        Self::with_config(BlurConfig::default())
    }

    /// Create a new Blur client with custom configuration
    pub fn with_config(config: BlurConfig) -> Result<Self, ListingError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ListingError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Tokens endpoint for the configured collection
    pub fn tokens_url(&self) -> String {
        format!(
            "{}/collections/{}/tokens",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.collection
        )
    }

    /// Detail page for one token
    pub fn asset_url(&self, token_id: &str) -> String {
        asset_url(&self.config.asset_base_url, &self.config.collection, token_id)
    }

    pub fn config(&self) -> &BlurConfig {
        &self.config
    }
}

/// Detail page URL: `{asset_base_url}/{collection}/{token_id}`
pub fn asset_url(asset_base_url: &str, collection: &str, token_id: &str) -> String {
    format!("{}/{}/{}", asset_base_url.trim_end_matches('/'), collection, token_id)
}

#[async_trait]
impl ListingSource for BlurClient {
    async fn fetch_listings(&self, filter: &ListingFilter) -> Result<Vec<RawListing>, ListingError> {
        let url = self.tokens_url();
        let filters = filter.to_query()?;
        tracing::info!("Fetching listings from {}", url);
        tracing::debug!("Listing filter: {}", filters);

        let response = self
            .http
            .get(&url)
            .query(&[("filters", filters.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ListingError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ListingError::Http(e.to_string()))?;

        // JSON error payloads fall through to MissingTokens so the raw body is shown
        if !status.is_success() {
            tracing::warn!("Listing API returned {}", status);
            if serde_json::from_str::<serde_json::Value>(&body).is_err() {
                return Err(ListingError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        parse_tokens_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_config_default() {
        let config = BlurConfig::default();
        assert_eq!(config.api_base_url, "https://core-api.prod.blur.io/v1");
        assert_eq!(config.collection, XENFT_COLLECTION);
    }

    #[test]
    fn test_blur_client_creation() {
        let client = BlurClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_tokens_url() {
        let client = BlurClient::with_config(BlurConfig {
            api_base_url: "https://example.test/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.tokens_url(),
            format!("https://example.test/v1/collections/{}/tokens", XENFT_COLLECTION)
        );
    }

    #[test]
    fn test_asset_url() {
        let client = BlurClient::new().unwrap();
        assert_eq!(
            client.asset_url("10452"),
            "https://blur.io/asset/0x0a252663dbcc0b073063d6420a40319e438cfa59/10452"
        );
    }
}
