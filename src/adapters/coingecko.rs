//! CoinGecko Price Client
//!
//! Live USD rates for ETH and XEN via the CoinGecko simple price API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::ports::{RateError, RateSupplier};

const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";

/// Upper bound on any single retry sleep
const MAX_BACKOFF_MS: u64 = 60_000;

/// CoinGecko client configuration
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub api_url: String,
    /// Pro API key, sent as `x-cg-pro-api-key`
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base delay for exponential backoff (milliseconds)
    pub retry_base_delay_ms: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: COINGECKO_API.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
}

/// `{"ethereum": {"usd": 2300.12}}`
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

impl CoinGeckoClient {
    pub fn new() -> Result<Self, RateError> {
        Self::with_config(CoinGeckoConfig::default())
    }

    pub fn with_config(config: CoinGeckoConfig) -> Result<Self, RateError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RateError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    fn price_url(&self) -> String {
        format!("{}/simple/price", self.config.api_url.trim_end_matches('/'))
    }

    /// Execute request with retry on 429 and 5xx
    async fn fetch_with_retry(
        &self,
        currency_id: &str,
        vs_currency: &str,
    ) -> Result<SimplePriceResponse, RateError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries.max(1) {
            let mut req = self
                .http
                .get(self.price_url())
                .query(&[("ids", currency_id), ("vs_currencies", vs_currency)]);
            if let Some(ref key) = self.config.api_key {
                req = req.header("x-cg-pro-api-key", key);
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(RateError::Http(e.to_string()));
                    tokio::time::sleep(linear_backoff(self.config.retry_base_delay_ms, attempt)).await;
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let backoff = exponential_backoff(self.config.retry_base_delay_ms, attempt);
                tracing::warn!(
                    "Rate limited (429), backing off for {:?} (attempt {}/{})",
                    backoff,
                    attempt + 1,
                    self.config.max_retries
                );
                last_error = Some(RateError::Http("Rate limit exceeded".into()));
                tokio::time::sleep(backoff).await;
                continue;
            }

            if status.is_server_error() {
                last_error = Some(RateError::Http(format!("Server error: {}", status)));
                tokio::time::sleep(linear_backoff(self.config.retry_base_delay_ms, attempt)).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RateError::Http(format!("API error {}: {}", status, body)));
            }

            return response
                .json()
                .await
                .map_err(|e| RateError::Parse(e.to_string()));
        }

        Err(last_error.unwrap_or_else(|| RateError::Http("Max retries exceeded".into())))
    }
}

/// `base * (attempt + 1)`, capped at `MAX_BACKOFF_MS`
fn linear_backoff(base_ms: u64, attempt: u32) -> Duration {
    let ms = base_ms.saturating_mul(u64::from(attempt) + 1);
    Duration::from_millis(ms.min(MAX_BACKOFF_MS))
}

/// `base * 2^(attempt + 1)`, capped at `MAX_BACKOFF_MS`
fn exponential_backoff(base_ms: u64, attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt.saturating_add(1))
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor));
    Duration::from_millis(ms.min(MAX_BACKOFF_MS))
}

/// Pull `response[currency_id][vs_currency]` and require it to be positive
pub fn extract_rate(
    response: &SimplePriceResponse,
    currency_id: &str,
    vs_currency: &str,
) -> Result<f64, RateError> {
    let rate = response
        .get(currency_id)
        .and_then(|quotes| quotes.get(vs_currency))
        .copied()
        .ok_or_else(|| RateError::NoRate {
            currency_id: currency_id.to_string(),
            vs_currency: vs_currency.to_string(),
        })?;

    if rate <= 0.0 || !rate.is_finite() {
        return Err(RateError::NonPositive {
            currency_id: currency_id.to_string(),
            rate,
        });
    }
    Ok(rate)
}

#[async_trait]
impl RateSupplier for CoinGeckoClient {
    async fn get_rate(&self, currency_id: &str, vs_currency: &str) -> Result<f64, RateError> {
        let response = self.fetch_with_retry(currency_id, vs_currency).await?;
        let rate = extract_rate(&response, currency_id, vs_currency)?;
        tracing::info!("{} = {} {}", currency_id, rate, vs_currency);
        Ok(rate)
    }
}
