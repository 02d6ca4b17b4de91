//! Rate Supplier Port
//!
//! Interface for currency conversion rates. A live price API and a fixed
//! configured constant satisfy the same contract.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("No {vs_currency} rate for {currency_id}")]
    NoRate {
        currency_id: String,
        vs_currency: String,
    },

    #[error("Rate for {currency_id} is not positive: {rate}")]
    NonPositive { currency_id: String, rate: f64 },

    #[error("Failed to parse rate response: {0}")]
    Parse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateSupplier: Send + Sync {
    /// Price of one unit of `currency_id` in `vs_currency` (e.g. "ethereum" in "usd")
    async fn get_rate(&self, currency_id: &str, vs_currency: &str) -> Result<f64, RateError>;
}

/// Configured constant rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRate(pub f64);

#[async_trait]
impl RateSupplier for FixedRate {
    async fn get_rate(&self, currency_id: &str, _vs_currency: &str) -> Result<f64, RateError> {
        if self.0 <= 0.0 || !self.0.is_finite() {
            return Err(RateError::NonPositive {
                currency_id: currency_id.to_string(),
                rate: self.0,
            });
        }
        Ok(self.0)
    }
}
