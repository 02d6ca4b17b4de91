//! XENFT Finder
//!
//! Runs one snapshot: acquire rates and listings, value them, hand the ranked
//! records back for rendering. No state survives between runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{PipelineConfig, Rates, RawListing, Screening, ValuationPipeline, ValuationRecord};
use crate::ports::{ListingError, ListingFilter, ListingSource, RateError, RateSupplier};

/// Run-level failures. Per-listing problems never surface here.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Listing retrieval failed: {0}")]
    Listing(#[from] ListingError),

    #[error("Rate retrieval failed for {currency_id}: {source}")]
    Rate {
        currency_id: String,
        #[source]
        source: RateError,
    },
}

/// Which currency ids to price, and in what
#[derive(Debug, Clone)]
pub struct RateIds {
    pub eth_id: String,
    pub xen_id: String,
    pub vs_currency: String,
}

impl Default for RateIds {
    fn default() -> Self {
        Self {
            eth_id: "ethereum".to_string(),
            xen_id: "xen-crypto".to_string(),
            vs_currency: "usd".to_string(),
        }
    }
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct FinderReport {
    pub rates: Rates,
    /// Ranked records
    pub records: Vec<ValuationRecord>,
    /// Listings returned by the source
    pub screened: usize,
    /// Listings screened out
    pub rejected: usize,
    /// Rejection counts per reason
    pub rejections: Vec<(&'static str, usize)>,
}

pub struct XenftFinder {
    listings: Arc<dyn ListingSource>,
    eth_rate: Arc<dyn RateSupplier>,
    xen_rate: Arc<dyn RateSupplier>,
    rate_ids: RateIds,
    filter: ListingFilter,
    pipeline_config: PipelineConfig,
}

impl XenftFinder {
    pub fn new(
        listings: Arc<dyn ListingSource>,
        eth_rate: Arc<dyn RateSupplier>,
        xen_rate: Arc<dyn RateSupplier>,
        filter: ListingFilter,
        pipeline_config: PipelineConfig,
    ) -> Self {
        Self {
            listings,
            eth_rate,
            xen_rate,
            rate_ids: RateIds::default(),
            filter,
            pipeline_config,
        }
    }

    pub fn with_rate_ids(mut self, rate_ids: RateIds) -> Self {
        self.rate_ids = rate_ids;
        self
    }

    /// ETH and XEN prices, fetched one after the other
    pub async fn acquire_rates(&self) -> Result<Rates, FinderError> {
        let RateIds {
            eth_id,
            xen_id,
            vs_currency,
        } = &self.rate_ids;

        let eth_usd = self
            .eth_rate
            .get_rate(eth_id, vs_currency)
            .await
            .map_err(|source| FinderError::Rate {
                currency_id: eth_id.clone(),
                source,
            })?;
        let xen_usd = self
            .xen_rate
            .get_rate(xen_id, vs_currency)
            .await
            .map_err(|source| FinderError::Rate {
                currency_id: xen_id.clone(),
                source,
            })?;

        tracing::info!("Rates: ETH = {} {}, XEN = {} {}", eth_usd, vs_currency, xen_usd, vs_currency);
        Ok(Rates::new(eth_usd, xen_usd))
    }

    pub async fn acquire_listings(&self) -> Result<Vec<RawListing>, FinderError> {
        let listings = self.listings.fetch_listings(&self.filter).await?;
        tracing::info!("Fetched {} listings", listings.len());
        Ok(listings)
    }

    /// Acquire inputs, then value them as of `now`
    pub async fn run(&self, now: DateTime<Utc>) -> Result<FinderReport, FinderError> {
        let rates = self.acquire_rates().await?;
        let listings = self.acquire_listings().await?;
        Ok(self.value(&listings, rates, now))
    }

    /// Pure valuation step over already-acquired inputs
    pub fn value(&self, listings: &[RawListing], rates: Rates, now: DateTime<Utc>) -> FinderReport {
        let pipeline = ValuationPipeline::new(self.pipeline_config.clone(), rates);
        let screenings = pipeline.screen_all(listings, now);
        let rejections = rejection_summary(&screenings);
        let records = pipeline.rank_accepted(screenings);

        FinderReport {
            rates,
            screened: listings.len(),
            rejected: listings.len() - records.len(),
            rejections,
            records,
        }
    }
}

/// Count rejections per reason, ordered by reason label
pub fn rejection_summary(screenings: &[Screening]) -> Vec<(&'static str, usize)> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for reason in screenings.iter().filter_map(Screening::rejection) {
        *counts.entry(reason.kind()).or_default() += 1;
    }
    counts.into_iter().collect()
}
