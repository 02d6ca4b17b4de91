//! Cached listing snapshot
//!
//! Reads a previously saved collection-tokens response from disk. The filter is
//! applied locally on the `Class` and `Maturity DateTime` year so a broad
//! snapshot can be re-screened offline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::blur::parse_tokens_response;
use crate::domain::listing::{RawListing, TRAIT_CLASS, TRAIT_MATURITY, TRAIT_MATURITY_YEAR};
use crate::ports::{ListingError, ListingFilter, ListingSource};

#[derive(Debug, Clone)]
pub struct FileListingSource {
    path: PathBuf,
}

impl FileListingSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ListingSource for FileListingSource {
    async fn fetch_listings(&self, filter: &ListingFilter) -> Result<Vec<RawListing>, ListingError> {
        tracing::info!("Reading listing snapshot from {}", self.path.display());
        let body = tokio::fs::read_to_string(&self.path).await?;
        let listings = parse_tokens_response(&body)?;
        Ok(listings
            .into_iter()
            .filter(|listing| matches_filter(listing, filter))
            .collect())
    }
}

/// A listing passes when every trait predicate it can be checked against holds.
/// An empty value list matches anything.
fn matches_filter(listing: &RawListing, filter: &ListingFilter) -> bool {
    filter.traits.iter().all(|predicate| {
        if predicate.values.is_empty() {
            return true;
        }
        let value = match predicate.trait_type.as_str() {
            TRAIT_MATURITY_YEAR => listing
                .trait_value(TRAIT_MATURITY_YEAR)
                .map(str::to_string)
                .or_else(|| maturity_year(listing)),
            TRAIT_CLASS => listing.trait_value(TRAIT_CLASS).map(|c| c.trim().to_string()),
            other => listing.trait_value(other).map(str::to_string),
        };
        match value {
            Some(v) => predicate.values.iter().any(|allowed| allowed.trim() == v),
            None => false,
        }
    })
}

/// Year from `"Jan 01, 2026 00:00 UTC"`
fn maturity_year(listing: &RawListing) -> Option<String> {
    let raw = listing.trait_value(TRAIT_MATURITY)?;
    let (_, rest) = raw.split_once(", ")?;
    rest.split_whitespace().next().map(str::to_string)
}
