//! Listing Source Port
//!
//! Interface for fetching the candidate listing snapshot.
//! Implementations: live marketplace API, cached JSON file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::listing::{RawListing, TRAIT_CLASS, TRAIT_MATURITY_YEAR};

/// Listing retrieval errors. All of them abort the run.
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Listing API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("'tokens' key not found in the response")]
    MissingTokens { raw: String },

    #[error("Failed to parse listing response: {0}")]
    Parse(String),

    #[error("Failed to read listing snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// One trait predicate: listing must carry one of `values` for `trait_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitFilter {
    #[serde(rename = "type")]
    pub trait_type: String,
    pub values: Vec<String>,
}

/// Filter sent to the listing source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub traits: Vec<TraitFilter>,
}

impl ListingFilter {
    /// Filter on XENFT class and maturity year, in the given order
    pub fn new(class_values: &[String], maturity_years: &[String]) -> Self {
        Self {
            traits: vec![
                TraitFilter {
                    trait_type: TRAIT_CLASS.to_string(),
                    values: class_values.to_vec(),
                },
                TraitFilter {
                    trait_type: TRAIT_MATURITY_YEAR.to_string(),
                    values: maturity_years.to_vec(),
                },
            ],
        }
    }

    /// JSON form used as the `filters` query parameter
    pub fn to_query(&self) -> Result<String, ListingError> {
        serde_json::to_string(self).map_err(|e| ListingError::Parse(e.to_string()))
    }
}

/// Source of the listing snapshot for a run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Return every listing matching `filter`, in the source's native order
    async fn fetch_listings(&self, filter: &ListingFilter) -> Result<Vec<RawListing>, ListingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_shape() {
        let filter = ListingFilter::new(
            &["Rare++++++".to_string(), "Limited+++".to_string()],
            &["2025".to_string(), "2026".to_string()],
        );
        assert_eq!(
            filter.to_query().unwrap(),
            r#"{"traits":[{"type":"Class","values":["Rare++++++","Limited+++"]},{"type":"Maturity Year","values":["2025","2026"]}]}"#
        );
    }

    #[test]
    fn test_missing_tokens_message() {
        let err = ListingError::MissingTokens { raw: "{}".into() };
        assert_eq!(err.to_string(), "'tokens' key not found in the response");
    }
}
