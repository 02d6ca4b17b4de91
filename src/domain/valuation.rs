//! Valuation types
//!
//! Output of the valuation pipeline: one `ValuationRecord` per accepted listing,
//! the sort key used to rank them, and the tagged rejection reasons used when a
//! listing is screened out.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conversion rates used to value a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rates {
    /// USD per ETH
    pub eth_usd: f64,
    /// USD per XEN
    pub xen_usd: f64,
}

impl Rates {
    pub fn new(eth_usd: f64, xen_usd: f64) -> Self {
        Self { eth_usd, xen_usd }
    }
}

/// Key used to rank valuation records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// XEN received per USD spent (descending)
    #[serde(rename = "yield-per-currency", alias = "yield_per_unit_currency", alias = "xen_per_usd")]
    YieldPerUnitCurrency,
    /// USD paid per VMU (ascending)
    #[serde(alias = "price_per_unit_usd", alias = "price_per_vmu_usd")]
    PricePerUnitUsd,
    /// Yield value over price (descending)
    #[default]
    Ratio,
}

impl SortKey {
    /// Higher-is-better keys sort descending
    pub fn is_descending(&self) -> bool {
        matches!(self, SortKey::YieldPerUnitCurrency | SortKey::Ratio)
    }

    /// Compare two records on this key, ignoring direction
    pub fn compare(&self, a: &ValuationRecord, b: &ValuationRecord) -> Ordering {
        match self {
            SortKey::YieldPerUnitCurrency => a.yield_per_usd.cmp(&b.yield_per_usd),
            SortKey::PricePerUnitUsd => a.price_per_unit_usd.total_cmp(&b.price_per_unit_usd),
            SortKey::Ratio => a.ratio.total_cmp(&b.ratio),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::YieldPerUnitCurrency => write!(f, "yield-per-currency"),
            SortKey::PricePerUnitUsd => write!(f, "price-per-unit-usd"),
            SortKey::Ratio => write!(f, "ratio"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown sort key: {0} (expected yield-per-currency, price-per-unit-usd or ratio)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yield-per-currency" | "yield_per_unit_currency" | "xen_per_usd" | "xen-per-usd" => {
                Ok(SortKey::YieldPerUnitCurrency)
            }
            "price-per-unit-usd" | "price_per_unit_usd" | "price_per_vmu_usd" | "price-per-vmu-usd" => {
                Ok(SortKey::PricePerUnitUsd)
            }
            "ratio" => Ok(SortKey::Ratio),
            _ => Err(UnknownSortKey(s.to_string())),
        }
    }
}

/// A screened, enriched listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationRecord {
    pub token_id: String,
    pub xenft_class: String,
    /// Maturity exactly as listed
    pub maturity_raw: String,
    pub maturity_date: DateTime<Utc>,
    /// Maturity for display, e.g. `Thu 01 Jan 2026`
    pub formatted_maturity: String,
    pub term: u32,
    /// Always > 0
    pub days_remaining: i64,

    pub vmus: u32,
    pub amp: u32,
    pub c_rank: u64,
    /// Listing price in ETH
    pub price_base: Decimal,
    pub price_usd: f64,

    /// Estimated XEN claimable at maturity
    pub yield_amount: u64,
    pub yield_usd: f64,
    pub price_per_unit_base: f64,
    pub price_per_unit_usd: f64,
    /// XEN per USD spent; 0 when the USD price is 0
    pub yield_per_usd: i64,
    /// `yield_usd / price_usd`; 0 when the USD price is 0
    pub ratio: f64,
}

/// Why a listing was screened out
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("missing Term trait")]
    MissingTerm,
    #[error("Term is not a whole number: {0:?}")]
    InvalidTerm(String),
    #[error("Term {term} does not exceed minimum {minimum}")]
    TermTooShort { term: u32, minimum: u32 },

    #[error("not listed for sale")]
    MissingPrice,
    #[error("price is not a decimal: {0:?}")]
    InvalidPrice(String),
    #[error("price is not positive")]
    NonPositivePrice,

    #[error("missing Maturity DateTime trait")]
    MissingMaturity,
    #[error("unparseable maturity: {0:?}")]
    InvalidMaturity(String),
    #[error("already matured ({days_remaining} days remaining)")]
    Matured { days_remaining: i64 },

    #[error("VMUs is not a whole number: {0:?}")]
    InvalidVmus(String),
    #[error("VMUs {vmus} does not exceed minimum {minimum}")]
    TooFewVmus { vmus: u32, minimum: u32 },

    #[error("AMP is not a whole number: {0:?}")]
    InvalidAmp(String),
    #[error("cRank is not a whole number: {0:?}")]
    InvalidRank(String),
    #[error("cRank {c_rank} leaves no rank budget below {reference}")]
    RankExhausted { c_rank: u64, reference: u64 },
}

impl Rejection {
    /// Stable short label, used when tallying reasons
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::MissingTerm => "missing-term",
            Rejection::InvalidTerm(_) => "invalid-term",
            Rejection::TermTooShort { .. } => "term-too-short",
            Rejection::MissingPrice => "missing-price",
            Rejection::InvalidPrice(_) => "invalid-price",
            Rejection::NonPositivePrice => "non-positive-price",
            Rejection::MissingMaturity => "missing-maturity",
            Rejection::InvalidMaturity(_) => "invalid-maturity",
            Rejection::Matured { .. } => "matured",
            Rejection::InvalidVmus(_) => "invalid-vmus",
            Rejection::TooFewVmus { .. } => "too-few-vmus",
            Rejection::InvalidAmp(_) => "invalid-amp",
            Rejection::InvalidRank(_) => "invalid-rank",
            Rejection::RankExhausted { .. } => "rank-exhausted",
        }
    }
}

/// Outcome of screening a single listing
#[derive(Debug, Clone, PartialEq)]
pub enum Screening {
    Accepted(ValuationRecord),
    Rejected { token_id: String, reason: Rejection },
}

impl Screening {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Screening::Accepted(_))
    }

    pub fn accepted(self) -> Option<ValuationRecord> {
        match self {
            Screening::Accepted(record) => Some(record),
            Screening::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Screening::Accepted(_) => None,
            Screening::Rejected { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_direction() {
        assert!(SortKey::YieldPerUnitCurrency.is_descending());
        assert!(SortKey::Ratio.is_descending());
        assert!(!SortKey::PricePerUnitUsd.is_descending());
    }

    #[test]
    fn test_sort_key_from_str_accepts_legacy_names() {
        assert_eq!("xen_per_usd".parse::<SortKey>().unwrap(), SortKey::YieldPerUnitCurrency);
        assert_eq!("price_per_vmu_usd".parse::<SortKey>().unwrap(), SortKey::PricePerUnitUsd);
        assert_eq!("Ratio".parse::<SortKey>().unwrap(), SortKey::Ratio);
        assert_eq!(
            "yield_per_unit_currency".parse::<SortKey>().unwrap(),
            SortKey::YieldPerUnitCurrency
        );
        assert_eq!("price_per_unit_usd".parse::<SortKey>().unwrap(), SortKey::PricePerUnitUsd);
        assert_eq!("ratio".parse::<SortKey>().unwrap(), SortKey::Ratio);
        assert!("volume".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_sort_key_display_round_trips() {
        for key in [SortKey::YieldPerUnitCurrency, SortKey::PricePerUnitUsd, SortKey::Ratio] {
            assert_eq!(key.to_string().parse::<SortKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_sort_key_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            sort_by: SortKey,
        }
        let w: Wrapper = toml::from_str(r#"sort_by = "price-per-unit-usd""#).unwrap();
        assert_eq!(w.sort_by, SortKey::PricePerUnitUsd);
        let w: Wrapper = toml::from_str(r#"sort_by = "xen_per_usd""#).unwrap();
        assert_eq!(w.sort_by, SortKey::YieldPerUnitCurrency);

        for (name, key) in [
            ("yield_per_unit_currency", SortKey::YieldPerUnitCurrency),
            ("price_per_unit_usd", SortKey::PricePerUnitUsd),
            ("ratio", SortKey::Ratio),
        ] {
            let w: Wrapper = toml::from_str(&format!("sort_by = \"{}\"", name)).unwrap();
            assert_eq!(w.sort_by, key, "{}", name);
        }
    }

    #[test]
    fn test_rejection_messages() {
        let reason = Rejection::TermTooShort { term: 50, minimum: 100 };
        assert_eq!(reason.to_string(), "Term 50 does not exceed minimum 100");
    }
}
