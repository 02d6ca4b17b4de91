//! Token Valuation Pipeline
//!
//! Pure transformation from raw listings plus two conversion rates into a
//! ranked list of valuation records:
//!
//! 1. Screen: Term > term_min, positive price, unmatured, VMUs > vmu_min
//! 2. Enrich: estimated XEN yield and the USD-denominated ratios
//! 3. Rank: stable sort on the configured key
//!
//! Listings that fail any step are dropped, never surfaced as errors. `screen`
//! returns the tagged outcome so callers can inspect why a listing was dropped.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::listing::{RawListing, TRAIT_AMP, TRAIT_CRANK, TRAIT_MATURITY, TRAIT_TERM, TRAIT_VMUS};
use super::maturity::{days_until, format_maturity, parse_maturity};
use super::valuation::{Rates, Rejection, Screening, SortKey, ValuationRecord};

/// Screening thresholds and ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Exclusive lower bound on Term (days)
    pub term_min: u32,
    /// Exclusive lower bound on VMUs
    pub vmu_min: u32,
    /// Approximate XEN global rank; must exceed every listed cRank
    pub global_rank_reference: u64,
    pub sort_key: SortKey,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            term_min: 100,
            vmu_min: 10,
            global_rank_reference: 19_960_000,
            sort_key: SortKey::Ratio,
        }
    }
}

/// Estimated XEN minted at maturity:
/// `round(vmus * log2(global_rank_reference - c_rank) * term * amp)`.
///
/// Returns `None` when the rank budget is not positive. Rounds half to even.
pub fn yield_amount(
    vmus: u32,
    amp: u32,
    term: u32,
    c_rank: u64,
    global_rank_reference: u64,
) -> Option<u64> {
    let budget = global_rank_reference.checked_sub(c_rank).filter(|b| *b > 0)?;
    let raw = f64::from(vmus) * ((budget as f64).log2() * f64::from(term) * f64::from(amp));
    Some(raw.round_ties_even() as u64)
}

#[derive(Debug, Clone)]
pub struct ValuationPipeline {
    config: PipelineConfig,
    rates: Rates,
}

impl ValuationPipeline {
    pub fn new(config: PipelineConfig, rates: Rates) -> Self {
        Self { config, rates }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn rates(&self) -> Rates {
        self.rates
    }

    /// Screen and rank a snapshot. Empty input yields empty output.
    pub fn evaluate(&self, listings: &[RawListing], now: DateTime<Utc>) -> Vec<ValuationRecord> {
        self.rank_accepted(self.screen_all(listings, now))
    }

    /// Keep accepted records in screening order, then rank them
    pub fn rank_accepted(&self, screenings: Vec<Screening>) -> Vec<ValuationRecord> {
        let total = screenings.len();
        let mut records: Vec<ValuationRecord> = screenings
            .into_iter()
            .filter_map(|outcome| match outcome {
                Screening::Accepted(record) => Some(record),
                Screening::Rejected { token_id, reason } => {
                    tracing::debug!("Excluded token {}: {}", token_id, reason);
                    None
                }
            })
            .collect();

        self.rank(&mut records);

        tracing::info!(
            "Valued {} of {} listings (sorted by {})",
            records.len(),
            total,
            self.config.sort_key
        );
        records
    }

    /// Screen every listing, preserving input order
    pub fn screen_all(&self, listings: &[RawListing], now: DateTime<Utc>) -> Vec<Screening> {
        listings.iter().map(|listing| self.screen(listing, now)).collect()
    }

    /// Stable sort; descending for higher-is-better keys
    pub fn rank(&self, records: &mut [ValuationRecord]) {
        let key = self.config.sort_key;
        records.sort_by(|a, b| {
            let ordering = key.compare(a, b);
            if key.is_descending() {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    /// Screen a single listing. Checks run in a fixed order and stop at the first failure.
    pub fn screen(&self, listing: &RawListing, now: DateTime<Utc>) -> Screening {
        match self.try_value(listing, now) {
            Ok(record) => Screening::Accepted(record),
            Err(reason) => Screening::Rejected {
                token_id: listing.token_id.clone(),
                reason,
            },
        }
    }

    fn try_value(&self, listing: &RawListing, now: DateTime<Utc>) -> Result<ValuationRecord, Rejection> {
        // Term
        let raw_term = listing.trait_value(TRAIT_TERM).ok_or(Rejection::MissingTerm)?;
        let term: u32 = parse_whole(raw_term).ok_or_else(|| Rejection::InvalidTerm(raw_term.to_string()))?;
        if term <= self.config.term_min {
            return Err(Rejection::TermTooShort {
                term,
                minimum: self.config.term_min,
            });
        }

        // Price
        let price = listing.price.as_ref().ok_or(Rejection::MissingPrice)?;
        let price_base = parse_decimal(&price.amount)
            .ok_or_else(|| Rejection::InvalidPrice(price.amount.clone()))?;
        if price_base <= Decimal::ZERO {
            return Err(Rejection::NonPositivePrice);
        }
        let price_eth = price_base
            .to_f64()
            .ok_or_else(|| Rejection::InvalidPrice(price.amount.clone()))?;

        // Maturity
        let maturity_raw = listing.trait_value(TRAIT_MATURITY).ok_or(Rejection::MissingMaturity)?;
        let maturity_date = parse_maturity(maturity_raw)
            .ok_or_else(|| Rejection::InvalidMaturity(maturity_raw.to_string()))?;
        let days_remaining = days_until(maturity_date, now);
        if days_remaining <= 0 {
            return Err(Rejection::Matured { days_remaining });
        }

        // VMUs
        let vmus: u32 = parse_trait_or_zero(listing, TRAIT_VMUS).map_err(Rejection::InvalidVmus)?;
        if vmus <= self.config.vmu_min {
            return Err(Rejection::TooFewVmus {
                vmus,
                minimum: self.config.vmu_min,
            });
        }

        // Yield
        let amp: u32 = parse_trait_or_zero(listing, TRAIT_AMP).map_err(Rejection::InvalidAmp)?;
        let c_rank: u64 = parse_trait_or_zero(listing, TRAIT_CRANK).map_err(Rejection::InvalidRank)?;
        let reference = self.config.global_rank_reference;
        let yield_amount = yield_amount(vmus, amp, term, c_rank, reference)
            .ok_or(Rejection::RankExhausted { c_rank, reference })?;

        let Rates { eth_usd, xen_usd } = self.rates;
        let price_usd = price_eth * eth_usd;
        let yield_usd = yield_amount as f64 * xen_usd;
        let price_per_unit_base = price_eth / f64::from(vmus);
        let price_per_unit_usd = price_per_unit_base * eth_usd;
        let (yield_per_usd, ratio) = if price_usd != 0.0 {
            (
                (yield_amount as f64 / price_usd).round_ties_even() as i64,
                yield_usd / price_usd,
            )
        } else {
            (0, 0.0)
        };

        Ok(ValuationRecord {
            token_id: listing.token_id.clone(),
            xenft_class: listing.class_label(),
            maturity_raw: maturity_raw.to_string(),
            maturity_date,
            formatted_maturity: format_maturity(maturity_date),
            term,
            days_remaining,
            vmus,
            amp,
            c_rank,
            price_base,
            price_usd,
            yield_amount,
            yield_usd,
            price_per_unit_base,
            price_per_unit_usd,
            yield_per_usd,
            ratio,
        })
    }
}

/// Digits only; no sign, no separators, no surrounding whitespace
fn parse_whole<T: FromStr>(raw: &str) -> Option<T> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Absent traits count as zero; present but malformed ones are an error
fn parse_trait_or_zero<T: FromStr + Default>(listing: &RawListing, name: &str) -> Result<T, String> {
    match listing.trait_value(name) {
        None => Ok(T::default()),
        Some(raw) => parse_whole(raw.trim()).ok_or_else(|| raw.to_string()),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
