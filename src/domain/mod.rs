//! Domain Layer - Core valuation logic for XENFT Finder
//!
//! This module contains pure domain types and logic with no I/O.
//! All external interactions happen through the ports layer.
//!
//! - `listing`: raw marketplace listing and trait names
//! - `maturity`: maturity timestamp parsing and day counting
//! - `valuation`: valuation records, sort keys and rejection reasons
//! - `pipeline`: screening, yield estimation and ranking

pub mod listing;
pub mod maturity;
pub mod valuation;
pub mod pipeline;

pub use listing::{ListingPrice, RawListing};
pub use maturity::{days_until, format_maturity, parse_maturity};
pub use valuation::{Rates, Rejection, Screening, SortKey, UnknownSortKey, ValuationRecord};
pub use pipeline::{yield_amount, PipelineConfig, ValuationPipeline};
