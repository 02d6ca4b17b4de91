//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The marketplace listing snapshot
//! - Currency conversion rates

pub mod listing_source;
pub mod rate_supplier;

pub use listing_source::{ListingError, ListingFilter, ListingSource, TraitFilter};
pub use rate_supplier::{FixedRate, RateError, RateSupplier};

#[cfg(test)]
pub use listing_source::MockListingSource;
#[cfg(test)]
pub use rate_supplier::MockRateSupplier;
