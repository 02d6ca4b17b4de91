//! Blur Adapter
//!
//! Implementation of the ListingSource port for the Blur marketplace.

mod client;
mod response;

pub use client::{asset_url, BlurClient, BlurConfig, XENFT_COLLECTION};
pub use response::parse_tokens_response;
