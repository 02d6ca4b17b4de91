//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Blur: marketplace listing snapshot
//! - File source: saved listing snapshot for offline runs
//! - CoinGecko: live ETH/XEN rates
//! - Report: table and JSON rendering
//! - CLI: Command-line interface handlers

pub mod blur;
pub mod file_source;
pub mod coingecko;
pub mod report;
pub mod cli;

pub use blur::BlurClient;
pub use file_source::FileListingSource;
pub use coingecko::CoinGeckoClient;
pub use report::{ReportFormat, ReportRenderer};
pub use cli::CliApp;
