//! XENFT Finder Library
//!
//! Finds the XENFTs listed on Blur that buy the most future XEN per dollar.
//!
//! # Modules
//!
//! - `domain`: Listing model, maturity parsing, yield formula and the valuation pipeline
//! - `ports`: Trait abstractions (ListingSource, RateSupplier)
//! - `adapters`: External implementations (Blur, CoinGecko, saved snapshots, report, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Single-snapshot finder use case

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
