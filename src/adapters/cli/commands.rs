//! CLI Command Handlers
//!
//! Implementation of all CLI commands for XENFT Finder.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::blur::BlurClient;
use crate::adapters::coingecko::CoinGeckoClient;
use crate::adapters::file_source::FileListingSource;
use crate::adapters::report::{ReportFormat, ReportRenderer};
use crate::application::{FinderError, RateIds, XenftFinder};
use crate::config::{load_config, Config};
use crate::domain::{PipelineConfig, SortKey};
use crate::ports::{FixedRate, ListingError, ListingFilter, ListingSource, RateSupplier};

/// XENFT Finder - rank listed XENFTs by XEN yield per dollar
#[derive(Parser, Debug)]
#[command(
    name = "xenft-finder",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Rank listed XENFTs by estimated XEN yield per dollar",
    long_about = "XENFT Finder pulls the current XENFT listings from Blur, prices them with \
                  live or fixed ETH/XEN rates, estimates the XEN each token mints at maturity \
                  and prints a ranked table."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch listings, value them and print the ranked report
    Scan(ScanCmd),

    /// Print the ETH and XEN rates that a scan would use
    Rates(RatesCmd),
}

/// Value the current listing snapshot
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Read listings from a saved API response instead of the marketplace
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Override sort key (yield-per-currency, price-per-unit-usd, ratio)
    #[arg(long, value_name = "KEY")]
    pub sort_by: Option<SortKey>,

    /// Override minimum Term (exclusive)
    #[arg(long, value_name = "DAYS")]
    pub term_min: Option<u32>,

    /// Override minimum VMUs (exclusive)
    #[arg(long, value_name = "N")]
    pub vmu_min: Option<u32>,

    /// Override the XEN global rank reference
    #[arg(long, value_name = "RANK")]
    pub global_rank: Option<u64>,

    /// Use the configured fixed rates instead of live prices
    #[arg(long)]
    pub fixed_rates: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: ReportFormat,
}

/// Show conversion rates
#[derive(Parser, Debug)]
pub struct RatesCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Use the configured fixed rates instead of live prices
    #[arg(long)]
    pub fixed_rates: bool,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    match app.command {
        Command::Scan(cmd) => {
            let config = load_config(&cmd.config)
                .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
            init_logging(app.verbose, app.debug, &config.logging.level)?;
            scan_command(cmd, config).await
        }
        Command::Rates(cmd) => {
            let config = load_config(&cmd.config)
                .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
            init_logging(app.verbose, app.debug, &config.logging.level)?;
            rates_command(cmd, config).await
        }
    }
}

/// Initialize logging system. Flags win over RUST_LOG, which wins over the config level.
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Apply command-line overrides to the configured pipeline settings
fn pipeline_config(cmd: &ScanCmd, config: &Config) -> PipelineConfig {
    let mut pipeline = PipelineConfig::from(config);
    if let Some(sort_key) = cmd.sort_by {
        pipeline.sort_key = sort_key;
    }
    if let Some(term_min) = cmd.term_min {
        pipeline.term_min = term_min;
    }
    if let Some(vmu_min) = cmd.vmu_min {
        pipeline.vmu_min = vmu_min;
    }
    if let Some(rank) = cmd.global_rank {
        pipeline.global_rank_reference = rank;
    }
    pipeline
}

/// Live CoinGecko supplier or the configured constant, per currency
fn rate_suppliers(config: &Config, force_fixed: bool) -> Result<(Arc<dyn RateSupplier>, Arc<dyn RateSupplier>)> {
    let rates = &config.rates;
    let needs_live = !force_fixed && (rates.eth_to_usd_live || rates.xen_to_usd_live);
    let coingecko: Option<Arc<CoinGeckoClient>> = if needs_live {
        Some(Arc::new(
            CoinGeckoClient::with_config(config.coingecko_config()).context("Failed to create CoinGecko client")?,
        ))
    } else {
        None
    };

    let pick = |live: bool, fixed: f64| -> Arc<dyn RateSupplier> {
        match (&coingecko, live && !force_fixed) {
            (Some(client), true) => client.clone(),
            _ => Arc::new(FixedRate(fixed)),
        }
    };

    Ok((
        pick(rates.eth_to_usd_live, rates.eth_usd_fixed),
        pick(rates.xen_to_usd_live, rates.xen_usd_fixed),
    ))
}

fn rate_ids(config: &Config) -> RateIds {
    RateIds {
        eth_id: config.rates.eth_id.clone(),
        xen_id: config.rates.xen_id.clone(),
        vs_currency: config.rates.vs_currency.clone(),
    }
}

/// Handle scan command
async fn scan_command(cmd: ScanCmd, config: Config) -> Result<()> {
    tracing::info!("Starting XENFT scan...");

    let listings: Arc<dyn ListingSource> = match cmd.input {
        Some(ref path) => Arc::new(FileListingSource::new(path)),
        None => Arc::new(BlurClient::with_config(config.blur_config()).context("Failed to create Blur client")?),
    };
    let (eth_rate, xen_rate) = rate_suppliers(&config, cmd.fixed_rates)?;
    let filter = ListingFilter::new(&config.filters.class_values, &config.filters.maturity_years);

    let finder = XenftFinder::new(listings, eth_rate, xen_rate, filter, pipeline_config(&cmd, &config))
        .with_rate_ids(rate_ids(&config));

    let report = match finder.run(chrono::Utc::now()).await {
        Ok(report) => report,
        Err(FinderError::Listing(ListingError::MissingTokens { raw })) => {
            println!("Error: 'tokens' key not found in the response. Here is the response data:");
            println!("{}", raw);
            return Ok(());
        }
        Err(e) => return Err(e).context("Scan failed"),
    };

    for (reason, count) in &report.rejections {
        tracing::debug!("Rejected {} listing(s): {}", count, reason);
    }
    tracing::info!(
        "{} of {} listings passed screening",
        report.records.len(),
        report.screened
    );

    let renderer = ReportRenderer::new(&config.source.asset_base_url, &config.source.collection);
    let output = renderer
        .render(&report.records, cmd.format)
        .context("Failed to render report")?;
    print!("{}", output);
    if cmd.format == ReportFormat::Json {
        println!();
    }

    Ok(())
}

/// Handle rates command
async fn rates_command(cmd: RatesCmd, config: Config) -> Result<()> {
    let (eth_rate, xen_rate) = rate_suppliers(&config, cmd.fixed_rates)?;
    let ids = rate_ids(&config);

    let eth = eth_rate
        .get_rate(&ids.eth_id, &ids.vs_currency)
        .await
        .with_context(|| format!("Failed to get {} rate", ids.eth_id))?;
    let xen = xen_rate
        .get_rate(&ids.xen_id, &ids.vs_currency)
        .await
        .with_context(|| format!("Failed to get {} rate", ids.xen_id))?;

    println!("{}: {} {}", ids.eth_id, eth, ids.vs_currency);
    println!("{}: {} {}", ids.xen_id, xen, ids.vs_currency);
    Ok(())
}
