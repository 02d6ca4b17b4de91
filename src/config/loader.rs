//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::blur::{BlurConfig, XENFT_COLLECTION};
use crate::adapters::coingecko::CoinGeckoConfig;
use crate::domain::{PipelineConfig, SortKey};

/// Upper bound on CoinGecko request attempts
const MAX_RETRIES: u32 = 10;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub valuation: ValuationSection,
    #[serde(default)]
    pub rates: RatesSection,
    #[serde(default)]
    pub filters: FiltersSection,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub coingecko: CoinGeckoSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Screening thresholds and ranking
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationSection {
    /// Approximate XEN global rank (see xen.pub); must exceed every listed cRank
    pub global_rank_reference: u64,
    /// Only keep XENFTs with Term strictly above this (days)
    #[serde(default = "default_term_min")]
    pub term_min: u32,
    /// Only keep XENFTs with VMUs strictly above this
    #[serde(default = "default_vmu_min")]
    pub vmu_min: u32,
    /// "yield-per-currency", "price-per-unit-usd" or "ratio"
    #[serde(default)]
    pub sort_by: SortKey,
}

fn default_term_min() -> u32 {
    100
}

fn default_vmu_min() -> u32 {
    10
}

/// Conversion rate sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatesSection {
    /// Fetch ETH/USD live instead of using `eth_usd_fixed`
    pub eth_to_usd_live: bool,
    /// Fetch XEN/USD live instead of using `xen_usd_fixed`
    pub xen_to_usd_live: bool,
    pub eth_usd_fixed: f64,
    pub xen_usd_fixed: f64,
    /// CoinGecko id for ETH
    pub eth_id: String,
    /// CoinGecko id for XEN
    pub xen_id: String,
    pub vs_currency: String,
}

impl Default for RatesSection {
    fn default() -> Self {
        Self {
            eth_to_usd_live: true,
            xen_to_usd_live: true,
            eth_usd_fixed: 2300.0,
            xen_usd_fixed: 0.000_000_38,
            eth_id: "ethereum".to_string(),
            xen_id: "xen-crypto".to_string(),
            vs_currency: "usd".to_string(),
        }
    }
}

/// Marketplace trait filters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FiltersSection {
    /// Allowed XENFT classes, in request order
    pub class_values: Vec<String>,
    /// Allowed maturity years (4 digits)
    pub maturity_years: Vec<String>,
}

impl Default for FiltersSection {
    fn default() -> Self {
        Self {
            class_values: [
                "Rare++++++", "Limited+++", "Epic++++++", "Xunicorn++", "Legendary+",
                "Exotic++++", "Sapphire++", "Aquamarine", "Topaz+++++", "Emerald+++",
                "Amethyst++", "Opal++++++", "Xenturion+",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            maturity_years: ["2024", "2025", "2026"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Listing source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub api_base_url: String,
    pub asset_base_url: String,
    /// XENFT collection contract
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        let blur = BlurConfig::default();
        Self {
            api_base_url: blur.api_base_url,
            asset_base_url: blur.asset_base_url,
            collection: XENFT_COLLECTION.to_string(),
            timeout_secs: blur.timeout.as_secs(),
        }
    }
}

/// CoinGecko settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoinGeckoSection {
    pub api_url: String,
    /// Optional pro API key
    pub api_key: Option<String>,
    pub max_retries: u32,
}

impl Default for CoinGeckoSection {
    fn default() -> Self {
        let defaults = CoinGeckoConfig::default();
        Self {
            api_url: defaults.api_url,
            api_key: None,
            max_retries: defaults.max_retries,
        }
    }
}

impl CoinGeckoSection {
    /// Get API key with environment variable fallback
    /// Checks COINGECKO_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("COINGECKO_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file. A leading `~` in the path is expanded.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let raw_path = path.as_ref().to_string_lossy();
    let expanded = shellexpand::tilde(&raw_path).to_string();
    let content = std::fs::read_to_string(expanded)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Valuation
        if self.valuation.global_rank_reference == 0 {
            return Err(ConfigError::ValidationError(
                "global_rank_reference must be > 0".to_string(),
            ));
        }

        // Rates
        for (name, value) in [
            ("eth_usd_fixed", self.rates.eth_usd_fixed),
            ("xen_usd_fixed", self.rates.xen_usd_fixed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }

        if self.rates.eth_id.is_empty() || self.rates.xen_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "eth_id and xen_id cannot be empty".to_string(),
            ));
        }

        if self.rates.vs_currency.is_empty() {
            return Err(ConfigError::ValidationError(
                "vs_currency cannot be empty".to_string(),
            ));
        }

        // Filters
        if self.filters.class_values.is_empty() {
            return Err(ConfigError::ValidationError(
                "class_values cannot be empty".to_string(),
            ));
        }

        if let Some(bad) = self
            .filters
            .maturity_years
            .iter()
            .find(|y| y.len() != 4 || !y.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(ConfigError::ValidationError(format!(
                "maturity_years must be 4-digit years, got {:?}",
                bad
            )));
        }

        // Source
        if self.source.api_base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api_base_url cannot be empty".to_string(),
            ));
        }

        if self.source.collection.is_empty() {
            return Err(ConfigError::ValidationError(
                "collection cannot be empty".to_string(),
            ));
        }

        if self.source.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        // CoinGecko
        if self.coingecko.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "coingecko api_url cannot be empty".to_string(),
            ));
        }

        if self.coingecko.max_retries == 0 || self.coingecko.max_retries > MAX_RETRIES {
            return Err(ConfigError::ValidationError(format!(
                "max_retries must be between 1 and {}, got {}",
                MAX_RETRIES, self.coingecko.max_retries
            )));
        }

        Ok(())
    }

    pub fn blur_config(&self) -> BlurConfig {
        BlurConfig {
            api_base_url: self.source.api_base_url.clone(),
            asset_base_url: self.source.asset_base_url.clone(),
            collection: self.source.collection.clone(),
            timeout: Duration::from_secs(self.source.timeout_secs),
        }
    }

    pub fn coingecko_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            api_url: self.coingecko.api_url.clone(),
            api_key: self.coingecko.get_api_key(),
            max_retries: self.coingecko.max_retries,
            ..Default::default()
        }
    }
}

// Conversion from Config to PipelineConfig
impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        PipelineConfig {
            term_min: config.valuation.term_min,
            vmu_min: config.valuation.vmu_min,
            global_rank_reference: config.valuation.global_rank_reference,
            sort_key: config.valuation.sort_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[valuation]
global_rank_reference = 19_960_000
term_min = 100
vmu_min = 10
sort_by = "ratio"

[rates]
eth_to_usd_live = false
xen_to_usd_live = true
eth_usd_fixed = 2300.0
xen_usd_fixed = 0.00000038

[filters]
class_values = ["Rare++++++", "Limited+++"]
maturity_years = ["2025", "2026"]

[source]
api_base_url = "https://core-api.prod.blur.io/v1"
asset_base_url = "https://blur.io/asset"
collection = "0x0a252663dbcc0b073063d6420a40319e438cfa59"
timeout_secs = 20

[logging]
level = "info"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.valuation.global_rank_reference, 19_960_000);
        assert_eq!(config.valuation.sort_by, SortKey::Ratio);
        assert!(!config.rates.eth_to_usd_live);
        assert!(config.rates.xen_to_usd_live);
        assert_eq!(config.filters.class_values.len(), 2);
        assert_eq!(config.source.timeout_secs, 20);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("[valuation]\nglobal_rank_reference = 20000000\n").unwrap();

        assert_eq!(config.valuation.term_min, 100);
        assert_eq!(config.valuation.vmu_min, 10);
        assert_eq!(config.valuation.sort_by, SortKey::Ratio);
        assert_eq!(config.rates.eth_usd_fixed, 2300.0);
        assert_eq!(config.rates.xen_id, "xen-crypto");
        assert_eq!(config.filters.class_values.len(), 13);
        assert_eq!(config.filters.maturity_years, vec!["2024", "2025", "2026"]);
        assert_eq!(config.source.collection, XENFT_COLLECTION);
    }

    #[test]
    fn test_global_rank_is_required() {
        let result = parse_config("[valuation]\nterm_min = 100\n");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_fixed_rate() {
        let result = parse_config(
            "[valuation]\nglobal_rank_reference = 20000000\n[rates]\nxen_usd_fixed = 0.0\n",
        );
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = parse_config(
            "[valuation]\nglobal_rank_reference = 20000000\n[source]\ntimeout_secs = 0\n",
        );
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_max_retries_bounds() {
        for retries in [0, 11, 4_000_000_000u32] {
            let result = parse_config(&format!(
                "[valuation]\nglobal_rank_reference = 20000000\n[coingecko]\nmax_retries = {}\n",
                retries
            ));
            assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
        }

        let config = parse_config(
            "[valuation]\nglobal_rank_reference = 20000000\n[coingecko]\nmax_retries = 10\n",
        )
        .unwrap();
        assert_eq!(config.coingecko.max_retries, 10);
    }

    #[test]
    fn test_invalid_maturity_year() {
        let result = parse_config(
            "[valuation]\nglobal_rank_reference = 20000000\n[filters]\nclass_values = [\"Apex\"]\nmaturity_years = [\"26\"]\n",
        );
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_sort_key() {
        let result = parse_config("[valuation]\nglobal_rank_reference = 1\nsort_by = \"volume\"\n");
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_legacy_sort_key_name() {
        let config =
            parse_config("[valuation]\nglobal_rank_reference = 1\nsort_by = \"price_per_vmu_usd\"\n")
                .unwrap();
        assert_eq!(config.valuation.sort_by, SortKey::PricePerUnitUsd);
    }

    #[test]
    fn test_config_to_pipeline_config() {
        let config = parse_config(&create_valid_config()).unwrap();
        let pipeline = PipelineConfig::from(&config);

        assert_eq!(pipeline.term_min, 100);
        assert_eq!(pipeline.vmu_min, 10);
        assert_eq!(pipeline.global_rank_reference, 19_960_000);
        assert_eq!(pipeline.sort_key, SortKey::Ratio);
    }

    #[test]
    fn test_blur_config_from_source_section() {
        let config = parse_config(&create_valid_config()).unwrap();
        let blur = config.blur_config();
        assert_eq!(blur.timeout, Duration::from_secs(20));
        assert_eq!(blur.collection, XENFT_COLLECTION);
    }
}
