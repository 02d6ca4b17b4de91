//! Raw Listing
//!
//! One marketplace listing as it arrives from the listing source, before any
//! screening. Trait values are kept as strings; parsing happens in the pipeline
//! so that malformed values become rejections rather than decode failures.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Trait holding the XENFT term in days
pub const TRAIT_TERM: &str = "Term";
/// Trait holding the maturity timestamp
pub const TRAIT_MATURITY: &str = "Maturity DateTime";
/// Trait holding the number of virtual mining units
pub const TRAIT_VMUS: &str = "VMUs";
/// Trait holding the reward amplifier
pub const TRAIT_AMP: &str = "AMP";
/// Trait holding the cRank at mint time
pub const TRAIT_CRANK: &str = "cRank";
/// Trait holding the XENFT class label
pub const TRAIT_CLASS: &str = "Class";
/// Trait used by the marketplace to filter by maturity year
pub const TRAIT_MATURITY_YEAR: &str = "Maturity Year";

/// Listing price, denominated in ETH
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPrice {
    /// Decimal amount as sent by the marketplace (e.g. "0.0425")
    pub amount: String,
    /// Currency unit, usually "ETH"
    #[serde(default)]
    pub unit: Option<String>,
}

impl ListingPrice {
    pub fn eth(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            unit: Some("ETH".to_string()),
        }
    }
}

/// A single NFT listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(rename = "tokenId", deserialize_with = "string_or_number")]
    pub token_id: String,
    #[serde(default, deserialize_with = "stringified_traits")]
    pub traits: BTreeMap<String, String>,
    #[serde(default)]
    pub price: Option<ListingPrice>,
}

impl RawListing {
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            traits: BTreeMap::new(),
            price: None,
        }
    }

    /// Builder: set a trait value
    pub fn with_trait(mut self, name: &str, value: impl Into<String>) -> Self {
        self.traits.insert(name.to_string(), value.into());
        self
    }

    /// Builder: set the ETH price
    pub fn with_price(mut self, amount: impl Into<String>) -> Self {
        self.price = Some(ListingPrice::eth(amount));
        self
    }

    pub fn trait_value(&self, name: &str) -> Option<&str> {
        self.traits.get(name).map(String::as_str)
    }

    /// Class label, trimmed; "Unknown" when absent
    pub fn class_label(&self) -> String {
        self.trait_value(TRAIT_CLASS)
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Traits occasionally come back as numbers; nulls and nested values are dropped.
fn stringified_traits<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name, s)),
            Value::Number(n) => Some((name, n.to_string())),
            Value::Bool(b) => Some((name, b.to_string())),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_marketplace_token() {
        let token = json!({
            "tokenId": "10452",
            "name": "XENFT #10452",
            "traits": {
                "Class": "Limited+++ ",
                "Term": "420",
                "VMUs": 64,
                "AMP": "2",
                "cRank": "1234567",
                "Maturity DateTime": "Mar 14, 2026 09:30 UTC",
                "Burned": null
            },
            "price": { "amount": "0.0425", "unit": "ETH", "marketplace": "BLUR" }
        });

        let listing: RawListing = serde_json::from_value(token).unwrap();
        assert_eq!(listing.token_id, "10452");
        assert_eq!(listing.trait_value(TRAIT_VMUS), Some("64"));
        assert_eq!(listing.trait_value("Burned"), None);
        assert_eq!(listing.class_label(), "Limited+++");
        assert_eq!(listing.price.unwrap().amount, "0.0425");
    }

    #[test]
    fn test_numeric_token_id_and_missing_price() {
        let listing: RawListing =
            serde_json::from_value(json!({ "tokenId": 77, "traits": {}, "price": null })).unwrap();
        assert_eq!(listing.token_id, "77");
        assert!(listing.price.is_none());
        assert_eq!(listing.class_label(), "Unknown");
    }

    #[test]
    fn test_builder() {
        let listing = RawListing::new("1")
            .with_trait(TRAIT_TERM, "150")
            .with_price("1.0");
        assert_eq!(listing.trait_value(TRAIT_TERM), Some("150"));
        assert_eq!(listing.price, Some(ListingPrice::eth("1.0")));
    }
}
