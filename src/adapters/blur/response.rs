//! Blur collection-tokens response handling
//!
//! The endpoint answers with `{"success": true, "tokens": [...], ...}` or, when
//! blocked or throttled, an error payload without `tokens`. Individual token
//! objects that fail to decode are skipped.

use serde_json::Value;

use crate::domain::RawListing;
use crate::ports::ListingError;

/// Decode a response body into listings
pub fn parse_tokens_response(body: &str) -> Result<Vec<RawListing>, ListingError> {
    let document: Value = serde_json::from_str(body).map_err(|e| ListingError::MissingTokens {
        raw: format!("{} (invalid JSON: {})", body, e),
    })?;

    let tokens = document
        .get("tokens")
        .and_then(Value::as_array)
        .ok_or_else(|| ListingError::MissingTokens {
            raw: document.to_string(),
        })?;

    let mut listings = Vec::with_capacity(tokens.len());
    for token in tokens {
        match serde_json::from_value::<RawListing>(token.clone()) {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                tracing::debug!("Skipping undecodable token entry: {}", e);
            }
        }
    }

    tracing::info!("Decoded {} of {} listed tokens", listings.len(), tokens.len());
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let body = r#"{
            "success": true,
            "totalCount": 2,
            "tokens": [
                {"tokenId": "1", "traits": {"Term": "150"}, "price": {"amount": "0.1", "unit": "ETH"}},
                {"tokenId": "2", "traits": {"Term": "200"}, "price": null}
            ]
        }"#;
        let listings = parse_tokens_response(body).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].token_id, "1");
        assert!(listings[1].price.is_none());
    }

    #[test]
    fn test_missing_tokens_key_keeps_raw_payload() {
        let body = r#"{"success":false,"message":"Too many requests"}"#;
        match parse_tokens_response(body) {
            Err(ListingError::MissingTokens { raw }) => assert!(raw.contains("Too many requests")),
            other => panic!("expected MissingTokens, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body() {
        let body = "<html>Just a moment...</html>";
        match parse_tokens_response(body) {
            Err(ListingError::MissingTokens { raw }) => assert!(raw.contains("Just a moment")),
            other => panic!("expected MissingTokens, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_tokens_are_skipped() {
        let body = r#"{"tokens": [{"name": "no id"}, {"tokenId": "9"}]}"#;
        let listings = parse_tokens_response(body).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].token_id, "9");
    }

    #[test]
    fn test_empty_tokens() {
        assert!(parse_tokens_response(r#"{"tokens": []}"#).unwrap().is_empty());
    }
}
