//! CoinGecko market-data client
//!
//! One HTTP round trip per lookup, bounded by an explicit timeout.
//! No retries, no caching: the bot serves low-frequency interactive
//! queries, not a hot path.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::application::errors::{BotError, LookupError};
use crate::domain::entities::{MarketStats, PriceTable};
use crate::domain::traits::QuoteSource;

/// CoinGecko price lookup client
pub struct CoinGeckoClient {
    base_url: String,
    client: Client,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Network(short_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Network(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| LookupError::Network(short_reqwest_error(&e)))
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoClient {
    async fn simple_price(
        &self,
        ids: &[&str],
        quotes: &[&str],
    ) -> Result<PriceTable, LookupError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            quotes.join(","),
        );
        tracing::debug!(%url, "price lookup");

        let body = self.get_text(&url).await?;
        parse_simple_price(&body, ids)
    }

    async fn market_stats(&self, id: &str, quote: &str) -> Result<MarketStats, LookupError> {
        let url = format!(
            "{}/coins/markets?vs_currency={}&ids={}",
            self.base_url, quote, id,
        );
        tracing::debug!(%url, "market stats lookup");

        let body = self.get_text(&url).await?;
        parse_market_stats(&body, id)
    }
}

/// Keep user-visible diagnostics short; full reqwest errors chain URLs and
/// source errors we do not want echoed into chat replies.
fn short_reqwest_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        "request failed".to_string()
    }
}

/// Parse a `/simple/price` body. Missing or empty symbol keys mean the
/// provider does not know the id; a body that is not an object of numeric
/// quote maps is a schema mismatch.
fn parse_simple_price(body: &str, ids: &[&str]) -> Result<PriceTable, LookupError> {
    let prices: HashMap<String, HashMap<String, f64>> = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(format!("unexpected shape: {}", e)))?;

    for id in ids {
        match prices.get(*id) {
            Some(quotes) if !quotes.is_empty() => {}
            _ => return Err(LookupError::UnknownSymbol(id.to_string())),
        }
    }

    Ok(PriceTable::from_map(prices))
}

#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    high_24h: Option<f64>,
    low_24h: Option<f64>,
    total_volume: Option<f64>,
}

/// Parse a `/coins/markets` body for a single requested id. An empty array
/// means the id is unknown; a row without a price is a schema mismatch.
fn parse_market_stats(body: &str, id: &str) -> Result<MarketStats, LookupError> {
    let rows: Vec<MarketRow> = serde_json::from_str(body)
        .map_err(|e| LookupError::MalformedResponse(format!("unexpected shape: {}", e)))?;

    let row = rows
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| LookupError::UnknownSymbol(id.to_string()))?;

    let price = row
        .current_price
        .ok_or_else(|| LookupError::MalformedResponse("missing current_price".to_string()))?;

    Ok(MarketStats {
        id: row.id,
        price,
        change_24h: row.price_change_percentage_24h,
        high_24h: row.high_24h,
        low_24h: row.low_24h,
        volume_24h: row.total_volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_price_parses_known_symbols() {
        let body = r#"{"bitcoin":{"usd":60000.5,"inr":5000000.0},"ethereum":{"usd":3000.0}}"#;
        let table = parse_simple_price(body, &["bitcoin", "ethereum"]).unwrap();

        assert_eq!(table.price_of("bitcoin", "usd"), Some(60000.5));
        assert_eq!(table.price_of("bitcoin", "inr"), Some(5000000.0));
        assert_eq!(table.price_of("ethereum", "inr"), None);
    }

    #[test]
    fn simple_price_missing_key_is_unknown_symbol() {
        let body = r#"{"bitcoin":{"usd":60000.5}}"#;
        let err = parse_simple_price(body, &["bitcoin", "notacoin"]).unwrap_err();
        assert!(matches!(err, LookupError::UnknownSymbol(id) if id == "notacoin"));
    }

    #[test]
    fn simple_price_empty_object_is_unknown_symbol() {
        // CoinGecko answers unknown ids with an empty object under the key
        let body = r#"{"notacoin":{}}"#;
        let err = parse_simple_price(body, &["notacoin"]).unwrap_err();
        assert!(matches!(err, LookupError::UnknownSymbol(_)));
    }

    #[test]
    fn simple_price_non_numeric_values_are_malformed() {
        let body = r#"{"bitcoin":{"usd":"sixty thousand"}}"#;
        let err = parse_simple_price(body, &["bitcoin"]).unwrap_err();
        assert!(matches!(err, LookupError::MalformedResponse(_)));

        let err = parse_simple_price("<html>rate limited</html>", &["bitcoin"]).unwrap_err();
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }

    #[test]
    fn market_stats_parses_full_row() {
        let body = r#"[{
            "id": "bitcoin",
            "current_price": 60123.45,
            "price_change_percentage_24h": -1.25,
            "high_24h": 61000.0,
            "low_24h": 59000.0,
            "total_volume": 31000000000.0
        }]"#;
        let stats = parse_market_stats(body, "bitcoin").unwrap();

        assert_eq!(stats.price, 60123.45);
        assert_eq!(stats.change_24h, Some(-1.25));
        assert_eq!(stats.high_24h, Some(61000.0));
        assert_eq!(stats.low_24h, Some(59000.0));
        assert_eq!(stats.volume_24h, Some(31000000000.0));
    }

    #[test]
    fn market_stats_tolerates_null_optionals() {
        let body = r#"[{"id":"bitcoin","current_price":60123.45,
            "price_change_percentage_24h":null,"high_24h":null,
            "low_24h":null,"total_volume":null}]"#;
        let stats = parse_market_stats(body, "bitcoin").unwrap();

        assert_eq!(stats.price, 60123.45);
        assert_eq!(stats.change_24h, None);
    }

    #[test]
    fn market_stats_empty_array_is_unknown_symbol() {
        let err = parse_market_stats("[]", "notacoin").unwrap_err();
        assert!(matches!(err, LookupError::UnknownSymbol(_)));
    }

    #[test]
    fn market_stats_missing_price_is_malformed() {
        let body = r#"[{"id":"bitcoin","current_price":null}]"#;
        let err = parse_market_stats(body, "bitcoin").unwrap_err();
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }
}
