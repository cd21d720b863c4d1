use std::collections::HashMap;

/// Result of a `/simple/price` style lookup: coin id -> quote currency -> price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, HashMap<String, f64>>,
}

impl PriceTable {
    pub fn from_map(prices: HashMap<String, HashMap<String, f64>>) -> Self {
        Self { prices }
    }

    /// Price of `id` expressed in `quote`, if the provider returned it.
    pub fn price_of(&self, id: &str, quote: &str) -> Option<f64> {
        self.prices.get(id).and_then(|quotes| quotes.get(quote)).copied()
    }

}

/// 24h market statistics for a single coin.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketStats {
    pub id: String,
    pub price: f64,
    pub change_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub volume_24h: Option<f64>,
}
