use crate::application::errors::LookupError;
use crate::domain::entities::{MarketStats, PriceTable};
use async_trait::async_trait;

/// QuoteSource trait - abstraction for the external market-data provider.
///
/// Every call is an independent network round trip: no retries, no caching.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Look up the price of each coin id in each quote currency.
    async fn simple_price(&self, ids: &[&str], quotes: &[&str])
        -> Result<PriceTable, LookupError>;

    /// Look up 24h market statistics for a single coin id.
    async fn market_stats(&self, id: &str, quote: &str) -> Result<MarketStats, LookupError>;
}
