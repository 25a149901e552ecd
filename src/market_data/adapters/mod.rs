// Shared trait for upstream market data providers

use crate::market_data::error::MarketDataError;
use crate::market_data::types::{Asset, GlobalStats};

/// One upstream provider. Implementations are stateless apart from their
/// HTTP client and issue exactly one request per call (no retries).
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Top `limit` assets ordered by market cap, highest first.
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<Asset>, MarketDataError>;

    async fn fetch_asset_by_id(&self, id: &str) -> Result<Asset, MarketDataError>;

    async fn fetch_global_stats(&self) -> Result<GlobalStats, MarketDataError>;
}

pub mod coingecko;
pub mod coingecko_types;
