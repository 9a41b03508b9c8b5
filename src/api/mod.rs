pub mod binance;

pub use binance::BinanceClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Candle;

/// Read operations the engine needs from a market data provider
///
/// Implementations own transport, authentication, rate limiting and retry;
/// the engine only sees success or failure per call.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Current spot price for a symbol
    async fn fetch_current_price(&self, symbol: &str) -> Result<f64>;

    /// Up to `limit` most recent candles at `interval`, oldest first
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: usize)
        -> Result<Vec<Candle>>;
}
