use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::api::MarketData;
use crate::models::Candle;

const BINANCE_API_BASE: &str = "https://api.binance.com";
// Binance budgets ~1200 request-weight/min; klines and ticker cost 1-2 each,
// so 300 req/min stays comfortably inside it
const RATE_LIMIT_RPM: u32 = 300;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance spot market-data client (public endpoints, no API key needed)
///
/// Cloneable; all clones share one rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<BinanceRateLimiter>,
}

/// Response from /api/v3/ticker/price
#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[allow(dead_code)]
    symbol: String,
    price: String,
}

/// One element of the /api/v3/klines response array
///
/// Binance serializes each kline as a 12-element JSON array; prices and
/// volumes arrive as strings.
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    #[allow(dead_code)] i64, // close time (ms)
    #[allow(dead_code)] String, // quote asset volume
    #[allow(dead_code)] u64, // number of trades
    #[allow(dead_code)] String, // taker buy base volume
    #[allow(dead_code)] String, // taker buy quote volume
    #[allow(dead_code)] String, // unused field
);

/// Binance error payload, e.g. {"code":-1121,"msg":"Invalid symbol."}
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

impl BinanceClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BINANCE_API_BASE)
    }

    /// Client against a custom base URL (used by tests with a local server)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            base_url: base_url.into(),
            rate_limiter,
        })
    }

    /// Make a rate-limited API request with retry logic
    async fn make_request(&self, url: &str) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            // Wait for rate limiter
            self.rate_limiter.until_ready().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    // 429/418: Binance asks us to back off
                    if status.as_u16() == 429 || status.as_u16() == 418 {
                        let wait_secs = 2u64.pow(attempt);
                        tracing::warn!(
                            "Binance rate limit hit ({}), waiting {}s (attempt {}/{})",
                            status,
                            wait_secs,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(wait_secs)).await;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    let detail = serde_json::from_str::<ApiError>(&body)
                        .map(|e| format!("code {}: {}", e.code, e.msg))
                        .unwrap_or(body);
                    bail!("Binance API error ({}): {}", status, detail);
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(e).context("Binance request failed after retries");
                    }
                    tracing::warn!(
                        "Binance request failed (attempt {}/{}): {}",
                        attempt,
                        MAX_RETRIES,
                        e
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(attempt as u64)).await;
                }
            }
        }

        bail!("Binance request exhausted {} retries", MAX_RETRIES)
    }

    /// Current spot price from /api/v3/ticker/price
    pub async fn get_price(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);
        let response = self.make_request(&url).await?;

        let ticker: TickerPrice = response
            .json()
            .await
            .context("Failed to parse ticker response")?;

        ticker
            .price
            .parse::<f64>()
            .with_context(|| format!("Invalid price string: {}", ticker.price))
    }

    /// Up to `limit` most recent klines from /api/v3/klines, oldest first
    pub async fn get_klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );
        let response = self.make_request(&url).await?;

        let raw: Vec<RawKline> = response
            .json()
            .await
            .context("Failed to parse klines response")?;

        raw.into_iter().map(convert_kline).collect()
    }
}

fn convert_kline(raw: RawKline) -> Result<Candle> {
    let timestamp = Utc
        .timestamp_millis_opt(raw.0)
        .single()
        .with_context(|| format!("Invalid kline timestamp: {}", raw.0))?;

    Ok(Candle {
        timestamp,
        open: parse_price(&raw.1, "open")?,
        high: parse_price(&raw.2, "high")?,
        low: parse_price(&raw.3, "low")?,
        close: parse_price(&raw.4, "close")?,
        volume: parse_price(&raw.5, "volume")?,
    })
}

fn parse_price(value: &str, field: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .with_context(|| format!("Invalid kline {} value: {}", field, value))
}

#[async_trait::async_trait]
impl MarketData for BinanceClient {
    async fn fetch_current_price(&self, symbol: &str) -> Result<f64> {
        self.get_price(symbol).await
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        self.get_klines(symbol, interval, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_kline() {
        let raw = RawKline(
            1_700_000_000_000,
            "42000.10".to_string(),
            "42100.00".to_string(),
            "41900.50".to_string(),
            "42050.25".to_string(),
            "123.456".to_string(),
            1_700_000_059_999,
            "5190000.0".to_string(),
            308,
            "60.0".to_string(),
            "2520000.0".to_string(),
            "0".to_string(),
        );

        let candle = convert_kline(raw).unwrap();
        assert_eq!(candle.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(candle.open, 42000.10);
        assert_eq!(candle.high, 42100.00);
        assert_eq!(candle.low, 41900.50);
        assert_eq!(candle.close, 42050.25);
        assert_eq!(candle.volume, 123.456);
    }

    #[test]
    fn test_convert_kline_rejects_bad_price() {
        let raw = RawKline(
            1_700_000_000_000,
            "not-a-number".to_string(),
            "1".to_string(),
            "1".to_string(),
            "1".to_string(),
            "1".to_string(),
            0,
            "0".to_string(),
            0,
            "0".to_string(),
            "0".to_string(),
            "0".to_string(),
        );

        assert!(convert_kline(raw).is_err());
    }
}
