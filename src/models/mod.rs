use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// OHLCV candlestick data for the traded symbol
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeriesError {
    #[error("candles out of order at index {index}: {prev} >= {next}")]
    OutOfOrder {
        index: usize,
        prev: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}

/// An ordered run of candles, oldest first
///
/// Construction validates strictly increasing timestamps, so downstream
/// consumers (moving averages, chart rendering) never see duplicates or
/// out-of-order samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[0].timestamp >= pair[1].timestamp {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    prev: pair[0].timestamp,
                    next: pair[1].timestamp,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most recent candle
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }
}

/// Side of a simulated fill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Record of one simulated order execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: Uuid,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    /// Set on sells only: (exit - entry) * quantity
    pub realized_pnl: Option<f64>,
}
