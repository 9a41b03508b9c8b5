// Trading strategy module
pub mod crossover;

use thiserror::Error;

use crate::models::{Candle, Signal};

pub use crossover::MaCrossover;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignalError {
    #[error("insufficient history: have {have} candles, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("invalid windows: short ({short}) must be positive and less than long ({long})")]
    InvalidWindows { short: usize, long: usize },
}

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal based on market data
    ///
    /// Pure with respect to portfolio state: the same candles always yield
    /// the same signal.
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal, SignalError>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
