use crate::indicators::calculate_sma;
use crate::models::{Candle, Signal};
use crate::strategy::{SignalError, Strategy};

/// Dual simple-moving-average crossover strategy
///
/// Compares the short-window SMA of closes against the long-window SMA at the
/// latest point only: short above long is bullish (Buy), short below long is
/// bearish (Sell), equal is Hold. No crossover-edge detection across history
/// and no memory of prior signals.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    short_window: usize,
    long_window: usize,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, SignalError> {
        if short_window == 0 || short_window >= long_window {
            return Err(SignalError::InvalidWindows {
                short: short_window,
                long: long_window,
            });
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }
}

impl Strategy for MaCrossover {
    fn generate_signal(&self, candles: &[Candle]) -> Result<Signal, SignalError> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let insufficient = SignalError::InsufficientHistory {
            have: candles.len(),
            need: self.long_window,
        };
        let short_ma = calculate_sma(&closes, self.short_window).ok_or(insufficient.clone())?;
        let long_ma = calculate_sma(&closes, self.long_window).ok_or(insufficient)?;

        tracing::debug!(
            "MA({}) = {:.4}, MA({}) = {:.4}",
            self.short_window,
            short_ma,
            self.long_window,
            long_ma
        );

        if short_ma > long_ma {
            Ok(Signal::Buy)
        } else if short_ma < long_ma {
            Ok(Signal::Sell)
        } else {
            Ok(Signal::Hold)
        }
    }

    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn min_candles_required(&self) -> usize {
        self.long_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_rejects_invalid_windows() {
        assert!(MaCrossover::new(0, 20).is_err());
        assert!(MaCrossover::new(20, 20).is_err());
        assert!(MaCrossover::new(21, 20).is_err());
        assert!(MaCrossover::new(5, 20).is_ok());
    }

    #[test]
    fn test_buy_when_short_ma_above_long_ma() {
        // Rising closes: recent window averages higher than the full window
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let strategy = MaCrossover::new(5, 20).unwrap();

        let signal = strategy.generate_signal(&candles_from_closes(&closes)).unwrap();
        assert_eq!(signal, Signal::Buy);
    }

    #[test]
    fn test_sell_when_short_ma_below_long_ma() {
        let closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let strategy = MaCrossover::new(5, 20).unwrap();

        let signal = strategy.generate_signal(&candles_from_closes(&closes)).unwrap();
        assert_eq!(signal, Signal::Sell);
    }

    #[test]
    fn test_hold_when_averages_equal() {
        let closes = vec![100.0; 20];
        let strategy = MaCrossover::new(5, 20).unwrap();

        let signal = strategy.generate_signal(&candles_from_closes(&closes)).unwrap();
        assert_eq!(signal, Signal::Hold);
    }

    #[test]
    fn test_insufficient_history_is_explicit() {
        // 15 candles with a long window of 20: no partial-window average
        let closes = vec![100.0; 15];
        let strategy = MaCrossover::new(5, 20).unwrap();

        let result = strategy.generate_signal(&candles_from_closes(&closes));
        assert_eq!(
            result,
            Err(SignalError::InsufficientHistory { have: 15, need: 20 })
        );
    }

    #[test]
    fn test_same_input_same_signal() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + (i % 7) as f64).collect();
        let candles = candles_from_closes(&closes);
        let strategy = MaCrossover::new(5, 20).unwrap();

        let first = strategy.generate_signal(&candles).unwrap();
        let second = strategy.generate_signal(&candles).unwrap();
        assert_eq!(first, second);
    }
}
