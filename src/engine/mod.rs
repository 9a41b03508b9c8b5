// Strategy loop: per-tick pipeline from market data to portfolio mutation

use crate::api::MarketData;
use crate::config::{Config, ExecutionPricing};
use crate::models::{Candle, CandleSeries};
use crate::portfolio::{OrderOutcome, Portfolio};
use crate::strategy::Strategy;

/// Which external read failed during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Candle series fetch at the start of the tick; nothing was mutated
    /// and no history entry was appended
    Candles,
    /// Spot price fetch for order execution; the transition was aborted but
    /// the observed close was still appended to history
    ExecutionPrice,
}

/// Outcome of one tick, one variant per distinguishable result
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The decision step ran; the order outcome says what the portfolio did
    Decided(OrderOutcome),
    /// Too few candles for the long window; decision step skipped
    InsufficientHistory { have: usize, need: usize },
    /// An external read failed; the tick degraded per `stage`
    DataUnavailable { stage: FetchStage, reason: String },
}

/// Owns the portfolio and history and advances them one tick at a time
///
/// Single writer: all mutation happens inside `tick`, which the caller runs
/// one at a time. Readers (status logging, chart rendering) use the accessors
/// between ticks.
pub struct Engine<D: MarketData, S: Strategy> {
    data: D,
    strategy: S,
    config: Config,
    portfolio: Portfolio,
    price_history: Vec<f64>,
    value_history: Vec<f64>,
    latest_series: CandleSeries,
}

impl<D: MarketData, S: Strategy> Engine<D, S> {
    pub fn new(config: Config, data: D, strategy: S) -> Self {
        let portfolio = Portfolio::new(config.initial_balance, config.order_quantity);
        Self {
            data,
            strategy,
            config,
            portfolio,
            price_history: Vec::new(),
            value_history: Vec::new(),
            latest_series: CandleSeries::default(),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Observed close per tick, append-only
    pub fn price_history(&self) -> &[f64] {
        &self.price_history
    }

    /// Total portfolio value per tick, parallel to `price_history`
    pub fn value_history(&self) -> &[f64] {
        &self.value_history
    }

    /// Latest fetched candle series, for chart consumers
    pub fn latest_candles(&self) -> &[Candle] {
        self.latest_series.as_slice()
    }

    /// Run one tick: fetch candles, classify, transition, append history
    pub async fn tick(&mut self) -> TickOutcome {
        let candles = match self
            .data
            .fetch_candles(
                &self.config.symbol,
                &self.config.candle_interval,
                self.config.long_window,
            )
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                return TickOutcome::DataUnavailable {
                    stage: FetchStage::Candles,
                    reason: e.to_string(),
                }
            }
        };

        // A provider that hands back unordered candles is as unusable as a
        // failed fetch
        let series = match CandleSeries::new(candles) {
            Ok(series) => series,
            Err(e) => {
                return TickOutcome::DataUnavailable {
                    stage: FetchStage::Candles,
                    reason: e.to_string(),
                }
            }
        };

        let latest_close = match series.last() {
            Some(candle) => candle.close,
            None => {
                return TickOutcome::DataUnavailable {
                    stage: FetchStage::Candles,
                    reason: "empty candle series".to_string(),
                }
            }
        };

        let have = series.len();
        let need = self.strategy.min_candles_required();
        if have < need {
            self.record(latest_close, series);
            return TickOutcome::InsufficientHistory { have, need };
        }

        let signal = match self.strategy.generate_signal(series.as_slice()) {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!("{} produced no signal: {}", self.strategy.name(), e);
                self.record(latest_close, series);
                return TickOutcome::InsufficientHistory { have, need };
            }
        };

        let outcome = if self.portfolio.transition_pending(signal) {
            match self.execution_price(latest_close).await {
                Ok(price) => self.portfolio.apply(signal, price),
                Err(reason) => {
                    self.record(latest_close, series);
                    return TickOutcome::DataUnavailable {
                        stage: FetchStage::ExecutionPrice,
                        reason,
                    };
                }
            }
        } else {
            // No transition possible, no execution price needed
            self.portfolio.apply(signal, latest_close)
        };

        self.record(latest_close, series);
        TickOutcome::Decided(outcome)
    }

    async fn execution_price(&self, latest_close: f64) -> Result<f64, String> {
        match self.config.execution_pricing {
            ExecutionPricing::LastClose => Ok(latest_close),
            ExecutionPricing::SpotTicker => self
                .data
                .fetch_current_price(&self.config.symbol)
                .await
                .map_err(|e| e.to_string()),
        }
    }

    fn record(&mut self, latest_close: f64, series: CandleSeries) {
        self.price_history.push(latest_close);
        self.value_history.push(self.portfolio.value(latest_close));
        self.latest_series = series;
    }
}
