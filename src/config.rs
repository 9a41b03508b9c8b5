use std::env;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("SHORT_WINDOW ({short}) must be positive and less than LONG_WINDOW ({long})")]
    InvalidWindows { short: usize, long: usize },

    #[error("{var} must be positive, got {value}")]
    NonPositive { var: String, value: f64 },

    #[error("TICK_INTERVAL_SECS must be nonzero")]
    ZeroTickInterval,
}

/// Where the execution price for a transition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPricing {
    /// Fresh /ticker/price read at the moment of the transition (default,
    /// matches live order behavior more closely)
    SpotTicker,
    /// Reuse the latest close of the candle series just fetched; one fewer
    /// external call per trade
    LastClose,
}

/// Process configuration, fixed for the lifetime of the run
#[derive(Debug, Clone)]
pub struct Config {
    pub symbol: String,
    pub short_window: usize,
    pub long_window: usize,
    pub order_quantity: f64,
    pub initial_balance: f64,
    pub tick_interval_secs: u64,
    pub candle_interval: String,
    pub execution_pricing: ExecutionPricing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            short_window: 5,
            long_window: 20,
            order_quantity: 0.001,
            initial_balance: 100.0,
            tick_interval_secs: 60,
            candle_interval: "1m".to_string(),
            execution_pricing: ExecutionPricing::SpotTicker,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            symbol: env::var("SYMBOL").unwrap_or(defaults.symbol),
            short_window: parse_var("SHORT_WINDOW", defaults.short_window)?,
            long_window: parse_var("LONG_WINDOW", defaults.long_window)?,
            order_quantity: parse_var("ORDER_QUANTITY", defaults.order_quantity)?,
            initial_balance: parse_var("INITIAL_BALANCE", defaults.initial_balance)?,
            tick_interval_secs: parse_var("TICK_INTERVAL_SECS", defaults.tick_interval_secs)?,
            candle_interval: env::var("CANDLE_INTERVAL").unwrap_or(defaults.candle_interval),
            execution_pricing: parse_execution_pricing()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.short_window == 0 || self.short_window >= self.long_window {
            return Err(ConfigError::InvalidWindows {
                short: self.short_window,
                long: self.long_window,
            });
        }
        if self.order_quantity <= 0.0 {
            return Err(ConfigError::NonPositive {
                var: "ORDER_QUANTITY".to_string(),
                value: self.order_quantity,
            });
        }
        if self.initial_balance <= 0.0 {
            return Err(ConfigError::NonPositive {
                var: "INITIAL_BALANCE".to_string(),
                value: self.initial_balance,
            });
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_execution_pricing() -> Result<ExecutionPricing, ConfigError> {
    match env::var("EXECUTION_PRICING") {
        Ok(raw) => match raw.as_str() {
            "spot" => Ok(ExecutionPricing::SpotTicker),
            "last-close" => Ok(ExecutionPricing::LastClose),
            _ => Err(ConfigError::InvalidValue {
                var: "EXECUTION_PRICING".to_string(),
                value: raw,
            }),
        },
        Err(_) => Ok(ExecutionPricing::SpotTicker),
    }
}
