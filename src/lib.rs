// Core modules
pub mod api;
pub mod config;
pub mod engine;
pub mod indicators;
pub mod models;
pub mod portfolio;
pub mod strategy;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Engine, TickOutcome};
pub use models::{Candle, CandleSeries, Signal};
pub use portfolio::{OrderOutcome, Portfolio};
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
