use crossbot::api::{BinanceClient, MarketData};
use crossbot::config::Config;
use crossbot::engine::{Engine, FetchStage, TickOutcome};
use crossbot::models::TradeSide;
use crossbot::portfolio::{NoActionReason, OrderOutcome};
use crossbot::strategy::{MaCrossover, Strategy};
use crossbot::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    tracing::info!("🚀 CrossBot starting - dual-MA crossover paper trader");

    let config = Config::from_env()?;
    log_configuration(&config);

    let client = BinanceClient::new()?;
    let strategy = MaCrossover::new(config.short_window, config.long_window)?;
    let tick_interval = Duration::from_secs(config.tick_interval_secs);
    let mut engine = Engine::new(config, client, strategy);

    // Skip, never burst: a slow tick must not be followed by a catch-up tick
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!("Ticking every {:?}. Press Ctrl+C to stop...\n", tick_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = engine.tick().await;
                log_tick(&engine, &outcome);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    log_run_summary(&engine);
    tracing::info!("👋 CrossBot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crossbot=info".into()),
        )
        .init();
}

fn log_configuration(config: &Config) {
    tracing::info!("📊 Configuration:");
    tracing::info!("  Symbol: {}", config.symbol);
    tracing::info!(
        "  Windows: MA({}) / MA({}) on {} candles",
        config.short_window,
        config.long_window,
        config.candle_interval
    );
    tracing::info!("  Order Quantity: {}", config.order_quantity);
    tracing::info!("  Initial Balance: {:.2}", config.initial_balance);
    tracing::info!("  Execution Pricing: {:?}", config.execution_pricing);
}

/// Per-tick status: price, balances, portfolio value and what the tick did
///
/// Output only; nothing here feeds back into the next decision.
fn log_tick<D: MarketData, S: Strategy>(engine: &Engine<D, S>, outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Decided(order) => {
            match order {
                OrderOutcome::Filled(trade) => match trade.side {
                    TradeSide::Buy => tracing::info!(
                        "✅ Simulated BUY: {} @ {:.2}",
                        trade.quantity,
                        trade.price
                    ),
                    TradeSide::Sell => tracing::info!(
                        "✅ Simulated SELL: {} @ {:.2} | PnL: {:.2}",
                        trade.quantity,
                        trade.price,
                        trade.realized_pnl.unwrap_or(0.0)
                    ),
                },
                OrderOutcome::InsufficientFunds { required, available } => tracing::warn!(
                    "💸 Insufficient funds: need {:.2}, have {:.2}",
                    required,
                    available
                ),
                OrderOutcome::NoAction(reason) => {
                    let text = match reason {
                        NoActionReason::Hold => "hold signal",
                        NoActionReason::AlreadyInPosition => "buy signal while in position",
                        NoActionReason::NoOpenPosition => "sell signal with no position",
                    };
                    tracing::info!("➖ No action ({})", text);
                }
            }
            log_portfolio(engine);
        }
        TickOutcome::InsufficientHistory { have, need } => {
            tracing::info!("⏳ Collecting data... ({}/{} candles)", have, need);
            log_portfolio(engine);
        }
        TickOutcome::DataUnavailable { stage, reason } => {
            let what = match stage {
                FetchStage::Candles => "candle fetch",
                FetchStage::ExecutionPrice => "execution price fetch",
            };
            tracing::warn!("✗ Tick skipped, {} failed: {}", what, reason);
        }
    }
}

fn log_portfolio<D: MarketData, S: Strategy>(engine: &Engine<D, S>) {
    let portfolio = engine.portfolio();
    if let Some(&price) = engine.price_history().last() {
        tracing::info!(
            "  Price: {:.2} | Cash: {:.4} | Holdings: {} | Value: {:.4}",
            price,
            portfolio.cash(),
            portfolio.holdings(),
            portfolio.value(price)
        );
    }
}

fn log_run_summary<D: MarketData, S: Strategy>(engine: &Engine<D, S>) {
    let portfolio = engine.portfolio();
    let realized: f64 = portfolio
        .trades()
        .iter()
        .filter_map(|t| t.realized_pnl)
        .sum();

    tracing::info!("\n📊 Run Summary:");
    tracing::info!("  Ticks observed: {}", engine.price_history().len());
    tracing::info!("  Trades executed: {}", portfolio.trades().len());
    tracing::info!("  Realized PnL: {:.4}", realized);
    if let Some(&last) = engine.price_history().last() {
        tracing::info!("  Final Value: {:.4}", portfolio.value(last));
    }
}
