use anyhow::Context;
use perpbot::api::BinanceFuturesClient;
use perpbot::config::BotConfig;
use perpbot::engine::TradingEngine;
use std::sync::Arc;
use tokio::time::Duration;

/// Period for the status summary written to the log while running.
const STATUS_LOG_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    tracing::info!("🚀 perpbot starting - simulated trading on Binance USDT perpetuals");

    let config = BotConfig::from_env();
    let market =
        Arc::new(BinanceFuturesClient::new().context("failed to build market-data client")?);

    let instruments = market.load_instruments().await;
    tracing::info!("✅ Tracking {} instruments", instruments.len());

    match market.refresh_tickers().await {
        Ok(count) => tracing::info!("✅ Seeded {} tickers", count),
        Err(e) => tracing::warn!(
            "Initial ticker refresh failed ({}), starting with an empty cache",
            e
        ),
    }

    tracing::info!("📊 Configuration:");
    tracing::info!("  Starting balance: ${:.2}", config.starting_balance);
    tracing::info!("  Max open positions: {}", config.limits.max_open_positions);
    tracing::info!(
        "  Position size: {:.0}% of balance",
        config.limits.position_size_pct * 100.0
    );
    tracing::info!("  Decision tick: {:?}", config.decision_interval);

    let engine = TradingEngine::new(market, config);
    engine.start();

    tracing::info!("Press Ctrl+C to stop...");

    let mut status = tokio::time::interval(Duration::from_secs(STATUS_LOG_SECS));
    status.tick().await; // immediate first tick carries no information

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down...");
                break;
            }
            _ = status.tick() => {
                let snapshot = engine.snapshot();
                tracing::info!(
                    "balance ${:.2} | pnl ${:.2} ({:.2}%) | {} open | {} trades | win rate {:.1}%",
                    snapshot.balance,
                    snapshot.total_pnl,
                    snapshot.total_pnl_pct,
                    snapshot.active,
                    snapshot.trades,
                    snapshot.win_rate
                );
            }
        }
    }

    engine.stop();
    tracing::info!("perpbot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "perpbot=info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
