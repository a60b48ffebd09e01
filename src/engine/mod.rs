// The process-wide scheduler: decision ticks, background market-data
// refresh cadences, and snapshot assembly for the control surface.
pub mod analyzer;
pub mod candle_cache;
pub mod events;
pub mod snapshot;

pub use analyzer::MarketAnalyzer;
pub use events::{EventLevel, EventLog, EventLogEntry};
pub use snapshot::{EngineSnapshot, PositionView, TickerView};

use anyhow::anyhow;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::MissedTickBehavior;

use crate::api::BinanceFuturesClient;
use crate::config::BotConfig;
use crate::execution::PositionManager;
use snapshot::{round2, SNAPSHOT_EVENTS, SNAPSHOT_HISTORY};

/// Composition of the market client, analyzer, position manager, and
/// event log, driven by three periodic loops.
///
/// Exposes the control surface consumed by the dashboard transport:
/// `start` / `stop` (both idempotent) and `snapshot` (safe at any time,
/// including while stopped).
///
/// Concurrency contract: the position aggregate is only mutated under
/// its mutex from the decision loop, and the mutex is never held across
/// an await. The background refresh loops touch nothing but the market
/// client's own caches.
pub struct TradingEngine {
    market: Arc<BinanceFuturesClient>,
    analyzer: Arc<MarketAnalyzer>,
    positions: Arc<Mutex<PositionManager>>,
    events: Arc<Mutex<EventLog>>,
    running: Arc<AtomicBool>,
    config: Arc<BotConfig>,
}

impl TradingEngine {
    pub fn new(market: Arc<BinanceFuturesClient>, config: BotConfig) -> Self {
        let config = Arc::new(config);
        Self {
            analyzer: Arc::new(MarketAnalyzer::new(market.clone(), config.clone())),
            positions: Arc::new(Mutex::new(PositionManager::new(
                config.starting_balance,
                config.limits.clone(),
            ))),
            events: Arc::new(Mutex::new(EventLog::new(config.event_log_capacity))),
            running: Arc::new(AtomicBool::new(false)),
            market,
            config,
        }
    }

    /// Begin the scheduler loops. A no-op when already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("start ignored, engine already running");
            return;
        }

        self.events
            .lock()
            .unwrap()
            .push(EventLevel::Success, "Engine started");
        tracing::info!(
            "Engine started (decision tick {:?}, price refresh {:?}, ticker refresh {:?})",
            self.config.decision_interval,
            self.config.price_refresh_interval,
            self.config.ticker_refresh_interval
        );

        self.spawn_price_loop();
        self.spawn_ticker_loop();
        self.spawn_decision_loop();
    }

    /// Halt the scheduler loops. Cooperative: each loop observes the
    /// cleared flag at its next iteration boundary. A no-op when already
    /// stopped.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.events
            .lock()
            .unwrap()
            .push(EventLevel::Warn, "Engine stopped");
        tracing::info!("Engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Assemble a consistent read-only state view.
    ///
    /// Position, account, and strategy fields are read under the same
    /// lock that serializes mutation, so the view is a point-in-time
    /// one. Never mutates owned state.
    pub fn snapshot(&self) -> EngineSnapshot {
        let coins: BTreeMap<String, TickerView> = self
            .market
            .tickers()
            .iter()
            .map(|(symbol, ticker)| (symbol.clone(), TickerView::from(ticker)))
            .collect();

        let events = self.events.lock().unwrap().recent(SNAPSHOT_EVENTS);

        let pm = self.positions.lock().unwrap();

        let positions: BTreeMap<String, PositionView> = pm
            .positions()
            .iter()
            .map(|(symbol, position)| (symbol.clone(), PositionView::from(position)))
            .collect();

        let strategies: BTreeMap<String, f64> = pm
            .weights()
            .iter()
            .map(|(label, weight)| (label.to_string(), weight))
            .collect();

        EngineSnapshot {
            balance: round2(pm.balance()),
            total_pnl: round2(pm.total_pnl()),
            total_pnl_pct: round2(pm.total_pnl() / pm.starting_balance() * 100.0),
            trades: pm.trades(),
            wins: pm.wins(),
            win_rate: pm.win_rate(),
            active: pm.open_count(),
            positions,
            history: pm.history().iter().take(SNAPSHOT_HISTORY).cloned().collect(),
            strategies,
            coins,
            running: self.is_running(),
            curve: pm.equity_curve().iter().map(|b| round2(*b)).collect(),
            events,
        }
    }

    fn spawn_price_loop(&self) {
        let market = self.market.clone();
        let running = self.running.clone();
        let period = self.config.price_refresh_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = market.refresh_prices().await {
                    tracing::warn!("price refresh failed, keeping cached values: {}", e);
                }
            }
            tracing::debug!("price refresh loop exited");
        });
    }

    fn spawn_ticker_loop(&self) {
        let market = self.market.clone();
        let running = self.running.clone();
        let period = self.config.ticker_refresh_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = market.refresh_tickers().await {
                    tracing::warn!("ticker refresh failed, keeping cached values: {}", e);
                }
            }
            tracing::debug!("ticker refresh loop exited");
        });
    }

    fn spawn_decision_loop(&self) {
        let market = self.market.clone();
        let analyzer = self.analyzer.clone();
        let positions = self.positions.clone();
        let events = self.events.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.decision_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                // One bad tick never kills the loop; only stop() does.
                if let Err(e) =
                    run_tick(&market, &analyzer, &positions, &events, &config, &mut rng, tick)
                        .await
                {
                    tracing::warn!("decision tick failed: {:#}", e);
                }
                tick += 1;
            }
            tracing::debug!("decision loop exited");
        });
    }
}

/// One decision-loop iteration: mark open positions to market, then on
/// scan ticks probe a random instrument batch for entries.
async fn run_tick(
    market: &BinanceFuturesClient,
    analyzer: &MarketAnalyzer,
    positions: &Mutex<PositionManager>,
    events: &Mutex<EventLog>,
    config: &BotConfig,
    rng: &mut StdRng,
    tick: u64,
) -> anyhow::Result<()> {
    let prices = market.prices();

    let closed = positions
        .lock()
        .map_err(|_| anyhow!("position state poisoned"))?
        .update(&prices);

    if !closed.is_empty() {
        let mut log = events.lock().map_err(|_| anyhow!("event log poisoned"))?;
        for record in &closed {
            log.push(
                if record.won {
                    EventLevel::Success
                } else {
                    EventLevel::Warn
                },
                format!(
                    "{} {} closed ({}) | ${:.2} ({:.2}%)",
                    record.symbol, record.direction, record.reason, record.pnl, record.pnl_pct
                ),
            );
        }
    }

    if tick % config.scan_every_ticks != 0 {
        return Ok(());
    }

    let instruments = market.instruments();
    if instruments.is_empty() {
        return Ok(());
    }

    let batch: Vec<String> = instruments
        .choose_multiple(rng, config.scan_batch_size.min(instruments.len()))
        .cloned()
        .collect();

    let (open_symbols, mut open_count, weights) = {
        let pm = positions
            .lock()
            .map_err(|_| anyhow!("position state poisoned"))?;
        (pm.open_symbols(), pm.open_count(), pm.weights().clone())
    };

    for symbol in batch {
        if open_count >= config.limits.max_open_positions {
            break;
        }

        let Some(signal) = analyzer.decide(&symbol, &open_symbols, &weights, rng).await else {
            continue;
        };

        let summary = format!(
            "{} {} @ ${:.4} | conf {:.0}% | {}",
            signal.symbol,
            signal.direction,
            signal.price,
            signal.confidence,
            signal
                .reasons
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );

        let opened = positions
            .lock()
            .map_err(|_| anyhow!("position state poisoned"))?
            .open(signal);
        if opened {
            open_count += 1;
            events
                .lock()
                .map_err(|_| anyhow!("event log poisoned"))?
                .push(EventLevel::Trade, summary);
        }
    }

    Ok(())
}
