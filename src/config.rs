use std::str::FromStr;
use std::time::Duration;

use crate::risk::TradeLimits;

/// Runtime configuration, read once at startup.
///
/// Every field has a production default; `PERPBOT_*` environment
/// variables (usually via `.env`) override individual values. Malformed
/// values fall back to the default rather than aborting startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Paper-account starting balance in quote currency.
    pub starting_balance: f64,
    /// Main decision-loop period.
    pub decision_interval: Duration,
    /// Price-cache refresh period.
    pub price_refresh_interval: Duration,
    /// 24h-ticker refresh period.
    pub ticker_refresh_interval: Duration,
    /// Entry scans run on every Nth decision tick.
    pub scan_every_ticks: u64,
    /// Instruments sampled per entry scan.
    pub scan_batch_size: usize,
    /// Candle interval requested from the exchange.
    pub candle_interval: String,
    /// Candles requested per fetch.
    pub candle_limit: usize,
    /// Minimum candles required before an instrument is scored.
    pub min_candles: usize,
    pub event_log_capacity: usize,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when unset.
    pub rng_seed: Option<u64>,
    pub limits: TradeLimits,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            decision_interval: Duration::from_secs(3),
            price_refresh_interval: Duration::from_secs(6),
            ticker_refresh_interval: Duration::from_secs(25),
            scan_every_ticks: 5,
            scan_batch_size: 4,
            candle_interval: "5m".to_string(),
            candle_limit: 60,
            min_candles: 30,
            event_log_capacity: 300,
            rng_seed: None,
            limits: TradeLimits::default(),
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_parse("PERPBOT_STARTING_BALANCE") {
            config.starting_balance = value;
        }
        if let Some(secs) = env_parse("PERPBOT_DECISION_INTERVAL_SECS") {
            config.decision_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse("PERPBOT_PRICE_REFRESH_SECS") {
            config.price_refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse("PERPBOT_TICKER_REFRESH_SECS") {
            config.ticker_refresh_interval = Duration::from_secs(secs);
        }
        if let Some(value) = env_parse("PERPBOT_MAX_POSITIONS") {
            config.limits.max_open_positions = value;
        }
        if let Some(value) = env_parse("PERPBOT_POSITION_SIZE_PCT") {
            config.limits.position_size_pct = value;
        }
        if let Some(value) = env_parse("PERPBOT_RNG_SEED") {
            config.rng_seed = Some(value);
        }

        config
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}
