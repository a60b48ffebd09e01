use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::events::EventLogEntry;
use crate::models::{Candle, Direction, IndicatorSnapshot, Position, Ticker, TradeRecord};

/// History entries included in a snapshot.
pub const SNAPSHOT_HISTORY: usize = 40;
/// Event entries included in a snapshot.
pub const SNAPSHOT_EVENTS: usize = 60;
/// Candles embedded per position in a snapshot.
pub const SNAPSHOT_CANDLES: usize = 30;

/// Per-instrument market view for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct TickerView {
    pub price: f64,
    pub change: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
}

impl From<&Ticker> for TickerView {
    fn from(ticker: &Ticker) -> Self {
        Self {
            price: ticker.last_price,
            change: round2(ticker.change_pct_24h),
            volume: ticker.volume,
            high: ticker.high_24h,
            low: ticker.low_24h,
        }
    }
}

/// Open-position view with a truncated candle window.
#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub direction: Direction,
    pub entry: f64,
    pub current: f64,
    pub tp: f64,
    pub sl: f64,
    pub size: f64,
    pub leverage: u32,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub strategy: String,
    pub reasons: Vec<String>,
    pub indicators: IndicatorSnapshot,
    pub opened_at: DateTime<Utc>,
    pub confidence: f64,
    pub candles: Vec<Candle>,
}

impl From<&Position> for PositionView {
    fn from(position: &Position) -> Self {
        let window_start = position.candles.len().saturating_sub(SNAPSHOT_CANDLES);
        Self {
            direction: position.direction,
            entry: position.entry_price,
            current: position.current_price,
            tp: position.take_profit,
            sl: position.stop_loss,
            size: position.size,
            leverage: position.leverage,
            pnl: round2(position.pnl),
            pnl_pct: round2(position.pnl_pct),
            strategy: position.strategy.clone(),
            reasons: position.reasons.clone(),
            indicators: position.indicators.clone(),
            opened_at: position.opened_at,
            confidence: position.confidence,
            candles: position.candles[window_start..].to_vec(),
        }
    }
}

/// Read-only state view consumed by the dashboard transport.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub balance: f64,
    pub total_pnl: f64,
    pub total_pnl_pct: f64,
    pub trades: u64,
    pub wins: u64,
    pub win_rate: f64,
    pub active: usize,
    pub positions: BTreeMap<String, PositionView>,
    pub history: Vec<TradeRecord>,
    pub strategies: BTreeMap<String, f64>,
    pub coins: BTreeMap<String, TickerView>,
    pub running: bool,
    pub curve: Vec<f64>,
    pub events: Vec<EventLogEntry>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
