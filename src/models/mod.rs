use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One OHLCV bar for a fixed interval.
///
/// Serialized with compact single-letter keys because candle windows are
/// embedded into the status snapshot in bulk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time in milliseconds since epoch.
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

/// 24h rolling statistics for one instrument, overwritten by refresh cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ticker {
    pub last_price: f64,
    pub change_pct_24h: f64,
    pub volume: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub quote_volume: f64,
}

/// Trade direction for a perpetual position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "TP")]
    TakeProfit,
    #[serde(rename = "SL")]
    StopLoss,
    Manual,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::TakeProfit => write!(f, "TP"),
            CloseReason::StopLoss => write!(f, "SL"),
            CloseReason::Manual => write!(f, "Manual"),
        }
    }
}

/// Indicator values captured at signal time, carried on the position for
/// the status surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub atr: f64,
    pub volume_ratio: f64,
}

/// A scored, directional entry suggestion for one instrument.
///
/// Ephemeral: consumed immediately by the position manager, never stored.
#[derive(Debug, Clone)]
pub struct TradeSignal {
    pub symbol: String,
    pub direction: Direction,
    pub price: f64,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub strategy: String,
    pub leverage: u32,
    pub indicators: IndicatorSnapshot,
    /// Recent candle window for charting on the status surface.
    pub candles: Vec<Candle>,
}

/// One open paper trade, marked to market on every price refresh.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub current_price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    /// Notional size in quote currency.
    pub size: f64,
    pub leverage: u32,
    /// Unrealized PnL in quote currency.
    pub pnl: f64,
    /// Leveraged percent PnL.
    pub pnl_pct: f64,
    /// Best unrealized PnL seen since entry.
    pub peak_pnl: f64,
    /// Worst unrealized PnL seen since entry.
    pub trough_pnl: f64,
    pub strategy: String,
    pub reasons: Vec<String>,
    pub indicators: IndicatorSnapshot,
    pub candles: Vec<Candle>,
    pub opened_at: DateTime<Utc>,
    pub confidence: f64,
}

/// Immutable summary of a closed trade, kept in bounded history.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    /// Monotonic trade sequence number (1-based).
    pub id: u64,
    pub uuid: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub leverage: u32,
    pub strategy: String,
    pub reasons: Vec<String>,
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
    /// Holding time bucketed for display: "42s", "7m", "3h".
    pub held_for: String,
    pub won: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_compact_keys() {
        let candle = Candle {
            open_time: 1_700_000_000_000,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1234.0,
        };

        let json = serde_json::to_value(&candle).unwrap();
        assert_eq!(json["t"], 1_700_000_000_000i64);
        assert_eq!(json["o"], 100.0);
        assert_eq!(json["c"], 100.5);

        let back: Candle = serde_json::from_value(json).unwrap();
        assert_eq!(back, candle);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Long.to_string(), "LONG");
        assert_eq!(Direction::Short.to_string(), "SHORT");
    }

    #[test]
    fn test_close_reason_serialization() {
        assert_eq!(
            serde_json::to_value(CloseReason::TakeProfit).unwrap(),
            "TP"
        );
        assert_eq!(serde_json::to_value(CloseReason::StopLoss).unwrap(), "SL");
    }
}
