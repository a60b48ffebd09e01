use serde::{Deserialize, Serialize};

use crate::models::Direction;

/// Hard limits and sizing parameters for the paper account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLimits {
    pub max_open_positions: usize,
    /// Fraction of the current balance committed per position.
    pub position_size_pct: f64,
    /// Take-profit distance at 3x leverage; scales linearly with leverage.
    pub take_profit_rate: f64,
    /// Stop-loss distance at 3x leverage; scales linearly with leverage.
    pub stop_loss_rate: f64,
    pub leverage_choices: Vec<u32>,
    /// Minimum absolute score before an entry is considered.
    pub min_score: i32,
    /// Minimum confidence (0-100) before an entry is considered.
    pub min_confidence: f64,
}

impl Default for TradeLimits {
    fn default() -> Self {
        Self {
            max_open_positions: 6,
            position_size_pct: 0.08,
            take_profit_rate: 0.018,
            stop_loss_rate: 0.007,
            leverage_choices: vec![2, 3, 5],
            min_score: 3,
            min_confidence: 45.0,
        }
    }
}

impl TradeLimits {
    /// Take-profit and stop-loss prices around an entry.
    ///
    /// Distances are anchored at 3x leverage and scale linearly, so a 5x
    /// position has wider brackets in price terms but the same leveraged
    /// PnL at trigger.
    pub fn exit_prices(&self, direction: Direction, entry: f64, leverage: u32) -> (f64, f64) {
        let scale = leverage as f64 / 3.0;
        match direction {
            Direction::Long => (
                entry * (1.0 + self.take_profit_rate * scale),
                entry * (1.0 - self.stop_loss_rate * scale),
            ),
            Direction::Short => (
                entry * (1.0 - self.take_profit_rate * scale),
                entry * (1.0 + self.stop_loss_rate * scale),
            ),
        }
    }
}
