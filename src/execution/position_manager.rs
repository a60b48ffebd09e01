use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use crate::models::{CloseReason, Direction, Position, TradeRecord, TradeSignal};
use crate::risk::TradeLimits;
use crate::strategy::StrategyWeights;

const HISTORY_CAPACITY: usize = 100;
const EQUITY_CURVE_CAPACITY: usize = 80;

/// Owns every open position, the closed-trade history, the equity curve,
/// the adaptive strategy weights, and the paper-account balance.
///
/// All methods take `&mut self`; callers serialize access behind a single
/// mutex so mark-to-market updates and signal-driven opens can never
/// interleave.
pub struct PositionManager {
    positions: HashMap<String, Position>,
    history: VecDeque<TradeRecord>,
    equity_curve: VecDeque<f64>,
    weights: StrategyWeights,
    starting_balance: f64,
    balance: f64,
    trades: u64,
    wins: u64,
    limits: TradeLimits,
}

impl PositionManager {
    pub fn new(starting_balance: f64, limits: TradeLimits) -> Self {
        let mut equity_curve = VecDeque::new();
        equity_curve.push_back(starting_balance);

        Self {
            positions: HashMap::new(),
            history: VecDeque::new(),
            equity_curve,
            weights: StrategyWeights::default(),
            starting_balance,
            balance: starting_balance,
            trades: 0,
            wins: 0,
            limits,
        }
    }

    /// Open a paper position from a signal.
    ///
    /// Sized at a fixed fraction of the current balance, with
    /// leverage-scaled exit brackets. A no-op (returns false) when the
    /// instrument already has an open position or the open count is at
    /// the cap — duplicate triggers within one scan are expected, not
    /// errors.
    pub fn open(&mut self, signal: TradeSignal) -> bool {
        if self.positions.contains_key(&signal.symbol) {
            return false;
        }
        if self.positions.len() >= self.limits.max_open_positions {
            return false;
        }

        let (take_profit, stop_loss) =
            self.limits
                .exit_prices(signal.direction, signal.price, signal.leverage);
        let size = self.balance * self.limits.position_size_pct;

        tracing::info!(
            "Opened {} {} @ {:.4} ({}x, tp {:.4}, sl {:.4}, conf {:.0}%)",
            signal.symbol,
            signal.direction,
            signal.price,
            signal.leverage,
            take_profit,
            stop_loss,
            signal.confidence
        );

        let position = Position {
            id: Uuid::new_v4(),
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_price: signal.price,
            current_price: signal.price,
            take_profit,
            stop_loss,
            size,
            leverage: signal.leverage,
            pnl: 0.0,
            pnl_pct: 0.0,
            peak_pnl: 0.0,
            trough_pnl: 0.0,
            strategy: signal.strategy,
            reasons: signal.reasons,
            indicators: signal.indicators,
            candles: signal.candles,
            opened_at: Utc::now(),
            confidence: signal.confidence,
        };

        self.positions.insert(signal.symbol, position);
        true
    }

    /// Mark every open position to market and close those whose price
    /// crossed an exit bracket. Instruments without a usable price
    /// (missing or zero) are skipped for this pass.
    ///
    /// Returns the records of every position closed in this pass.
    pub fn update(&mut self, prices: &HashMap<String, f64>) -> Vec<TradeRecord> {
        let mut triggered = Vec::new();

        for (symbol, position) in self.positions.iter_mut() {
            let Some(&price) = prices.get(symbol) else {
                continue;
            };
            if price == 0.0 {
                continue;
            }

            position.current_price = price;

            let leverage = position.leverage as f64;
            let pct = match position.direction {
                Direction::Long => {
                    (price - position.entry_price) / position.entry_price * 100.0 * leverage
                }
                Direction::Short => {
                    (position.entry_price - price) / position.entry_price * 100.0 * leverage
                }
            };
            let pnl = position.size * pct / 100.0;

            position.pnl = pnl;
            position.pnl_pct = pct;
            position.peak_pnl = position.peak_pnl.max(pnl);
            position.trough_pnl = position.trough_pnl.min(pnl);

            let crossed = match position.direction {
                Direction::Long if price >= position.take_profit => Some(CloseReason::TakeProfit),
                Direction::Long if price <= position.stop_loss => Some(CloseReason::StopLoss),
                Direction::Short if price <= position.take_profit => Some(CloseReason::TakeProfit),
                Direction::Short if price >= position.stop_loss => Some(CloseReason::StopLoss),
                _ => None,
            };

            if let Some(reason) = crossed {
                triggered.push((symbol.clone(), reason));
            }
        }

        triggered
            .into_iter()
            .filter_map(|(symbol, reason)| self.close(&symbol, reason))
            .collect()
    }

    /// Close an open position and settle it into the account.
    ///
    /// Credits the realized PnL, adjusts the strategy weight for the
    /// outcome, prepends the trade record, appends the balance to the
    /// equity curve, and removes the position. Returns `None` (no-op)
    /// when the instrument has no open position.
    pub fn close(&mut self, symbol: &str, reason: CloseReason) -> Option<TradeRecord> {
        let position = self.positions.remove(symbol)?;

        self.balance += position.pnl;
        self.trades += 1;
        let won = position.pnl > 0.0;
        if won {
            self.wins += 1;
        }
        self.weights.record_outcome(&position.strategy, won);

        let closed_at = Utc::now();
        let held_secs = (closed_at - position.opened_at).num_seconds().max(0);

        let record = TradeRecord {
            id: self.trades,
            uuid: position.id,
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price: position.current_price,
            take_profit: position.take_profit,
            stop_loss: position.stop_loss,
            pnl: position.pnl,
            pnl_pct: position.pnl_pct,
            leverage: position.leverage,
            strategy: position.strategy.clone(),
            reasons: position.reasons.clone(),
            reason,
            closed_at,
            held_for: format_holding(held_secs),
            won,
        };

        tracing::info!(
            "[{}] {} {} | ${:.2} ({:.2}%) | {}",
            if won { "WIN" } else { "LOSS" },
            record.symbol,
            record.direction,
            record.pnl,
            record.pnl_pct,
            reason
        );

        self.history.push_front(record.clone());
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_back();
        }

        self.equity_curve.push_back(self.balance);
        if self.equity_curve.len() > EQUITY_CURVE_CAPACITY {
            self.equity_curve.pop_front();
        }

        Some(record)
    }

    pub fn has_open_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn open_symbols(&self) -> HashSet<String> {
        self.positions.keys().cloned().collect()
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Closed trades, newest first.
    pub fn history(&self) -> &VecDeque<TradeRecord> {
        &self.history
    }

    pub fn equity_curve(&self) -> &VecDeque<f64> {
        &self.equity_curve
    }

    pub fn weights(&self) -> &StrategyWeights {
        &self.weights
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn total_pnl(&self) -> f64 {
        self.balance - self.starting_balance
    }

    pub fn trades(&self) -> u64 {
        self.trades
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    /// Win percentage; reads as a coin flip until the first trade closes.
    pub fn win_rate(&self) -> f64 {
        if self.trades > 0 {
            self.wins as f64 / self.trades as f64 * 100.0
        } else {
            50.0
        }
    }

    pub fn limits(&self) -> &TradeLimits {
        &self.limits
    }
}

fn format_holding(secs: i64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}
