use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

use crate::api::BinanceFuturesClient;
use crate::config::BotConfig;
use crate::engine::candle_cache::CandleCache;
use crate::models::{Candle, TradeSignal};
use crate::strategy::{entry_direction, score_candles, MarketAnalysis, StrategyWeights};

/// Candles carried on a signal for charting on the status surface.
const SIGNAL_CANDLE_WINDOW: usize = 40;

/// Turns an instrument's recent candle history into scored entry
/// signals.
///
/// Owns the candle cache: a successful fetch replaces the cached series,
/// a failed refetch falls back to the last good one, so one bad cycle
/// degrades to a slightly stale read instead of a skipped instrument.
pub struct MarketAnalyzer {
    market: Arc<BinanceFuturesClient>,
    cache: CandleCache,
    config: Arc<BotConfig>,
}

impl MarketAnalyzer {
    pub fn new(market: Arc<BinanceFuturesClient>, config: Arc<BotConfig>) -> Self {
        Self {
            market,
            cache: CandleCache::new(),
            config,
        }
    }

    /// Score an instrument's current candle series.
    ///
    /// Returns the analysis plus the trailing candle window to attach to
    /// a signal, or `None` when fewer than the minimum candles are
    /// available even after falling back to the cache.
    pub async fn analyze(&self, symbol: &str) -> Option<(MarketAnalysis, Vec<Candle>)> {
        let candles = match self
            .market
            .fetch_candles(symbol, &self.config.candle_interval, self.config.candle_limit)
            .await
        {
            Ok(fetched) if !fetched.is_empty() => {
                self.cache.store(symbol, fetched.clone());
                fetched
            }
            Ok(_) => {
                tracing::debug!("{}: empty candle response, reusing cached series", symbol);
                self.cache.get(symbol)
            }
            Err(e) => {
                tracing::warn!("{}: candle fetch failed ({}), reusing cached series", symbol, e);
                self.cache.get(symbol)
            }
        };

        let analysis = score_candles(&candles, self.config.min_candles)?;

        let window_start = candles.len().saturating_sub(SIGNAL_CANDLE_WINDOW);
        Some((analysis, candles[window_start..].to_vec()))
    }

    /// Produce an entry signal for an instrument, or `None`.
    ///
    /// Never signals an instrument that already has an open position.
    /// Past that gate the decision is the scored analysis run through
    /// the score and confidence thresholds, tagged with a weight-sampled
    /// strategy label and a random leverage draw.
    pub async fn decide<R: Rng>(
        &self,
        symbol: &str,
        open_symbols: &HashSet<String>,
        weights: &StrategyWeights,
        rng: &mut R,
    ) -> Option<TradeSignal> {
        if open_symbols.contains(symbol) {
            return None;
        }

        let (analysis, window) = self.analyze(symbol).await?;

        let limits = &self.config.limits;
        let direction = entry_direction(
            analysis.score,
            analysis.confidence,
            limits.min_score,
            limits.min_confidence,
        )?;

        let strategy = weights.pick(rng);
        let leverage = limits.leverage_choices.choose(rng).copied().unwrap_or(3);

        Some(TradeSignal {
            symbol: symbol.to_string(),
            direction,
            price: analysis.price,
            confidence: analysis.confidence,
            reasons: analysis.reasons,
            strategy,
            leverage,
            indicators: analysis.indicators,
            candles: window,
        })
    }
}
