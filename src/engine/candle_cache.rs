use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::Candle;

/// Last-good candle series per instrument.
///
/// Not a rolling buffer: each successful fetch replaces the entry
/// wholesale, and a failed refetch leaves the previous series available
/// (stale-but-usable).
pub struct CandleCache {
    data: RwLock<HashMap<String, Vec<Candle>>>,
}

impl CandleCache {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the cached series for an instrument.
    pub fn store(&self, symbol: &str, candles: Vec<Candle>) {
        self.data
            .write()
            .unwrap()
            .insert(symbol.to_string(), candles);
    }

    /// Cached series for an instrument, empty when nothing is cached.
    pub fn get(&self, symbol: &str) -> Vec<Candle> {
        self.data
            .read()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.data
            .read()
            .unwrap()
            .get(symbol)
            .map(|series| series.len())
            .unwrap_or(0)
    }
}

impl Default for CandleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize, base: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                open_time: i as i64 * 300_000,
                open: base,
                high: base + 1.0,
                low: base - 1.0,
                close: base,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn test_missing_symbol_is_empty() {
        let cache = CandleCache::new();
        assert!(cache.get("BTCUSDT").is_empty());
        assert_eq!(cache.len("BTCUSDT"), 0);
    }

    #[test]
    fn test_store_replaces_wholesale() {
        let cache = CandleCache::new();

        cache.store("BTCUSDT", series(60, 100.0));
        assert_eq!(cache.len("BTCUSDT"), 60);

        cache.store("BTCUSDT", series(10, 200.0));
        let cached = cache.get("BTCUSDT");
        assert_eq!(cached.len(), 10);
        assert_eq!(cached[0].close, 200.0);
    }

    #[test]
    fn test_entries_are_independent_per_symbol() {
        let cache = CandleCache::new();
        cache.store("BTCUSDT", series(60, 100.0));
        cache.store("ETHUSDT", series(30, 50.0));

        assert_eq!(cache.len("BTCUSDT"), 60);
        assert_eq!(cache.len("ETHUSDT"), 30);
    }
}
