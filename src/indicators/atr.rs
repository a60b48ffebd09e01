use crate::models::Candle;

/// Average True Range: the mean of the last `period` true ranges, where
/// true range = max(high − low, |high − prev close|, |low − prev close|).
///
/// Returns 0 for fewer than `period + 1` candles.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if candles.len() < period + 1 {
        return 0.0;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect();

    true_ranges.iter().rev().take(period).sum::<f64>() / period as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open: close,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn test_atr_insufficient_data() {
        let candles: Vec<Candle> = (0..10).map(|_| candle(101.0, 99.0, 100.0)).collect();
        assert_eq!(atr(&candles, 14), 0.0);
    }

    #[test]
    fn test_atr_constant_range() {
        // Every bar spans exactly 2.0 and closes mid-range.
        let candles: Vec<Candle> = (0..20).map(|_| candle(101.0, 99.0, 100.0)).collect();
        assert!((atr(&candles, 14) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_atr_gap_counts_against_prev_close() {
        // A gap up makes |high - prev_close| the dominant term.
        let mut candles: Vec<Candle> = (0..15).map(|_| candle(101.0, 99.0, 100.0)).collect();
        candles.push(candle(111.0, 110.0, 110.5));

        let value = atr(&candles, 14);
        // 13 plain ranges of 2.0 plus one gap true range of 11.0 (111 - 100).
        let expected = (13.0 * 2.0 + 11.0) / 14.0;
        assert!((value - expected).abs() < 1e-12, "got {}", value);
    }
}
