use super::ema;

/// The signal line is a fixed scaling of the MACD value, not a 9-period
/// EMA of it. The score thresholds downstream are tuned against this
/// proxy, so changing it shifts every MACD rule.
const SIGNAL_FACTOR: f64 = 0.85;

/// MACD line (EMA12 − EMA26) and its proxy signal line.
///
/// Returns `(0.0, 0.0)` for series shorter than 26 points.
pub fn macd(prices: &[f64]) -> (f64, f64) {
    if prices.len() < 26 {
        return (0.0, 0.0);
    }

    let line = ema(prices, 12) - ema(prices, 26);
    (line, line * SIGNAL_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_insufficient_data() {
        let prices = vec![100.0; 25];
        assert_eq!(macd(&prices), (0.0, 0.0));
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let (line, signal) = macd(&prices);
        assert!(line > 0.0);
        assert!((signal - line * 0.85).abs() < 1e-12);
        // Positive MACD above its scaled-down signal.
        assert!(line > signal);
    }

    #[test]
    fn test_macd_negative_in_downtrend() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 - i as f64 * 0.5).collect();
        let (line, signal) = macd(&prices);
        assert!(line < 0.0);
        // Negative MACD sits below its scaled-down signal.
        assert!(line < signal);
    }
}
