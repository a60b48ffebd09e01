/// Relative Strength Index over the trailing `period` price deltas.
///
/// Uses the mean-gain / mean-loss ratio of the last `period` changes.
/// Degenerate windows resolve without error: fewer than `period + 1`
/// prices returns the neutral 50, an all-gain window (mean loss exactly
/// zero) returns 100, and an all-loss window falls out of the standard
/// formula as 0.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if prices.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];

    let avg_gain: f64 = recent.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 = recent.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_insufficient_data_is_neutral() {
        let prices = vec![100.0, 102.0, 101.0];
        assert_eq!(rsi(&prices, 14), 50.0);
    }

    #[test]
    fn test_rsi_all_gains_hits_ceiling() {
        // Strictly rising window: mean loss is exactly zero.
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&prices, 14), 100.0);
    }

    #[test]
    fn test_rsi_all_losses_hits_floor() {
        // Strictly falling window: mean gain is zero, formula gives 0.
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_eq!(rsi(&prices, 14), 0.0);
    }

    #[test]
    fn test_rsi_mixed_series_in_range() {
        let prices = vec![
            44.0, 44.25, 44.5, 43.75, 44.0, 44.5, 45.0, 45.5, 45.25, 45.5, 46.0, 46.5, 46.25,
            46.0, 46.5,
        ];

        let value = rsi(&prices, 14);
        assert!(value > 50.0 && value < 100.0, "got {}", value);
    }

    #[test]
    fn test_rsi_uses_trailing_window_only() {
        // Early losses outside the 5-delta window must not matter.
        let prices = vec![100.0, 90.0, 80.0, 81.0, 82.0, 83.0, 84.0, 85.0];
        assert_eq!(rsi(&prices, 5), 100.0);
    }
}
