/// Bollinger band levels for the trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Mean ± 2 population standard deviations over the last `period` prices.
///
/// Series shorter than `period` collapse all three bands onto the last
/// price.
pub fn bollinger(prices: &[f64], period: usize) -> Bands {
    let last = prices.last().copied().unwrap_or(0.0);
    if prices.len() < period {
        return Bands {
            upper: last,
            middle: last,
            lower: last,
        };
    }

    let window = &prices[prices.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    Bands {
        upper: mean + 2.0 * std_dev,
        middle: mean,
        lower: mean - 2.0 * std_dev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_insufficient_data_collapses() {
        let prices = vec![100.0, 101.0];
        let bands = bollinger(&prices, 20);
        assert_eq!(bands.upper, 101.0);
        assert_eq!(bands.middle, 101.0);
        assert_eq!(bands.lower, 101.0);
    }

    #[test]
    fn test_bollinger_flat_series_has_zero_width() {
        let prices = vec![50.0; 25];
        let bands = bollinger(&prices, 20);
        assert_eq!(bands.upper, 50.0);
        assert_eq!(bands.lower, 50.0);
    }

    #[test]
    fn test_bollinger_symmetric_around_mean() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + (i % 4) as f64).collect();
        let bands = bollinger(&prices, 20);
        assert!((bands.upper - bands.middle) - (bands.middle - bands.lower) < 1e-12);
        assert!(bands.upper > bands.middle && bands.middle > bands.lower);
    }

    #[test]
    fn test_bollinger_uses_population_std_dev() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, population sigma 2.
        let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = bollinger(&prices, 8);
        assert!((bands.middle - 5.0).abs() < 1e-12);
        assert!((bands.upper - 9.0).abs() < 1e-12);
        assert!((bands.lower - 1.0).abs() < 1e-12);
    }
}
