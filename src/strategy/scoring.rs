use crate::indicators::{atr, bollinger, ema, macd, rsi};
use crate::models::{Candle, Direction, IndicatorSnapshot};

/// Score magnitude treated as full scale when mapping to confidence.
const SCORE_FULL_SCALE: f64 = 9.0;
/// Confidence is capped below 100: the rule set is heuristic, never certain.
const MAX_CONFIDENCE: f64 = 96.0;

/// Tolerance factors for the Bollinger break rules: a price within 0.1%
/// of a band counts as a break.
const LOWER_BAND_TOLERANCE: f64 = 1.001;
const UPPER_BAND_TOLERANCE: f64 = 0.999;

const VOLUME_SURGE_RATIO: f64 = 2.5;
const HAMMER_BODY_RATIO: f64 = 0.3;

/// Scored market read for one instrument at one instant.
#[derive(Debug, Clone)]
pub struct MarketAnalysis {
    pub price: f64,
    pub score: i32,
    pub confidence: f64,
    pub indicators: IndicatorSnapshot,
    pub reasons: Vec<String>,
}

/// Score a candle series by summing independent rule contributions.
///
/// Returns `None` when fewer than `min_candles` bars are available —
/// callers skip the instrument for this cycle. Positive scores favor a
/// long entry, negative scores a short one.
pub fn score_candles(candles: &[Candle], min_candles: usize) -> Option<MarketAnalysis> {
    if candles.len() < min_candles {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let price = *closes.last()?;

    let rsi_value = rsi(&closes, 14);
    let (macd_line, macd_signal) = macd(&closes);
    let ema20 = ema(&closes, 20);
    let ema50 = ema(&closes, 50);
    let bands = bollinger(&closes, 20);
    let atr_value = atr(candles, 14);

    let volume_tail = &volumes[volumes.len().saturating_sub(20)..];
    let avg_volume = volume_tail.iter().sum::<f64>() / volume_tail.len() as f64;
    let volume_ratio = if avg_volume > 0.0 {
        volumes.last()? / avg_volume
    } else {
        1.0
    };

    let mut score: i32 = 0;
    let mut reasons = Vec::new();

    if rsi_value < 25.0 {
        score += 3;
        reasons.push(format!("RSI deeply oversold at {:.0}", rsi_value));
    } else if rsi_value < 32.0 {
        score += 2;
        reasons.push(format!("RSI in the buy zone at {:.0}", rsi_value));
    } else if rsi_value > 75.0 {
        score -= 3;
        reasons.push(format!("RSI deeply overbought at {:.0}", rsi_value));
    } else if rsi_value > 68.0 {
        score -= 2;
        reasons.push(format!("RSI in the sell zone at {:.0}", rsi_value));
    }

    if macd_line > macd_signal && macd_line > 0.0 {
        score += 2;
        reasons.push("MACD strongly bullish".to_string());
    } else if macd_line > macd_signal {
        score += 1;
        reasons.push("MACD turning up".to_string());
    } else if macd_line < macd_signal && macd_line < 0.0 {
        score -= 2;
        reasons.push("MACD strongly bearish".to_string());
    } else if macd_line < macd_signal {
        score -= 1;
        reasons.push("MACD turning down".to_string());
    }

    if price > ema20 && ema20 > ema50 {
        score += 1;
        reasons.push("EMA uptrend stack".to_string());
    } else if price < ema20 && ema20 < ema50 {
        score -= 1;
        reasons.push("EMA downtrend stack".to_string());
    }

    if price < bands.lower * LOWER_BAND_TOLERANCE {
        score += 2;
        reasons.push("Lower Bollinger band break".to_string());
    } else if price > bands.upper * UPPER_BAND_TOLERANCE {
        score -= 2;
        reasons.push("Upper Bollinger band break".to_string());
    }

    if volume_ratio > VOLUME_SURGE_RATIO {
        score += 1;
        reasons.push(format!("Volume surge x{:.1}", volume_ratio));
    }

    // Hammer-like bar: small close-to-close body against a long wick,
    // closing up.
    let body = (closes[closes.len() - 1] - closes[closes.len() - 2]).abs();
    let last = &candles[candles.len() - 1];
    let wick = last.high - last.low;
    if wick > 0.0 && body / wick < HAMMER_BODY_RATIO && closes[closes.len() - 1] > closes[closes.len() - 2]
    {
        score += 1;
        reasons.push("Hammer candle".to_string());
    }

    let confidence = (score.abs() as f64 / SCORE_FULL_SCALE * 100.0).min(MAX_CONFIDENCE);

    Some(MarketAnalysis {
        price,
        score,
        confidence,
        indicators: IndicatorSnapshot {
            rsi: rsi_value,
            macd: macd_line,
            ema20,
            ema50,
            bb_upper: bands.upper,
            bb_lower: bands.lower,
            atr: atr_value,
            volume_ratio,
        },
        reasons,
    })
}

/// Entry direction for a scored analysis, or `None` below the score or
/// confidence thresholds.
pub fn entry_direction(
    score: i32,
    confidence: f64,
    min_score: i32,
    min_confidence: f64,
) -> Option<Direction> {
    let direction = if score >= min_score {
        Direction::Long
    } else if score <= -min_score {
        Direction::Short
    } else {
        return None;
    };

    if confidence < min_confidence {
        return None;
    }

    Some(direction)
}
