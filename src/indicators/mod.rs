// Technical indicators over price and candle series.
//
// Every function here is total: short input degrades to a neutral value
// (RSI 50, EMA = last price, zero ATR) instead of an error, so callers
// skip an instrument for a cycle rather than unwind.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;

pub use atr::atr;
pub use bollinger::{bollinger, Bands};
pub use ema::ema;
pub use macd::macd;
pub use rsi::rsi;
