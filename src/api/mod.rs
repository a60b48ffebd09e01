pub mod binance;

pub use binance::{BinanceFuturesClient, FetchError, PRIORITY_SYMBOLS};
