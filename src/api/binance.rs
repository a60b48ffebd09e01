use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::models::{Candle, Ticker};

const BINANCE_FUTURES_BASE: &str = "https://fapi.binance.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const RATE_LIMIT_RPM: u32 = 1200;

/// Cap on eligible instruments appended after the priority intersection.
const MAX_EXTRA_SYMBOLS: usize = 20;
/// Working-set size when instrument discovery fails outright.
const FALLBACK_SYMBOLS: usize = 10;

/// Curated priority instruments, in preference order. The working set is
/// this list intersected with what the exchange reports as tradable.
pub const PRIORITY_SYMBOLS: &[&str] = &[
    "BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT", "ADAUSDT", "DOGEUSDT", "DOTUSDT",
    "MATICUSDT", "AVAXUSDT", "LINKUSDT", "UNIUSDT", "LTCUSDT", "BCHUSDT", "ATOMUSDT", "ETCUSDT",
    "APTUSDT", "ARBUSDT", "OPUSDT", "NEARUSDT", "ICPUSDT", "VETUSDT", "INJUSDT", "STXUSDT",
    "THETAUSDT", "ALGOUSDT", "FTMUSDT", "SANDUSDT", "MANAUSDT", "AXSUSDT", "GALAUSDT", "CHZUSDT",
    "SUSHIUSDT", "AAVEUSDT", "COMPUSDT", "GRTUSDT", "CRVUSDT", "RUNEUSDT", "SNXUSDT", "1INCHUSDT",
    "FILUSDT", "ROSEUSDT", "ENJUSDT", "BATUSDT", "BALUSDT", "MKRUSDT", "YFIUSDT", "KSMUSDT",
    "KNCUSDT", "BANDUSDT", "SUIUSDT", "SXPUSDT", "ZILUSDT", "QNTUSDT", "EGLDUSDT", "FLOWUSDT",
    "HBARUSDT", "XLMUSDT", "XTZUSDT", "EOSUSDT", "TRXUSDT", "DASHUSDT", "ONTUSDT", "CELOUSDT",
    "LRCUSDT", "OCEANUSDT", "STORJUSDT", "RENUSDT", "SKLUSDT", "FETUSDT",
];

// Shorthand for the non-keyed rate limiter used by the shared client
type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A market-data fetch that did not produce usable data.
///
/// Callers treat any variant as "keep the cached value and try again on
/// the next cadence" — the error type exists so that degradation is an
/// explicit decision at the call site, not a silent catch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(String),
}

/// Binance USDT-margined futures market-data client.
///
/// Caches the working instrument set plus the last good ticker and price
/// for each instrument; refresh failures leave the caches untouched
/// (stale-but-available). Shareable across tasks; all clones of the
/// internal caches go through `RwLock`.
pub struct BinanceFuturesClient {
    http: Client,
    base_url: String,
    symbols: RwLock<Vec<String>>,
    tickers: RwLock<HashMap<String, Ticker>>,
    prices: RwLock<HashMap<String, f64>>,
    rate_limiter: Arc<DirectRateLimiter>,
}

/// Response from /fapi/v1/exchangeInfo
#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    #[serde(default)]
    contract_type: String,
    #[serde(default)]
    status: String,
}

/// Row from /fapi/v1/ticker/24hr
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    volume: String,
    high_price: String,
    low_price: String,
    quote_volume: String,
}

/// Row from /fapi/v1/ticker/price
#[derive(Debug, Deserialize)]
struct PriceRow {
    symbol: String,
    price: String,
}

/// Kline row: heterogeneous JSON array
/// [openTime, open, high, low, close, volume, closeTime, quoteVolume,
///  trades, takerBase, takerQuote, ignore]
type RawKline = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    u64,
    String,
    String,
    String,
);

fn parse_f64(raw: &str, field: &str) -> Result<f64, FetchError> {
    raw.parse::<f64>()
        .map_err(|_| FetchError::Decode(format!("bad {} value: {:?}", field, raw)))
}

impl BinanceFuturesClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(BINANCE_FUTURES_BASE)
    }

    /// Create a client against a non-default base URL (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap());

        Ok(Self {
            http,
            base_url: base_url.into(),
            symbols: RwLock::new(Vec::new()),
            tickers: RwLock::new(HashMap::new()),
            prices: RwLock::new(HashMap::new()),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.rate_limiter.until_ready().await;
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    /// Load the working instrument set for this run.
    ///
    /// Eligible = USDT-quoted, perpetual, currently trading. The working
    /// set is the priority list intersected with eligible (in priority
    /// order), topped up with further eligible instruments in exchange
    /// order. A failed fetch falls back to the head of the priority list.
    pub async fn load_instruments(&self) -> Vec<String> {
        let working = match self.fetch_eligible_symbols().await {
            Ok(eligible) => {
                let eligible_set: HashSet<&str> = eligible.iter().map(String::as_str).collect();

                let mut working: Vec<String> = PRIORITY_SYMBOLS
                    .iter()
                    .filter(|s| eligible_set.contains(**s))
                    .map(|s| s.to_string())
                    .collect();

                let extras: Vec<String> = eligible
                    .iter()
                    .filter(|s| !working.contains(s))
                    .take(MAX_EXTRA_SYMBOLS)
                    .cloned()
                    .collect();
                working.extend(extras);

                tracing::info!("Loaded {} tradable instruments", working.len());
                working
            }
            Err(e) => {
                tracing::warn!(
                    "Instrument discovery failed ({}), falling back to priority list",
                    e
                );
                PRIORITY_SYMBOLS
                    .iter()
                    .take(FALLBACK_SYMBOLS)
                    .map(|s| s.to_string())
                    .collect()
            }
        };

        *self.symbols.write().unwrap() = working.clone();
        working
    }

    async fn fetch_eligible_symbols(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
        let info: ExchangeInfo = self.get_json(&url).await?;

        Ok(info
            .symbols
            .into_iter()
            .filter(|s| {
                s.symbol.ends_with("USDT")
                    && s.contract_type == "PERPETUAL"
                    && s.status == "TRADING"
            })
            .map(|s| s.symbol)
            .collect())
    }

    /// Overwrite cached 24h tickers for in-scope instruments.
    ///
    /// Returns the number of entries updated. On error the cache keeps
    /// its last good values.
    pub async fn refresh_tickers(&self) -> Result<usize, FetchError> {
        let url = format!("{}/fapi/v1/ticker/24hr", self.base_url);
        let rows: Vec<Ticker24h> = self.get_json(&url).await?;

        let in_scope: HashSet<String> = self.symbols.read().unwrap().iter().cloned().collect();

        let mut parsed = Vec::new();
        for row in rows {
            if !in_scope.contains(&row.symbol) {
                continue;
            }
            let ticker = Ticker {
                last_price: parse_f64(&row.last_price, "lastPrice")?,
                change_pct_24h: parse_f64(&row.price_change_percent, "priceChangePercent")?,
                volume: parse_f64(&row.volume, "volume")?,
                high_24h: parse_f64(&row.high_price, "highPrice")?,
                low_24h: parse_f64(&row.low_price, "lowPrice")?,
                quote_volume: parse_f64(&row.quote_volume, "quoteVolume")?,
            };
            parsed.push((row.symbol, ticker));
        }

        let updated = parsed.len();
        let mut tickers = self.tickers.write().unwrap();
        let mut prices = self.prices.write().unwrap();
        for (symbol, ticker) in parsed {
            prices.insert(symbol.clone(), ticker.last_price);
            tickers.insert(symbol, ticker);
        }

        Ok(updated)
    }

    /// Overwrite cached last prices for in-scope instruments.
    ///
    /// Cheaper than a full ticker refresh, so it runs on a faster
    /// cadence. Same error contract as [`refresh_tickers`].
    ///
    /// [`refresh_tickers`]: Self::refresh_tickers
    pub async fn refresh_prices(&self) -> Result<usize, FetchError> {
        let url = format!("{}/fapi/v1/ticker/price", self.base_url);
        let rows: Vec<PriceRow> = self.get_json(&url).await?;

        let in_scope: HashSet<String> = self.symbols.read().unwrap().iter().cloned().collect();

        let mut parsed = Vec::new();
        for row in rows {
            if !in_scope.contains(&row.symbol) {
                continue;
            }
            parsed.push((row.symbol, parse_f64(&row.price, "price")?));
        }

        let updated = parsed.len();
        let mut tickers = self.tickers.write().unwrap();
        let mut prices = self.prices.write().unwrap();
        for (symbol, price) in parsed {
            prices.insert(symbol.clone(), price);
            if let Some(ticker) = tickers.get_mut(&symbol) {
                ticker.last_price = price;
            }
        }

        Ok(updated)
    }

    /// Fetch a time-ordered candle series for one instrument.
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );
        let rows: Vec<RawKline> = self.get_json(&url).await?;

        rows.into_iter()
            .map(|row| {
                Ok(Candle {
                    open_time: row.0,
                    open: parse_f64(&row.1, "open")?,
                    high: parse_f64(&row.2, "high")?,
                    low: parse_f64(&row.3, "low")?,
                    close: parse_f64(&row.4, "close")?,
                    volume: parse_f64(&row.5, "volume")?,
                })
            })
            .collect()
    }

    /// Last known price for an instrument, 0.0 when nothing is cached.
    pub fn price(&self, symbol: &str) -> f64 {
        self.prices
            .read()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0.0)
    }

    /// Snapshot of the full price cache.
    pub fn prices(&self) -> HashMap<String, f64> {
        self.prices.read().unwrap().clone()
    }

    /// Snapshot of the full ticker cache.
    pub fn tickers(&self) -> HashMap<String, Ticker> {
        self.tickers.read().unwrap().clone()
    }

    /// The working instrument set (empty before `load_instruments`).
    pub fn instruments(&self) -> Vec<String> {
        self.symbols.read().unwrap().clone()
    }
}
