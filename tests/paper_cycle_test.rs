use perpbot::api::BinanceFuturesClient;
use perpbot::config::BotConfig;
use perpbot::engine::TradingEngine;
use perpbot::models::Direction;
use std::sync::Arc;
use std::time::Duration;

/// Mocked exchange serving one tradable perpetual whose candle history
/// scores a deep short (long decline, drift, sharp exhaustion rally)
/// while the live price has already fallen through any short
/// take-profit bracket.
async fn mock_exchange() -> mockito::ServerGuard {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/fapi/v1/exchangeInfo")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "symbols": [
                    { "symbol": "BTCUSDT", "contractType": "PERPETUAL", "status": "TRADING" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut closes: Vec<f64> = Vec::new();
    for i in 0..46 {
        closes.push(1000.0 - 10.0 * i as f64);
    }
    for i in 1..=9 {
        closes.push(550.0 - i as f64);
    }
    for i in 1..=5 {
        closes.push(541.0 + 22.0 * i as f64); // last close 651
    }
    let klines: Vec<serde_json::Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            serde_json::json!([
                i as i64 * 300_000,
                close.to_string(),
                (close + 1.0).to_string(),
                (close - 1.0).to_string(),
                close.to_string(),
                "1000.0",
                i as i64 * 300_000 + 299_999,
                "100000.0",
                500,
                "500.0",
                "50000.0",
                "0"
            ])
        })
        .collect();
    server
        .mock("GET", "/fapi/v1/klines")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(serde_json::Value::Array(klines).to_string())
        .create_async()
        .await;

    // Live price far below every possible short take-profit (631-644).
    server
        .mock("GET", "/fapi/v1/ticker/price")
        .with_status(200)
        .with_body(r#"[{"symbol":"BTCUSDT","price":"600.0"}]"#)
        .create_async()
        .await;

    server
        .mock("GET", "/fapi/v1/ticker/24hr")
        .with_status(200)
        .with_body(
            serde_json::json!([{
                "symbol": "BTCUSDT",
                "lastPrice": "600.0",
                "priceChangePercent": "-8.0",
                "volume": "125000",
                "highPrice": "700.0",
                "lowPrice": "590.0",
                "quoteVolume": "80000000"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    server
}

fn fast_config() -> BotConfig {
    BotConfig {
        decision_interval: Duration::from_millis(10),
        price_refresh_interval: Duration::from_millis(10),
        ticker_refresh_interval: Duration::from_millis(10),
        scan_every_ticks: 1,
        rng_seed: Some(7),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_paper_trade_cycle() {
    let server = mock_exchange().await;

    let market = Arc::new(BinanceFuturesClient::with_base_url(server.url()).unwrap());
    let instruments = market.load_instruments().await;
    assert_eq!(instruments, vec!["BTCUSDT"]);

    assert_eq!(market.refresh_tickers().await.unwrap(), 1);

    let engine = TradingEngine::new(market, fast_config());
    engine.start();

    // Wait for at least one open -> take-profit -> close cycle.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if engine.snapshot().trades >= 1 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "no trade completed within the deadline"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    engine.stop();
    let snapshot = engine.snapshot();

    assert!(!snapshot.running);
    assert!(snapshot.trades >= 1);

    // Every recorded trade is a short that hit its bracket at the mocked
    // live price.
    let newest = &snapshot.history[0];
    assert_eq!(newest.symbol, "BTCUSDT");
    assert_eq!(newest.direction, Direction::Short);
    assert_eq!(newest.entry_price, 651.0);
    assert_eq!(newest.exit_price, 600.0);
    assert!(newest.won);
    assert!(newest.pnl > 0.0);

    // Balance reconciles exactly with recorded realized PnL.
    let recorded: f64 = snapshot.history.iter().map(|r| r.pnl).sum();
    assert!(
        (snapshot.balance - (10_000.0 + recorded)).abs() < 0.01,
        "balance {} vs start + recorded {}",
        snapshot.balance,
        10_000.0 + recorded
    );

    // Single instrument: the one-position-per-instrument invariant means
    // at most one open position ever shows up.
    assert!(snapshot.active <= 1);

    // The winning closes fed the strategy weights upward.
    assert!(snapshot
        .strategies
        .values()
        .all(|weight| (0.1..=3.0).contains(weight)));
}

#[tokio::test]
async fn test_snapshot_serializes_dashboard_contract() {
    let server = mock_exchange().await;

    let market = Arc::new(BinanceFuturesClient::with_base_url(server.url()).unwrap());
    market.load_instruments().await;
    market.refresh_tickers().await.unwrap();

    let engine = TradingEngine::new(market, fast_config());
    let json = serde_json::to_value(engine.snapshot()).unwrap();

    for key in [
        "balance",
        "total_pnl",
        "total_pnl_pct",
        "trades",
        "wins",
        "win_rate",
        "active",
        "positions",
        "history",
        "strategies",
        "coins",
        "running",
        "curve",
        "events",
    ] {
        assert!(json.get(key).is_some(), "missing snapshot key {}", key);
    }

    assert_eq!(json["balance"], 10_000.0);
    assert_eq!(json["running"], false);
    assert_eq!(json["coins"]["BTCUSDT"]["price"], 600.0);
    assert_eq!(json["strategies"]["Trend Following"], 1.0);
}
