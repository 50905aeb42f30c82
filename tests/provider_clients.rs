//! Provider client integration tests against local HTTP mocks
//!
//! Run with: cargo test --test provider_clients

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_mood::adapters::binance::{BinanceClient, BinanceConfig};
use market_mood::adapters::coingecko::{CoinGeckoClient, CoinGeckoConfig};
use market_mood::adapters::defillama::{DefiLlamaClient, DefiLlamaConfig};
use market_mood::adapters::etherscan::{EtherscanClient, EtherscanConfig};
use market_mood::adapters::fear_greed::{FearGreedClient, FearGreedConfig};
use market_mood::adapters::moralis::{MoralisClient, MoralisConfig};
use market_mood::ports::provider::{
    ChainSource, DefiSource, ErrorKind, Interval, PriceSource, ProviderError, SentimentSource,
    WalletSource,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn binance(server: &MockServer) -> BinanceClient {
    BinanceClient::with_config(BinanceConfig {
        base_url: server.uri(),
        timeout: TIMEOUT,
    })
    .unwrap()
}

fn defillama(server: &MockServer) -> DefiLlamaClient {
    DefiLlamaClient::with_config(DefiLlamaConfig {
        base_url: server.uri(),
        yields_url: server.uri(),
        stablecoins_url: server.uri(),
        coins_url: server.uri(),
        timeout: TIMEOUT,
    })
    .unwrap()
}

fn coingecko(server: &MockServer) -> CoinGeckoClient {
    CoinGeckoClient::with_config(CoinGeckoConfig {
        base_url: server.uri(),
        api_key: None,
        timeout: TIMEOUT,
    })
    .unwrap()
}

fn fear_greed(server: &MockServer) -> FearGreedClient {
    FearGreedClient::with_config(FearGreedConfig {
        base_url: server.uri(),
        timeout: TIMEOUT,
    })
    .unwrap()
}

fn etherscan(server: &MockServer, api_key: Option<&str>) -> EtherscanClient {
    EtherscanClient::with_config(EtherscanConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        timeout: TIMEOUT,
    })
    .unwrap()
}

fn moralis(server: &MockServer, api_key: Option<&str>) -> MoralisClient {
    MoralisClient::with_config(MoralisConfig {
        base_url: server.uri(),
        api_key: api_key.map(str::to_string),
        timeout: TIMEOUT,
    })
    .unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

// ============================================================================
// Binance
// ============================================================================

#[tokio::test]
async fn test_binance_price_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticker/24hr"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "BTCUSDT",
            "lastPrice": "50000.50",
            "priceChangePercent": "-2.5",
            "highPrice": "51000",
            "lowPrice": "49000",
            "quoteVolume": "1234567.89"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let price = binance(&server).fetch_price("btc").await.unwrap();

    assert_eq!(price.symbol, "BTC");
    assert_eq!(price.price, 50000.50);
    assert_eq!(price.change_24h_pct, -2.5);
    assert_eq!(price.high_24h, Some(51000.0));
    assert_eq!(price.volume_24h_usd, 1234567.89);
}

#[tokio::test]
async fn test_binance_unknown_symbol_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticker/24hr"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"code": -1121, "msg": "Invalid symbol."})),
        )
        .mount(&server)
        .await;

    let err = binance(&server).fetch_price("NOTACOIN").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("400"));
}

#[tokio::test]
async fn test_binance_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = binance(&server).fetch_price("ETH").await.unwrap_err();
    assert!(err.to_string().contains("Rate limit"));
}

#[tokio::test]
async fn test_binance_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = binance(&server).fetch_price("BTC").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_binance_klines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/klines"))
        .and(query_param("symbol", "ETHUSDT"))
        .and(query_param("interval", "4h"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1700000000000_i64, "100.0", "110.0", "95.0", "105.0", "12.5", 1700014399999_i64, "1300.0", 10, "6", "600", "0"],
            [1700014400000_i64, "105.0", "120.0", "104.0", "118.0", "20.0", 1700028799999_i64, "2300.0", 12, "9", "900", "0"]
        ])))
        .mount(&server)
        .await;

    let candles = binance(&server)
        .fetch_ohlcv("ETH", Interval::FourHours, 2)
        .await
        .unwrap();

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].open, 100.0);
    assert_eq!(candles[1].close, 118.0);
    assert_eq!(candles[1].volume, 20.0);
}

#[tokio::test]
async fn test_binance_movers() {
    let server = MockServer::start().await;
    let tickers: Vec<_> = [("AUSDT", "12.0"), ("BUSDT", "-8.0"), ("CBTC", "50.0"), ("DUSDT", "1.0")]
        .iter()
        .map(|(symbol, change)| {
            json!({
                "symbol": symbol,
                "lastPrice": "1.0",
                "priceChangePercent": change,
                "highPrice": "1.0",
                "lowPrice": "1.0",
                "quoteVolume": "100.0"
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tickers))
        .mount(&server)
        .await;

    let movers = binance(&server).fetch_movers().await.unwrap();

    assert_eq!(movers.gainers[0].symbol, "A");
    assert_eq!(movers.losers[0].symbol, "B");
    assert!(movers.gainers.iter().all(|m| m.symbol != "CBTC" && m.symbol != "C"));
}

// ============================================================================
// CoinGecko
// ============================================================================

#[tokio::test]
async fn test_coingecko_price_with_demo_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "bitcoin"))
        .and(header("x-cg-demo-api-key", "demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": {"usd": 64000.0, "usd_24h_change": 1.5, "usd_24h_vol": 1.0e9}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CoinGeckoClient::with_config(CoinGeckoConfig {
        base_url: server.uri(),
        api_key: Some("demo".into()),
        timeout: TIMEOUT,
    })
    .unwrap();

    let price = client.fetch_price("BTC").await.unwrap();
    assert_eq!(price.symbol, "BTC");
    assert_eq!(price.price, 64000.0);
    assert_eq!(price.high_24h, None);
}

#[tokio::test]
async fn test_coingecko_missing_coin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = CoinGeckoClient::with_config(CoinGeckoConfig {
        base_url: server.uri(),
        api_key: None,
        timeout: TIMEOUT,
    })
    .unwrap();

    let err = client.fetch_price("NOTACOIN").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_coingecko_price_without_change_or_volume_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": {"usd": 64000.0}
        })))
        .mount(&server)
        .await;

    let err = coingecko(&server).fetch_price("BTC").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_coingecko_daily_chart_trimmed_to_limit() {
    let server = MockServer::start().await;
    // 30 full days plus today's partial point
    let prices: Vec<_> = (0..31)
        .map(|day| json!([1_700_000_000_000_i64 + day * 86_400_000, 100.0 + day as f64]))
        .collect();
    let volumes: Vec<_> = (0..31)
        .map(|day| json!([1_700_000_000_000_i64 + day * 86_400_000, 1_000.0]))
        .collect();
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .and(query_param("days", "30"))
        .and(query_param("interval", "daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prices": prices,
            "total_volumes": volumes
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candles = coingecko(&server)
        .fetch_ohlcv("BTC", Interval::OneDay, 30)
        .await
        .unwrap();

    assert_eq!(candles.len(), 30);
    assert_eq!(candles[0].close, 101.0);
    assert_eq!(candles[29].close, 130.0);
    assert!(candles.windows(2).all(|w| w[0].open_time < w[1].open_time));
}

// ============================================================================
// DefiLlama
// ============================================================================

#[tokio::test]
async fn test_defillama_overview() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/historicalChainTvl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": 1, "tvl": 90.0e9},
            {"date": 2, "tvl": 95.5e9}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/protocols"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Lido", "tvl": 30.0e9, "change_1d": 0.5, "category": "Liquid Staking", "chains": ["Ethereum", "Solana", "Polygon", "Moonbeam"]},
            {"name": "Dead", "tvl": 0.0, "chains": []},
            {"name": "Aave", "tvl": 12.0e9, "chains": ["Ethereum"]}
        ])))
        .mount(&server)
        .await;

    let overview = defillama(&server).fetch_overview().await.unwrap();

    assert_eq!(overview.total_tvl_usd, 95.5e9);
    assert_eq!(overview.top_protocols.len(), 2);
    assert_eq!(overview.top_protocols[0].name, "Lido");
    assert_eq!(overview.top_protocols[0].chains.len(), 3);
    assert_eq!(overview.top_protocols[1].name, "Aave");
}

#[tokio::test]
async fn test_defillama_overview_fails_when_any_leg_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/historicalChainTvl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"date": 1, "tvl": 1.0}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/protocols"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = defillama(&server).fetch_overview().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_defillama_overview_empty_history_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/historicalChainTvl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/protocols"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Lido", "tvl": 30.0e9, "chains": ["Ethereum"]}
        ])))
        .mount(&server)
        .await;

    let err = defillama(&server).fetch_overview().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_defillama_dex_volumes_without_totals_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/overview/dexs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = defillama(&server).fetch_dex_volumes().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_defillama_protocol_fees() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/overview/fees"))
        .and(query_param("dataType", "dailyFees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total24h": 45.0e6,
            "total7d": 300.0e6,
            "protocols": [
                {"name": "Uniswap", "total24h": 3.0e6, "total7d": 20.0e6, "category": "Dexs"},
                {"name": "Tether", "total24h": 20.0e6, "total7d": 140.0e6, "category": "Stablecoin Issuer"},
                {"name": "Quiet", "total24h": null}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fees = defillama(&server).fetch_protocol_fees().await.unwrap();

    assert_eq!(fees.total_24h_usd, 45.0e6);
    assert_eq!(fees.total_7d_usd, 300.0e6);
    let names: Vec<_> = fees.top_protocols.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Tether", "Uniswap", "Quiet"]);
    assert_eq!(fees.top_protocols[2].fees_24h_usd, 0.0);
}

#[tokio::test]
async fn test_defillama_token_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prices/current/coingecko:ethereum"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coins": {
                "coingecko:ethereum": {"price": 3012.5, "symbol": "ETH", "timestamp": 1700000000, "confidence": 0.99}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let price = defillama(&server)
        .fetch_token_price("coingecko:Ethereum")
        .await
        .unwrap();

    assert_eq!(price.coin_id, "coingecko:ethereum");
    assert_eq!(price.price, 3012.5);
    assert_eq!(price.symbol.as_deref(), Some("ETH"));
    assert_eq!(price.confidence, Some(0.99));
}

#[tokio::test]
async fn test_defillama_token_price_unknown_coin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"coins": {}})))
        .mount(&server)
        .await;

    let client = defillama(&server);
    let err = client.fetch_token_price("coingecko:notacoin").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);

    let err = client.fetch_token_price("ethereum").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_defillama_yields_filtered_and_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [
                {"pool": "a", "project": "p", "chain": "Ethereum", "symbol": "USDC", "tvlUsd": 5.0e6, "apy": 4.123},
                {"pool": "b", "project": "p", "chain": "Ethereum", "symbol": "ETH", "tvlUsd": 9.0e6, "apy": 12.5},
                {"pool": "c", "project": "p", "chain": "Base", "symbol": "X", "tvlUsd": 1.0e3, "apy": 300.0},
                {"pool": "d", "project": "p", "chain": "Base", "symbol": "Y", "tvlUsd": 8.0e6, "apy": 5000.0},
                {"pool": "e", "project": "p", "chain": "Base", "symbol": "Z", "tvlUsd": 8.0e6, "apy": null}
            ]
        })))
        .mount(&server)
        .await;

    let pools = defillama(&server).fetch_yields(1.0e6, 10).await.unwrap();

    let ids: Vec<_> = pools.iter().map(|p| p.pool_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(pools[1].apy_pct, 4.12);
}

#[tokio::test]
async fn test_defillama_yields_invalid_limit_makes_no_request() {
    let server = MockServer::start().await;

    let err = defillama(&server).fetch_yields(0.0, 0).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(request_count(&server).await, 0);
}

// ============================================================================
// Fear & Greed
// ============================================================================

#[tokio::test]
async fn test_fear_greed_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Fear and Greed Index",
            "data": [
                {"value": "72", "value_classification": "Greed", "timestamp": "1700086400"},
                {"value": "20", "timestamp": "1700000000"}
            ],
            "metadata": {"error": null}
        })))
        .mount(&server)
        .await;

    let window = fear_greed(&server).fetch_fear_greed(2).await.unwrap();
    assert_eq!(window.readings.len(), 2);
    assert_eq!(window.current().unwrap().value, 72);
    assert_eq!(window.readings[1].label, "Extreme Fear");
}

#[tokio::test]
async fn test_fear_greed_out_of_range_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"value": "140", "timestamp": "1700000000"}]
        })))
        .mount(&server)
        .await;

    let err = fear_greed(&server).fetch_fear_greed(1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_fear_greed_missing_data_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Fear and Greed Index"})))
        .mount(&server)
        .await;

    let err = fear_greed(&server).fetch_fear_greed(7).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_fear_greed_empty_data_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "metadata": {"error": null}
        })))
        .mount(&server)
        .await;

    let err = fear_greed(&server).fetch_fear_greed(7).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

// ============================================================================
// Moralis
// ============================================================================

#[tokio::test]
async fn test_moralis_missing_key_makes_no_request() {
    let server = MockServer::start().await;

    let err = moralis(&server, None)
        .fetch_wallet("0xabc", "eth")
        .await
        .unwrap_err();

    assert_eq!(err, ProviderError::MissingCredential("MORALIS_API_KEY".into()));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_moralis_wallet_snapshot() {
    let server = MockServer::start().await;
    let address = "0x1234";

    Mock::given(method("GET"))
        .and(path(format!("/wallets/{}/net-worth", address)))
        .and(header("X-API-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_networth_usd": "1520.75"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/wallets/{}/tokens", address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"symbol": "ETH", "name": "Ether", "balance_formatted": "0.5", "usd_price": 3000.0, "usd_value": 1500.0, "usd_price_24hr_percent_change": 2.0},
                {"symbol": "DUST", "balance_formatted": "1", "usd_price": 0.001, "usd_value": 0.001}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/wallets/{}/history", address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"hash": "0xfeed", "category": "send", "value_usd": "20.75", "block_timestamp": "2024-01-01T00:00:00.000Z"}
            ]
        })))
        .mount(&server)
        .await;

    let snapshot = moralis(&server, Some("secret"))
        .fetch_wallet(address, "eth")
        .await
        .unwrap();

    assert_eq!(snapshot.net_worth_usd, 1520.75);
    assert_eq!(snapshot.holdings.len(), 1);
    assert_eq!(snapshot.holdings[0].symbol, "ETH");
    assert_eq!(snapshot.recent_txs.len(), 1);
    assert_eq!(snapshot.recent_txs[0].category, "send");
    assert!(snapshot.recent_txs[0].timestamp.is_some());
}

#[tokio::test]
async fn test_moralis_net_worth_without_total_is_malformed() {
    let server = MockServer::start().await;
    let address = "0x1234";

    Mock::given(method("GET"))
        .and(path(format!("/wallets/{}/net-worth", address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/wallets/{}/tokens", address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/wallets/{}/history", address)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .mount(&server)
        .await;

    let err = moralis(&server, Some("secret"))
        .fetch_wallet(address, "eth")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
}

#[tokio::test]
async fn test_moralis_defi_positions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wallets/0x1234/defi/positions"))
        .and(query_param("chain", "eth"))
        .and(header("X-API-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "protocol_name": "Aave v3",
                "protocol_id": "aave-v3",
                "position": {
                    "label": "supplied",
                    "balance_usd": 2500.0,
                    "total_unclaimed_usd_value": null,
                    "tokens": [{"symbol": "USDC"}]
                }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let positions = moralis(&server, Some("secret"))
        .fetch_defi_positions("0x1234", "eth")
        .await
        .unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].protocol, "Aave v3");
    assert_eq!(positions[0].label, "supplied");
    assert_eq!(positions[0].balance_usd, Some(2500.0));
    assert_eq!(positions[0].unclaimed_usd, None);
    assert_eq!(positions[0].tokens, vec!["USDC"]);
}

#[tokio::test]
async fn test_moralis_token_holders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/erc20/0xdac17f958d2ee523a2206206994597c13d831ec7/owners"))
        .and(query_param("chain", "eth"))
        .and(query_param("limit", "2"))
        .and(query_param("order", "DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"owner_address": "0xf977", "owner_address_label": "Binance 8", "balance_formatted": "1000000.5",
                 "usd_value": "1000100.0", "percentage_relative_to_total_supply": 1.2},
                {"owner_address": "0x5754", "balance_formatted": "500000"}
            ]
        })))
        .mount(&server)
        .await;

    let holders = moralis(&server, Some("secret"))
        .fetch_token_holders("0xdac17f958d2ee523a2206206994597c13d831ec7", "eth", 2)
        .await
        .unwrap();

    assert_eq!(holders.len(), 2);
    assert_eq!(holders[0].label.as_deref(), Some("Binance 8"));
    assert_eq!(holders[0].balance, 1_000_000.5);
    assert_eq!(holders[1].value_usd, None);
}

// ============================================================================
// Etherscan
// ============================================================================

#[tokio::test]
async fn test_etherscan_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    let client = etherscan(&server, Some("   "));

    let err = client.fetch_gas().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingCredential);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_etherscan_balance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("module", "account"))
        .and(query_param("action", "balance"))
        .and(query_param("chainid", "1"))
        .and(query_param("apikey", "key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": "1500000000000000000"
        })))
        .mount(&server)
        .await;

    let balance = etherscan(&server, Some("key"))
        .fetch_eth_balance("0xabc")
        .await
        .unwrap();

    assert_eq!(balance.wei, 1_500_000_000_000_000_000);
    assert_eq!(balance.eth, 1.5);
}

#[tokio::test]
async fn test_etherscan_gas_oracle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("module", "gastracker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": {
                "LastBlock": "19000000",
                "SafeGasPrice": "12",
                "ProposeGasPrice": "14",
                "FastGasPrice": "20",
                "suggestBaseFee": "11.5"
            }
        })))
        .mount(&server)
        .await;

    let gas = etherscan(&server, Some("key")).fetch_gas().await.unwrap();

    assert_eq!(gas.last_block, 19_000_000);
    assert_eq!(gas.fast_gwei, 20.0);
    assert_eq!(gas.base_fee_gwei, Some(11.5));
}

#[tokio::test]
async fn test_etherscan_status_zero_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Invalid API Key"
        })))
        .mount(&server)
        .await;

    let err = etherscan(&server, Some("bad")).fetch_gas().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("Invalid API Key"));
}

#[tokio::test]
async fn test_etherscan_transactions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("module", "account"))
        .and(query_param("action", "txlist"))
        .and(query_param("address", "0xabc"))
        .and(query_param("offset", "2"))
        .and(query_param("sort", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": [
                {"blockNumber": "19000001", "timeStamp": "1700000100", "hash": "0xb", "from": "0xabc",
                 "to": "0xdef", "value": "250000000000000000", "isError": "0",
                 "functionName": "transfer(address _to, uint256 _value)"},
                {"blockNumber": "19000000", "timeStamp": "1700000000", "hash": "0xa", "from": "0xdef",
                 "to": "", "value": "0", "isError": "1", "functionName": ""}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let txs = etherscan(&server, Some("key"))
        .fetch_transactions("0xabc", 2)
        .await
        .unwrap();

    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].block_number, 19_000_001);
    assert_eq!(txs[0].value_eth, 0.25);
    assert_eq!(txs[0].method.as_deref(), Some("transfer"));
    assert!(!txs[0].failed);
    assert!(txs[1].failed);
    assert_eq!(txs[1].to, None);
}

#[tokio::test]
async fn test_etherscan_no_transfers_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "tokentx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "0",
            "message": "No transactions found",
            "result": []
        })))
        .mount(&server)
        .await;

    let transfers = etherscan(&server, Some("key"))
        .fetch_token_transfers("0xabc", 20)
        .await
        .unwrap();

    assert!(transfers.is_empty());
}

#[tokio::test]
async fn test_etherscan_token_transfers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "tokentx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": [
                {"blockNumber": "19000000", "timeStamp": "1700000000", "hash": "0xc", "from": "0xabc",
                 "to": "0xdef", "value": "1500000", "contractAddress": "0xa0b8",
                 "tokenName": "USD Coin", "tokenSymbol": "USDC", "tokenDecimal": "6"}
            ]
        })))
        .mount(&server)
        .await;

    let transfers = etherscan(&server, Some("key"))
        .fetch_token_transfers("0xabc", 20)
        .await
        .unwrap();

    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].token_symbol, "USDC");
    assert_eq!(transfers[0].amount, 1.5);
}

#[tokio::test]
async fn test_etherscan_top_holders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("module", "token"))
        .and(query_param("action", "tokenholderlist"))
        .and(query_param("contractaddress", "0xdac1"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "1",
            "message": "OK",
            "result": [
                {"TokenHolderAddress": "0xf977", "TokenHolderQuantity": "900000000"},
                {"TokenHolderAddress": "0x5754", "TokenHolderQuantity": "400000000"}
            ]
        })))
        .mount(&server)
        .await;

    let holders = etherscan(&server, Some("key"))
        .fetch_top_holders("0xdac1")
        .await
        .unwrap();

    assert_eq!(holders.len(), 2);
    assert_eq!(holders[0].address, "0xf977");
    assert_eq!(holders[0].balance, 900_000_000.0);
}

#[tokio::test]
async fn test_etherscan_error_hides_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = etherscan(&server, Some("SUPERSECRETKEY"))
        .fetch_transactions("0xabc", 5)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
}
