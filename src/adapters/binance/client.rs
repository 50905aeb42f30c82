//! Binance Market Data Client
//!
//! HTTP client for the public Binance market-data mirror. No key required.
//! Serves spot prices, klines and the 24h movers board for USDT pairs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::types::{parse_kline, RawKline, Ticker24h};
use crate::adapters::http::{build_client, get_json, require_non_empty, require_positive};
use crate::domain::records::{Candle, MarketMovers, PriceRecord};
use crate::domain::symbols;
use crate::ports::provider::{Interval, PriceSource, ProviderError, Source};

pub const DEFAULT_BASE_URL: &str = "https://data-api.binance.vision/api/v3";

/// Upper bound Binance accepts for `limit` on `/klines`
pub const MAX_KLINES: u32 = 1000;

/// Entries on each side of the movers board
const MOVERS_PER_SIDE: usize = 5;

/// Binance client configuration
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// Base URL for the market-data API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(8),
        }
    }
}

/// Binance spot market-data client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    config: BinanceConfig,
    http: Client,
}

impl BinanceClient {
    /// Create a new Binance client with default configuration
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(BinanceConfig::default())
    }

    /// Create a new Binance client with custom configuration
    pub fn with_config(config: BinanceConfig) -> Result<Self, ProviderError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    /// Get the configured API base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Rank USDT tickers into the top gainers and losers
pub fn rank_movers(tickers: &[Ticker24h]) -> MarketMovers {
    let mut movers: Vec<_> = tickers.iter().filter_map(Ticker24h::to_mover).collect();
    movers.sort_by(|a, b| a.change_24h_pct.total_cmp(&b.change_24h_pct));

    let losers = movers.iter().take(MOVERS_PER_SIDE).cloned().collect();
    let gainers = movers.iter().rev().take(MOVERS_PER_SIDE).cloned().collect();

    MarketMovers {
        gainers,
        losers,
        as_of: chrono::Utc::now(),
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    fn source(&self) -> Source {
        Source::Binance
    }

    async fn fetch_price(&self, symbol: &str) -> Result<PriceRecord, ProviderError> {
        let symbol = require_non_empty("symbol", symbol)?;
        let pair = symbols::binance_pair(symbol);

        let request = self
            .http
            .get(self.url("/ticker/24hr"))
            .query(&[("symbol", pair.as_str())]);

        let ticker: Ticker24h = get_json(request, self.config.timeout).await?;
        ticker.into_price(&symbols::normalize(symbol))
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, ProviderError> {
        let symbol = require_non_empty("symbol", symbol)?;
        let limit = require_positive("limit", limit)?;
        if limit > MAX_KLINES {
            return Err(ProviderError::InvalidRequest(format!(
                "limit {} exceeds Binance maximum of {}",
                limit, MAX_KLINES
            )));
        }

        let pair = symbols::binance_pair(symbol);
        let request = self.http.get(self.url("/klines")).query(&[
            ("symbol", pair.as_str()),
            ("interval", interval.as_str()),
            ("limit", limit.to_string().as_str()),
        ]);

        let rows: Vec<RawKline> = get_json(request, self.config.timeout).await?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }

    async fn fetch_movers(&self) -> Result<MarketMovers, ProviderError> {
        let request = self.http.get(self.url("/ticker/24hr"));
        let tickers: Vec<Ticker24h> = get_json(request, self.config.timeout).await?;

        tracing::debug!("Ranking {} Binance tickers", tickers.len());
        Ok(rank_movers(&tickers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(symbol: &str, change: f64) -> Ticker24h {
        Ticker24h {
            symbol: symbol.to_string(),
            last_price: "1".into(),
            price_change_percent: change.to_string(),
            high_price: "1".into(),
            low_price: "1".into(),
            quote_volume: "1".into(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = BinanceClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.source(), Source::Binance);
    }

    #[test]
    fn test_rank_movers() {
        let tickers: Vec<Ticker24h> = (0..12)
            .map(|i| ticker(&format!("T{}USDT", i), i as f64 - 6.0))
            .chain(std::iter::once(ticker("ETHBTC", 99.0)))
            .collect();

        let movers = rank_movers(&tickers);
        assert_eq!(movers.gainers.len(), 5);
        assert_eq!(movers.losers.len(), 5);
        assert_eq!(movers.gainers[0].symbol, "T11");
        assert_eq!(movers.gainers[0].change_24h_pct, 5.0);
        assert_eq!(movers.losers[0].symbol, "T0");
        assert_eq!(movers.losers[0].change_24h_pct, -6.0);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_io() {
        let client = BinanceClient::with_config(BinanceConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(50),
        })
        .unwrap();

        let err = client.fetch_price("  ").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));

        let err = client.fetch_ohlcv("BTC", Interval::OneDay, 0).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));

        let err = client.fetch_ohlcv("BTC", Interval::OneDay, 1001).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }
}
