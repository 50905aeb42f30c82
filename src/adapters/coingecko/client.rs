//! CoinGecko Client
//!
//! Alternate price source. Works without a key; a demo key raises the
//! rate limit. Candles are synthesized from the market chart series, so only
//! hourly and daily intervals are available.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::types::{MarketChart, SimplePriceResponse};
use crate::adapters::http::{build_client, get_json, require_non_empty, require_positive};
use crate::domain::records::{Candle, PriceRecord};
use crate::domain::symbols;
use crate::ports::provider::{Interval, PriceSource, ProviderError, Source};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Header carrying the optional demo key
const DEMO_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko client configuration
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    /// Optional demo API key for higher rate limits
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
}

impl CoinGeckoClient {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(CoinGeckoConfig::default())
    }

    pub fn with_config(config: CoinGeckoConfig) -> Result<Self, ProviderError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut req = self.http.get(url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header(DEMO_KEY_HEADER, api_key);
        }
        req
    }
}

/// Chart query (`days`, `interval`) covering `limit` bars
fn chart_window(interval: Interval, limit: u32) -> Result<(u32, Option<&'static str>), ProviderError> {
    match interval {
        Interval::OneDay => Ok((limit, Some("daily"))),
        // Ranges of 2..=90 days come back hourly
        Interval::OneHour => Ok((limit.div_ceil(24).clamp(2, 90), None)),
        other => Err(ProviderError::Unsupported(format!(
            "coingecko charts support 1h and 1d candles, not {}",
            other
        ))),
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn source(&self) -> Source {
        Source::CoinGecko
    }

    async fn fetch_price(&self, symbol: &str) -> Result<PriceRecord, ProviderError> {
        let symbol = require_non_empty("symbol", symbol)?;
        let coin_id = symbols::coingecko_id(symbol);

        let request = self.get("/simple/price").query(&[
            ("ids", coin_id.as_str()),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
            ("include_24hr_vol", "true"),
        ]);

        let mut body: SimplePriceResponse = get_json(request, self.config.timeout).await?;
        let quote = body.remove(&coin_id).ok_or_else(|| {
            ProviderError::UpstreamUnavailable(format!("coingecko has no price for '{}'", coin_id))
        })?;

        quote.into_price(&symbols::normalize(symbol))
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, ProviderError> {
        let symbol = require_non_empty("symbol", symbol)?;
        let limit = require_positive("limit", limit)?;
        let (days, granularity) = chart_window(interval, limit)?;
        let coin_id = symbols::coingecko_id(symbol);

        let days = days.to_string();
        let mut request = self
            .get(&format!("/coins/{}/market_chart", coin_id))
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);
        if let Some(granularity) = granularity {
            request = request.query(&[("interval", granularity)]);
        }

        let chart: MarketChart = get_json(request, self.config.timeout).await?;
        let mut candles = chart.into_candles()?;

        // Daily charts include today's partial point, so `days` yields `days + 1`
        let excess = candles.len().saturating_sub(limit as usize);
        candles.drain(..excess);
        Ok(candles)
    }
}
