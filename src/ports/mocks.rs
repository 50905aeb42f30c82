//! Mock Providers
//!
//! In-memory implementations of every capability trait. Responses, failures
//! and artificial latency are configured per `operation:subject` key and every
//! call is recorded so tests can assert how often an upstream was reached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};

use super::provider::{
    ChainSource, DefiSource, FromRecord, Interval, PriceSource, ProviderError, Record,
    SentimentSource, Source, WalletSource,
};
use crate::domain::records::{
    Candle, DefiOverview, DefiPosition, DexVolumes, EthBalance, EthTransaction, FearGreedReading,
    FearGreedWindow, GasOracle, MarketMovers, PriceRecord, ProtocolDetail, ProtocolFees, Stablecoin,
    TokenHolder, TokenPrice, TokenTransfer, WalletSnapshot, YieldPool,
};
use crate::domain::symbols;

/// Mock provider that answers from a table of canned records
#[derive(Debug, Clone)]
pub struct MockProvider {
    source: Source,
    responses: Arc<Mutex<HashMap<String, Result<Record, ProviderError>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Source::Binance)
    }
}

fn call_key(operation: &str, subject: &str) -> String {
    format!("{}:{}", operation, subject)
}

impl MockProvider {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            responses: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builder method to answer `operation:subject` with a record
    pub fn with_response(self, operation: &str, subject: &str, record: impl Into<Record>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(call_key(operation, subject), Ok(record.into()));
        self
    }

    /// Builder method to fail `operation:subject`
    pub fn with_failure(self, operation: &str, subject: &str, error: ProviderError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(call_key(operation, subject), Err(error));
        self
    }

    /// Builder method to delay `operation:subject` before answering
    pub fn with_delay(self, operation: &str, subject: &str, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(call_key(operation, subject), delay);
        self
    }

    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        let symbol = symbols::normalize(symbol);
        let record = sample_price(&symbol, price);
        self.with_response("price", &symbol, record)
    }

    pub fn with_candles(self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.with_response("ohlcv", &symbols::normalize(symbol), candles)
    }

    pub fn with_fear_greed(self, window: FearGreedWindow) -> Self {
        self.with_response("fear_greed", "", window)
    }

    /// Get all recorded calls as `operation:subject`
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made for one operation
    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{}:", operation);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    async fn respond<T: FromRecord>(&self, operation: &str, subject: &str) -> Result<T, ProviderError> {
        let key = call_key(operation, subject);
        self.calls.lock().unwrap().push(key.clone());

        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().get(&key).cloned();
        match response {
            Some(Ok(record)) => T::from_record(record).map_err(|other| {
                ProviderError::malformed(format!("mock for {} holds {}", key, other.kind()))
            }),
            Some(Err(error)) => Err(error),
            None => Err(ProviderError::UpstreamUnavailable(format!(
                "400 Bad Request: no mock response for {}",
                key
            ))),
        }
    }
}

#[async_trait]
impl PriceSource for MockProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_price(&self, symbol: &str) -> Result<PriceRecord, ProviderError> {
        self.respond("price", &symbols::normalize(symbol)).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        _interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, ProviderError> {
        let mut candles: Vec<Candle> = self.respond("ohlcv", &symbols::normalize(symbol)).await?;
        let excess = candles.len().saturating_sub(limit as usize);
        candles.drain(..excess);
        Ok(candles)
    }

    async fn fetch_movers(&self) -> Result<MarketMovers, ProviderError> {
        self.respond("movers", "").await
    }
}

#[async_trait]
impl DefiSource for MockProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_overview(&self) -> Result<DefiOverview, ProviderError> {
        self.respond("defi_overview", "").await
    }

    async fn fetch_protocol(&self, slug: &str) -> Result<ProtocolDetail, ProviderError> {
        self.respond("protocol", slug).await
    }

    async fn fetch_dex_volumes(&self) -> Result<DexVolumes, ProviderError> {
        self.respond("dex_volumes", "").await
    }

    async fn fetch_yields(&self, min_tvl_usd: f64, limit: usize) -> Result<Vec<YieldPool>, ProviderError> {
        let pools: Vec<YieldPool> = self.respond("yields", "").await?;
        Ok(pools
            .into_iter()
            .filter(|p| p.tvl_usd >= min_tvl_usd)
            .take(limit)
            .collect())
    }

    async fn fetch_stablecoins(&self) -> Result<Vec<Stablecoin>, ProviderError> {
        self.respond("stablecoins", "").await
    }

    async fn fetch_protocol_fees(&self) -> Result<ProtocolFees, ProviderError> {
        self.respond("protocol_fees", "").await
    }

    async fn fetch_token_price(&self, coin_id: &str) -> Result<TokenPrice, ProviderError> {
        self.respond("token_price", coin_id).await
    }
}

#[async_trait]
impl SentimentSource for MockProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_fear_greed(&self, limit: u32) -> Result<FearGreedWindow, ProviderError> {
        let mut window: FearGreedWindow = self.respond("fear_greed", "").await?;
        window.readings.truncate(limit as usize);
        Ok(window)
    }
}

#[async_trait]
impl WalletSource for MockProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_wallet(&self, address: &str, _chain: &str) -> Result<WalletSnapshot, ProviderError> {
        self.respond("wallet", address).await
    }

    async fn fetch_defi_positions(&self, address: &str, _chain: &str) -> Result<Vec<DefiPosition>, ProviderError> {
        self.respond("defi_positions", address).await
    }

    async fn fetch_token_holders(
        &self,
        token_address: &str,
        _chain: &str,
        limit: u32,
    ) -> Result<Vec<TokenHolder>, ProviderError> {
        let mut holders: Vec<TokenHolder> = self.respond("token_holders", token_address).await?;
        holders.truncate(limit as usize);
        Ok(holders)
    }
}

#[async_trait]
impl ChainSource for MockProvider {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_eth_balance(&self, address: &str) -> Result<EthBalance, ProviderError> {
        self.respond("eth_balance", address).await
    }

    async fn fetch_transactions(&self, address: &str, limit: u32) -> Result<Vec<EthTransaction>, ProviderError> {
        let mut txs: Vec<EthTransaction> = self.respond("eth_transactions", address).await?;
        txs.truncate(limit as usize);
        Ok(txs)
    }

    async fn fetch_token_transfers(&self, address: &str, limit: u32) -> Result<Vec<TokenTransfer>, ProviderError> {
        let mut transfers: Vec<TokenTransfer> = self.respond("token_transfers", address).await?;
        transfers.truncate(limit as usize);
        Ok(transfers)
    }

    async fn fetch_top_holders(&self, token_address: &str) -> Result<Vec<TokenHolder>, ProviderError> {
        self.respond("top_holders", token_address).await
    }

    async fn fetch_gas(&self) -> Result<GasOracle, ProviderError> {
        self.respond("gas", "").await
    }
}

/// Price record with zeroed extras
pub fn sample_price(symbol: &str, price: f64) -> PriceRecord {
    PriceRecord {
        symbol: symbol.to_string(),
        price,
        change_24h_pct: 0.0,
        high_24h: None,
        low_24h: None,
        volume_24h_usd: 0.0,
    }
}

/// Token holders with descending balances
pub fn sample_holders(balances: &[f64]) -> Vec<TokenHolder> {
    balances
        .iter()
        .enumerate()
        .map(|(rank, &balance)| TokenHolder {
            address: format!("0x{:040x}", rank + 1),
            label: None,
            balance,
            value_usd: None,
            share_pct: None,
        })
        .collect()
}

/// Daily candles with the given closes and volumes, oldest first
pub fn sample_candles(closes: &[f64], volumes: &[f64]) -> Vec<Candle> {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    closes
        .iter()
        .zip(volumes.iter())
        .enumerate()
        .map(|(day, (&close, &volume))| Candle {
            open_time: start + ChronoDuration::days(day as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        })
        .collect()
}

/// Fear & greed window from values, newest first
pub fn sample_fear_greed(values: &[u8]) -> FearGreedWindow {
    let newest = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    FearGreedWindow {
        readings: values
            .iter()
            .enumerate()
            .map(|(age, &value)| FearGreedReading {
                value,
                label: FearGreedReading::label_for(value).to_string(),
                timestamp: newest - ChronoDuration::days(age as i64),
            })
            .collect(),
    }
}
