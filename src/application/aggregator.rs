//! Fan-Out Aggregator
//!
//! Resolves logical [`FetchRequest`]s against the configured providers. Each
//! request is checked against the shared TTL cache first; misses are
//! dispatched to the matching capability trait under a per-call deadline and
//! successful payloads are cached with the TTL of their source class.
//!
//! Batches run concurrently with at most `max_in_flight` calls outstanding.
//! Results come back in request order whatever order the calls finish in,
//! and one failed call never disturbs its siblings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::domain::cache::{Clock, SystemClock, TtlCache};
use crate::domain::symbols;
use crate::ports::provider::{
    ChainSource, DefiSource, Interval, PriceSource, ProviderError, ProviderResult, Record,
    SentimentSource, Source, WalletSource,
};

/// Default deadline for a single provider call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Default cap on concurrently outstanding provider calls
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Source class deciding how long a payload stays fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    Price,
    Candles,
    Movers,
    Tvl,
    Yields,
    Sentiment,
    Wallet,
    Gas,
}

impl TtlClass {
    pub const ALL: [TtlClass; 8] = [
        TtlClass::Price,
        TtlClass::Candles,
        TtlClass::Movers,
        TtlClass::Tvl,
        TtlClass::Yields,
        TtlClass::Sentiment,
        TtlClass::Wallet,
        TtlClass::Gas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TtlClass::Price => "price",
            TtlClass::Candles => "candles",
            TtlClass::Movers => "movers",
            TtlClass::Tvl => "tvl",
            TtlClass::Yields => "yields",
            TtlClass::Sentiment => "sentiment",
            TtlClass::Wallet => "wallet",
            TtlClass::Gas => "gas",
        }
    }
}

impl fmt::Display for TtlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freshness window per source class. A zero TTL disables caching for
/// that class.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlPolicy {
    pub price: Duration,
    pub candles: Duration,
    pub movers: Duration,
    pub tvl: Duration,
    pub yields: Duration,
    pub sentiment: Duration,
    pub wallet: Duration,
    pub gas: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            price: Duration::from_secs(10),
            candles: Duration::from_secs(60),
            movers: Duration::from_secs(60),
            tvl: Duration::from_secs(300),
            yields: Duration::from_secs(600),
            sentiment: Duration::from_secs(3600),
            wallet: Duration::from_secs(120),
            gas: Duration::from_secs(30),
        }
    }
}

impl TtlPolicy {
    pub fn ttl(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Price => self.price,
            TtlClass::Candles => self.candles,
            TtlClass::Movers => self.movers,
            TtlClass::Tvl => self.tvl,
            TtlClass::Yields => self.yields,
            TtlClass::Sentiment => self.sentiment,
            TtlClass::Wallet => self.wallet,
            TtlClass::Gas => self.gas,
        }
    }

    pub fn set(&mut self, class: TtlClass, ttl: Duration) {
        let slot = match class {
            TtlClass::Price => &mut self.price,
            TtlClass::Candles => &mut self.candles,
            TtlClass::Movers => &mut self.movers,
            TtlClass::Tvl => &mut self.tvl,
            TtlClass::Yields => &mut self.yields,
            TtlClass::Sentiment => &mut self.sentiment,
            TtlClass::Wallet => &mut self.wallet,
            TtlClass::Gas => &mut self.gas,
        };
        *slot = ttl;
    }
}

/// One logical query against a provider capability
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Price { symbol: String },
    Ohlcv { symbol: String, interval: Interval, limit: u32 },
    Movers,
    DefiOverview,
    Protocol { slug: String },
    DexVolumes,
    Yields { min_tvl_usd: f64, limit: usize },
    Stablecoins,
    ProtocolFees,
    TokenPrice { coin_id: String },
    FearGreed { limit: u32 },
    Wallet { address: String, chain: String },
    DefiPositions { address: String, chain: String },
    TokenHolders { token_address: String, chain: String, limit: u32 },
    EthBalance { address: String },
    EthTransactions { address: String, limit: u32 },
    TokenTransfers { address: String, limit: u32 },
    TopHolders { token_address: String },
    Gas,
}

fn lower(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

impl FetchRequest {
    pub fn price(symbol: impl Into<String>) -> Self {
        FetchRequest::Price {
            symbol: symbol.into(),
        }
    }

    pub fn ohlcv(symbol: impl Into<String>, interval: Interval, limit: u32) -> Self {
        FetchRequest::Ohlcv {
            symbol: symbol.into(),
            interval,
            limit,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            FetchRequest::Price { .. } => "price",
            FetchRequest::Ohlcv { .. } => "ohlcv",
            FetchRequest::Movers => "movers",
            FetchRequest::DefiOverview => "defi_overview",
            FetchRequest::Protocol { .. } => "protocol",
            FetchRequest::DexVolumes => "dex_volumes",
            FetchRequest::Yields { .. } => "yields",
            FetchRequest::Stablecoins => "stablecoins",
            FetchRequest::ProtocolFees => "protocol_fees",
            FetchRequest::TokenPrice { .. } => "token_price",
            FetchRequest::FearGreed { .. } => "fear_greed",
            FetchRequest::Wallet { .. } => "wallet",
            FetchRequest::DefiPositions { .. } => "defi_positions",
            FetchRequest::TokenHolders { .. } => "token_holders",
            FetchRequest::EthBalance { .. } => "eth_balance",
            FetchRequest::EthTransactions { .. } => "eth_transactions",
            FetchRequest::TokenTransfers { .. } => "token_transfers",
            FetchRequest::TopHolders { .. } => "top_holders",
            FetchRequest::Gas => "gas",
        }
    }

    pub fn ttl_class(&self) -> TtlClass {
        match self {
            FetchRequest::Price { .. } | FetchRequest::TokenPrice { .. } => TtlClass::Price,
            FetchRequest::Ohlcv { .. } => TtlClass::Candles,
            FetchRequest::Movers => TtlClass::Movers,
            FetchRequest::DefiOverview
            | FetchRequest::Protocol { .. }
            | FetchRequest::DexVolumes
            | FetchRequest::ProtocolFees => TtlClass::Tvl,
            FetchRequest::Yields { .. } | FetchRequest::Stablecoins => TtlClass::Yields,
            FetchRequest::FearGreed { .. } => TtlClass::Sentiment,
            FetchRequest::Wallet { .. }
            | FetchRequest::DefiPositions { .. }
            | FetchRequest::TokenHolders { .. }
            | FetchRequest::EthTransactions { .. }
            | FetchRequest::TokenTransfers { .. }
            | FetchRequest::TopHolders { .. } => TtlClass::Wallet,
            FetchRequest::EthBalance { .. } | FetchRequest::Gas => TtlClass::Gas,
        }
    }

    /// What the request is about: a symbol, slug, address or the operation
    pub fn subject(&self) -> String {
        match self {
            FetchRequest::Price { symbol } | FetchRequest::Ohlcv { symbol, .. } => {
                symbols::normalize(symbol)
            }
            FetchRequest::Protocol { slug } => lower(slug),
            FetchRequest::TokenPrice { coin_id } => lower(coin_id),
            FetchRequest::Wallet { address, .. }
            | FetchRequest::DefiPositions { address, .. }
            | FetchRequest::EthBalance { address }
            | FetchRequest::EthTransactions { address, .. }
            | FetchRequest::TokenTransfers { address, .. } => address.trim().to_string(),
            FetchRequest::TokenHolders { token_address, .. } | FetchRequest::TopHolders { token_address } => {
                token_address.trim().to_string()
            }
            other => other.operation().to_string(),
        }
    }

    fn params(&self) -> Option<String> {
        match self {
            FetchRequest::Price { symbol } => Some(symbols::normalize(symbol)),
            FetchRequest::Ohlcv {
                symbol,
                interval,
                limit,
            } => Some(format!("{}:{}:{}", symbols::normalize(symbol), interval, limit)),
            FetchRequest::Protocol { slug } => Some(lower(slug)),
            FetchRequest::TokenPrice { coin_id } => Some(lower(coin_id)),
            FetchRequest::Yields { min_tvl_usd, limit } => Some(format!("{}:{}", min_tvl_usd, limit)),
            FetchRequest::FearGreed { limit } => Some(limit.to_string()),
            FetchRequest::Wallet { address, chain } | FetchRequest::DefiPositions { address, chain } => {
                Some(format!("{}:{}", lower(address), lower(chain)))
            }
            FetchRequest::TokenHolders {
                token_address,
                chain,
                limit,
            } => Some(format!("{}:{}:{}", lower(token_address), lower(chain), limit)),
            FetchRequest::EthBalance { address } => Some(lower(address)),
            FetchRequest::EthTransactions { address, limit }
            | FetchRequest::TokenTransfers { address, limit } => Some(format!("{}:{}", lower(address), limit)),
            FetchRequest::TopHolders { token_address } => Some(lower(token_address)),
            FetchRequest::Movers
            | FetchRequest::DefiOverview
            | FetchRequest::DexVolumes
            | FetchRequest::Stablecoins
            | FetchRequest::ProtocolFees
            | FetchRequest::Gas => None,
        }
    }

    /// Deterministic `{source}:{operation}[:{params}]` key
    pub fn cache_key(&self, source: Source) -> String {
        match self.params() {
            Some(params) => format!("{}:{}:{}", source, self.operation(), params),
            None => format!("{}:{}", source, self.operation()),
        }
    }
}

/// One provider per capability
#[derive(Clone)]
pub struct Providers {
    pub price: Arc<dyn PriceSource>,
    pub defi: Arc<dyn DefiSource>,
    pub sentiment: Arc<dyn SentimentSource>,
    pub wallet: Arc<dyn WalletSource>,
    pub chain: Arc<dyn ChainSource>,
}

impl Providers {
    /// Serve every capability from one provider
    pub fn uniform<P>(provider: Arc<P>) -> Self
    where
        P: PriceSource + DefiSource + SentimentSource + WalletSource + ChainSource + 'static,
    {
        Self {
            price: provider.clone(),
            defi: provider.clone(),
            sentiment: provider.clone(),
            wallet: provider.clone(),
            chain: provider,
        }
    }

    /// Upstream that would serve `request`
    pub fn source_for(&self, request: &FetchRequest) -> Source {
        match request {
            FetchRequest::Price { .. } | FetchRequest::Ohlcv { .. } | FetchRequest::Movers => {
                self.price.source()
            }
            FetchRequest::DefiOverview
            | FetchRequest::Protocol { .. }
            | FetchRequest::DexVolumes
            | FetchRequest::Yields { .. }
            | FetchRequest::Stablecoins
            | FetchRequest::ProtocolFees
            | FetchRequest::TokenPrice { .. } => self.defi.source(),
            FetchRequest::FearGreed { .. } => self.sentiment.source(),
            FetchRequest::Wallet { .. }
            | FetchRequest::DefiPositions { .. }
            | FetchRequest::TokenHolders { .. } => self.wallet.source(),
            FetchRequest::EthBalance { .. }
            | FetchRequest::EthTransactions { .. }
            | FetchRequest::TokenTransfers { .. }
            | FetchRequest::TopHolders { .. }
            | FetchRequest::Gas => self.chain.source(),
        }
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("price", &self.price.source())
            .field("defi", &self.defi.source())
            .field("sentiment", &self.sentiment.source())
            .field("wallet", &self.wallet.source())
            .field("chain", &self.chain.source())
            .finish()
    }
}

/// Aggregator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    /// Deadline applied to every provider call
    pub call_timeout: Duration,
    /// Maximum provider calls outstanding within one batch
    pub max_in_flight: usize,
    pub ttl: TtlPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            ttl: TtlPolicy::default(),
        }
    }
}

/// Cache-first, bounded, order-preserving fan-out over the providers
#[derive(Debug)]
pub struct FanOutAggregator {
    providers: Providers,
    cache: Arc<TtlCache<Record>>,
    config: AggregatorConfig,
}

impl FanOutAggregator {
    pub fn new(providers: Providers, config: AggregatorConfig) -> Self {
        Self::with_clock(providers, config, Arc::new(SystemClock))
    }

    /// Create an aggregator with a private cache reading time from `clock`
    pub fn with_clock(providers: Providers, config: AggregatorConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_cache(providers, config, Arc::new(TtlCache::with_clock(clock)))
    }

    /// Create an aggregator over an existing cache, which may be shared
    pub fn with_cache(providers: Providers, config: AggregatorConfig, cache: Arc<TtlCache<Record>>) -> Self {
        Self {
            providers,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<Record>> {
        &self.cache
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Resolve one request, serving from the cache when fresh
    pub async fn fetch(&self, request: &FetchRequest) -> ProviderResult {
        let source = self.providers.source_for(request);
        let key = request.cache_key(source);

        if let Some(record) = self.cache.get(&key) {
            tracing::debug!("Cache hit: {}", key);
            let mut result = ProviderResult::new(source, request.subject(), Ok(record));
            result.cached = true;
            return result;
        }

        tracing::debug!("Cache miss: {}, dispatching to {}", key, source);
        let deadline = self.config.call_timeout;
        let outcome = match tokio::time::timeout(deadline, self.dispatch(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Timeout(deadline)),
        };

        match &outcome {
            Ok(record) => {
                let ttl = self.config.ttl.ttl(request.ttl_class());
                if !ttl.is_zero() {
                    self.cache.set(key, record.clone(), ttl);
                }
            }
            Err(e) => {
                tracing::warn!("{} {} failed for '{}': {}", source, request.operation(), request.subject(), e);
            }
        }

        ProviderResult::new(source, request.subject(), outcome)
    }

    /// Resolve a batch concurrently; output order matches input order
    pub async fn fetch_all(&self, requests: &[FetchRequest]) -> Vec<ProviderResult> {
        let limit = self.config.max_in_flight.max(1);
        stream::iter(requests.iter().map(|request| self.fetch(request)))
            .buffered(limit)
            .collect()
            .await
    }

    async fn dispatch(&self, request: &FetchRequest) -> Result<Record, ProviderError> {
        let p = &self.providers;
        match request {
            FetchRequest::Price { symbol } => p.price.fetch_price(symbol).await.map(Record::from),
            FetchRequest::Ohlcv {
                symbol,
                interval,
                limit,
            } => p
                .price
                .fetch_ohlcv(symbol, *interval, *limit)
                .await
                .map(Record::from),
            FetchRequest::Movers => p.price.fetch_movers().await.map(Record::from),
            FetchRequest::DefiOverview => p.defi.fetch_overview().await.map(Record::from),
            FetchRequest::Protocol { slug } => p.defi.fetch_protocol(slug).await.map(Record::from),
            FetchRequest::DexVolumes => p.defi.fetch_dex_volumes().await.map(Record::from),
            FetchRequest::Yields { min_tvl_usd, limit } => p
                .defi
                .fetch_yields(*min_tvl_usd, *limit)
                .await
                .map(Record::from),
            FetchRequest::Stablecoins => p.defi.fetch_stablecoins().await.map(Record::from),
            FetchRequest::ProtocolFees => p.defi.fetch_protocol_fees().await.map(Record::from),
            FetchRequest::TokenPrice { coin_id } => {
                p.defi.fetch_token_price(coin_id).await.map(Record::from)
            }
            FetchRequest::FearGreed { limit } => {
                p.sentiment.fetch_fear_greed(*limit).await.map(Record::from)
            }
            FetchRequest::Wallet { address, chain } => {
                p.wallet.fetch_wallet(address, chain).await.map(Record::from)
            }
            FetchRequest::DefiPositions { address, chain } => p
                .wallet
                .fetch_defi_positions(address, chain)
                .await
                .map(Record::from),
            FetchRequest::TokenHolders {
                token_address,
                chain,
                limit,
            } => p
                .wallet
                .fetch_token_holders(token_address, chain, *limit)
                .await
                .map(Record::from),
            FetchRequest::EthBalance { address } => {
                p.chain.fetch_eth_balance(address).await.map(Record::from)
            }
            FetchRequest::EthTransactions { address, limit } => p
                .chain
                .fetch_transactions(address, *limit)
                .await
                .map(Record::from),
            FetchRequest::TokenTransfers { address, limit } => p
                .chain
                .fetch_token_transfers(address, *limit)
                .await
                .map(Record::from),
            FetchRequest::TopHolders { token_address } => {
                p.chain.fetch_top_holders(token_address).await.map(Record::from)
            }
            FetchRequest::Gas => p.chain.fetch_gas().await.map(Record::from),
        }
    }
}
