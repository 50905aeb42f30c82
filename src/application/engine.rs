//! Market Engine
//!
//! Facade over the fan-out aggregator and the mood index service. Every
//! query goes through the shared cache and comes back as a typed
//! `ProviderResult`, so a failing upstream never fails the caller.

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::binance::BinanceClient;
use crate::adapters::coingecko::CoinGeckoClient;
use crate::adapters::defillama::DefiLlamaClient;
use crate::adapters::etherscan::EtherscanClient;
use crate::adapters::fear_greed::FearGreedClient;
use crate::adapters::moralis::MoralisClient;
use crate::config::{Config, PriceProvider};
use crate::domain::cache::{CacheStats, Clock, SystemClock, TtlCache};
use crate::domain::records::{
    Candle, DefiOverview, DefiPosition, DexVolumes, EthBalance, EthTransaction, FearGreedWindow,
    GasOracle, MarketMovers, PriceRecord, ProtocolDetail, ProtocolFees, Stablecoin, TokenHolder,
    TokenPrice, TokenTransfer, WalletSnapshot, YieldPool,
};
use crate::domain::scoring::{ComponentWeights, CompositeIndex, CompositeScorer, ScoringError};
use crate::ports::provider::{
    FromRecord, Interval, PriceSource, ProviderError, ProviderResult, Record,
};

use super::aggregator::{AggregatorConfig, FanOutAggregator, FetchRequest, Providers};
use super::composite::MoodIndexService;

/// Engine construction errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Scoring setup failed: {0}")]
    Scoring(#[from] ScoringError),
}

/// Everything the engine needs besides its providers
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub aggregator: AggregatorConfig,
    pub weights: ComponentWeights,
    pub scorer: CompositeScorer,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        Ok(Self {
            aggregator: AggregatorConfig::from(config),
            weights: config.weights.to_weights()?,
            scorer: config.scorer()?,
        })
    }
}

/// Market data and mood engine
#[derive(Debug)]
pub struct MarketEngine {
    aggregator: FanOutAggregator,
    mood: MoodIndexService,
}

impl MarketEngine {
    /// Build real HTTP clients for every capability
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let settings = EngineSettings::from_config(config)?;

        let price: Arc<dyn PriceSource> = match config.providers.price {
            PriceProvider::Binance => Arc::new(BinanceClient::with_config(config.into())?),
            PriceProvider::CoinGecko => Arc::new(CoinGeckoClient::with_config(config.into())?),
        };

        let moralis = MoralisClient::with_config(config.into())?;
        if !moralis.has_credential() {
            tracing::warn!("MORALIS_API_KEY not set, wallet snapshots will be unavailable");
        }
        let etherscan = EtherscanClient::with_config(config.into())?;
        if !etherscan.has_credential() {
            tracing::warn!("ETHERSCAN_API_KEY not set, balances and gas will be unavailable");
        }

        let providers = Providers {
            price,
            defi: Arc::new(DefiLlamaClient::with_config(config.into())?),
            sentiment: Arc::new(FearGreedClient::with_config(config.into())?),
            wallet: Arc::new(moralis),
            chain: Arc::new(etherscan),
        };

        tracing::info!("Market engine ready: {:?}", providers);
        Ok(Self::with_providers(providers, settings, Arc::new(SystemClock)))
    }

    /// Assemble from injected providers and clock
    pub fn with_providers(providers: Providers, settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        Self::with_cache(providers, settings, Arc::new(TtlCache::with_clock(clock)))
    }

    /// Assemble over an existing cache, e.g. one shared with another engine
    pub fn with_cache(providers: Providers, settings: EngineSettings, cache: Arc<TtlCache<Record>>) -> Self {
        Self {
            aggregator: FanOutAggregator::with_cache(providers, settings.aggregator, cache),
            mood: MoodIndexService::new(settings.scorer, settings.weights),
        }
    }

    pub fn aggregator(&self) -> &FanOutAggregator {
        &self.aggregator
    }

    async fn fetch<T: FromRecord>(&self, request: FetchRequest) -> ProviderResult<T> {
        self.aggregator.fetch(&request).await.typed()
    }

    async fn fetch_many<T: FromRecord>(&self, requests: Vec<FetchRequest>) -> Vec<ProviderResult<T>> {
        self.aggregator
            .fetch_all(&requests)
            .await
            .into_iter()
            .map(|r| r.typed())
            .collect()
    }

    pub async fn get_price(&self, symbol: &str) -> ProviderResult<PriceRecord> {
        self.fetch(FetchRequest::price(symbol)).await
    }

    /// Prices for several symbols concurrently, in input order
    pub async fn get_prices_multi<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<ProviderResult<PriceRecord>> {
        let requests = symbols
            .iter()
            .map(|s| FetchRequest::price(s.as_ref()))
            .collect();
        self.fetch_many(requests).await
    }

    pub async fn get_ohlcv(&self, symbol: &str, interval: Interval, limit: u32) -> ProviderResult<Vec<Candle>> {
        self.fetch(FetchRequest::ohlcv(symbol, interval, limit)).await
    }

    /// Always produces an index; failed inputs score neutral
    pub async fn get_composite_index(&self, token: &str) -> CompositeIndex {
        self.mood.compute(&self.aggregator, token).await
    }

    pub async fn get_wallet_snapshot(&self, address: &str, chain: &str) -> ProviderResult<WalletSnapshot> {
        self.fetch(FetchRequest::Wallet {
            address: address.to_string(),
            chain: chain.to_string(),
        })
        .await
    }

    pub async fn get_wallet_defi_positions(&self, address: &str, chain: &str) -> ProviderResult<Vec<DefiPosition>> {
        self.fetch(FetchRequest::DefiPositions {
            address: address.to_string(),
            chain: chain.to_string(),
        })
        .await
    }

    /// Largest holders of an ERC-20 token, biggest first
    pub async fn get_token_holders(
        &self,
        token_address: &str,
        chain: &str,
        limit: u32,
    ) -> ProviderResult<Vec<TokenHolder>> {
        self.fetch(FetchRequest::TokenHolders {
            token_address: token_address.to_string(),
            chain: chain.to_string(),
            limit,
        })
        .await
    }

    pub async fn get_market_movers(&self) -> ProviderResult<MarketMovers> {
        self.fetch(FetchRequest::Movers).await
    }

    pub async fn get_defi_overview(&self) -> ProviderResult<DefiOverview> {
        self.fetch(FetchRequest::DefiOverview).await
    }

    pub async fn get_protocol(&self, slug: &str) -> ProviderResult<ProtocolDetail> {
        self.fetch(FetchRequest::Protocol {
            slug: slug.to_string(),
        })
        .await
    }

    pub async fn get_dex_volumes(&self) -> ProviderResult<DexVolumes> {
        self.fetch(FetchRequest::DexVolumes).await
    }

    pub async fn get_top_yields(&self, min_tvl_usd: f64, limit: usize) -> ProviderResult<Vec<YieldPool>> {
        self.fetch(FetchRequest::Yields { min_tvl_usd, limit }).await
    }

    pub async fn get_stablecoins(&self) -> ProviderResult<Vec<Stablecoin>> {
        self.fetch(FetchRequest::Stablecoins).await
    }

    /// Protocol fees over the last day and week, top earners first
    pub async fn get_protocol_revenues(&self) -> ProviderResult<ProtocolFees> {
        self.fetch(FetchRequest::ProtocolFees).await
    }

    /// Price by `chain:address` or `coingecko:id` coin id
    pub async fn get_token_price_llama(&self, coin_id: &str) -> ProviderResult<TokenPrice> {
        self.fetch(FetchRequest::TokenPrice {
            coin_id: coin_id.to_string(),
        })
        .await
    }

    pub async fn get_fear_greed(&self, limit: u32) -> ProviderResult<FearGreedWindow> {
        self.fetch(FetchRequest::FearGreed { limit }).await
    }

    pub async fn get_eth_balance(&self, address: &str) -> ProviderResult<EthBalance> {
        self.fetch(FetchRequest::EthBalance {
            address: address.to_string(),
        })
        .await
    }

    /// Latest normal transactions of an account, newest first
    pub async fn get_eth_transactions(&self, address: &str, limit: u32) -> ProviderResult<Vec<EthTransaction>> {
        self.fetch(FetchRequest::EthTransactions {
            address: address.to_string(),
            limit,
        })
        .await
    }

    pub async fn get_token_transfers(&self, address: &str, limit: u32) -> ProviderResult<Vec<TokenTransfer>> {
        self.fetch(FetchRequest::TokenTransfers {
            address: address.to_string(),
            limit,
        })
        .await
    }

    pub async fn get_top_token_holders(&self, token_address: &str) -> ProviderResult<Vec<TokenHolder>> {
        self.fetch(FetchRequest::TopHolders {
            token_address: token_address.to_string(),
        })
        .await
    }

    pub async fn get_gas_oracle(&self) -> ProviderResult<GasOracle> {
        self.fetch(FetchRequest::Gas).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.aggregator.cache().stats()
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_cache(&self) -> usize {
        let removed = self.aggregator.cache().purge_expired();
        tracing::debug!("Purged {} expired cache entries", removed);
        removed
    }
}
