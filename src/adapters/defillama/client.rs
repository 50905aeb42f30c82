//! DefiLlama Client
//!
//! HTTP client for the free DefiLlama APIs: global and per-protocol TVL, DEX
//! volumes, protocol fees, yield pools, stablecoin supply and coin prices.
//! Four hosts are involved, each with its own configurable base URL.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use super::types::{
    ChainTvlPoint, CoinsResponse, LlamaPool, LlamaProtocol, LlamaProtocolDetail, Overview,
    OverviewEntry, PoolsResponse, StablecoinsResponse,
};
use crate::adapters::http::{build_client, get_json, require_non_empty};
use crate::domain::records::{
    DefiOverview, DexVolumes, ProtocolDetail, ProtocolFees, Stablecoin, TokenPrice, YieldPool,
};
use crate::ports::provider::{DefiSource, ProviderError, Source};

pub const DEFAULT_BASE_URL: &str = "https://api.llama.fi";
pub const DEFAULT_YIELDS_URL: &str = "https://yields.llama.fi";
pub const DEFAULT_STABLECOINS_URL: &str = "https://stablecoins.llama.fi";
pub const DEFAULT_COINS_URL: &str = "https://coins.llama.fi";

const TOP_PROTOCOLS: usize = 20;
const TOP_DEXES: usize = 10;
const TOP_FEE_EARNERS: usize = 10;
const TOP_STABLECOINS: usize = 10;

/// Pools reporting an APY at or above this are treated as broken
const MAX_SANE_APY: f64 = 1000.0;

/// DefiLlama client configuration
#[derive(Debug, Clone)]
pub struct DefiLlamaConfig {
    /// TVL and DEX volume API
    pub base_url: String,
    /// Yield pools API
    pub yields_url: String,
    /// Stablecoin supply API
    pub stablecoins_url: String,
    /// Coin price API
    pub coins_url: String,
    pub timeout: Duration,
}

impl Default for DefiLlamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            yields_url: DEFAULT_YIELDS_URL.to_string(),
            stablecoins_url: DEFAULT_STABLECOINS_URL.to_string(),
            coins_url: DEFAULT_COINS_URL.to_string(),
            timeout: Duration::from_secs(12),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefiLlamaClient {
    config: DefiLlamaConfig,
    http: Client,
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

impl DefiLlamaClient {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(DefiLlamaConfig::default())
    }

    pub fn with_config(config: DefiLlamaConfig) -> Result<Self, ProviderError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &DefiLlamaConfig {
        &self.config
    }

    /// `/overview/{kind}` with charts stripped
    async fn overview(&self, kind: &str, data_type: &str) -> Result<Overview, ProviderError> {
        let request = self
            .http
            .get(join(&self.config.base_url, &format!("/overview/{}", kind)))
            .query(&[
                ("excludeTotalDataChart", "true"),
                ("excludeTotalDataChartBreakdown", "true"),
                ("dataType", data_type),
            ]);

        get_json(request, self.config.timeout).await
    }
}

/// Coin ids are `coingecko:<id>` or `<chain>:<address>`
fn validate_coin_id(coin_id: &str) -> Result<String, ProviderError> {
    let coin_id = require_non_empty("coin id", coin_id)?;
    match coin_id.split_once(':') {
        Some((prefix, id)) if !prefix.is_empty() && !id.is_empty() => Ok(coin_id.to_ascii_lowercase()),
        _ => Err(ProviderError::InvalidRequest(format!(
            "coin id '{}' must look like coingecko:<id> or <chain>:<address>",
            coin_id
        ))),
    }
}

/// Keep pools at or above `min_tvl_usd` with a plausible positive APY,
/// best APY first
pub fn select_pools(pools: Vec<LlamaPool>, min_tvl_usd: f64, limit: usize) -> Vec<YieldPool> {
    let mut selected: Vec<LlamaPool> = pools
        .into_iter()
        .filter(|p| {
            let apy = p.apy.unwrap_or(0.0);
            p.tvl_usd.unwrap_or(0.0) >= min_tvl_usd && apy > 0.0 && apy < MAX_SANE_APY
        })
        .collect();

    selected.sort_by(|a, b| b.apy.unwrap_or(0.0).total_cmp(&a.apy.unwrap_or(0.0)));
    selected.into_iter().take(limit).map(LlamaPool::into_pool).collect()
}

#[async_trait]
impl DefiSource for DefiLlamaClient {
    fn source(&self) -> Source {
        Source::DefiLlama
    }

    async fn fetch_overview(&self) -> Result<DefiOverview, ProviderError> {
        let timeout = self.config.timeout;
        let history = self.http.get(join(&self.config.base_url, "/v2/historicalChainTvl"));
        let protocols = self.http.get(join(&self.config.base_url, "/protocols"));

        let (history, protocols): (Vec<ChainTvlPoint>, Vec<LlamaProtocol>) = tokio::try_join!(
            get_json(history, timeout),
            get_json(protocols, timeout)
        )?;

        let total_tvl_usd = history
            .last()
            .map(|p| p.tvl)
            .ok_or_else(|| ProviderError::malformed("historicalChainTvl is empty"))?;
        let top_protocols = protocols
            .into_iter()
            .take(TOP_PROTOCOLS)
            .filter(|p| p.tvl.unwrap_or(0.0) > 0.0)
            .map(LlamaProtocol::into_summary)
            .collect();

        Ok(DefiOverview {
            total_tvl_usd,
            top_protocols,
            as_of: Utc::now(),
        })
    }

    async fn fetch_protocol(&self, slug: &str) -> Result<ProtocolDetail, ProviderError> {
        let slug = require_non_empty("protocol slug", slug)?.to_ascii_lowercase();
        let request = self
            .http
            .get(join(&self.config.base_url, &format!("/protocol/{}", slug)));

        let detail: LlamaProtocolDetail = get_json(request, self.config.timeout).await?;
        Ok(detail.into_detail(&slug))
    }

    async fn fetch_dex_volumes(&self) -> Result<DexVolumes, ProviderError> {
        let overview = self.overview("dexs", "dailyVolume").await?;

        Ok(DexVolumes {
            total_24h_usd: overview.total_24h,
            total_7d_usd: overview.total_7d,
            top_dexes: overview
                .top(TOP_DEXES)
                .into_iter()
                .map(OverviewEntry::into_volume)
                .collect(),
            as_of: Utc::now(),
        })
    }

    async fn fetch_yields(&self, min_tvl_usd: f64, limit: usize) -> Result<Vec<YieldPool>, ProviderError> {
        if limit == 0 {
            return Err(ProviderError::InvalidRequest("limit must be positive".into()));
        }
        if !min_tvl_usd.is_finite() || min_tvl_usd < 0.0 {
            return Err(ProviderError::InvalidRequest(format!(
                "minimum TVL must be a non-negative number, got {}",
                min_tvl_usd
            )));
        }

        let request = self.http.get(join(&self.config.yields_url, "/pools"));
        let body: PoolsResponse = get_json(request, self.config.timeout).await?;

        tracing::debug!("Filtering {} yield pools (min TVL ${:.0})", body.data.len(), min_tvl_usd);
        Ok(select_pools(body.data, min_tvl_usd, limit))
    }

    async fn fetch_stablecoins(&self) -> Result<Vec<Stablecoin>, ProviderError> {
        let request = self
            .http
            .get(join(&self.config.stablecoins_url, "/stablecoins"))
            .query(&[("includePrices", "true")]);

        let body: StablecoinsResponse = get_json(request, self.config.timeout).await?;
        Ok(body
            .pegged_assets
            .into_iter()
            .take(TOP_STABLECOINS)
            .map(|a| a.into_stablecoin())
            .collect())
    }

    async fn fetch_protocol_fees(&self) -> Result<ProtocolFees, ProviderError> {
        let overview = self.overview("fees", "dailyFees").await?;

        Ok(ProtocolFees {
            total_24h_usd: overview.total_24h,
            total_7d_usd: overview.total_7d,
            top_protocols: overview
                .top(TOP_FEE_EARNERS)
                .into_iter()
                .map(OverviewEntry::into_fee)
                .collect(),
            as_of: Utc::now(),
        })
    }

    async fn fetch_token_price(&self, coin_id: &str) -> Result<TokenPrice, ProviderError> {
        let coin_id = validate_coin_id(coin_id)?;
        let request = self
            .http
            .get(join(&self.config.coins_url, &format!("/prices/current/{}", coin_id)));

        let mut body: CoinsResponse = get_json(request, self.config.timeout).await?;
        // Keys echo the request, though address casing may differ
        let key = body
            .coins
            .keys()
            .find(|key| key.eq_ignore_ascii_case(&coin_id))
            .cloned();
        let price = key.and_then(|key| body.coins.remove(&key)).ok_or_else(|| {
            ProviderError::UpstreamUnavailable(format!("defillama has no price for '{}'", coin_id))
        })?;

        price.into_token_price(&coin_id)
    }
}
