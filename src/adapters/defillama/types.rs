//! DefiLlama Types
//!
//! Wire shapes for the TVL, DEX, fees, yields, stablecoin and coin price
//! endpoints. Per-row numbers DefiLlama omits or nulls freely are optional and
//! default to zero in the canonical records; aggregate totals are required.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use chrono::{TimeZone, Utc};

use crate::domain::records::{
    DexVolume, FeeEntry, ProtocolDetail, ProtocolSummary, Stablecoin, TokenPrice, YieldPool,
};
use crate::ports::provider::ProviderError;

/// Chains listed per protocol or DEX entry
pub const CHAINS_SHOWN: usize = 3;

/// Chains listed per stablecoin
pub const STABLE_CHAINS_SHOWN: usize = 5;

/// `/v2/historicalChainTvl` point
#[derive(Debug, Clone, Deserialize)]
pub struct ChainTvlPoint {
    pub tvl: f64,
}

/// `/protocols` entry
#[derive(Debug, Clone, Deserialize)]
pub struct LlamaProtocol {
    pub name: String,
    #[serde(default)]
    pub tvl: Option<f64>,
    #[serde(default)]
    pub change_1d: Option<f64>,
    #[serde(default)]
    pub change_7d: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
}

impl LlamaProtocol {
    pub fn into_summary(self) -> ProtocolSummary {
        ProtocolSummary {
            name: self.name,
            tvl_usd: self.tvl.unwrap_or(0.0),
            change_1d_pct: self.change_1d.unwrap_or(0.0),
            change_7d_pct: self.change_7d.unwrap_or(0.0),
            category: self.category,
            chains: self.chains.into_iter().take(CHAINS_SHOWN).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvlPoint {
    #[serde(rename = "totalLiquidityUSD")]
    pub total_liquidity_usd: f64,
}

/// `/protocol/{slug}` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlamaProtocolDetail {
    pub name: String,
    #[serde(default)]
    pub current_chain_tvls: HashMap<String, f64>,
    #[serde(default)]
    pub tvl: Vec<TvlPoint>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    /// Either a count as a string or a list of audit links
    #[serde(default)]
    pub audits: Option<Value>,
    #[serde(default)]
    pub raises: Vec<Value>,
}

impl LlamaProtocolDetail {
    fn audit_count(&self) -> usize {
        match &self.audits {
            Some(Value::String(count)) => count.trim().parse().unwrap_or(0),
            Some(Value::Number(count)) => count.as_u64().unwrap_or(0) as usize,
            Some(Value::Array(links)) => links.len(),
            _ => 0,
        }
    }

    pub fn into_detail(self, slug: &str) -> ProtocolDetail {
        let audits = self.audit_count();
        let total_tvl_usd = self.tvl.last().map(|p| p.total_liquidity_usd).unwrap_or(0.0);

        let mut chain_tvls: Vec<(String, f64)> = self.current_chain_tvls.into_iter().collect();
        chain_tvls.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        ProtocolDetail {
            slug: slug.to_string(),
            name: self.name,
            total_tvl_usd,
            chain_tvls,
            category: self.category,
            chains: self.chains,
            description: self.description,
            url: self.url,
            twitter: self.twitter,
            audits,
            raises: self.raises.len(),
        }
    }
}

/// `/overview/dexs` and `/overview/fees` body
#[derive(Debug, Clone, Deserialize)]
pub struct Overview {
    #[serde(rename = "total24h")]
    pub total_24h: f64,
    #[serde(rename = "total7d")]
    pub total_7d: f64,
    pub protocols: Vec<OverviewEntry>,
}

impl Overview {
    /// The `limit` largest entries by 24h total
    pub fn top(self, limit: usize) -> Vec<OverviewEntry> {
        let mut protocols = self.protocols;
        protocols.sort_by(|a, b| b.total_24h.unwrap_or(0.0).total_cmp(&a.total_24h.unwrap_or(0.0)));
        protocols.truncate(limit);
        protocols
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverviewEntry {
    pub name: String,
    #[serde(rename = "total24h", default)]
    pub total_24h: Option<f64>,
    #[serde(rename = "total7d", default)]
    pub total_7d: Option<f64>,
    #[serde(default)]
    pub change_1d: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
}

impl OverviewEntry {
    pub fn into_fee(self) -> FeeEntry {
        FeeEntry {
            name: self.name,
            fees_24h_usd: self.total_24h.unwrap_or(0.0),
            fees_7d_usd: self.total_7d.unwrap_or(0.0),
            category: self.category,
        }
    }

    pub fn into_volume(self) -> DexVolume {
        DexVolume {
            name: self.name,
            volume_24h_usd: self.total_24h.unwrap_or(0.0),
            volume_7d_usd: self.total_7d.unwrap_or(0.0),
            change_1d_pct: self.change_1d.unwrap_or(0.0),
            chains: self.chains.into_iter().take(CHAINS_SHOWN).collect(),
        }
    }
}

/// coins `/prices/current/{coins}` body, keyed by coin id
#[derive(Debug, Clone, Deserialize)]
pub struct CoinsResponse {
    pub coins: HashMap<String, CoinPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinPrice {
    pub price: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    pub timestamp: i64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl CoinPrice {
    pub fn into_token_price(self, coin_id: &str) -> Result<TokenPrice, ProviderError> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ProviderError::malformed(format!("price {} for {}", self.price, coin_id)));
        }
        let timestamp = Utc
            .timestamp_opt(self.timestamp, 0)
            .single()
            .ok_or_else(|| ProviderError::malformed(format!("timestamp {} out of range", self.timestamp)))?;

        Ok(TokenPrice {
            coin_id: coin_id.to_string(),
            symbol: self.symbol,
            price: self.price,
            confidence: self.confidence,
            timestamp,
        })
    }
}

/// yields `/pools` body
#[derive(Debug, Clone, Deserialize)]
pub struct PoolsResponse {
    #[serde(default)]
    pub data: Vec<LlamaPool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlamaPool {
    pub pool: String,
    pub project: String,
    pub chain: String,
    pub symbol: String,
    #[serde(default)]
    pub tvl_usd: Option<f64>,
    #[serde(default)]
    pub apy: Option<f64>,
    #[serde(default)]
    pub apy_base: Option<f64>,
    #[serde(default)]
    pub apy_reward: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl LlamaPool {
    pub fn into_pool(self) -> YieldPool {
        YieldPool {
            pool_id: self.pool,
            project: self.project,
            chain: self.chain,
            symbol: self.symbol,
            tvl_usd: self.tvl_usd.unwrap_or(0.0),
            apy_pct: round2(self.apy.unwrap_or(0.0)),
            apy_base_pct: round2(self.apy_base.unwrap_or(0.0)),
            apy_reward_pct: round2(self.apy_reward.unwrap_or(0.0)),
        }
    }
}

/// stablecoins `/stablecoins` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StablecoinsResponse {
    #[serde(default)]
    pub pegged_assets: Vec<PeggedAsset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeggedAsset {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub peg_type: Option<String>,
    /// Circulating supply per peg, e.g. `peggedUSD`
    #[serde(default)]
    pub circulating: HashMap<String, f64>,
    #[serde(default)]
    pub chains: Vec<String>,
}

impl PeggedAsset {
    pub fn into_stablecoin(self) -> Stablecoin {
        Stablecoin {
            circulating_usd: self.circulating.get("peggedUSD").copied().unwrap_or(0.0),
            name: self.name,
            symbol: self.symbol,
            peg_type: self.peg_type,
            chains: self.chains.into_iter().take(STABLE_CHAINS_SHOWN).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_detail_mapping() {
        let detail: LlamaProtocolDetail = serde_json::from_str(
            r#"{
                "name": "Aave",
                "currentChainTvls": {"Ethereum": 10.0, "Polygon": 2.0, "Arbitrum": 5.0},
                "tvl": [{"date": 1, "totalLiquidityUSD": 1.0}, {"date": 2, "totalLiquidityUSD": 17.0}],
                "chains": ["Ethereum", "Polygon", "Arbitrum"],
                "audits": "2",
                "raises": [{"round": "Seed"}]
            }"#,
        )
        .unwrap();

        let detail = detail.into_detail("aave");
        assert_eq!(detail.slug, "aave");
        assert_eq!(detail.total_tvl_usd, 17.0);
        assert_eq!(detail.chain_tvls[0], ("Ethereum".to_string(), 10.0));
        assert_eq!(detail.chain_tvls[1].0, "Arbitrum");
        assert_eq!(detail.audits, 2);
        assert_eq!(detail.raises, 1);
        assert!(detail.description.is_none());
    }

    #[test]
    fn test_protocol_summary_truncates_chains() {
        let protocol: LlamaProtocol = serde_json::from_str(
            r#"{"name": "Lido", "tvl": 3.0e10, "change_1d": null,
                "chains": ["Ethereum", "Solana", "Polygon", "Terra"]}"#,
        )
        .unwrap();

        let summary = protocol.into_summary();
        assert_eq!(summary.chains.len(), CHAINS_SHOWN);
        assert_eq!(summary.change_1d_pct, 0.0);
    }

    #[test]
    fn test_pool_rounds_apy() {
        let pool: LlamaPool = serde_json::from_str(
            r#"{"pool": "abc", "project": "curve", "chain": "Ethereum", "symbol": "3CRV",
                "tvlUsd": 2000000.0, "apy": 4.56789, "apyBase": null, "apyReward": 1.234}"#,
        )
        .unwrap();

        let pool = pool.into_pool();
        assert_eq!(pool.apy_pct, 4.57);
        assert_eq!(pool.apy_base_pct, 0.0);
        assert_eq!(pool.apy_reward_pct, 1.23);
    }

    #[test]
    fn test_overview_totals_required() {
        assert!(serde_json::from_str::<Overview>("{}").is_err());
        assert!(serde_json::from_str::<Overview>(r#"{"total24h": 1.0, "protocols": []}"#).is_err());
        assert!(serde_json::from_str::<Overview>(r#"{"total24h": null, "total7d": 2.0, "protocols": []}"#).is_err());
    }

    #[test]
    fn test_overview_top_sorted() {
        let overview: Overview = serde_json::from_str(
            r#"{"total24h": 100.0, "total7d": 700.0, "protocols": [
                {"name": "Small", "total24h": 5.0, "category": "Dexs"},
                {"name": "Unknown", "total24h": null},
                {"name": "Tether", "total24h": 50.0, "total7d": 350.0, "category": "Stablecoin Issuer"},
                {"name": "Lido", "total24h": 20.0}
            ]}"#,
        )
        .unwrap();

        let top: Vec<_> = overview.top(2).into_iter().map(OverviewEntry::into_fee).collect();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Tether");
        assert_eq!(top[0].fees_7d_usd, 350.0);
        assert_eq!(top[0].category.as_deref(), Some("Stablecoin Issuer"));
        assert_eq!(top[1].name, "Lido");
    }

    #[test]
    fn test_coin_price_mapping() {
        let body: CoinsResponse = serde_json::from_str(
            r#"{"coins": {"coingecko:ethereum": {"price": 3012.5, "symbol": "ETH",
                                                "timestamp": 1700000000, "confidence": 0.99}}}"#,
        )
        .unwrap();

        let price = body.coins["coingecko:ethereum"].clone().into_token_price("coingecko:ethereum").unwrap();
        assert_eq!(price.price, 3012.5);
        assert_eq!(price.symbol.as_deref(), Some("ETH"));
        assert_eq!(price.timestamp.timestamp(), 1_700_000_000);

        assert!(serde_json::from_str::<CoinsResponse>("{}").is_err());
    }

    #[test]
    fn test_stablecoin_mapping() {
        let asset: PeggedAsset = serde_json::from_str(
            r#"{"name": "Tether", "symbol": "USDT", "pegType": "peggedUSD",
                "circulating": {"peggedUSD": 1.1e11}, "chains": ["Tron", "Ethereum"]}"#,
        )
        .unwrap();

        let coin = asset.into_stablecoin();
        assert_eq!(coin.circulating_usd, 1.1e11);
        assert_eq!(coin.peg_type.as_deref(), Some("peggedUSD"));
    }
}
