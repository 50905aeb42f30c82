//! Canonical Provider Records
//!
//! Normalized shapes every provider client translates its upstream response
//! into. Units are fixed regardless of source:
//! - prices and values in decimal USD
//! - percentages as signed decimals (`2.5` means +2.5%)
//! - timestamps in UTC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spot price with 24h statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Upper-cased symbol as requested by the caller
    pub symbol: String,
    pub price: f64,
    pub change_24h_pct: f64,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub volume_24h_usd: f64,
}

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A symbol's 24h move, used for the gainers/losers board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub symbol: String,
    pub change_24h_pct: f64,
    pub price: f64,
    pub volume_24h_usd: f64,
}

/// Top gainers (best first) and losers (worst first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMovers {
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
    pub as_of: DateTime<Utc>,
}

/// Protocol row in the DeFi overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSummary {
    pub name: String,
    pub tvl_usd: f64,
    pub change_1d_pct: f64,
    pub change_7d_pct: f64,
    pub category: Option<String>,
    pub chains: Vec<String>,
}

/// Global TVL plus the largest protocols
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefiOverview {
    pub total_tvl_usd: f64,
    pub top_protocols: Vec<ProtocolSummary>,
    pub as_of: DateTime<Utc>,
}

impl DefiOverview {
    /// TVL formatted in billions, e.g. `$92.4B`
    pub fn total_tvl_formatted(&self) -> String {
        format!("${:.1}B", self.total_tvl_usd / 1e9)
    }
}

/// Detail for a single protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDetail {
    pub slug: String,
    pub name: String,
    pub total_tvl_usd: f64,
    pub chain_tvls: Vec<(String, f64)>,
    pub category: Option<String>,
    pub chains: Vec<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub twitter: Option<String>,
    pub audits: usize,
    pub raises: usize,
}

/// DEX volume row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexVolume {
    pub name: String,
    pub volume_24h_usd: f64,
    pub volume_7d_usd: f64,
    pub change_1d_pct: f64,
    pub chains: Vec<String>,
}

/// Aggregate DEX volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexVolumes {
    pub total_24h_usd: f64,
    pub total_7d_usd: f64,
    pub top_dexes: Vec<DexVolume>,
    pub as_of: DateTime<Utc>,
}

/// Yield farming pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPool {
    pub pool_id: String,
    pub project: String,
    pub chain: String,
    pub symbol: String,
    pub tvl_usd: f64,
    pub apy_pct: f64,
    pub apy_base_pct: f64,
    pub apy_reward_pct: f64,
}

/// Stablecoin supply snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stablecoin {
    pub name: String,
    pub symbol: String,
    pub peg_type: Option<String>,
    pub circulating_usd: f64,
    pub chains: Vec<String>,
}

/// One day of the sentiment index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreedReading {
    /// 0 (extreme fear) ..= 100 (extreme greed)
    pub value: u8,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl FearGreedReading {
    /// Standard label for a value, used when the feed omits one
    pub fn label_for(value: u8) -> &'static str {
        match value {
            0..=24 => "Extreme Fear",
            25..=46 => "Fear",
            47..=54 => "Neutral",
            55..=75 => "Greed",
            _ => "Extreme Greed",
        }
    }
}

/// Sentiment index over a trailing window, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreedWindow {
    pub readings: Vec<FearGreedReading>,
}

impl FearGreedWindow {
    /// Most recent reading
    pub fn current(&self) -> Option<&FearGreedReading> {
        self.readings.first()
    }

    /// Mean value over the whole window
    pub fn average(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let sum: f64 = self.readings.iter().map(|r| r.value as f64).sum();
        Some(sum / self.readings.len() as f64)
    }

    /// Current value minus the window average
    pub fn trend(&self) -> Option<f64> {
        Some(self.current()?.value as f64 - self.average()?)
    }
}

/// Token held by a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: Option<String>,
    pub balance: f64,
    pub price_usd: f64,
    pub value_usd: f64,
    pub change_24h_pct: f64,
}

/// Recent wallet transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTx {
    pub hash: String,
    pub category: String,
    pub value_usd: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

/// Wallet holdings and activity on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: String,
    pub chain: String,
    pub net_worth_usd: f64,
    pub holdings: Vec<Holding>,
    pub recent_txs: Vec<WalletTx>,
}

/// Open DeFi position such as an LP share or a lending deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefiPosition {
    pub protocol: String,
    pub protocol_id: Option<String>,
    /// Position kind as the source names it, e.g. `liquidity` or `supplied`
    pub label: String,
    pub balance_usd: Option<f64>,
    pub unclaimed_usd: Option<f64>,
    /// Symbols of the tokens in the position
    pub tokens: Vec<String>,
}

/// Holder of an ERC-20 token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolder {
    pub address: String,
    pub label: Option<String>,
    /// Moralis reports decimal token units, Etherscan raw base units
    pub balance: f64,
    pub value_usd: Option<f64>,
    /// Share of total supply in percent
    pub share_pct: Option<f64>,
}

/// Normal (external) transaction from an account's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthTransaction {
    pub hash: String,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub from: String,
    /// Empty for contract creations
    pub to: Option<String>,
    pub value_eth: f64,
    pub failed: bool,
    /// Called contract method, when the source decodes one
    pub method: Option<String>,
}

/// ERC-20 transfer touching an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub hash: String,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub contract_address: String,
    pub token_symbol: String,
    pub token_name: Option<String>,
    /// Amount scaled by the token's decimals
    pub amount: f64,
}

/// Protocol fee row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeEntry {
    pub name: String,
    pub fees_24h_usd: f64,
    pub fees_7d_usd: f64,
    pub category: Option<String>,
}

/// Aggregate protocol fees with the top earners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolFees {
    pub total_24h_usd: f64,
    pub total_7d_usd: f64,
    pub top_protocols: Vec<FeeEntry>,
    pub as_of: DateTime<Utc>,
}

/// Token price keyed by a `chain:address` or `coingecko:id` coin id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub coin_id: String,
    pub symbol: Option<String>,
    pub price: f64,
    /// 0..=1 quality score reported with the price
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Native ETH balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthBalance {
    pub address: String,
    pub wei: u128,
    pub eth: f64,
}

/// Gas price tiers in gwei
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasOracle {
    pub safe_gwei: f64,
    pub propose_gwei: f64,
    pub fast_gwei: f64,
    pub base_fee_gwei: Option<f64>,
    pub last_block: u64,
}
