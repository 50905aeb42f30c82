//! Moralis Types

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::adapters::http::lenient_f64;
use crate::domain::records::{DefiPosition, Holding, TokenHolder, WalletTx};
use crate::ports::provider::ProviderError;

/// Holdings below this USD value are dust and dropped
pub const DUST_THRESHOLD_USD: f64 = 0.01;

/// `/wallets/{address}/net-worth` body
#[derive(Debug, Clone, Deserialize)]
pub struct NetWorthResponse {
    #[serde(deserialize_with = "lenient_f64")]
    pub total_networth_usd: Option<f64>,
}

impl NetWorthResponse {
    pub fn net_worth(&self) -> Result<f64, ProviderError> {
        self.total_networth_usd
            .ok_or_else(|| ProviderError::malformed("net worth response has a null total_networth_usd"))
    }
}

/// Paged `result` envelope used by the token, history and owner endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub result: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalance {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance_formatted: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_price_24hr_percent_change: Option<f64>,
}

impl TokenBalance {
    pub fn value_usd(&self) -> f64 {
        self.usd_value.unwrap_or(0.0)
    }

    pub fn into_holding(self) -> Holding {
        Holding {
            symbol: self.symbol.unwrap_or_else(|| "?".to_string()),
            name: self.name,
            balance: self.balance_formatted.unwrap_or(0.0),
            price_usd: self.usd_price.unwrap_or(0.0),
            value_usd: self.usd_value.unwrap_or(0.0),
            change_24h_pct: self.usd_price_24hr_percent_change.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub hash: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value_usd: Option<f64>,
    #[serde(default)]
    pub block_timestamp: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl HistoryEntry {
    pub fn into_tx(self) -> WalletTx {
        let timestamp = self
            .block_timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        WalletTx {
            hash: self.hash,
            category: self.category.unwrap_or_else(|| "transfer".to_string()),
            value_usd: self.value_usd.unwrap_or(0.0),
            timestamp,
            summary: self.summary,
        }
    }
}

/// `/wallets/{address}/defi/positions` body; a bare list or a `result` page
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PositionsBody {
    List(Vec<PositionEntry>),
    Page(Page<PositionEntry>),
}

impl PositionsBody {
    pub fn into_positions(self) -> Vec<DefiPosition> {
        let entries = match self {
            PositionsBody::List(entries) => entries,
            PositionsBody::Page(page) => page.result,
        };
        entries.into_iter().map(PositionEntry::into_position).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionEntry {
    pub protocol_name: String,
    #[serde(default)]
    pub protocol_id: Option<String>,
    pub position: PositionDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionDetail {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub tokens: Vec<PositionToken>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_unclaimed_usd_value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionToken {
    #[serde(default)]
    pub symbol: Option<String>,
}

impl PositionEntry {
    pub fn into_position(self) -> DefiPosition {
        DefiPosition {
            protocol: self.protocol_name,
            protocol_id: self.protocol_id,
            label: self.position.label.unwrap_or_else(|| "position".to_string()),
            balance_usd: self.position.balance_usd,
            unclaimed_usd: self.position.total_unclaimed_usd_value,
            tokens: self
                .position
                .tokens
                .into_iter()
                .filter_map(|t| t.symbol)
                .collect(),
        }
    }
}

/// `/erc20/{token}/owners` entry
#[derive(Debug, Clone, Deserialize)]
pub struct TokenOwner {
    pub owner_address: String,
    #[serde(default)]
    pub owner_address_label: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub balance_formatted: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage_relative_to_total_supply: Option<f64>,
}

impl TokenOwner {
    pub fn into_holder(self) -> Result<TokenHolder, ProviderError> {
        let balance = self.balance_formatted.ok_or_else(|| {
            ProviderError::malformed(format!("holder {} has no balance", self.owner_address))
        })?;

        Ok(TokenHolder {
            address: self.owner_address,
            label: self.owner_address_label,
            balance,
            value_usd: self.usd_value,
            share_pct: self.percentage_relative_to_total_supply,
        })
    }
}
