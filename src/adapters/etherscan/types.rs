//! Etherscan Types

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::http::parse_decimal;
use crate::domain::records::{EthBalance, EthTransaction, GasOracle, TokenHolder, TokenTransfer};
use crate::ports::provider::ProviderError;

const WEI_PER_ETH: f64 = 1e18;

/// Envelope every Etherscan action answers with
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    /// The `result` payload when `status == "1"`
    pub fn into_result(self) -> Result<Value, ProviderError> {
        if self.status == "1" {
            return Ok(self.result);
        }

        let detail = match &self.result {
            Value::String(text) if !text.is_empty() => format!("{}: {}", self.message, text),
            _ => self.message.clone(),
        };
        Err(ProviderError::UpstreamUnavailable(format!("etherscan: {}", detail)))
    }

    /// Like [`Envelope::into_result`] for list actions, where an account
    /// without history answers `status: "0"` with "No transactions found"
    pub fn into_list<T: DeserializeOwned>(self) -> Result<Vec<T>, ProviderError> {
        let empty = matches!(&self.result, Value::Array(items) if items.is_empty());
        if self.status != "1" && empty && self.message.starts_with("No ") {
            return Ok(Vec::new());
        }

        let result = self.into_result()?;
        serde_json::from_value(result).map_err(|e| ProviderError::malformed(format!("list result: {}", e)))
    }
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::malformed(format!("{} '{}' is not an integer", field, raw)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ProviderError> {
    let secs = parse_u64("timeStamp", raw)?;
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .ok_or_else(|| ProviderError::malformed(format!("timeStamp {} out of range", secs)))
}

fn parse_wei(field: &str, raw: &str) -> Result<u128, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::malformed(format!("{} '{}' is not an integer", field, raw)))
}

pub fn parse_balance(address: &str, result: &Value) -> Result<EthBalance, ProviderError> {
    let raw = result
        .as_str()
        .ok_or_else(|| ProviderError::malformed("balance result is not a string"))?;
    let wei: u128 = raw
        .trim()
        .parse()
        .map_err(|_| ProviderError::malformed(format!("balance '{}' is not an integer", raw)))?;

    Ok(EthBalance {
        address: address.to_string(),
        wei,
        eth: wei as f64 / WEI_PER_ETH,
    })
}

/// `account/txlist` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxListEntry {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub is_error: String,
    #[serde(default)]
    pub function_name: String,
}

impl TxListEntry {
    pub fn into_transaction(self) -> Result<EthTransaction, ProviderError> {
        let wei = parse_wei("value", &self.value)?;
        // functionName looks like `transfer(address _to, uint256 _value)`
        let method = self
            .function_name
            .split('(')
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(EthTransaction {
            block_number: parse_u64("blockNumber", &self.block_number)?,
            timestamp: parse_timestamp(&self.time_stamp)?,
            hash: self.hash,
            from: self.from,
            to: Some(self.to).filter(|to| !to.is_empty()),
            value_eth: wei as f64 / WEI_PER_ETH,
            failed: self.is_error == "1",
            method,
        })
    }
}

/// `account/tokentx` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTxEntry {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub contract_address: String,
    #[serde(default)]
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimal: String,
}

impl TokenTxEntry {
    pub fn into_transfer(self) -> Result<TokenTransfer, ProviderError> {
        let decimals = parse_u64("tokenDecimal", &self.token_decimal)?;
        if decimals > 36 {
            return Err(ProviderError::malformed(format!("tokenDecimal {} is implausible", decimals)));
        }
        let raw = parse_decimal("value", &self.value)?;

        Ok(TokenTransfer {
            block_number: parse_u64("blockNumber", &self.block_number)?,
            timestamp: parse_timestamp(&self.time_stamp)?,
            hash: self.hash,
            from: self.from,
            to: self.to,
            contract_address: self.contract_address,
            token_symbol: self.token_symbol,
            token_name: Some(self.token_name).filter(|name| !name.is_empty()),
            amount: raw / 10f64.powi(decimals as i32),
        })
    }
}

/// `token/tokenholderlist` entry; quantities are raw base units
#[derive(Debug, Clone, Deserialize)]
pub struct HolderEntry {
    #[serde(rename = "TokenHolderAddress")]
    pub address: String,
    #[serde(rename = "TokenHolderQuantity")]
    pub quantity: String,
}

impl HolderEntry {
    pub fn into_holder(self) -> Result<TokenHolder, ProviderError> {
        Ok(TokenHolder {
            balance: parse_decimal("TokenHolderQuantity", &self.quantity)?,
            address: self.address,
            label: None,
            value_usd: None,
            share_pct: None,
        })
    }
}

/// `gastracker/gasoracle` result
#[derive(Debug, Clone, Deserialize)]
pub struct GasOracleResult {
    #[serde(rename = "LastBlock")]
    pub last_block: String,
    #[serde(rename = "SafeGasPrice")]
    pub safe_gas_price: String,
    #[serde(rename = "ProposeGasPrice")]
    pub propose_gas_price: String,
    #[serde(rename = "FastGasPrice")]
    pub fast_gas_price: String,
    #[serde(rename = "suggestBaseFee", default)]
    pub suggest_base_fee: Option<String>,
}

impl GasOracleResult {
    pub fn into_oracle(self) -> Result<GasOracle, ProviderError> {
        let last_block = self
            .last_block
            .trim()
            .parse()
            .map_err(|_| ProviderError::malformed(format!("LastBlock '{}' is not an integer", self.last_block)))?;

        let base_fee_gwei = match self.suggest_base_fee.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_decimal("suggestBaseFee", raw)?),
            _ => None,
        };

        Ok(GasOracle {
            safe_gwei: parse_decimal("SafeGasPrice", &self.safe_gas_price)?,
            propose_gwei: parse_decimal("ProposeGasPrice", &self.propose_gas_price)?,
            fast_gwei: parse_decimal("FastGasPrice", &self.fast_gas_price)?,
            base_fee_gwei,
            last_block,
        })
    }
}
