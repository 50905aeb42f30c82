//! Etherscan Client
//!
//! Ethereum mainnet balances, account history, token holders and the gas
//! oracle through the Etherscan v2 API.
//! Every call carries `apikey`; without `ETHERSCAN_API_KEY` calls fail with
//! `MissingCredential` and no request is sent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::types::{parse_balance, Envelope, GasOracleResult, HolderEntry, TokenTxEntry, TxListEntry};
use crate::adapters::http::{build_client, get_json, require_non_empty, require_positive};
use crate::domain::records::{EthBalance, EthTransaction, GasOracle, TokenHolder, TokenTransfer};
use crate::ports::provider::{ChainSource, ProviderError, Source};

pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/v2/api";
pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Ethereum mainnet
const CHAIN_ID: &str = "1";

/// Entries `tokenholderlist` returns per call
const TOP_HOLDERS: usize = 10;

#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EtherscanClient {
    config: EtherscanConfig,
    http: Client,
}

impl EtherscanClient {
    pub fn with_config(config: EtherscanConfig) -> Result<Self, ProviderError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingCredential(API_KEY_ENV.to_string()))
    }

    /// Run one `module`/`action` call and unwrap the status envelope
    async fn call(
        &self,
        module: &str,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError> {
        self.envelope(module, action, params).await?.into_result()
    }

    async fn envelope(
        &self,
        module: &str,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<Envelope, ProviderError> {
        let api_key = self.api_key()?;

        let request = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("chainid", CHAIN_ID),
                ("module", module),
                ("action", action),
                ("apikey", api_key),
            ])
            .query(params);

        get_json(request, self.config.timeout).await
    }

    /// Newest-first page of an account list action
    async fn account_list<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        address: &str,
        limit: u32,
    ) -> Result<Vec<T>, ProviderError> {
        self.api_key()?;
        let address = require_non_empty("address", address)?;
        let limit = require_positive("limit", limit)?.to_string();

        self.envelope(
            "account",
            action,
            &[("address", address), ("page", "1"), ("offset", limit.as_str()), ("sort", "desc")],
        )
        .await?
        .into_list()
    }
}

#[async_trait]
impl ChainSource for EtherscanClient {
    fn source(&self) -> Source {
        Source::Etherscan
    }

    async fn fetch_eth_balance(&self, address: &str) -> Result<EthBalance, ProviderError> {
        self.api_key()?;
        let address = require_non_empty("address", address)?;

        let result = self
            .call("account", "balance", &[("address", address), ("tag", "latest")])
            .await?;
        parse_balance(address, &result)
    }

    async fn fetch_transactions(&self, address: &str, limit: u32) -> Result<Vec<EthTransaction>, ProviderError> {
        let entries: Vec<TxListEntry> = self.account_list("txlist", address, limit).await?;
        entries
            .into_iter()
            .take(limit as usize)
            .map(TxListEntry::into_transaction)
            .collect()
    }

    async fn fetch_token_transfers(&self, address: &str, limit: u32) -> Result<Vec<TokenTransfer>, ProviderError> {
        let entries: Vec<TokenTxEntry> = self.account_list("tokentx", address, limit).await?;
        entries
            .into_iter()
            .take(limit as usize)
            .map(TokenTxEntry::into_transfer)
            .collect()
    }

    async fn fetch_top_holders(&self, token_address: &str) -> Result<Vec<TokenHolder>, ProviderError> {
        self.api_key()?;
        let token_address = require_non_empty("token address", token_address)?;
        let offset = TOP_HOLDERS.to_string();

        let entries: Vec<HolderEntry> = self
            .envelope(
                "token",
                "tokenholderlist",
                &[("contractaddress", token_address), ("page", "1"), ("offset", offset.as_str())],
            )
            .await?
            .into_list()?;
        entries
            .into_iter()
            .take(TOP_HOLDERS)
            .map(HolderEntry::into_holder)
            .collect()
    }

    async fn fetch_gas(&self) -> Result<GasOracle, ProviderError> {
        let result = self.call("gastracker", "gasoracle", &[]).await?;
        let raw: GasOracleResult = serde_json::from_value(result)
            .map_err(|e| ProviderError::malformed(format!("gas oracle: {}", e)))?;
        raw.into_oracle()
    }
}
