//! Moralis Client
//!
//! Wallet net worth, token holdings, recent history, DeFi positions and
//! ERC-20 holder lists from the Moralis deep-index API. Requires `MORALIS_API_KEY`; without it every call fails
//! with `MissingCredential` before touching the network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::types::{
    HistoryEntry, NetWorthResponse, Page, PositionsBody, TokenBalance, TokenOwner, DUST_THRESHOLD_USD,
};
use crate::adapters::http::{build_client, get_json, require_non_empty, require_positive};
use crate::domain::records::{DefiPosition, TokenHolder, WalletSnapshot};
use crate::ports::provider::{ProviderError, Source, WalletSource};

pub const DEFAULT_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";
pub const API_KEY_ENV: &str = "MORALIS_API_KEY";

const API_KEY_HEADER: &str = "X-API-Key";
const MAX_HOLDINGS: usize = 15;
const MAX_TRANSACTIONS: usize = 10;

#[derive(Debug, Clone)]
pub struct MoralisConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for MoralisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoralisClient {
    config: MoralisConfig,
    http: Client,
}

impl MoralisClient {
    pub fn with_config(config: MoralisConfig) -> Result<Self, ProviderError> {
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

    fn request(&self, api_key: &str, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        self.http.get(url).header(API_KEY_HEADER, api_key)
    }

    fn get(&self, api_key: &str, address: &str, endpoint: &str) -> reqwest::RequestBuilder {
        self.request(api_key, &format!("/wallets/{}/{}", address, endpoint))
    }
}

#[async_trait]
impl WalletSource for MoralisClient {
    fn source(&self) -> Source {
        Source::Moralis
    }

    async fn fetch_wallet(&self, address: &str, chain: &str) -> Result<WalletSnapshot, ProviderError> {
        let api_key = self.api_key()?;
        let address = require_non_empty("address", address)?;
        let chain = require_non_empty("chain", chain)?;
        let timeout = self.config.timeout;

        let worth = self.get(api_key, address, "net-worth").query(&[
            ("chains[0]", chain),
            ("exclude_spam", "true"),
            ("exclude_unverified_contracts", "true"),
        ]);
        let tokens = self
            .get(api_key, address, "tokens")
            .query(&[("chain", chain), ("exclude_spam", "true")]);
        let history = self
            .get(api_key, address, "history")
            .query(&[("chain", chain), ("limit", MAX_TRANSACTIONS.to_string().as_str())]);

        let (worth, tokens, history): (NetWorthResponse, Page<TokenBalance>, Page<HistoryEntry>) =
            tokio::try_join!(
                get_json(worth, timeout),
                get_json(tokens, timeout),
                get_json(history, timeout)
            )?;

        let holdings = tokens
            .result
            .into_iter()
            .take(MAX_HOLDINGS)
            .filter(|t| t.value_usd() > DUST_THRESHOLD_USD)
            .map(TokenBalance::into_holding)
            .collect();

        let recent_txs = history
            .result
            .into_iter()
            .take(MAX_TRANSACTIONS)
            .map(HistoryEntry::into_tx)
            .collect();

        Ok(WalletSnapshot {
            address: address.to_string(),
            chain: chain.to_string(),
            net_worth_usd: worth.net_worth()?,
            holdings,
            recent_txs,
        })
    }

    async fn fetch_defi_positions(&self, address: &str, chain: &str) -> Result<Vec<DefiPosition>, ProviderError> {
        let api_key = self.api_key()?;
        let address = require_non_empty("address", address)?;
        let chain = require_non_empty("chain", chain)?;

        let request = self
            .get(api_key, address, "defi/positions")
            .query(&[("chain", chain)]);

        let body: PositionsBody = get_json(request, self.config.timeout).await?;
        Ok(body.into_positions())
    }

    async fn fetch_token_holders(
        &self,
        token_address: &str,
        chain: &str,
        limit: u32,
    ) -> Result<Vec<TokenHolder>, ProviderError> {
        let api_key = self.api_key()?;
        let token_address = require_non_empty("token address", token_address)?;
        let chain = require_non_empty("chain", chain)?;
        let limit = require_positive("limit", limit)?;

        let request = self
            .request(api_key, &format!("/erc20/{}/owners", token_address))
            .query(&[("chain", chain), ("limit", limit.to_string().as_str()), ("order", "DESC")]);

        let page: Page<TokenOwner> = get_json(request, self.config.timeout).await?;
        page.result
            .into_iter()
            .take(limit as usize)
            .map(TokenOwner::into_holder)
            .collect()
    }
}
