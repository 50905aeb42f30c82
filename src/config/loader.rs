//! Configuration Loader
//!
//! Loads and validates configuration from an optional TOML file plus
//! environment overrides. Every section has defaults, so an empty file (or
//! no file at all) yields a working configuration.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::binance::BinanceConfig;
use crate::adapters::coingecko::CoinGeckoConfig;
use crate::adapters::defillama::DefiLlamaConfig;
use crate::adapters::etherscan::EtherscanConfig;
use crate::adapters::fear_greed::FearGreedConfig;
use crate::adapters::moralis::MoralisConfig;
use crate::application::aggregator::{AggregatorConfig, TtlClass, TtlPolicy};
use crate::domain::scoring::{Band, BandTable, ComponentWeights, CompositeScorer, ScoringError};

pub const MORALIS_KEY_ENV: &str = "MORALIS_API_KEY";
pub const ETHERSCAN_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const COINGECKO_KEY_ENV: &str = "COINGECKO_API_KEY";
pub const PRICE_PROVIDER_ENV: &str = "MOOD_PRICE_PROVIDER";
pub const WEIGHTS_ENV: &str = "MOOD_WEIGHTS";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub providers: ProvidersSection,
    pub fetch: FetchSection,
    pub cache: CacheSection,
    pub weights: WeightsSection,
    pub endpoints: EndpointsSection,
    pub keys: KeysSection,
    pub logging: LoggingSection,
    pub bands: BandsSection,
}

/// Which upstream serves prices and candles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvider {
    #[default]
    Binance,
    CoinGecko,
}

impl FromStr for PriceProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(PriceProvider::Binance),
            "coingecko" => Ok(PriceProvider::CoinGecko),
            other => Err(ConfigError::ValidationError(format!(
                "price provider must be 'binance' or 'coingecko', got '{}'",
                other
            ))),
        }
    }
}

/// Provider selection section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersSection {
    pub price: PriceProvider,
}

/// Fan-out section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Deadline for each provider call, in seconds
    pub call_timeout_secs: u64,
    /// Maximum provider calls in flight per batch
    pub max_in_flight: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            call_timeout_secs: 15,
            max_in_flight: 16,
        }
    }
}

/// Cache TTLs per source class, in seconds. Zero disables caching.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub price_secs: u64,
    pub candles_secs: u64,
    pub movers_secs: u64,
    pub tvl_secs: u64,
    pub yields_secs: u64,
    pub sentiment_secs: u64,
    pub wallet_secs: u64,
    pub gas_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        let policy = TtlPolicy::default();
        Self {
            price_secs: policy.price.as_secs(),
            candles_secs: policy.candles.as_secs(),
            movers_secs: policy.movers.as_secs(),
            tvl_secs: policy.tvl.as_secs(),
            yields_secs: policy.yields.as_secs(),
            sentiment_secs: policy.sentiment.as_secs(),
            wallet_secs: policy.wallet.as_secs(),
            gas_secs: policy.gas.as_secs(),
        }
    }
}

impl CacheSection {
    fn slot(&mut self, class: TtlClass) -> &mut u64 {
        match class {
            TtlClass::Price => &mut self.price_secs,
            TtlClass::Candles => &mut self.candles_secs,
            TtlClass::Movers => &mut self.movers_secs,
            TtlClass::Tvl => &mut self.tvl_secs,
            TtlClass::Yields => &mut self.yields_secs,
            TtlClass::Sentiment => &mut self.sentiment_secs,
            TtlClass::Wallet => &mut self.wallet_secs,
            TtlClass::Gas => &mut self.gas_secs,
        }
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            price: Duration::from_secs(self.price_secs),
            candles: Duration::from_secs(self.candles_secs),
            movers: Duration::from_secs(self.movers_secs),
            tvl: Duration::from_secs(self.tvl_secs),
            yields: Duration::from_secs(self.yields_secs),
            sentiment: Duration::from_secs(self.sentiment_secs),
            wallet: Duration::from_secs(self.wallet_secs),
            gas: Duration::from_secs(self.gas_secs),
        }
    }
}

/// Composite weights section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeightsSection {
    pub social: f64,
    pub onchain: f64,
    pub sentiment: f64,
    pub historical: f64,
}

impl Default for WeightsSection {
    fn default() -> Self {
        let weights = ComponentWeights::default();
        Self {
            social: weights.social,
            onchain: weights.onchain,
            sentiment: weights.sentiment,
            historical: weights.historical,
        }
    }
}

impl WeightsSection {
    pub fn to_weights(&self) -> Result<ComponentWeights, ScoringError> {
        ComponentWeights::new(self.social, self.onchain, self.sentiment, self.historical)
    }
}

/// Optional base URL overrides
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EndpointsSection {
    pub binance: Option<String>,
    pub coingecko: Option<String>,
    pub defillama: Option<String>,
    pub defillama_yields: Option<String>,
    pub defillama_stablecoins: Option<String>,
    pub defillama_coins: Option<String>,
    pub fear_greed: Option<String>,
    pub moralis: Option<String>,
    pub etherscan: Option<String>,
}

impl EndpointsSection {
    fn entries(&self) -> [(&'static str, &Option<String>); 9] {
        [
            ("binance", &self.binance),
            ("coingecko", &self.coingecko),
            ("defillama", &self.defillama),
            ("defillama_yields", &self.defillama_yields),
            ("defillama_stablecoins", &self.defillama_stablecoins),
            ("defillama_coins", &self.defillama_coins),
            ("fear_greed", &self.fear_greed),
            ("moralis", &self.moralis),
            ("etherscan", &self.etherscan),
        ]
    }
}

/// API keys. Environment variables take precedence over file values.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct KeysSection {
    pub moralis_api_key: Option<String>,
    pub etherscan_api_key: Option<String>,
    pub coingecko_api_key: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl KeysSection {
    pub fn moralis(&self) -> Option<String> {
        non_empty(&self.moralis_api_key)
    }

    pub fn etherscan(&self) -> Option<String> {
        non_empty(&self.etherscan_api_key)
    }

    pub fn coingecko(&self) -> Option<String> {
        non_empty(&self.coingecko_api_key)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Band table overrides; absent tables keep the built-in bands
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BandsSection {
    pub classification: Option<Vec<Band>>,
    pub signal: Option<Vec<Band>>,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<ScoringError> for ConfigError {
    fn from(err: ScoringError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the file when given (defaults otherwise), then apply process
/// environment overrides and validate the result
pub fn resolve_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

/// `MOOD_TTL_<CLASS>_SECS`
fn ttl_env_name(class: TtlClass) -> String {
    format!("MOOD_TTL_{}_SECS", class.as_str().to_ascii_uppercase())
}

impl Config {
    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = lookup(PRICE_PROVIDER_ENV) {
            self.providers.price = provider.parse()?;
        }

        for class in TtlClass::ALL {
            let name = ttl_env_name(class);
            if let Some(raw) = lookup(&name) {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    ConfigError::ValidationError(format!("{} must be whole seconds, got '{}'", name, raw))
                })?;
                *self.cache.slot(class) = secs;
            }
        }

        if let Some(raw) = lookup(WEIGHTS_ENV) {
            let weights = parse_weights(&raw)?;
            self.weights = WeightsSection {
                social: weights.social,
                onchain: weights.onchain,
                sentiment: weights.sentiment,
                historical: weights.historical,
            };
        }

        if let Some(key) = lookup(MORALIS_KEY_ENV) {
            self.keys.moralis_api_key = Some(key);
        }
        if let Some(key) = lookup(ETHERSCAN_KEY_ENV) {
            self.keys.etherscan_api_key = Some(key);
        }
        if let Some(key) = lookup(COINGECKO_KEY_ENV) {
            self.keys.coingecko_api_key = Some(key);
        }

        Ok(())
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "call_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.fetch.max_in_flight == 0 {
            return Err(ConfigError::ValidationError(
                "max_in_flight must be >= 1".to_string(),
            ));
        }

        self.weights.to_weights()?;
        self.scorer()?;

        for (name, url) in self.endpoints.entries() {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::ValidationError(format!(
                        "endpoint '{}' must be an http(s) URL, got '{}'",
                        name, url
                    )));
                }
            }
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.call_timeout_secs)
    }

    /// Scorer with any configured band overrides
    pub fn scorer(&self) -> Result<CompositeScorer, ScoringError> {
        let classification = match &self.bands.classification {
            Some(bands) => BandTable::new(bands.clone())?,
            None => BandTable::default_classification(),
        };
        let signal = match &self.bands.signal {
            Some(bands) => BandTable::new(bands.clone())?,
            None => BandTable::default_signal(),
        };
        Ok(CompositeScorer::new(classification, signal))
    }
}

/// Parse `social=0.3,onchain=0.3,sentiment=0.2,historical=0.2`
pub fn parse_weights(raw: &str) -> Result<ComponentWeights, ConfigError> {
    let mut pairs = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = part.split_once('=').ok_or_else(|| {
            ConfigError::ValidationError(format!("weight '{}' must look like name=value", part))
        })?;
        let value = value.trim().parse::<f64>().map_err(|_| {
            ConfigError::ValidationError(format!("weight for '{}' is not a number", name.trim()))
        })?;
        pairs.push((name.trim(), value));
    }

    Ok(ComponentWeights::from_pairs(pairs)?)
}

// Conversions from Config to component configurations

impl From<&Config> for AggregatorConfig {
    fn from(config: &Config) -> Self {
        AggregatorConfig {
            call_timeout: config.call_timeout(),
            max_in_flight: config.fetch.max_in_flight,
            ttl: config.cache.ttl_policy(),
        }
    }
}

impl From<&Config> for BinanceConfig {
    fn from(config: &Config) -> Self {
        let mut client = BinanceConfig::default();
        if let Some(url) = &config.endpoints.binance {
            client.base_url = url.clone();
        }
        client
    }
}

impl From<&Config> for CoinGeckoConfig {
    fn from(config: &Config) -> Self {
        let mut client = CoinGeckoConfig::default();
        if let Some(url) = &config.endpoints.coingecko {
            client.base_url = url.clone();
        }
        client.api_key = config.keys.coingecko();
        client
    }
}

impl From<&Config> for DefiLlamaConfig {
    fn from(config: &Config) -> Self {
        let mut client = DefiLlamaConfig::default();
        if let Some(url) = &config.endpoints.defillama {
            client.base_url = url.clone();
        }
        if let Some(url) = &config.endpoints.defillama_yields {
            client.yields_url = url.clone();
        }
        if let Some(url) = &config.endpoints.defillama_stablecoins {
            client.stablecoins_url = url.clone();
        }
        if let Some(url) = &config.endpoints.defillama_coins {
            client.coins_url = url.clone();
        }
        client
    }
}

impl From<&Config> for FearGreedConfig {
    fn from(config: &Config) -> Self {
        let mut client = FearGreedConfig::default();
        if let Some(url) = &config.endpoints.fear_greed {
            client.base_url = url.clone();
        }
        client
    }
}

impl From<&Config> for MoralisConfig {
    fn from(config: &Config) -> Self {
        let mut client = MoralisConfig::default();
        if let Some(url) = &config.endpoints.moralis {
            client.base_url = url.clone();
        }
        client.api_key = config.keys.moralis();
        client
    }
}

impl From<&Config> for EtherscanConfig {
    fn from(config: &Config) -> Self {
        let mut client = EtherscanConfig::default();
        if let Some(url) = &config.endpoints.etherscan {
            client.base_url = url.clone();
        }
        client.api_key = config.keys.etherscan();
        client
    }
}
