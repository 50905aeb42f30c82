//! Provider Port
//!
//! Capability traits every upstream client implements, the tagged failure
//! taxonomy they report, and the `ProviderResult` record the aggregator hands
//! back to callers.

use async_trait::async_trait;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::records::{
    Candle, DefiOverview, DefiPosition, DexVolumes, EthBalance, EthTransaction, FearGreedWindow,
    GasOracle, MarketMovers, PriceRecord, ProtocolDetail, ProtocolFees, Stablecoin, TokenHolder,
    TokenPrice, TokenTransfer, WalletSnapshot, YieldPool,
};

/// Tagged provider failure
///
/// Clients convert every transport, status and decoding problem into one of
/// these; nothing else escapes a provider call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Connection failure, non-2xx status, or an upstream "not ok" flag
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Body parsed but lacked the expected shape
    #[error("Upstream response malformed: {0}")]
    UpstreamMalformed(String),

    /// Required API key is not configured; names the variable
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    /// Call exceeded its fixed deadline
    #[error("Upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// Caller input violates the operation's constraints
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The configured provider does not offer this operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Fieldless mirror of [`ProviderError`] for matching and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UpstreamUnavailable,
    UpstreamMalformed,
    MissingCredential,
    Timeout,
    InvalidRequest,
    Unsupported,
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            ProviderError::UpstreamMalformed(_) => ErrorKind::UpstreamMalformed,
            ProviderError::MissingCredential(_) => ErrorKind::MissingCredential,
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ProviderError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Map a reqwest failure for a call made with `deadline`
    ///
    /// The request URL is dropped from the message; some upstreams carry
    /// their API key in the query string.
    pub fn from_transport(err: reqwest::Error, deadline: Duration) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ProviderError::Timeout(deadline)
        } else if err.is_decode() {
            ProviderError::UpstreamMalformed(err.to_string())
        } else {
            ProviderError::UpstreamUnavailable(err.to_string())
        }
    }

    pub fn malformed(what: impl fmt::Display) -> Self {
        ProviderError::UpstreamMalformed(what.to_string())
    }
}

/// Upstream a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Binance,
    CoinGecko,
    DefiLlama,
    AlternativeMe,
    Moralis,
    Etherscan,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Binance => "binance",
            Source::CoinGecko => "coingecko",
            Source::DefiLlama => "defillama",
            Source::AlternativeMe => "alternative_me",
            Source::Moralis => "moralis",
            Source::Etherscan => "etherscan",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candle interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
    FourHours,
    SixHours,
    EightHours,
    TwelveHours,
    OneDay,
    ThreeDays,
    OneWeek,
    OneMonth,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::ThreeMinutes => "3m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::TwoHours => "2h",
            Interval::FourHours => "4h",
            Interval::SixHours => "6h",
            Interval::EightHours => "8h",
            Interval::TwelveHours => "12h",
            Interval::OneDay => "1d",
            Interval::ThreeDays => "3d",
            Interval::OneWeek => "1w",
            Interval::OneMonth => "1M",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ProviderError;

    /// Case-sensitive: `1m` is one minute, `1M` one month
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interval = match s.trim() {
            "1m" => Interval::OneMinute,
            "3m" => Interval::ThreeMinutes,
            "5m" => Interval::FiveMinutes,
            "15m" => Interval::FifteenMinutes,
            "30m" => Interval::ThirtyMinutes,
            "1h" => Interval::OneHour,
            "2h" => Interval::TwoHours,
            "4h" => Interval::FourHours,
            "6h" => Interval::SixHours,
            "8h" => Interval::EightHours,
            "12h" => Interval::TwelveHours,
            "1d" => Interval::OneDay,
            "3d" => Interval::ThreeDays,
            "1w" => Interval::OneWeek,
            "1M" => Interval::OneMonth,
            other => {
                return Err(ProviderError::InvalidRequest(format!(
                    "unknown candle interval '{}'",
                    other
                )))
            }
        };
        Ok(interval)
    }
}

/// Narrowing from [`Record`] to one concrete payload type
pub trait FromRecord: Sized {
    /// Returns the record untouched when it holds a different payload
    fn from_record(record: Record) -> Result<Self, Record>;
}

macro_rules! records {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Any canonical payload a provider can produce; what the cache stores
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "kind", content = "data", rename_all = "snake_case")]
        pub enum Record {
            $($variant($ty)),*
        }

        impl Record {
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Record::$variant(_) => stringify!($variant)),*
                }
            }
        }

        $(
            impl From<$ty> for Record {
                fn from(value: $ty) -> Self {
                    Record::$variant(value)
                }
            }

            impl FromRecord for $ty {
                fn from_record(record: Record) -> Result<Self, Record> {
                    match record {
                        Record::$variant(value) => Ok(value),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

records! {
    Price(PriceRecord),
    Candles(Vec<Candle>),
    Movers(MarketMovers),
    DefiOverview(DefiOverview),
    Protocol(ProtocolDetail),
    DexVolumes(DexVolumes),
    Yields(Vec<YieldPool>),
    Stablecoins(Vec<Stablecoin>),
    FearGreed(FearGreedWindow),
    Wallet(WalletSnapshot),
    DefiPositions(Vec<DefiPosition>),
    TokenHolders(Vec<TokenHolder>),
    EthBalance(EthBalance),
    EthTransactions(Vec<EthTransaction>),
    TokenTransfers(Vec<TokenTransfer>),
    Gas(GasOracle),
    ProtocolFees(ProtocolFees),
    TokenPrice(TokenPrice),
}

/// Outcome of one provider request, success or tagged failure
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult<T = Record> {
    pub source: Source,
    /// Symbol, address or operation the request was about
    pub subject: String,
    /// Served from the cache without an upstream call
    pub cached: bool,
    pub outcome: Result<T, ProviderError>,
}

impl<T> ProviderResult<T> {
    pub fn new(source: Source, subject: impl Into<String>, outcome: Result<T, ProviderError>) -> Self {
        Self {
            source,
            subject: subject.into(),
            cached: false,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn payload(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ProviderError> {
        self.outcome.as_ref().err()
    }

    pub fn into_outcome(self) -> Result<T, ProviderError> {
        self.outcome
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResult<U> {
        ProviderResult {
            source: self.source,
            subject: self.subject,
            cached: self.cached,
            outcome: self.outcome.map(f),
        }
    }
}

impl ProviderResult<Record> {
    /// Narrow the payload; a payload of the wrong kind becomes `UpstreamMalformed`
    pub fn typed<T: FromRecord>(self) -> ProviderResult<T> {
        let outcome = self.outcome.and_then(|record| {
            T::from_record(record).map_err(|other| {
                ProviderError::malformed(format!("unexpected {} payload", other.kind()))
            })
        });

        ProviderResult {
            source: self.source,
            subject: self.subject,
            cached: self.cached,
            outcome,
        }
    }
}

impl<T: Serialize> Serialize for ProviderResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Failure {
            kind: ErrorKind,
            message: String,
        }

        let mut state = serializer.serialize_struct("ProviderResult", 6)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("subject", &self.subject)?;
        state.serialize_field("cached", &self.cached)?;
        state.serialize_field("success", &self.is_success())?;
        state.serialize_field("payload", &self.payload())?;
        state.serialize_field(
            "error",
            &self.error().map(|e| Failure {
                kind: e.kind(),
                message: e.to_string(),
            }),
        )?;
        state.end()
    }
}

/// Spot prices and candles
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn source(&self) -> Source;

    async fn fetch_price(&self, symbol: &str) -> Result<PriceRecord, ProviderError>;

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Candle>, ProviderError>;

    /// Top 24h gainers and losers
    async fn fetch_movers(&self) -> Result<MarketMovers, ProviderError> {
        Err(ProviderError::Unsupported(format!(
            "{} does not publish a market movers board",
            self.source()
        )))
    }
}

/// DeFi TVL, DEX volume and yield data
#[async_trait]
pub trait DefiSource: Send + Sync {
    fn source(&self) -> Source;

    async fn fetch_overview(&self) -> Result<DefiOverview, ProviderError>;

    async fn fetch_protocol(&self, slug: &str) -> Result<ProtocolDetail, ProviderError>;

    async fn fetch_dex_volumes(&self) -> Result<DexVolumes, ProviderError>;

    async fn fetch_yields(&self, min_tvl_usd: f64, limit: usize) -> Result<Vec<YieldPool>, ProviderError>;

    async fn fetch_stablecoins(&self) -> Result<Vec<Stablecoin>, ProviderError>;

    /// Daily fees across protocols, top earners first
    async fn fetch_protocol_fees(&self) -> Result<ProtocolFees, ProviderError>;

    /// Price for a `coingecko:<id>` or `<chain>:<address>` coin id
    async fn fetch_token_price(&self, coin_id: &str) -> Result<TokenPrice, ProviderError>;
}

/// Sentiment index history
#[async_trait]
pub trait SentimentSource: Send + Sync {
    fn source(&self) -> Source;

    /// Trailing window of `limit` daily readings, newest first
    async fn fetch_fear_greed(&self, limit: u32) -> Result<FearGreedWindow, ProviderError>;
}

/// Wallet holdings (credentialed)
#[async_trait]
pub trait WalletSource: Send + Sync {
    fn source(&self) -> Source;

    async fn fetch_wallet(&self, address: &str, chain: &str) -> Result<WalletSnapshot, ProviderError>;

    async fn fetch_defi_positions(&self, address: &str, chain: &str) -> Result<Vec<DefiPosition>, ProviderError>;

    /// Largest holders of an ERC-20 token, biggest first
    async fn fetch_token_holders(
        &self,
        token_address: &str,
        chain: &str,
        limit: u32,
    ) -> Result<Vec<TokenHolder>, ProviderError>;
}

/// Raw chain state (credentialed)
#[async_trait]
pub trait ChainSource: Send + Sync {
    fn source(&self) -> Source;

    async fn fetch_eth_balance(&self, address: &str) -> Result<EthBalance, ProviderError>;

    /// Most recent normal transactions, newest first
    async fn fetch_transactions(&self, address: &str, limit: u32) -> Result<Vec<EthTransaction>, ProviderError>;

    /// Most recent ERC-20 transfers, newest first
    async fn fetch_token_transfers(&self, address: &str, limit: u32) -> Result<Vec<TokenTransfer>, ProviderError>;

    /// Top holders of an ERC-20 token
    async fn fetch_top_holders(&self, token_address: &str) -> Result<Vec<TokenHolder>, ProviderError>;

    async fn fetch_gas(&self) -> Result<GasOracle, ProviderError>;
}
