//! Domain Layer - Core logic for the market mood engine
//!
//! Pure types and functions with no network dependencies. Providers reach
//! this layer only through the records they produce.
//!
//! - `cache`: expiring key/value store with an injectable clock
//! - `records`: canonical provider records
//! - `symbols`: ticker alias tables
//! - `scoring`: normalization formulas, band tables, composite scorer
//! - `components`: producers that turn records into composite components

pub mod cache;
pub mod records;
pub mod symbols;
pub mod scoring;
pub mod components;

pub use cache::{CacheEntry, CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use records::{
    Candle, DefiOverview, DexVolume, DexVolumes, EthBalance, FearGreedReading, FearGreedWindow,
    GasOracle, Holding, MarketMovers, Mover, PriceRecord, ProtocolDetail, ProtocolSummary,
    Stablecoin, WalletSnapshot, WalletTx, YieldPool,
};
pub use scoring::{
    Band, BandTable, ComponentWeights, CompositeComponent, CompositeIndex, CompositeScorer,
    ScoringError, NEUTRAL_SCORE,
};
