//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that provider adapters must
//! implement. Following hexagonal architecture, these traits abstract:
//! - Spot prices, candles and movers
//! - DeFi TVL, DEX volume, yields and stablecoins
//! - Sentiment index history
//! - Wallet holdings and raw chain state

pub mod provider;
pub mod mocks;

// Re-export main traits and types
pub use provider::{
    ChainSource, DefiSource, ErrorKind, FromRecord, Interval, PriceSource, ProviderError,
    ProviderResult, Record, SentimentSource, Source, WalletSource,
};
pub use mocks::MockProvider;
